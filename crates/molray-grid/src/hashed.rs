//! Open-extent hashed spatial grid.

use ahash::AHashMap;
use lin_alg::f32::Vec3;
use smallvec::SmallVec;

use crate::bucket::CellLists;
use crate::error::{GridError, GridResult};

/// Integer cell coordinate obtained by floor division.
pub type CellCoord = (i32, i32, i32);

/// Cells per hash-table axis; each axis contributes 4 bits to the bucket.
const TABLE_DIM: i32 = 16;
const TABLE_SIZE: usize = (TABLE_DIM * TABLE_DIM * TABLE_DIM) as usize;
const AXIS_MASK: i32 = TABLE_DIM - 1;

/// Offsets covering half of the 3x3x3 neighborhood, so that walking every
/// occupied cell emits each cross-cell pair exactly once.
const FORWARD_NEIGHBORS: [(i32, i32, i32); 13] = [
    (1, -1, -1),
    (1, -1, 0),
    (1, -1, 1),
    (1, 0, -1),
    (1, 0, 0),
    (1, 0, 1),
    (1, 1, -1),
    (1, 1, 0),
    (1, 1, 1),
    (0, 1, -1),
    (0, 1, 0),
    (0, 1, 1),
    (0, 0, 1),
];

/// Spatial hash for neighbor searches over data whose extent is not known
/// in advance (bond perception, surface neighbor passes over an entire
/// molecule).
///
/// Cell coordinates hash into a fixed 16x16x16 table by masking each axis
/// to its low 4 bits. The mask is lossy, so every bucket keeps the list of
/// distinct cell coordinates it holds and lookups resolve the true cell by
/// a short linear scan. Two points within `spacing` of each other always
/// land in the same or adjacent cells, so a 3x3x3 cell walk sees them both.
pub struct HashGrid {
    spacing: f32,
    /// bucket -> dense cell indices whose coordinates mask to the bucket
    table: Vec<SmallVec<[u32; 4]>>,
    /// dense cell index -> resolved cell coordinate
    cells: Vec<CellCoord>,
    lists: CellLists,
    /// external id -> insertion-order slot; rejects duplicate ids
    slots: AHashMap<u32, u32>,
}

impl HashGrid {
    /// `spacing` is the query distance the grid is tuned for.
    pub fn new(spacing: f32) -> GridResult<Self> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(GridError::BadCellSize(spacing));
        }
        Ok(Self {
            spacing,
            table: vec![SmallVec::new(); TABLE_SIZE],
            cells: Vec::new(),
            lists: CellLists::new(),
            slots: AHashMap::new(),
        })
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Number of stored ids.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.slots.contains_key(&id)
    }

    /// Dense insertion-order slot assigned to `id`, if present. Sparse
    /// external ids map to `0..len()`, so callers can keep per-id data in
    /// flat arrays parallel to the grid.
    pub fn slot_of(&self, id: u32) -> Option<u32> {
        self.slots.get(&id).copied()
    }

    /// Removes everything while keeping allocations for reuse.
    pub fn clear(&mut self) {
        for bucket in &mut self.table {
            bucket.clear();
        }
        self.cells.clear();
        self.lists.reset(0);
        self.slots.clear();
    }

    #[inline]
    fn cell_coord(&self, pos: Vec3) -> CellCoord {
        (
            (pos.x / self.spacing).floor() as i32,
            (pos.y / self.spacing).floor() as i32,
            (pos.z / self.spacing).floor() as i32,
        )
    }

    #[inline]
    fn bucket_index(coord: CellCoord) -> usize {
        let i = (coord.0 & AXIS_MASK) as usize;
        let j = (coord.1 & AXIS_MASK) as usize;
        let k = (coord.2 & AXIS_MASK) as usize;
        (i << 8) | (j << 4) | k
    }

    /// Resolves a coordinate to its dense cell index, if occupied.
    fn find_cell(&self, coord: CellCoord) -> Option<usize> {
        self.table[Self::bucket_index(coord)]
            .iter()
            .find(|&&c| self.cells[c as usize] == coord)
            .map(|&c| c as usize)
    }

    fn find_or_create_cell(&mut self, coord: CellCoord) -> usize {
        let bucket = Self::bucket_index(coord);
        for &c in &self.table[bucket] {
            if self.cells[c as usize] == coord {
                return c as usize;
            }
        }
        let cell = self.lists.add_cell();
        self.cells.push(coord);
        self.table[bucket].push(cell as u32);
        cell
    }

    /// Registers `id` at `pos`. Duplicate ids and non-finite positions are
    /// dropped with a diagnostic.
    pub fn add(&mut self, id: u32, pos: Vec3) {
        if !pos.x.is_finite() || !pos.y.is_finite() || !pos.z.is_finite() {
            log::warn!("hash grid: dropping id {id} with non-finite position");
            return;
        }
        if self.slots.contains_key(&id) {
            log::debug!("hash grid: id {id} already present, re-add ignored");
            return;
        }
        let slot = self.lists.len() as u32;
        self.slots.insert(id, slot);
        let cell = self.find_or_create_cell(self.cell_coord(pos));
        self.lists.insert(cell, id);
    }

    /// Collects every id in the 3x3x3 cell neighborhood of `pos` into
    /// `out`, clearing it first. `exclude` omits one id, typically the
    /// querying object itself.
    pub fn neighbors(&self, pos: Vec3, exclude: Option<u32>, out: &mut Vec<u32>) {
        out.clear();
        if !pos.x.is_finite() || !pos.y.is_finite() || !pos.z.is_finite() {
            return;
        }
        let (ci, cj, ck) = self.cell_coord(pos);
        for di in -1..=1 {
            for dj in -1..=1 {
                for dk in -1..=1 {
                    let coord = (
                        ci.saturating_add(di),
                        cj.saturating_add(dj),
                        ck.saturating_add(dk),
                    );
                    let Some(cell) = self.find_cell(coord) else {
                        continue;
                    };
                    for id in self.lists.cell(cell) {
                        if Some(id) != exclude {
                            out.push(id);
                        }
                    }
                }
            }
        }
    }

    /// Occupied cell coordinates, in creation order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.iter().copied()
    }

    /// Appends the unordered id pairs of `cell`: every pair within the cell
    /// plus every pair against its 13 forward neighbor cells. Calling this
    /// for each occupied cell yields each proximate pair exactly once.
    pub fn cell_pairs(&self, cell: CellCoord, out: &mut Vec<(u32, u32)>) {
        let Some(home) = self.find_cell(cell) else {
            return;
        };
        let mut first = self.lists.cell(home);
        while let Some(a) = first.next() {
            for b in first.clone() {
                out.push((a, b));
            }
        }
        for &(di, dj, dk) in &FORWARD_NEIGHBORS {
            let coord = (
                cell.0.saturating_add(di),
                cell.1.saturating_add(dj),
                cell.2.saturating_add(dk),
            );
            let Some(other) = self.find_cell(coord) else {
                continue;
            };
            for a in self.lists.cell(home) {
                for b in self.lists.cell(other) {
                    out.push((a, b));
                }
            }
        }
    }

    /// All proximate id pairs in the grid, appended to `out`.
    pub fn all_pairs(&self, out: &mut Vec<(u32, u32)>) {
        for i in 0..self.cells.len() {
            self.cell_pairs(self.cells[i], out);
        }
    }
}
