//! Dense pre-sized grids over a known bounding box.
//!
//! Unlike the hashed grid these address cells by direct row-major
//! arithmetic, which makes them the right shape for per-frame rebuild and
//! reuse: `reset` re-sizes the cell table without freeing and every `add`
//! is a couple of array writes. The per-axis cell count is capped so
//! worst-case memory stays deterministic; a cell size too fine for the cap
//! is silently enlarged and reported through a debug diagnostic.

use lin_alg::f32::Vec3;

use crate::bucket::CellLists;
use crate::error::{GridError, GridResult};

/// Default cap on cells per axis.
pub const MAX_CELLS_PER_AXIS: usize = 64;

/// Cells needed to cover `extent` at `cell` size, including the cell that
/// holds the far boundary. Computed in float space so an absurd quotient
/// saturates instead of overflowing the integer add.
#[inline]
fn axis_cells(extent: f32, cell: f32) -> usize {
    ((extent / cell).floor() + 1.0) as usize
}

/// Enlarged cell size so `extent` fits into at most `max_dim` cells. The
/// small headroom keeps the far boundary inside the last cell after
/// rounding.
#[inline]
fn fit_cell(extent: f32, max_dim: usize) -> f32 {
    extent / (max_dim as f32 - 0.001)
}

/// Dense 3D grid over a fixed extent.
#[derive(Debug)]
pub struct BoundedGrid3 {
    min: Vec3,
    cell_size: f32,
    dims: [usize; 3],
    max_dim: usize,
    lists: CellLists,
}

impl BoundedGrid3 {
    pub fn new() -> Self {
        Self::with_max_dim(MAX_CELLS_PER_AXIS)
    }

    /// A grid capped at `max_dim` cells per axis instead of the default.
    pub fn with_max_dim(max_dim: usize) -> Self {
        Self {
            min: Vec3::new(0.0, 0.0, 0.0),
            cell_size: 1.0,
            dims: [0; 3],
            max_dim: max_dim.max(1),
            lists: CellLists::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Number of stored ids.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Drops all membership while keeping the configured extent and cell
    /// size.
    pub fn clear(&mut self) {
        let cells = self.dims[0] * self.dims[1] * self.dims[2];
        self.lists.reset(cells);
    }

    /// Re-sizes the grid over `[min, max]` and drops all membership,
    /// keeping allocations. The effective cell size is `cell_size` unless
    /// the per-axis cap forces a coarser one.
    pub fn reset(&mut self, min: Vec3, max: Vec3, cell_size: f32) -> GridResult<()> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(GridError::BadCellSize(cell_size));
        }
        let finite = min.x.is_finite()
            && min.y.is_finite()
            && min.z.is_finite()
            && max.x.is_finite()
            && max.y.is_finite()
            && max.z.is_finite();
        if !finite || max.x < min.x || max.y < min.y || max.z < min.z {
            return Err(GridError::BadExtent(format!(
                "min ({:.3}, {:.3}, {:.3}) max ({:.3}, {:.3}, {:.3})",
                min.x, min.y, min.z, max.x, max.y, max.z
            )));
        }

        let extent = [max.x - min.x, max.y - min.y, max.z - min.z];
        let mut cell = cell_size;
        for &e in &extent {
            if axis_cells(e, cell) > self.max_dim {
                cell = fit_cell(e, self.max_dim);
            }
        }
        if cell > cell_size {
            log::debug!(
                "bounded grid: cell size {cell_size:.3} enlarged to {cell:.3} to fit {}^3 cells",
                self.max_dim
            );
        }

        self.min = min;
        self.cell_size = cell;
        self.dims = [
            axis_cells(extent[0], cell),
            axis_cells(extent[1], cell),
            axis_cells(extent[2], cell),
        ];
        self.lists.reset(self.dims[0] * self.dims[1] * self.dims[2]);
        Ok(())
    }

    #[inline]
    fn cell_index(&self, pos: Vec3) -> Option<usize> {
        if !pos.x.is_finite() || !pos.y.is_finite() || !pos.z.is_finite() {
            return None;
        }
        let i = ((pos.x - self.min.x) / self.cell_size).floor() as i32;
        let j = ((pos.y - self.min.y) / self.cell_size).floor() as i32;
        let k = ((pos.z - self.min.z) / self.cell_size).floor() as i32;
        if i < 0 || j < 0 || k < 0 {
            return None;
        }
        let (i, j, k) = (i as usize, j as usize, k as usize);
        if i >= self.dims[0] || j >= self.dims[1] || k >= self.dims[2] {
            return None;
        }
        Some((i * self.dims[1] + j) * self.dims[2] + k)
    }

    /// Registers `id` at `pos`. Positions outside the configured extent are
    /// dropped with a diagnostic; the frame goes on without them.
    pub fn add(&mut self, id: u32, pos: Vec3) {
        match self.cell_index(pos) {
            Some(cell) => self.lists.insert(cell, id),
            None => log::warn!(
                "bounded grid: id {id} at ({:.2}, {:.2}, {:.2}) outside extent, dropped",
                pos.x,
                pos.y,
                pos.z
            ),
        }
    }

    /// Collects every id in the 3x3x3 cell neighborhood of `pos` into
    /// `out`, clearing it first.
    pub fn neighbors(&self, pos: Vec3, exclude: Option<u32>, out: &mut Vec<u32>) {
        out.clear();
        if self.dims[0] == 0 || !pos.x.is_finite() || !pos.y.is_finite() || !pos.z.is_finite() {
            return;
        }
        let ci = ((pos.x - self.min.x) / self.cell_size).floor() as i32;
        let cj = ((pos.y - self.min.y) / self.cell_size).floor() as i32;
        let ck = ((pos.z - self.min.z) / self.cell_size).floor() as i32;
        let (di, dj, dk) = (
            self.dims[0] as i32,
            self.dims[1] as i32,
            self.dims[2] as i32,
        );
        for i in ci.saturating_sub(1).max(0)..=ci.saturating_add(1).min(di - 1) {
            for j in cj.saturating_sub(1).max(0)..=cj.saturating_add(1).min(dj - 1) {
                for k in ck.saturating_sub(1).max(0)..=ck.saturating_add(1).min(dk - 1) {
                    let cell =
                        (i as usize * self.dims[1] + j as usize) * self.dims[2] + k as usize;
                    for id in self.lists.cell(cell) {
                        if Some(id) != exclude {
                            out.push(id);
                        }
                    }
                }
            }
        }
    }
}

impl Default for BoundedGrid3 {
    fn default() -> Self {
        Self::new()
    }
}

/// Dense 2D grid over a fixed extent, used for light-space projections.
/// The query radius is a per-call parameter instead of a fixed one-cell
/// ring, since shaded spheres of different radii share one grid.
#[derive(Debug)]
pub struct BoundedGrid2 {
    min: [f32; 2],
    cell_size: f32,
    dims: [usize; 2],
    max_dim: usize,
    lists: CellLists,
}

impl BoundedGrid2 {
    pub fn new() -> Self {
        Self::with_max_dim(MAX_CELLS_PER_AXIS)
    }

    pub fn with_max_dim(max_dim: usize) -> Self {
        Self {
            min: [0.0; 2],
            cell_size: 1.0,
            dims: [0; 2],
            max_dim: max_dim.max(1),
            lists: CellLists::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Drops all membership while keeping the configured extent and cell
    /// size.
    pub fn clear(&mut self) {
        self.lists.reset(self.dims[0] * self.dims[1]);
    }

    /// Re-sizes the grid over `[min, max]` and drops all membership. Same
    /// cap-and-enlarge policy as the 3D variant.
    pub fn reset(&mut self, min: [f32; 2], max: [f32; 2], cell_size: f32) -> GridResult<()> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(GridError::BadCellSize(cell_size));
        }
        let finite =
            min[0].is_finite() && min[1].is_finite() && max[0].is_finite() && max[1].is_finite();
        if !finite || max[0] < min[0] || max[1] < min[1] {
            return Err(GridError::BadExtent(format!(
                "min ({:.3}, {:.3}) max ({:.3}, {:.3})",
                min[0], min[1], max[0], max[1]
            )));
        }

        let extent = [max[0] - min[0], max[1] - min[1]];
        let mut cell = cell_size;
        for &e in &extent {
            if axis_cells(e, cell) > self.max_dim {
                cell = fit_cell(e, self.max_dim);
            }
        }
        if cell > cell_size {
            log::debug!(
                "bounded grid 2d: cell size {cell_size:.3} enlarged to {cell:.3} to fit {}^2 cells",
                self.max_dim
            );
        }

        self.min = min;
        self.cell_size = cell;
        self.dims = [axis_cells(extent[0], cell), axis_cells(extent[1], cell)];
        self.lists.reset(self.dims[0] * self.dims[1]);
        Ok(())
    }

    #[inline]
    fn cell_index(&self, pos: [f32; 2]) -> Option<usize> {
        if !pos[0].is_finite() || !pos[1].is_finite() {
            return None;
        }
        let i = ((pos[0] - self.min[0]) / self.cell_size).floor() as i32;
        let j = ((pos[1] - self.min[1]) / self.cell_size).floor() as i32;
        if i < 0 || j < 0 {
            return None;
        }
        let (i, j) = (i as usize, j as usize);
        if i >= self.dims[0] || j >= self.dims[1] {
            return None;
        }
        Some(i * self.dims[1] + j)
    }

    /// Registers `id` at `pos`; out-of-extent positions are dropped with a
    /// diagnostic.
    pub fn add(&mut self, id: u32, pos: [f32; 2]) {
        match self.cell_index(pos) {
            Some(cell) => self.lists.insert(cell, id),
            None => log::warn!(
                "bounded grid 2d: id {id} at ({:.2}, {:.2}) outside extent, dropped",
                pos[0],
                pos[1]
            ),
        }
    }

    /// Collects every id within `radius` of `pos` (measured cell-wise, so
    /// the result is a superset of the true disk) into `out`, clearing it
    /// first. The scanned block spans `ceil(radius / cell_size)` cells on
    /// each side.
    pub fn neighbors(&self, pos: [f32; 2], radius: f32, exclude: Option<u32>, out: &mut Vec<u32>) {
        out.clear();
        if self.dims[0] == 0 || !pos[0].is_finite() || !pos[1].is_finite() || !radius.is_finite() {
            return;
        }
        let reach = (radius.max(0.0) / self.cell_size).ceil() as i32;
        let (di, dj) = (self.dims[0] as i32, self.dims[1] as i32);
        if reach >= di.max(dj) {
            log::debug!("bounded grid 2d: query radius {radius:.2} spans the whole grid");
        }
        let ci = ((pos[0] - self.min[0]) / self.cell_size).floor() as i32;
        let cj = ((pos[1] - self.min[1]) / self.cell_size).floor() as i32;
        for i in ci.saturating_sub(reach).max(0)..=ci.saturating_add(reach).min(di - 1) {
            for j in cj.saturating_sub(reach).max(0)..=cj.saturating_add(reach).min(dj - 1) {
                let cell = i as usize * self.dims[1] + j as usize;
                for id in self.lists.cell(cell) {
                    if Some(id) != exclude {
                        out.push(id);
                    }
                }
            }
        }
    }
}

impl Default for BoundedGrid2 {
    fn default() -> Self {
        Self::new()
    }
}
