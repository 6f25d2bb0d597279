//! Index-linked cell membership lists.
//!
//! Both grid flavors store which ids live in which cell as singly linked
//! lists laid out in flat parallel arrays: `head[cell]` holds the first
//! slot of a cell's chain, `next[slot]` the following slot and `ids[slot]`
//! the caller's id. Appending is a push onto the slot arrays plus one head
//! swap, and resetting truncates without freeing, so a per-frame rebuild
//! stops allocating once the arrays have grown to steady state.

/// Sentinel marking an empty head or the end of a chain.
pub const INVALID: u32 = u32::MAX;

/// Flat-array linked lists, one list per cell.
#[derive(Debug, Default, Clone)]
pub struct CellLists {
    head: Vec<u32>,
    next: Vec<u32>,
    ids: Vec<u32>,
}

impl CellLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all membership and resizes to `cell_count` empty cells,
    /// keeping the allocations from previous frames.
    pub fn reset(&mut self, cell_count: usize) {
        self.head.clear();
        self.head.resize(cell_count, INVALID);
        self.next.clear();
        self.ids.clear();
    }

    /// Appends one empty cell and returns its index.
    pub fn add_cell(&mut self) -> usize {
        self.head.push(INVALID);
        self.head.len() - 1
    }

    pub fn cell_count(&self) -> usize {
        self.head.len()
    }

    /// Total memberships across all cells.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Prepends `id` to the chain of `cell`.
    pub fn insert(&mut self, cell: usize, id: u32) {
        let slot = self.ids.len() as u32;
        self.ids.push(id);
        self.next.push(self.head[cell]);
        self.head[cell] = slot;
    }

    /// Iterates the ids stored in `cell`, most recently inserted first.
    /// Out-of-range cells iterate as empty.
    pub fn cell(&self, cell: usize) -> CellIter<'_> {
        let slot = self.head.get(cell).copied().unwrap_or(INVALID);
        CellIter { lists: self, slot }
    }
}

/// Iterator over one cell's chain.
#[derive(Clone)]
pub struct CellIter<'a> {
    lists: &'a CellLists,
    slot: u32,
}

impl Iterator for CellIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.slot == INVALID {
            return None;
        }
        let i = self.slot as usize;
        self.slot = self.lists.next[i];
        Some(self.lists.ids[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_iterate_lifo() {
        let mut lists = CellLists::new();
        lists.reset(3);
        lists.insert(1, 10);
        lists.insert(1, 20);
        lists.insert(1, 30);
        let got: Vec<u32> = lists.cell(1).collect();
        assert_eq!(got, vec![30, 20, 10]);
        assert!(lists.cell(0).next().is_none());
        assert_eq!(lists.len(), 3);
    }

    #[test]
    fn test_chains_stay_separate() {
        let mut lists = CellLists::new();
        lists.reset(2);
        lists.insert(0, 1);
        lists.insert(1, 2);
        lists.insert(0, 3);
        assert_eq!(lists.cell(0).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(lists.cell(1).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_reset_drops_membership() {
        let mut lists = CellLists::new();
        lists.reset(2);
        lists.insert(0, 5);
        lists.reset(4);
        assert_eq!(lists.cell_count(), 4);
        assert!(lists.is_empty());
        assert!(lists.cell(0).next().is_none());
    }

    #[test]
    fn test_add_cell_extends() {
        let mut lists = CellLists::new();
        lists.reset(0);
        let a = lists.add_cell();
        let b = lists.add_cell();
        assert_eq!((a, b), (0, 1));
        lists.insert(b, 7);
        assert_eq!(lists.cell(b).collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_out_of_range_cell_is_empty() {
        let mut lists = CellLists::new();
        lists.reset(1);
        lists.insert(0, 9);
        assert!(lists.cell(99).next().is_none());
    }
}
