//! Spatial indexing for the molecular renderer.
//!
//! Two flavors of uniform grid back the neighbor queries:
//!
//! - [`HashGrid`]: open extent, cell coordinates hashed into a fixed table.
//!   For searches over data whose bounds are unknown up front, like bond
//!   partner detection across a whole molecule.
//! - [`BoundedGrid3`] / [`BoundedGrid2`]: dense and pre-sized over a known
//!   bounding box, rebuilt and reused every frame by the shadow engine.
//!
//! Both store cell membership in flat index-linked lists ([`CellLists`])
//! instead of per-cell vectors, so a warm rebuild performs no allocation.
//!
//! # Example
//!
//! ```
//! use lin_alg::f32::Vec3;
//! use molray_grid::HashGrid;
//!
//! let mut grid = HashGrid::new(2.0)?;
//! grid.add(7, Vec3::new(0.0, 0.0, 0.0));
//! grid.add(9, Vec3::new(1.0, 0.0, 0.0));
//!
//! let mut out = Vec::new();
//! grid.neighbors(Vec3::new(0.5, 0.0, 0.0), None, &mut out);
//! out.sort_unstable();
//! assert_eq!(out, vec![7, 9]);
//! # Ok::<(), molray_grid::GridError>(())
//! ```

mod bounded;
mod bucket;
mod error;
mod hashed;

pub use bounded::{BoundedGrid2, BoundedGrid3, MAX_CELLS_PER_AXIS};
pub use bucket::{CellIter, CellLists, INVALID};
pub use error::{GridError, GridResult};
pub use hashed::{CellCoord, HashGrid};

pub mod prelude {
    pub use crate::{BoundedGrid2, BoundedGrid3, CellLists, GridError, GridResult, HashGrid};
}
