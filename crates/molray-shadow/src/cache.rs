//! Per-kind occluder caches.
//!
//! The engine keeps one cache per primitive kind. A cache owns the
//! primitives in flat parallel arrays (a primitive's id is its array
//! index), their bounding spheres, the light-plane projections of the
//! bound centers and a dense 2D grid over those projections. Rebuilds
//! reuse every allocation.

use lin_alg::f32::Vec3;

use molray_geom::{Bounded, BoundingSphere, LightBasis};
use molray_grid::{BoundedGrid2, GridResult};

/// Running 2D extent of the projected bound centers.
#[derive(Debug, Clone, Copy)]
struct Extent2 {
    min: [f32; 2],
    max: [f32; 2],
}

impl Extent2 {
    fn empty() -> Self {
        Self {
            min: [f32::MAX; 2],
            max: [f32::MIN; 2],
        }
    }

    fn grow(&mut self, p: [f32; 2]) {
        for axis in 0..2 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }
}

/// Cache of one occluder kind, generic over the primitive type.
pub(crate) struct KindCache<P> {
    /// Primitives, indexed by id.
    pub prims: Vec<P>,
    /// Per-primitive transparency flag.
    pub transparent: Vec<bool>,
    /// Conservative bounds, parallel to `prims`.
    pub bounds: Vec<BoundingSphere>,
    /// Light-plane projections of the bound centers, filled by `rebuild`.
    proj: Vec<[f32; 2]>,
    /// 2D culling grid over `proj`.
    grid: BoundedGrid2,
    /// Candidates for the sphere most recently passed to `prepare`.
    pub active: Vec<u32>,
    /// Id of the occluder that last shadowed a point, tried first on the
    /// next query.
    pub hint: Option<u32>,
    /// Largest bound radius seen since the last clear.
    max_radius: f32,
}

impl<P: Bounded> KindCache<P> {
    pub fn new(max_dim: usize) -> Self {
        Self {
            prims: Vec::new(),
            transparent: Vec::new(),
            bounds: Vec::new(),
            proj: Vec::new(),
            grid: BoundedGrid2::with_max_dim(max_dim),
            active: Vec::new(),
            hint: None,
            max_radius: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.prims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prims.is_empty()
    }

    /// Drops all primitives, projections, candidates and the hint.
    pub fn clear(&mut self) {
        self.prims.clear();
        self.transparent.clear();
        self.bounds.clear();
        self.proj.clear();
        self.grid.clear();
        self.active.clear();
        self.hint = None;
        self.max_radius = 0.0;
    }

    pub fn push(&mut self, prim: P, transparent: bool) {
        let bound = prim.bounding_sphere();
        self.max_radius = self.max_radius.max(bound.radius);
        self.bounds.push(bound);
        self.transparent.push(transparent);
        self.prims.push(prim);
    }

    /// Projects every bound center into the light plane and rebuilds the
    /// culling grid. The cell edge is the largest bound radius, floored at
    /// `min_cell`, so a one-cell reach plus the query radius covers every
    /// overlap.
    pub fn rebuild(&mut self, basis: &LightBasis, min_cell: f32) -> GridResult<()> {
        self.proj.clear();
        self.active.clear();
        if self.prims.is_empty() {
            self.grid.reset([0.0; 2], [0.0; 2], min_cell)?;
            return Ok(());
        }
        let mut extent = Extent2::empty();
        for bound in &self.bounds {
            let p = basis.project(bound.center);
            extent.grow(p);
            self.proj.push(p);
        }
        let cell = self.max_radius.max(min_cell);
        self.grid.reset(extent.min, extent.max, cell)?;
        for (id, &p) in self.proj.iter().enumerate() {
            self.grid.add(id as u32, p);
        }
        Ok(())
    }

    /// Rebuilds `active` with every occluder that could shadow some point
    /// of the sphere `(center, radius)`: grid cull in the light plane, then
    /// an exact projected-disk overlap plus a light-side test on the
    /// survivors. With `transparency_shadows` off, transparent occluders
    /// are filtered here so the query loop never sees them.
    pub fn prepare(
        &mut self,
        basis: &LightBasis,
        center: Vec3,
        radius: f32,
        transparency_shadows: bool,
    ) {
        self.active.clear();
        if self.prims.is_empty() {
            return;
        }
        let center2 = basis.project(center);
        let reach = radius + self.grid.cell_size();
        self.grid.neighbors(center2, reach, None, &mut self.active);

        let light = basis.dir;
        let bounds = &self.bounds;
        let proj = &self.proj;
        let transparent = &self.transparent;
        self.active.retain(|&id| {
            let i = id as usize;
            if !transparency_shadows && transparent[i] {
                return false;
            }
            let bound = &bounds[i];
            // Entirely on the far side of the sphere from the light.
            if (bound.center - center).dot(light) < -(radius + bound.radius) {
                return false;
            }
            let dx = proj[i][0] - center2[0];
            let dy = proj[i][1] - center2[1];
            let rr = radius + bound.radius;
            dx * dx + dy * dy <= rr * rr
        });

        // A hint filtered out above must not resurface via the fast path.
        if let Some(h) = self.hint {
            if !transparency_shadows && self.transparent[h as usize] {
                self.hint = None;
            }
        }
    }
}
