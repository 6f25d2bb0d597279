//! Per-point shadow queries for a single directional light.

use lin_alg::f32::Vec3;

use molray_geom::{ray_segment_distance_sq, ray_triangle, Capsule, LightBasis, Sphere, Triangle};

use crate::cache::KindCache;
use crate::error::{ShadowError, ShadowResult};
use crate::settings::ShadowSettings;

/// Exact sphere occlusion: the center sits on the light side of the point
/// and within one radius of the point-to-light ray.
#[inline]
fn sphere_occludes(sphere: &Sphere, p: Vec3, light: Vec3) -> bool {
    let d = sphere.center - p;
    let t = d.dot(light);
    if t < 0.0 {
        return false;
    }
    d.magnitude_squared() - t * t < sphere.radius * sphere.radius
}

/// Capsule occlusion via the ray-to-segment distance. Cheaper than the full
/// render-time capsule intersection and exact for the cylindrical body and
/// caps alike.
#[inline]
fn capsule_occludes(capsule: &Capsule, p: Vec3, light: Vec3) -> bool {
    let (dist_sq, _) = ray_segment_distance_sq(p, light, capsule.start, capsule.end);
    dist_sq < capsule.radius * capsule.radius
}

/// Triangle occlusion: an exact double-sided intersection on the forward
/// half of the shadow ray.
#[inline]
fn triangle_occludes(triangle: &Triangle, p: Vec3, light: Vec3) -> bool {
    matches!(ray_triangle(p, light, triangle), Some(t) if t >= 0.0)
}

#[inline]
fn finite(v: Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Shadow determination engine.
///
/// Answers "does anything block the light from this point?" for the shading
/// loop of the software renderer. Occluders are registered per frame, then
/// [`rebuild`](Self::rebuild) projects their bounds into the light plane
/// and indexes them; [`prepare_sphere`](Self::prepare_sphere) narrows the
/// occluders to those that can affect one shaded sphere; and
/// [`point_shadowed`](Self::point_shadowed) resolves a single sample
/// against that short list, fronted by a per-kind last-occluder hint that
/// pays off on coherent scanline runs.
///
/// One engine serves one thread; renderers that shade tiles in parallel
/// hold an engine per worker over the same immutable occluder lists.
pub struct ShadowEngine {
    settings: ShadowSettings,
    basis: Option<LightBasis>,
    spheres: KindCache<Sphere>,
    capsules: KindCache<Capsule>,
    triangles: KindCache<Triangle>,
}

impl ShadowEngine {
    pub fn new(settings: ShadowSettings) -> Self {
        let max_dim = settings.max_cells_per_axis;
        Self {
            settings,
            basis: None,
            spheres: KindCache::new(max_dim),
            capsules: KindCache::new(max_dim),
            triangles: KindCache::new(max_dim),
        }
    }

    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    /// The light frame of the last successful [`rebuild`](Self::rebuild).
    pub fn light_basis(&self) -> Option<&LightBasis> {
        self.basis.as_ref()
    }

    pub fn sphere_count(&self) -> usize {
        self.spheres.len()
    }

    pub fn capsule_count(&self) -> usize {
        self.capsules.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty() && self.capsules.is_empty() && self.triangles.is_empty()
    }

    /// Drops every registered occluder and both the candidate lists and the
    /// coherence hints. Allocations and settings stay.
    pub fn clear(&mut self) {
        self.spheres.clear();
        self.capsules.clear();
        self.triangles.clear();
    }

    /// Registers an atom sphere. Invalid geometry is dropped with a
    /// diagnostic rather than failing the frame.
    pub fn add_sphere(&mut self, sphere: Sphere, transparent: bool) {
        if !finite(sphere.center) || !sphere.radius.is_finite() || sphere.radius < 0.0 {
            log::warn!("shadow engine: dropping sphere with invalid geometry");
            return;
        }
        self.spheres.push(sphere, transparent);
    }

    /// Registers a bond capsule. A capsule whose endpoints coincide still
    /// occludes like a sphere of its radius.
    pub fn add_capsule(&mut self, capsule: Capsule, transparent: bool) {
        if !finite(capsule.start)
            || !finite(capsule.end)
            || !capsule.radius.is_finite()
            || capsule.radius < 0.0
        {
            log::warn!("shadow engine: dropping capsule with invalid geometry");
            return;
        }
        self.capsules.push(capsule, transparent);
    }

    /// Registers a surface triangle. Zero-area triangles are kept but never
    /// intersect anything.
    pub fn add_triangle(&mut self, triangle: Triangle, transparent: bool) {
        if !finite(triangle.v0) || !finite(triangle.v1) || !finite(triangle.v2) {
            log::warn!("shadow engine: dropping triangle with invalid geometry");
            return;
        }
        self.triangles.push(triangle, transparent);
    }

    /// Fixes the light direction for the frame and rebuilds the per-kind
    /// culling grids over the projected occluder bounds. Call after the
    /// occluders for the frame are registered and before any queries.
    /// Hints warmed under the previous light are dropped. On error the
    /// engine is left without a light basis and every query answers
    /// unshadowed until a rebuild succeeds.
    pub fn rebuild(&mut self, light_dir: Vec3) -> ShadowResult<()> {
        let basis = LightBasis::new(light_dir).ok_or(ShadowError::DegenerateLight)?;
        // Unset until every kind is indexed under the new light.
        self.basis = None;
        let min_cell = self.settings.min_cell_size;
        self.spheres.rebuild(&basis, min_cell)?;
        self.capsules.rebuild(&basis, min_cell)?;
        self.triangles.rebuild(&basis, min_cell)?;
        self.clear_hints();
        log::debug!(
            "shadow caches rebuilt: {} spheres, {} capsules, {} triangles",
            self.spheres.len(),
            self.capsules.len(),
            self.triangles.len()
        );
        self.basis = Some(basis);
        Ok(())
    }

    /// Narrows the occluders to those able to shadow any point of the
    /// sphere `(center, radius)`. Every subsequent
    /// [`point_shadowed`](Self::point_shadowed) call assumes its point lies
    /// on or inside that sphere. `transparency_shadows` decides whether
    /// transparent occluders throw shadows this pass.
    pub fn prepare_sphere(&mut self, center: Vec3, radius: f32, transparency_shadows: bool) {
        let Some(basis) = self.basis else {
            self.spheres.active.clear();
            self.capsules.active.clear();
            self.triangles.active.clear();
            return;
        };
        self.spheres
            .prepare(&basis, center, radius, transparency_shadows);
        self.capsules
            .prepare(&basis, center, radius, transparency_shadows);
        self.triangles
            .prepare(&basis, center, radius, transparency_shadows);
    }

    /// Whether anything blocks the light from `point`.
    ///
    /// The point is nudged `bias` toward the light first so a sample never
    /// re-hits the surface it sits on. Answers do not depend on the hint
    /// state; the hints only change which occluder is tested first.
    pub fn point_shadowed(&mut self, point: Vec3) -> bool {
        let Some(basis) = self.basis else {
            return false;
        };
        let light = basis.dir;
        let p = point + light * self.settings.bias;

        if let Some(id) = self.spheres.hint {
            if sphere_occludes(&self.spheres.prims[id as usize], p, light) {
                return true;
            }
            self.spheres.hint = None;
        }
        if let Some(id) = self.capsules.hint {
            if capsule_occludes(&self.capsules.prims[id as usize], p, light) {
                return true;
            }
            self.capsules.hint = None;
        }
        if let Some(id) = self.triangles.hint {
            if triangle_occludes(&self.triangles.prims[id as usize], p, light) {
                return true;
            }
            self.triangles.hint = None;
        }

        let hit = self
            .spheres
            .active
            .iter()
            .copied()
            .find(|&id| sphere_occludes(&self.spheres.prims[id as usize], p, light));
        if let Some(id) = hit {
            self.spheres.hint = Some(id);
            return true;
        }

        let hit = self
            .capsules
            .active
            .iter()
            .copied()
            .find(|&id| capsule_occludes(&self.capsules.prims[id as usize], p, light));
        if let Some(id) = hit {
            self.capsules.hint = Some(id);
            return true;
        }

        let hit = self
            .triangles
            .active
            .iter()
            .copied()
            .find(|&id| triangle_occludes(&self.triangles.prims[id as usize], p, light));
        if let Some(id) = hit {
            self.triangles.hint = Some(id);
            return true;
        }

        false
    }

    /// Back-face pre-filter: a sample whose normal points away from the
    /// light is dark regardless of occluders, so callers skip the full
    /// query for it. `tolerance` widens or narrows the cutoff around the
    /// terminator.
    pub fn self_shadowed(&self, normal: Vec3, tolerance: f32) -> bool {
        match self.basis {
            Some(basis) => normal.dot(basis.dir) < tolerance,
            None => false,
        }
    }

    /// Forgets the per-kind last-occluder hints. Useful between image tiles
    /// where coherence breaks anyway.
    pub fn clear_hints(&mut self) {
        self.spheres.hint = None;
        self.capsules.hint = None;
        self.triangles.hint = None;
    }
}

impl Default for ShadowEngine {
    fn default() -> Self {
        Self::new(ShadowSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_light(light: Vec3) -> ShadowEngine {
        let mut engine = ShadowEngine::default();
        engine.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0), false);
        engine.rebuild(light).unwrap();
        engine
    }

    #[test]
    fn test_sphere_blocks_light() {
        let mut engine = engine_with_light(Vec3::new(0.0, 0.0, 1.0));
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 3.0, true);
        assert!(engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
        assert!(!engine.point_shadowed(Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_occluder_behind_point_does_not_shadow() {
        let mut engine = ShadowEngine::default();
        engine.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0), false);
        engine.rebuild(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0, true);
        assert!(!engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_hint_set_and_invalidated() {
        let mut engine = engine_with_light(Vec3::new(0.0, 0.0, 1.0));
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 3.0, true);
        assert!(engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
        assert_eq!(engine.spheres.hint, Some(0));
        // A lit point must clear the stale hint and still answer false.
        assert!(!engine.point_shadowed(Vec3::new(3.0, 0.0, 0.0)));
        assert!(engine.spheres.hint.is_none());
    }

    #[test]
    fn test_clear_hints_keeps_answers() {
        let mut engine = engine_with_light(Vec3::new(0.0, 0.0, 1.0));
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0, true);
        let p = Vec3::new(0.2, 0.1, 0.0);
        let warm = engine.point_shadowed(p);
        engine.clear_hints();
        assert_eq!(engine.point_shadowed(p), warm);
    }

    #[test]
    fn test_capsule_occlusion_including_caps() {
        let mut engine = ShadowEngine::default();
        // Bond hanging above the origin, axis along x.
        engine.add_capsule(
            Capsule::new(Vec3::new(-1.0, 0.0, 4.0), Vec3::new(1.0, 0.0, 4.0), 0.5),
            false,
        );
        engine.rebuild(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 2.0, true);
        // Under the body.
        assert!(engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
        // Under the cap hemisphere just past the segment end.
        assert!(engine.point_shadowed(Vec3::new(1.3, 0.0, 0.0)));
        // Past the cap entirely.
        assert!(!engine.point_shadowed(Vec3::new(1.8, 0.0, 0.0)));
    }

    #[test]
    fn test_degenerate_capsule_occludes_like_sphere() {
        let mut engine = ShadowEngine::default();
        let p = Vec3::new(0.0, 0.0, 4.0);
        engine.add_capsule(Capsule::new(p, p, 0.5), false);
        engine.rebuild(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0, true);
        assert!(engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
        assert!(!engine.point_shadowed(Vec3::new(0.6, 0.0, 0.0)));
    }

    #[test]
    fn test_triangle_shadow_edges() {
        let mut engine = ShadowEngine::default();
        engine.add_triangle(
            Triangle::new(
                Vec3::new(-1.0, -1.0, 3.0),
                Vec3::new(1.0, -1.0, 3.0),
                Vec3::new(0.0, 1.0, 3.0),
            ),
            false,
        );
        engine.rebuild(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 2.0, true);
        assert!(engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
        assert!(!engine.point_shadowed(Vec3::new(1.5, 0.0, 0.0)));
    }

    #[test]
    fn test_transparency_toggle() {
        let mut engine = ShadowEngine::default();
        engine.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0), true);
        engine.rebuild(Vec3::new(0.0, 0.0, 1.0)).unwrap();

        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0, false);
        assert!(!engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));

        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0, true);
        assert!(engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_transparent_hint_cannot_leak_across_passes() {
        let mut engine = ShadowEngine::default();
        engine.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0), true);
        engine.rebuild(Vec3::new(0.0, 0.0, 1.0)).unwrap();

        // Warm the hint with transparency shadows on.
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0, true);
        assert!(engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
        assert_eq!(engine.spheres.hint, Some(0));

        // Same sphere, transparency shadows off: the warmed hint must not
        // produce a shadow the scan would not.
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0, false);
        assert!(!engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_own_sphere_shadows_back_hemisphere() {
        let mut engine = ShadowEngine::default();
        let atom = Sphere::new(Vec3::new(0.0, 0.0, 0.0), 1.0);
        engine.add_sphere(atom, false);
        engine.rebuild(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        engine.prepare_sphere(atom.center, atom.radius, true);

        // Light-facing surface point stays lit thanks to the bias nudge.
        assert!(!engine.point_shadowed(Vec3::new(0.0, 0.0, 1.0)));
        // The far hemisphere is occluded by the sphere itself.
        assert!(engine.point_shadowed(Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_self_shadowed_prefilter() {
        let mut engine = ShadowEngine::default();
        engine.rebuild(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        assert!(engine.self_shadowed(Vec3::new(0.0, 0.0, -1.0), 0.05));
        assert!(!engine.self_shadowed(Vec3::new(0.0, 0.0, 1.0), 0.05));
        // Terminator-grazing normal falls under the tolerance.
        assert!(engine.self_shadowed(Vec3::new(1.0, 0.0, 0.0), 0.05));
    }

    #[test]
    fn test_failed_rebuild_leaves_engine_unprepared() {
        // A zero min_cell_size makes an empty kind fail its grid reset.
        let settings = ShadowSettings {
            min_cell_size: 0.0,
            ..ShadowSettings::default()
        };
        let mut engine = ShadowEngine::new(settings);
        engine.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0), false);
        engine.add_capsule(
            Capsule::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 0.5),
            false,
        );
        engine.add_triangle(
            Triangle::new(
                Vec3::new(0.0, 0.0, 3.0),
                Vec3::new(1.0, 0.0, 3.0),
                Vec3::new(0.0, 1.0, 3.0),
            ),
            false,
        );
        engine.rebuild(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        assert!(engine.light_basis().is_some());

        // Next frame carries only spheres, so the sphere grid is rebuilt
        // under the new light before the empty capsule kind fails.
        engine.clear();
        engine.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0), false);
        assert!(engine.rebuild(Vec3::new(1.0, 0.0, 0.0)).is_err());

        // No basis survives the failure: the stale light must not pair
        // with the half-rebuilt grids.
        assert!(engine.light_basis().is_none());
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0, true);
        assert!(!engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_degenerate_light_rejected() {
        let mut engine = ShadowEngine::default();
        engine.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0), false);
        assert!(matches!(
            engine.rebuild(Vec3::new(0.0, 0.0, 0.0)),
            Err(ShadowError::DegenerateLight)
        ));
        // No basis, no shadows.
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0, true);
        assert!(!engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_invalid_geometry_dropped() {
        let mut engine = ShadowEngine::default();
        engine.add_sphere(Sphere::new(Vec3::new(f32::NAN, 0.0, 0.0), 1.0), false);
        engine.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 0.0), -1.0), false);
        engine.add_capsule(
            Capsule::new(
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(f32::INFINITY, 0.0, 0.0),
                0.5,
            ),
            false,
        );
        engine.add_triangle(
            Triangle::new(
                Vec3::new(f32::NAN, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ),
            false,
        );
        assert!(engine.is_empty());
    }

    #[test]
    fn test_clear_then_requery() {
        let mut engine = engine_with_light(Vec3::new(0.0, 0.0, 1.0));
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0, true);
        assert!(engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));

        engine.clear();
        assert!(engine.is_empty());
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0, true);
        assert!(!engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));

        // Refill and relight.
        engine.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0), false);
        engine.rebuild(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0, true);
        assert!(engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
    }
}
