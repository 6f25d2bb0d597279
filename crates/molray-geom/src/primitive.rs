//! Occluder primitives: spheres, capsules and triangles.

use lin_alg::f32::Vec3;

/// Degeneracy threshold shared by the intersection routines.
pub const EPSILON: f32 = 1e-6;

/// A sphere occluder. Atoms are drawn as spheres.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn aabb(&self) -> (Vec3, Vec3) {
        let r = Vec3::new(self.radius, self.radius, self.radius);
        (self.center - r, self.center + r)
    }

    #[inline]
    pub fn centroid(&self) -> Vec3 {
        self.center
    }
}

/// A capsule occluder: a cylinder of radius `radius` between `start` and
/// `end`, closed by hemispherical caps. Bonds are drawn as capsules.
#[derive(Debug, Clone, Copy)]
pub struct Capsule {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

impl Capsule {
    pub fn new(start: Vec3, end: Vec3, radius: f32) -> Self {
        Self { start, end, radius }
    }

    /// Unnormalized axis from `start` to `end`.
    #[inline]
    pub fn axis(&self) -> Vec3 {
        self.end - self.start
    }

    /// Distance between the segment endpoints.
    pub fn length(&self) -> f32 {
        self.axis().magnitude()
    }

    #[inline]
    pub fn centroid(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    pub fn aabb(&self) -> (Vec3, Vec3) {
        let r = Vec3::new(self.radius, self.radius, self.radius);
        let min = Vec3::new(
            self.start.x.min(self.end.x),
            self.start.y.min(self.end.y),
            self.start.z.min(self.end.z),
        );
        let max = Vec3::new(
            self.start.x.max(self.end.x),
            self.start.y.max(self.end.y),
            self.start.z.max(self.end.z),
        );
        (min - r, max + r)
    }
}

/// A surface triangle occluder. Molecular surfaces arrive as meshes.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    #[inline]
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) * (1.0 / 3.0)
    }

    pub fn aabb(&self) -> (Vec3, Vec3) {
        let min = Vec3::new(
            self.v0.x.min(self.v1.x).min(self.v2.x),
            self.v0.y.min(self.v1.y).min(self.v2.y),
            self.v0.z.min(self.v1.z).min(self.v2.z),
        );
        let max = Vec3::new(
            self.v0.x.max(self.v1.x).max(self.v2.x),
            self.v0.y.max(self.v1.y).max(self.v2.y),
            self.v0.z.max(self.v1.z).max(self.v2.z),
        );
        (min, max)
    }

    /// Normalized face normal following the v0, v1, v2 winding. Degenerate
    /// triangles fall back to +Y.
    pub fn normal(&self) -> Vec3 {
        let n = (self.v1 - self.v0).cross(self.v2 - self.v0);
        if n.magnitude() < EPSILON {
            Vec3::new(0.0, 1.0, 0.0)
        } else {
            n.to_normalized()
        }
    }
}

/// A conservative bounding sphere used for culling.
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        (point - self.center).magnitude_squared() <= self.radius * self.radius
    }
}

/// Shapes that can report a conservative bounding sphere.
pub trait Bounded {
    fn bounding_sphere(&self) -> BoundingSphere;
}

impl Bounded for Sphere {
    fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.center, self.radius)
    }
}

impl Bounded for Capsule {
    /// Midpoint of the segment; radius covers either cap.
    fn bounding_sphere(&self) -> BoundingSphere {
        let center = self.centroid();
        let half = (self.end - self.start).magnitude() * 0.5;
        BoundingSphere::new(center, half + self.radius)
    }
}

impl Bounded for Triangle {
    /// Centroid plus the distance to the farthest vertex. Not minimal, but
    /// cheap and within a factor of the optimum.
    fn bounding_sphere(&self) -> BoundingSphere {
        let center = self.centroid();
        let r = (self.v0 - center)
            .magnitude()
            .max((self.v1 - center).magnitude())
            .max((self.v2 - center).magnitude());
        BoundingSphere::new(center, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_bound_is_itself() {
        let s = Sphere::new(Vec3::new(1.0, 2.0, 3.0), 1.5);
        let b = s.bounding_sphere();
        assert!((b.center.x - 1.0).abs() < 1e-6);
        assert!((b.radius - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_capsule_bound_covers_caps() {
        let c = Capsule::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0), 0.5);
        let b = c.bounding_sphere();
        assert!((b.center.x - 2.0).abs() < 1e-6);
        assert!((b.radius - 2.5).abs() < 1e-6);
        // Far pole of each cap sits on the bound surface.
        assert!(b.contains(Vec3::new(-0.5, 0.0, 0.0)));
        assert!(b.contains(Vec3::new(4.5, 0.0, 0.0)));
    }

    #[test]
    fn test_triangle_bound_contains_vertices() {
        let t = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
        );
        let b = t.bounding_sphere();
        assert!(b.contains(t.v0));
        assert!(b.contains(t.v1));
        assert!(b.contains(t.v2));
    }

    #[test]
    fn test_triangle_normal_ccw() {
        let t = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let n = t.normal();
        assert!((n.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_triangle_normal_fallback() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        let t = Triangle::new(p, p, p);
        let n = t.normal();
        assert!((n.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_capsule_aabb_pads_radius() {
        let c = Capsule::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0), 0.25);
        let (min, max) = c.aabb();
        assert!((min.x + 0.25).abs() < 1e-6);
        assert!((max.z - 2.25).abs() < 1e-6);
    }
}
