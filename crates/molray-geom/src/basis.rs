//! Orthonormal frames, including the light-space projection basis.

use lin_alg::f32::Vec3;

use crate::primitive::EPSILON;

/// Two unit vectors perpendicular to `axis` and to each other. `axis` must
/// be normalized.
///
/// The perpendicular seed zeroes out one component picked by dominance, the
/// same trick the renderer uses for camera up vectors, so the construction
/// stays stable for axis-aligned inputs.
pub fn orthonormal_basis(axis: Vec3) -> (Vec3, Vec3) {
    let u = if axis.x.abs() > axis.y.abs() {
        Vec3::new(-axis.z, 0.0, axis.x)
    } else {
        Vec3::new(0.0, axis.z, -axis.y)
    };
    let u = u.to_normalized();
    let v = u.cross(axis);
    (u, v)
}

/// Per-frame light frame: the unit direction toward the light plus a 2D
/// basis spanning the plane perpendicular to it. All light-space culling
/// projects through this frame.
#[derive(Debug, Clone, Copy)]
pub struct LightBasis {
    /// Unit direction from the scene toward the light.
    pub dir: Vec3,
    /// First projection axis, perpendicular to `dir`.
    pub x: Vec3,
    /// Second projection axis, perpendicular to `dir` and `x`.
    pub y: Vec3,
}

impl LightBasis {
    /// Builds the frame for a light direction of any length. Returns `None`
    /// when the direction is too short to normalize.
    pub fn new(dir: Vec3) -> Option<Self> {
        let len = dir.magnitude();
        if !len.is_finite() || len < EPSILON {
            return None;
        }
        let dir = dir * (1.0 / len);
        let (x, y) = orthonormal_basis(dir);
        Some(Self { dir, x, y })
    }

    /// Projects a world point onto the light plane.
    #[inline]
    pub fn project(&self, point: Vec3) -> [f32; 2] {
        [point.dot(self.x), point.dot(self.y)]
    }
}
