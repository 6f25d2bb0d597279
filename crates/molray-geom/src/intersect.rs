//! Ray intersection routines for the occluder primitives.
//!
//! All routines are pure functions over `f32` coordinates. Degenerate
//! configurations (zero-length rays, parallel triangles, capsules with a
//! collapsed axis) report a miss instead of failing; shadow queries treat
//! "cannot intersect" and "does not intersect" the same way.

use lin_alg::f32::Vec3;
use smallvec::SmallVec;

use crate::basis::orthonormal_basis;
use crate::primitive::{Capsule, Sphere, Triangle, EPSILON};

/// A ray hit: parameter along the ray, hit point and unit surface normal.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub t: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Both quadratic roots of the ray/sphere equation, unfiltered.
#[inline]
fn sphere_roots(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<(f32, f32)> {
    let oc = origin - center;
    let a = dir.magnitude_squared();
    if a < EPSILON * EPSILON {
        return None;
    }
    let b = oc.dot(dir);
    let c = oc.magnitude_squared() - radius * radius;
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    Some(((-b - sqrt_disc) / a, (-b + sqrt_disc) / a))
}

/// General parametric ray/sphere intersection.
///
/// `dir` need not be normalized; `t` is reported in units of `dir`. Returns
/// the nearest hit with `t >= EPSILON`, so rays starting on the surface
/// report the far side rather than their own origin.
pub fn ray_sphere(origin: Vec3, dir: Vec3, sphere: &Sphere) -> Option<RayHit> {
    if sphere.radius < EPSILON {
        return None;
    }
    let (t_near, t_far) = sphere_roots(origin, dir, sphere.center, sphere.radius)?;
    let t = if t_near >= EPSILON {
        t_near
    } else if t_far >= EPSILON {
        t_far
    } else {
        return None;
    };
    let point = origin + dir * t;
    let normal = (point - sphere.center) * (1.0 / sphere.radius);
    Some(RayHit { t, point, normal })
}

/// Fast path for primary rays cast along -Z, the view axis of the software
/// rasterizer. Reduces to a 2D distance check in the XY plane and solves
/// only for the front (larger z) surface.
pub fn ray_sphere_axial(origin: Vec3, sphere: &Sphere) -> Option<RayHit> {
    if sphere.radius < EPSILON {
        return None;
    }
    let dx = origin.x - sphere.center.x;
    let dy = origin.y - sphere.center.y;
    let perp_sq = dx * dx + dy * dy;
    let r_sq = sphere.radius * sphere.radius;
    if perp_sq > r_sq {
        return None;
    }
    let z = sphere.center.z + (r_sq - perp_sq).sqrt();
    let point = Vec3::new(origin.x, origin.y, z);
    let normal = (point - sphere.center) * (1.0 / sphere.radius);
    Some(RayHit {
        t: origin.z - z,
        point,
        normal,
    })
}

/// Precomputed frame for a capsule axis, shared across every ray tested
/// against the same capsule.
#[derive(Debug, Clone, Copy)]
pub struct CapsuleBasis {
    /// Unit axis from `start` toward `end`.
    pub axis: Vec3,
    /// Perpendicular frame completing the axis.
    pub u: Vec3,
    pub v: Vec3,
    /// Segment length.
    pub length: f32,
}

impl CapsuleBasis {
    /// Returns `None` when the axis is too short to orient; callers treat
    /// such capsules as plain spheres.
    pub fn new(capsule: &Capsule) -> Option<Self> {
        let axis = capsule.axis();
        let length = axis.magnitude();
        if !length.is_finite() || length < EPSILON {
            return None;
        }
        let axis = axis * (1.0 / length);
        let (u, v) = orthonormal_basis(axis);
        Some(Self { axis, u, v, length })
    }
}

/// One ray/capsule hit.
#[derive(Debug, Clone, Copy)]
pub struct CapsuleHit {
    pub t: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Collects the crossings of one hemispherical cap. Only sphere crossings
/// on the outward side of the cap boundary lie on the capsule surface.
#[allow(clippy::too_many_arguments)]
fn push_cap_hits(
    origin: Vec3,
    dir: Vec3,
    cap_center: Vec3,
    radius: f32,
    start: Vec3,
    axis: Vec3,
    length: f32,
    start_cap: bool,
    hits: &mut SmallVec<[CapsuleHit; 2]>,
) {
    let Some((r0, r1)) = sphere_roots(origin, dir, cap_center, radius) else {
        return;
    };
    for t in [r0, r1] {
        if t < EPSILON {
            continue;
        }
        let point = origin + dir * t;
        let s = (point - start).dot(axis);
        let outward = if start_cap { s <= 0.0 } else { s >= length };
        if outward {
            hits.push(CapsuleHit {
                t,
                point,
                normal: (point - cap_center) * (1.0 / radius),
            });
        }
    }
}

/// Ray/capsule intersection.
///
/// Solves the infinite-cylinder quadratic in the capsule's perpendicular
/// frame and keeps roots whose axial parameter falls inside the segment;
/// with `closed_caps` the hemispherical cap crossings are collected as
/// well. `dir` need not be normalized; up to two hits come back sorted by
/// `t` (all with `t >= EPSILON`).
pub fn ray_capsule(
    origin: Vec3,
    dir: Vec3,
    capsule: &Capsule,
    basis: &CapsuleBasis,
    closed_caps: bool,
) -> SmallVec<[CapsuleHit; 2]> {
    let mut hits: SmallVec<[CapsuleHit; 2]> = SmallVec::new();
    let radius = capsule.radius;
    if radius < EPSILON {
        return hits;
    }

    let w = origin - capsule.start;
    let ou = w.dot(basis.u);
    let ov = w.dot(basis.v);
    let du = dir.dot(basis.u);
    let dv = dir.dot(basis.v);
    let a = du * du + dv * dv;

    if a > EPSILON {
        let b = ou * du + ov * dv;
        let c = ou * ou + ov * ov - radius * radius;
        let disc = b * b - a * c;
        if disc < 0.0 {
            // Misses the infinite cylinder, so it misses the caps too.
            return hits;
        }
        let sqrt_disc = disc.sqrt();
        for t in [(-b - sqrt_disc) / a, (-b + sqrt_disc) / a] {
            if t < EPSILON {
                continue;
            }
            let point = origin + dir * t;
            let s = (point - capsule.start).dot(basis.axis);
            if (0.0..=basis.length).contains(&s) {
                let on_axis = capsule.start + basis.axis * s;
                hits.push(CapsuleHit {
                    t,
                    point,
                    normal: (point - on_axis) * (1.0 / radius),
                });
            }
        }
    }

    if closed_caps {
        for (center, start_cap) in [(capsule.start, true), (capsule.end, false)] {
            push_cap_hits(
                origin,
                dir,
                center,
                radius,
                capsule.start,
                basis.axis,
                basis.length,
                start_cap,
                &mut hits,
            );
        }
    }

    hits.sort_by(|a, b| a.t.partial_cmp(&b.t).unwrap_or(std::cmp::Ordering::Equal));
    // A crossing on the cap boundary circle shows up from both the cylinder
    // and the cap test.
    hits.dedup_by(|a, b| (a.t - b.t).abs() < EPSILON);
    hits
}

/// Moller-Trumbore ray/triangle intersection, double sided.
///
/// Returns the ray parameter of the plane crossing inside the triangle, or
/// `None` for parallel rays and barycentric misses. The parameter is for
/// the whole line and may be negative; shadow callers require `t >= 0`
/// themselves.
pub fn ray_triangle(origin: Vec3, dir: Vec3, tri: &Triangle) -> Option<f32> {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;
    let pvec = dir.cross(edge2);
    let det = edge1.dot(pvec);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = origin - tri.v0;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(edge1);
    let v = dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    Some(edge2.dot(qvec) * inv_det)
}

/// Squared distance between the forward ray `origin + t * dir` (`dir` unit,
/// `t >= 0`) and the segment `[a, b]`, plus the ray parameter at the
/// closest approach.
///
/// This is the cheap capsule shadow test: a shadow ray grazes a bond when
/// this distance drops below the squared capsule radius.
pub fn ray_segment_distance_sq(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3) -> (f32, f32) {
    let seg = b - a;
    let w = origin - a;
    let seg_sq = seg.magnitude_squared();
    let c1 = dir.dot(w);
    if seg_sq < EPSILON * EPSILON {
        // Collapsed segment: point-to-ray distance.
        let t = (-c1).max(0.0);
        let diff = w + dir * t;
        return (diff.magnitude_squared(), t);
    }
    let a12 = dir.dot(seg);
    let c2 = seg.dot(w);
    let det = seg_sq - a12 * a12;
    let mut s = if det > EPSILON {
        ((c2 - a12 * c1) / det).clamp(0.0, 1.0)
    } else {
        // Parallel: the distance is flat along the overlap.
        0.0
    };
    let mut t = s * a12 - c1;
    if t < 0.0 {
        t = 0.0;
        s = (c2 / seg_sq).clamp(0.0, 1.0);
    }
    let diff = w + dir * t - seg * s;
    (diff.magnitude_squared(), t)
}
