//! Geometry kernel for the molecular renderer.
//!
//! Primitive shapes (atom spheres, bond capsules, surface triangles), their
//! conservative bounding spheres, ray intersection routines and the
//! light-space projection basis used by shadow culling.
//!
//! # Architecture
//!
//! - Primitive types are plain `Copy` values over `lin_alg` vectors;
//!   identity and storage are the caller's business.
//! - Intersection routines are free functions so hot loops can call them
//!   without trait dispatch.
//! - [`LightBasis`] turns a directional-light vector into the 2D frame that
//!   the culling grids index.
//!
//! # Example
//!
//! ```
//! use lin_alg::f32::Vec3;
//! use molray_geom::{ray_sphere, Sphere};
//!
//! let sphere = Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0);
//! let hit = ray_sphere(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), &sphere)
//!     .expect("ray points at the sphere");
//! assert!((hit.t - 4.0).abs() < 1e-5);
//! ```

mod basis;
mod intersect;
mod primitive;

pub use basis::{orthonormal_basis, LightBasis};
pub use intersect::{
    ray_capsule, ray_segment_distance_sq, ray_sphere, ray_sphere_axial, ray_triangle,
    CapsuleBasis, CapsuleHit, RayHit,
};
pub use primitive::{Bounded, BoundingSphere, Capsule, Sphere, Triangle, EPSILON};

pub mod prelude {
    pub use crate::{
        orthonormal_basis, ray_capsule, ray_segment_distance_sq, ray_sphere, ray_sphere_axial,
        ray_triangle, Bounded, BoundingSphere, Capsule, CapsuleBasis, CapsuleHit, LightBasis,
        RayHit, Sphere, Triangle,
    };
}
