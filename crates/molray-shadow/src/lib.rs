//! Shadow determination for the molecular software renderer.
//!
//! A scene is a set of occluders (atom spheres, bond capsules, surface
//! triangles) lit by one directional light. This crate answers the shading
//! loop's only shadow question, "does anything block the light from this
//! point?", without tracing against every occluder.
//!
//! # Architecture
//!
//! Culling happens in three stages, each paying for the next:
//! 1. Per frame, every occluder's bounding sphere is projected into the
//!    plane perpendicular to the light and indexed in a dense 2D grid.
//! 2. Per shaded sphere, the grid plus an exact projected-disk overlap test
//!    produce a short per-kind candidate list.
//! 3. Per sample point, the candidates are tested exactly, fronted by a
//!    per-kind "last occluder" hint that usually answers coherent scanline
//!    runs in one test.
//!
//! Hints are an optimization only; query results never depend on them.
//!
//! # Example
//!
//! ```
//! use lin_alg::f32::Vec3;
//! use molray_geom::Sphere;
//! use molray_shadow::{ShadowEngine, ShadowSettings};
//!
//! let mut engine = ShadowEngine::new(ShadowSettings::default());
//! // An atom between the origin and the light.
//! engine.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0), false);
//! engine.rebuild(Vec3::new(0.0, 0.0, 1.0))?;
//!
//! // Shade points within a sphere of radius 3 around the origin.
//! engine.prepare_sphere(Vec3::new(0.0, 0.0, 0.0), 3.0, true);
//! assert!(engine.point_shadowed(Vec3::new(0.0, 0.0, 0.0)));
//! assert!(!engine.point_shadowed(Vec3::new(3.0, 0.0, 0.0)));
//! # Ok::<(), molray_shadow::ShadowError>(())
//! ```

mod cache;
mod engine;
mod error;
mod settings;

pub use engine::ShadowEngine;
pub use error::{ShadowError, ShadowResult};
pub use settings::ShadowSettings;

pub mod prelude {
    pub use crate::{ShadowEngine, ShadowError, ShadowResult, ShadowSettings};
    pub use molray_geom::{Capsule, Sphere, Triangle};
}
