#![warn(missing_docs)]

//! Scene-side interfaces for gridtrace.
//!
//! This crate defines what acceleration structures consume: rays, the
//! [`Geometry`] trait, intersection records and the [`Scene`] that owns the
//! geometry. It also ships a handful of reference primitives and a JSON
//! scene format so the grid can be exercised end to end.
//!
//! # Architecture
//!
//! - [`Ray`] - Ray with origin, unit direction and slab-method box tests
//! - [`Geometry`] - Bounding box plus ray intersection
//! - [`Intersection`] - A hit attributed to a [`GeometryId`]
//! - [`Scene`] - Ordered geometry list with union bounds
//! - [`intersect`] - Sphere, infinite plane and triangle primitives
//! - [`SceneDescription`] - Serializable scene format
//!
//! # Example
//!
//! ```
//! use gridtrace_math::{Point3, Vec3};
//! use gridtrace_scene::{Ray, Scene, Sphere};
//!
//! let mut scene = Scene::new();
//! scene.add(Sphere::new(Point3::new(0.0, 0.0, 0.0), 1.0));
//!
//! let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
//! let hit = scene.intersect_closest(&ray).unwrap();
//! assert!((hit.t - 4.0).abs() < 1e-10);
//! ```

mod description;
mod error;
mod geometry;
pub mod intersect;
mod ray;
mod scene;

pub use description::{SceneDescription, ShapeDescription};
pub use error::{Result, SceneError};
pub use geometry::{Geometry, GeometryId, Intersection, SurfaceHit};
pub use intersect::{InfinitePlane, Sphere, Triangle};
pub use ray::Ray;
pub use scene::Scene;
