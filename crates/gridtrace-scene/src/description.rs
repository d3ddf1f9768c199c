//! Serializable scene descriptions.
//!
//! A small JSON format for feeding reference scenes to the CLI and tests:
//!
//! ```json
//! { "shapes": [
//!     { "type": "sphere", "center": [0, 0, 0], "radius": 1 },
//!     { "type": "plane", "point": [0, 0, -1], "normal": [0, 0, 1] },
//!     { "type": "triangle", "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]] }
//! ] }
//! ```

use gridtrace_math::{Point3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};
use crate::{InfinitePlane, Scene, Sphere, Triangle};

/// One shape in a [`SceneDescription`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeDescription {
    /// A sphere.
    Sphere {
        /// Center point.
        center: [f64; 3],
        /// Radius.
        radius: f64,
    },
    /// An unbounded plane.
    Plane {
        /// Any point on the plane.
        point: [f64; 3],
        /// Plane normal (need not be unit length).
        normal: [f64; 3],
    },
    /// A triangle.
    Triangle {
        /// Vertex positions, counter-clockwise.
        vertices: [[f64; 3]; 3],
    },
}

/// A list of shapes that can be turned into a [`Scene`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Shapes in id order.
    pub shapes: Vec<ShapeDescription>,
}

fn point(c: [f64; 3]) -> Point3 {
    Point3::new(c[0], c[1], c[2])
}

impl SceneDescription {
    /// Parse a description from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate every shape and build the scene.
    pub fn to_scene(&self) -> Result<Scene> {
        let mut scene = Scene::new();
        for (index, shape) in self.shapes.iter().enumerate() {
            let invalid = |reason: &str| SceneError::InvalidShape {
                index,
                reason: reason.to_string(),
            };
            match *shape {
                ShapeDescription::Sphere { center, radius } => {
                    if !(radius.is_finite() && radius > 0.0) {
                        return Err(invalid("sphere radius must be positive"));
                    }
                    scene.add(Sphere::new(point(center), radius));
                }
                ShapeDescription::Plane { point: p, normal } => {
                    let n = Vec3::new(normal[0], normal[1], normal[2]);
                    if n.norm() < 1e-12 {
                        return Err(invalid("plane normal must be non-zero"));
                    }
                    scene.add(InfinitePlane::new(point(p), n));
                }
                ShapeDescription::Triangle { vertices } => {
                    let tri = Triangle::new(point(vertices[0]), point(vertices[1]), point(vertices[2]));
                    if tri.normal().is_none() {
                        return Err(invalid("triangle is degenerate"));
                    }
                    scene.add(tri);
                }
            }
        }
        Ok(scene)
    }
}
