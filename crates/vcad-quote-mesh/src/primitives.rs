//! Simple closed meshes with outward-facing winding.

use crate::mesh::{Triangle, TriangleMesh};
use crate::Point3;

/// Split the planar quad `a b c d` (counter-clockwise seen from outside)
/// into two triangles.
pub fn quad(a: Point3, b: Point3, c: Point3, d: Point3) -> [Triangle; 2] {
    [Triangle::new(a, b, c), Triangle::new(a, c, d)]
}

/// Axis-aligned box spanning `[0, w] × [0, d] × [0, h]` (mm), 12 triangles.
pub fn cuboid(w: f64, d: f64, h: f64) -> TriangleMesh {
    let p = |x: f64, y: f64, z: f64| Point3::new(x, y, z);
    let faces = [
        quad(p(0.0, 0.0, 0.0), p(0.0, d, 0.0), p(w, d, 0.0), p(w, 0.0, 0.0)),
        quad(p(0.0, 0.0, h), p(w, 0.0, h), p(w, d, h), p(0.0, d, h)),
        quad(p(0.0, 0.0, 0.0), p(w, 0.0, 0.0), p(w, 0.0, h), p(0.0, 0.0, h)),
        quad(p(0.0, d, 0.0), p(0.0, d, h), p(w, d, h), p(w, d, 0.0)),
        quad(p(0.0, 0.0, 0.0), p(0.0, 0.0, h), p(0.0, d, h), p(0.0, d, 0.0)),
        quad(p(w, 0.0, 0.0), p(w, d, 0.0), p(w, d, h), p(w, 0.0, h)),
    ];
    faces.into_iter().flatten().collect()
}
