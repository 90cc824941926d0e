//! Mesh measurements: volume, area, bounds and mass properties.

use serde::{Deserialize, Serialize};

use crate::mesh::TriangleMesh;
use crate::{Point3, Vec3};

/// Axis-aligned bounding box (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: [f64; 3],
    /// Maximum corner.
    pub max: [f64; 3],
}

impl BoundingBox {
    /// Extent along X (mm).
    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    /// Extent along Y (mm).
    pub fn depth(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    /// Extent along Z (mm).
    pub fn height(&self) -> f64 {
        self.max[2] - self.min[2]
    }

    /// `width × depth` (mm²).
    pub fn footprint_area(&self) -> f64 {
        self.width() * self.depth()
    }

    /// `width × depth × height` (mm³).
    pub fn volume(&self) -> f64 {
        self.footprint_area() * self.height()
    }

    /// Extents converted to centimeters.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width() / 10.0,
            depth: self.depth() / 10.0,
            height: self.height() / 10.0,
        }
    }
}

/// Part extents in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// X extent (cm).
    pub width: f64,
    /// Y extent (cm).
    pub depth: f64,
    /// Z extent (cm).
    pub height: f64,
}

/// Enclosed volume (mm³) from summed signed tetrahedra.
///
/// The absolute value of the total is returned, so inverted winding still
/// yields a positive volume.
pub fn volume(mesh: &TriangleMesh) -> f64 {
    mesh.triangles()
        .iter()
        .map(|t| t.signed_volume())
        .sum::<f64>()
        .abs()
}

/// Total triangle area (mm²).
pub fn surface_area(mesh: &TriangleMesh) -> f64 {
    mesh.triangles().iter().map(|t| t.area()).sum()
}

/// Componentwise min/max over all vertices. An empty mesh yields a zero box.
pub fn bounding_box(mesh: &TriangleMesh) -> BoundingBox {
    if mesh.is_empty() {
        return BoundingBox {
            min: [0.0; 3],
            max: [0.0; 3],
        };
    }

    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for v in mesh.vertices() {
        for axis in 0..3 {
            min[axis] = min[axis].min(v[axis]);
            max[axis] = max[axis].max(v[axis]);
        }
    }

    BoundingBox { min, max }
}

/// Bounding-box footprint (`width × depth`, mm²).
///
/// This stands in for the top/bottom solid area. It is not the projected
/// silhouette and the cost formulas are tuned against it.
pub fn horizontal_area(mesh: &TriangleMesh) -> f64 {
    bounding_box(mesh).footprint_area()
}

/// Center of mass of the enclosed solid, assuming uniform density.
///
/// Meshes that enclose no volume (open sheets) fall back to the
/// area-weighted centroid of their triangles.
pub fn center_of_mass(mesh: &TriangleMesh) -> Point3 {
    let mut weighted = Vec3::zeros();
    let mut total = 0.0;
    for t in mesh.triangles() {
        let v = t.signed_volume();
        let [a, b, c] = t.vertices;
        // Tetrahedron (origin, a, b, c) has its centroid at (a + b + c) / 4.
        weighted += (a.coords + b.coords + c.coords) * (v / 4.0);
        total += v;
    }

    if total.abs() > 1e-9 {
        return Point3::from(weighted / total);
    }

    let mut weighted = Vec3::zeros();
    let mut area = 0.0;
    for t in mesh.triangles() {
        let a = t.area();
        weighted += t.centroid().coords * a;
        area += a;
    }
    if area > 0.0 {
        Point3::from(weighted / area)
    } else {
        Point3::origin()
    }
}
