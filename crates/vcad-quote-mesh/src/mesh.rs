//! Triangle soup mesh type.

use nalgebra::UnitQuaternion;

use crate::{Point3, Vec3};

/// A single triangle with vertices in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// The three corners, in winding order.
    pub vertices: [Point3; 3],
}

impl Triangle {
    /// Create a triangle from three corners.
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Unnormalized face normal (`(b - a) x (c - a)`), length is twice the area.
    pub fn cross(&self) -> Vec3 {
        let [a, b, c] = self.vertices;
        (b - a).cross(&(c - a))
    }

    /// Unit face normal, or the zero vector for a degenerate triangle.
    pub fn normal(&self) -> Vec3 {
        let n = self.cross();
        let len = n.norm();
        if len > 1e-12 {
            n / len
        } else {
            Vec3::zeros()
        }
    }

    /// Triangle area (mm²).
    pub fn area(&self) -> f64 {
        self.cross().norm() / 2.0
    }

    /// Signed volume of the tetrahedron spanned with the origin (mm³).
    pub fn signed_volume(&self) -> f64 {
        let [a, b, c] = self.vertices;
        a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
    }

    /// Arithmetic mean of the three corners.
    pub fn centroid(&self) -> Point3 {
        let [a, b, c] = self.vertices;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    /// Lowest Z among the corners.
    pub fn z_min(&self) -> f64 {
        self.vertices
            .iter()
            .map(|v| v.z)
            .fold(f64::INFINITY, f64::min)
    }

    /// Highest Z among the corners.
    pub fn z_max(&self) -> f64 {
        self.vertices
            .iter()
            .map(|v| v.z)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// An immutable triangle mesh.
///
/// STL carries no shared-vertex topology, so the mesh is an ordered list of
/// independent triangles. Transformations return a new mesh and leave the
/// source untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    triangles: Vec<Triangle>,
}

impl TriangleMesh {
    /// Build a mesh from triangles.
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    /// Triangles in file order.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of (unshared) vertices.
    pub fn num_vertices(&self) -> usize {
        self.triangles.len() * 3
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Iterate over every vertex, three per triangle.
    pub fn vertices(&self) -> impl Iterator<Item = &Point3> + '_ {
        self.triangles.iter().flat_map(|t| t.vertices.iter())
    }

    /// A copy of this mesh rotated about the origin.
    pub fn rotated(&self, rotation: &UnitQuaternion<f64>) -> Self {
        self.map_points(|p| rotation * p)
    }

    /// A copy of this mesh translated by `offset`.
    pub fn translated(&self, offset: Vec3) -> Self {
        self.map_points(|p| p + offset)
    }

    /// A copy of this mesh moved so its lowest point sits at `z = 0`.
    pub fn placed_on_bed(&self) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        let min_z = self.vertices().map(|v| v.z).fold(f64::INFINITY, f64::min);
        self.translated(Vec3::new(0.0, 0.0, -min_z))
    }

    fn map_points(&self, f: impl Fn(&Point3) -> Point3) -> Self {
        let triangles = self
            .triangles
            .iter()
            .map(|t| {
                let [a, b, c] = &t.vertices;
                Triangle::new(f(a), f(b), f(c))
            })
            .collect();
        Self { triangles }
    }
}

impl FromIterator<Triangle> for TriangleMesh {
    fn from_iter<I: IntoIterator<Item = Triangle>>(iter: I) -> Self {
        Self::from_triangles(iter.into_iter().collect())
    }
}
