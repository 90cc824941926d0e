//! Overhang detection and support-volume estimation.

use serde::{Deserialize, Serialize};
use vcad_quote_mesh::{bounding_box, TriangleMesh};

use crate::config::SupportVolumeSettings;

/// Normals with `z` at or below this face the bed and never count as
/// overhangs. Empirical; keep in sync with the support-risk calibration.
pub const FLOOR_NORMAL_Z: f64 = -0.1;

/// Settings for the overhang estimator.
#[derive(Debug, Clone, Copy)]
pub struct OverhangSettings {
    /// Overhang angle threshold (degrees).
    pub max_overhang_angle: f64,
    /// Average support column height as a fraction of part height.
    pub average_height_ratio: f64,
    /// Support fill density (0.0 to 1.0).
    pub support_density: f64,
}

impl Default for OverhangSettings {
    fn default() -> Self {
        Self {
            max_overhang_angle: 45.0,
            average_height_ratio: 0.4,
            support_density: 0.10,
        }
    }
}

impl From<&SupportVolumeSettings> for OverhangSettings {
    fn from(s: &SupportVolumeSettings) -> Self {
        Self {
            max_overhang_angle: s.max_overhang_angle,
            average_height_ratio: s.average_height_ratio,
            support_density: s.density,
        }
    }
}

/// Overhang statistics for an oriented mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverhangAnalysis {
    /// Area of overhanging triangles (mm²).
    pub overhang_area: f64,
    /// Total surface area (mm²).
    pub total_area: f64,
    /// `overhang_area / total_area` as a percentage (0 to 100).
    pub overhang_percentage: f64,
    /// Whether overhangs exceed 5% of the surface.
    pub has_overhangs: bool,
    /// Estimated support material (cm³).
    pub support_volume: f64,
    /// Number of overhanging triangles.
    pub overhang_triangle_count: usize,
    /// Largest XY extent of a single overhanging triangle (mm).
    pub max_overhang_length: f64,
}

/// Classify overhanging triangles of an already-oriented mesh and estimate
/// the support material they need.
pub fn estimate_overhangs(mesh: &TriangleMesh, settings: &OverhangSettings) -> OverhangAnalysis {
    let threshold = settings.max_overhang_angle.to_radians().cos();

    let mut overhang_area = 0.0;
    let mut total_area = 0.0;
    let mut overhang_triangle_count = 0;
    let mut max_overhang_length: f64 = 0.0;

    for tri in mesh.triangles() {
        let area = tri.area();
        total_area += area;
        if area <= 0.0 {
            continue;
        }

        let nz = tri.normal().z;
        if nz < threshold && nz > FLOOR_NORMAL_Z {
            overhang_area += area;
            overhang_triangle_count += 1;

            let xs = tri.vertices.map(|v| v.x);
            let ys = tri.vertices.map(|v| v.y);
            let span = |c: [f64; 3]| {
                c.iter().copied().fold(f64::NEG_INFINITY, f64::max)
                    - c.iter().copied().fold(f64::INFINITY, f64::min)
            };
            max_overhang_length = max_overhang_length.max(span(xs).max(span(ys)));
        }
    }

    let overhang_percentage = if total_area > 0.0 {
        (overhang_area / total_area * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let piece_height = bounding_box(mesh).height();
    let average_support_height = piece_height * settings.average_height_ratio;
    let support_volume =
        (overhang_area * average_support_height * settings.support_density / 1000.0).max(0.0);

    OverhangAnalysis {
        overhang_area,
        total_area,
        overhang_percentage,
        has_overhangs: overhang_percentage > 5.0,
        support_volume,
        overhang_triangle_count,
        max_overhang_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vcad_quote_mesh::primitives::cuboid;
    use vcad_quote_mesh::{Point3, Triangle};

    #[test]
    fn test_settings_default() {
        let settings = OverhangSettings::default();
        assert!((settings.max_overhang_angle - 45.0).abs() < 0.1);
        assert!(settings.support_density > 0.0);
    }

    #[test]
    fn test_cube_walls_count_as_overhang() {
        // Vertical walls have normal.z = 0 < cos(45°); the floor is excluded
        // by the -0.1 band and the roof points up.
        let mesh = cuboid(10.0, 10.0, 10.0);
        let result = estimate_overhangs(&mesh, &OverhangSettings::default());

        assert_relative_eq!(result.total_area, 600.0, epsilon = 1e-9);
        assert_relative_eq!(result.overhang_area, 400.0, epsilon = 1e-9);
        assert_relative_eq!(result.overhang_percentage, 400.0 / 6.0, epsilon = 1e-9);
        assert!(result.has_overhangs);
        assert_eq!(result.overhang_triangle_count, 8);

        // 400 mm² × (10 mm × 0.4) × 0.10 / 1000
        assert_relative_eq!(result.support_volume, 0.16, epsilon = 1e-12);
    }

    #[test]
    fn test_floor_band_excludes_nearly_flat_underside() {
        // Tilted slightly below horizontal: normal.z just under -0.1 is excluded,
        // just above is counted.
        let tri_with_nz = |nz: f64| {
            let tilt = (1.0 - nz * nz).sqrt();
            // Triangle in the plane with normal (tilt, 0, nz)
            let u = nalgebra::Vector3::new(-nz, 0.0, tilt);
            let v = nalgebra::Vector3::new(0.0, 1.0, 0.0);
            let o = Point3::new(0.0, 0.0, 5.0);
            Triangle::new(o, o + v * 10.0, o + u * 10.0)
        };

        let settings = OverhangSettings::default();
        let below = TriangleMesh::from_triangles(vec![tri_with_nz(-0.2)]);
        let above = TriangleMesh::from_triangles(vec![tri_with_nz(-0.05)]);

        assert_relative_eq!(below.triangles()[0].normal().z, -0.2, epsilon = 1e-9);
        assert_eq!(estimate_overhangs(&below, &settings).overhang_triangle_count, 0);
        assert_eq!(estimate_overhangs(&above, &settings).overhang_triangle_count, 1);
    }

    #[test]
    fn test_empty_mesh() {
        let result = estimate_overhangs(&TriangleMesh::default(), &OverhangSettings::default());
        assert_eq!(result.overhang_percentage, 0.0);
        assert_eq!(result.support_volume, 0.0);
        assert!(!result.has_overhangs);
    }
}
