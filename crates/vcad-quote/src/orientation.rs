//! Automatic print orientation.
//!
//! Evaluates a small, fixed set of candidate rotations and keeps the one
//! that needs the least support while still standing stably on the bed:
//!
//! 1. the rotation that puts the largest flat face down, and
//! 2. the six rotations that bring `±X`, `±Y`, `±Z` up.
//!
//! Each candidate is scored on an independently rotated copy of the mesh,
//! so the evaluation runs in parallel. Results are collected in generation
//! order and ties go to the earlier candidate.

use std::collections::HashMap;
use std::fmt;

use nalgebra::{Unit, UnitQuaternion};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vcad_quote_mesh::{bounding_box, center_of_mass, TriangleMesh, Vec3};

use crate::overhang::{estimate_overhangs, OverhangSettings};

/// Normal components are snapped to this grid when grouping flat faces.
const NORMAL_GRID: f64 = 0.05;

/// A face group needs at least this many triangles to become a candidate.
const MIN_FACE_GROUP: usize = 3;

/// Triangles this close to the lowest Z count as bed contact (mm).
const CONTACT_TOLERANCE: f64 = 0.1;

/// Where a candidate rotation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Largest flat face placed on the bed.
    DominantFace,
    /// The given body axis turned to point up.
    Axis(AxisDirection),
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DominantFace => f.write_str("dominant face down"),
            Self::Axis(axis) => write!(f, "{axis} up"),
        }
    }
}

/// A signed body axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisDirection {
    /// +X
    PosX,
    /// -X
    NegX,
    /// +Y
    PosY,
    /// -Y
    NegY,
    /// +Z
    PosZ,
    /// -Z
    NegZ,
}

impl AxisDirection {
    /// All six directions in candidate order.
    pub const ALL: [AxisDirection; 6] = [
        Self::PosX,
        Self::NegX,
        Self::PosY,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// Unit vector for this direction.
    pub fn vector(&self) -> Vec3 {
        match self {
            Self::PosX => Vec3::x(),
            Self::NegX => -Vec3::x(),
            Self::PosY => Vec3::y(),
            Self::NegY => -Vec3::y(),
            Self::PosZ => Vec3::z(),
            Self::NegZ => -Vec3::z(),
        }
    }
}

impl fmt::Display for AxisDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PosX => "+X",
            Self::NegX => "-X",
            Self::PosY => "+Y",
            Self::NegY => "-Y",
            Self::PosZ => "+Z",
            Self::NegZ => "-Z",
        };
        f.write_str(s)
    }
}

/// Evaluation of one candidate rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationCandidate {
    /// How the rotation was generated.
    pub source: CandidateSource,
    /// Rotation applied to the input mesh.
    pub rotation: UnitQuaternion<f64>,
    /// Overhanging share of the surface (0 to 100).
    pub overhang_percentage: f64,
    /// Estimated support material (cm³).
    pub support_volume: f64,
    /// Height on the bed (mm).
    pub print_height: f64,
    /// Bed contact and tipping resistance (0 to 100).
    pub base_stability: f64,
    /// Weighted composite (0 to 100, higher is better).
    pub score: f64,
}

/// Outcome of [`optimize_orientation`].
#[derive(Debug, Clone)]
pub struct OrientationResult {
    /// Winning candidate.
    pub best: OrientationCandidate,
    /// The input mesh rotated by `best.rotation` and resting on `z = 0`.
    pub oriented_mesh: TriangleMesh,
    /// Every candidate, best first. Equal scores keep generation order.
    pub candidates: Vec<OrientationCandidate>,
}

/// Pick the rotation that minimizes support need while keeping the part stable.
pub fn optimize_orientation(mesh: &TriangleMesh, settings: &OverhangSettings) -> OrientationResult {
    let mut generated: Vec<(CandidateSource, UnitQuaternion<f64>)> = Vec::with_capacity(7);
    if let Some(normal) = dominant_face_normal(mesh) {
        generated.push((
            CandidateSource::DominantFace,
            rotation_onto(&normal, &-Vec3::z()),
        ));
    }
    for axis in AxisDirection::ALL {
        generated.push((
            CandidateSource::Axis(axis),
            rotation_onto(&axis.vector(), &Vec3::z()),
        ));
    }

    // Ordered collect keeps generation order for tie-breaking.
    let mut evaluated: Vec<(OrientationCandidate, TriangleMesh)> = generated
        .par_iter()
        .map(|(source, rotation)| evaluate_candidate(mesh, *source, *rotation, settings))
        .collect();

    let mut best_index = 0;
    for (i, (candidate, _)) in evaluated.iter().enumerate() {
        if candidate.score > evaluated[best_index].0.score {
            best_index = i;
        }
    }

    let mut candidates: Vec<OrientationCandidate> =
        evaluated.iter().map(|(c, _)| c.clone()).collect();
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    // The six axis candidates are always present, so the index is valid.
    let (best, oriented_mesh) = evaluated.swap_remove(best_index);

    debug!(
        source = %best.source,
        score = best.score,
        overhang = best.overhang_percentage,
        "selected orientation"
    );

    OrientationResult {
        best,
        oriented_mesh,
        candidates,
    }
}

/// Score one rotation on its own transformed copy of the mesh.
fn evaluate_candidate(
    mesh: &TriangleMesh,
    source: CandidateSource,
    rotation: UnitQuaternion<f64>,
    settings: &OverhangSettings,
) -> (OrientationCandidate, TriangleMesh) {
    let oriented = mesh.rotated(&rotation).placed_on_bed();
    let overhang = estimate_overhangs(&oriented, settings);
    let print_height = bounding_box(&oriented).height();
    let base_stability = base_stability(&oriented);

    let overhang_score = (100.0 - 2.0 * overhang.overhang_percentage).max(0.0);
    let height_score = (100.0 - print_height / 3.0).max(0.0);
    let volume_score = (100.0 - 10.0 * overhang.support_volume).max(0.0);
    let score = (60.0 * overhang_score
        + 25.0 * base_stability
        + 10.0 * height_score
        + 5.0 * volume_score)
        / 100.0;

    let candidate = OrientationCandidate {
        source,
        rotation,
        overhang_percentage: overhang.overhang_percentage,
        support_volume: overhang.support_volume,
        print_height,
        base_stability,
        score: score.clamp(0.0, 100.0),
    };
    (candidate, oriented)
}

/// Stability of a mesh resting on the bed, 0 to 100.
///
/// Up to 60 points for the share of the footprint in contact with the bed,
/// up to 40 for a wide footprint relative to height, with a 15% penalty
/// when the center of mass sits above 60% of the height.
pub fn base_stability(mesh: &TriangleMesh) -> f64 {
    let bbox = bounding_box(mesh);
    let footprint = bbox.footprint_area();
    let height = bbox.height();
    let min_z = bbox.min[2];

    let contact_area: f64 = mesh
        .triangles()
        .iter()
        .filter(|t| t.z_max() - min_z <= CONTACT_TOLERANCE)
        .map(|t| t.area())
        .sum();
    let contact_ratio = if footprint > 0.0 {
        (contact_area / footprint).min(1.0)
    } else {
        0.0
    };

    let spread = if height > 0.0 {
        (footprint / (height * height) * 20.0).min(40.0)
    } else {
        40.0
    };

    let mut stability = contact_ratio * 60.0 + spread;
    if height > 0.0 && center_of_mass(mesh).z - min_z > 0.6 * height {
        stability *= 0.85;
    }
    stability.clamp(0.0, 100.0)
}

/// Area-weighted mean normal of the largest group of coplanar-facing triangles.
///
/// Normals are bucketed on a [`NORMAL_GRID`] lattice; groups with fewer than
/// [`MIN_FACE_GROUP`] triangles are ignored. The first-seen group wins ties.
fn dominant_face_normal(mesh: &TriangleMesh) -> Option<Vec3> {
    struct Group {
        area: f64,
        weighted_normal: Vec3,
        count: usize,
    }

    let mut index: HashMap<(i64, i64, i64), usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for tri in mesh.triangles() {
        let area = tri.area();
        if area <= 0.0 {
            continue;
        }
        let n = tri.normal();
        let key = (
            (n.x / NORMAL_GRID).round() as i64,
            (n.y / NORMAL_GRID).round() as i64,
            (n.z / NORMAL_GRID).round() as i64,
        );
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Group {
                area: 0.0,
                weighted_normal: Vec3::zeros(),
                count: 0,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.area += area;
        group.weighted_normal += n * area;
        group.count += 1;
    }

    let mut best: Option<&Group> = None;
    for group in groups.iter().filter(|g| g.count >= MIN_FACE_GROUP) {
        if best.map_or(true, |b| group.area > b.area) {
            best = Some(group);
        }
    }

    best.and_then(|g| g.weighted_normal.try_normalize(1e-12))
}

/// Shortest rotation taking `from` onto `to`; a half turn about a
/// perpendicular axis when they are opposite.
pub fn rotation_onto(from: &Vec3, to: &Vec3) -> UnitQuaternion<f64> {
    UnitQuaternion::rotation_between(from, to).unwrap_or_else(|| {
        let helper = if from.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
        let axis = Unit::new_normalize(from.cross(&helper));
        UnitQuaternion::from_axis_angle(&axis, std::f64::consts::PI)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vcad_quote_mesh::primitives::{cuboid, quad};
    use vcad_quote_mesh::{Point3, Triangle};

    /// Square frustum: 40 × 40 base (split into 4 triangles), 10 × 10 top,
    /// 5 mm tall. The base is the only face with 3+ triangles.
    fn frustum() -> TriangleMesh {
        let p = Point3::new;
        let (b0, b1, b2, b3) = (
            p(0.0, 0.0, 0.0),
            p(40.0, 0.0, 0.0),
            p(40.0, 40.0, 0.0),
            p(0.0, 40.0, 0.0),
        );
        let (t0, t1, t2, t3) = (
            p(15.0, 15.0, 5.0),
            p(25.0, 15.0, 5.0),
            p(25.0, 25.0, 5.0),
            p(15.0, 25.0, 5.0),
        );
        let c = p(20.0, 20.0, 0.0);

        let mut tris = vec![
            // Base fan, facing -Z
            Triangle::new(c, b1, b0),
            Triangle::new(c, b2, b1),
            Triangle::new(c, b3, b2),
            Triangle::new(c, b0, b3),
        ];
        tris.extend(quad(t0, t1, t2, t3));
        tris.extend(quad(b0, b1, t1, t0));
        tris.extend(quad(b1, b2, t2, t1));
        tris.extend(quad(b2, b3, t3, t2));
        tris.extend(quad(b3, b0, t0, t3));
        TriangleMesh::from_triangles(tris)
    }

    #[test]
    fn test_frustum_winding_is_outward() {
        let mesh = frustum();
        assert!(mesh.triangles()[..4].iter().all(|t| t.normal().z < -0.99));
        let com = center_of_mass(&mesh);
        for t in mesh.triangles() {
            assert!(t.normal().dot(&(t.centroid() - com)) > 0.0);
        }
    }

    #[test]
    fn test_dominant_face_is_chosen() {
        let mesh = frustum();
        let result = optimize_orientation(&mesh, &OverhangSettings::default());

        assert_eq!(result.best.source, CandidateSource::DominantFace);
        let min_overhang = result
            .candidates
            .iter()
            .map(|c| c.overhang_percentage)
            .fold(f64::INFINITY, f64::min);
        assert_relative_eq!(result.best.overhang_percentage, min_overhang);
        assert_relative_eq!(result.best.print_height, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_candidates_ranked() {
        let result = optimize_orientation(&frustum(), &OverhangSettings::default());
        assert_eq!(result.candidates.len(), 7);
        for pair in result.candidates.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(result.candidates[0], result.best);
    }

    #[test]
    fn test_no_face_group_for_plain_box() {
        // Each box face is only two triangles.
        let result = optimize_orientation(&cuboid(10.0, 20.0, 30.0), &OverhangSettings::default());
        assert_eq!(result.candidates.len(), 6);
        assert!(result
            .candidates
            .iter()
            .all(|c| c.source != CandidateSource::DominantFace));
    }

    #[test]
    fn test_tall_box_is_laid_down() {
        let mesh = cuboid(10.0, 20.0, 60.0);
        let result = optimize_orientation(&mesh, &OverhangSettings::default());
        assert!(result.best.print_height < 59.0);
        let bbox = bounding_box(&result.oriented_mesh);
        assert!(bbox.min[2].abs() < 1e-9);
    }

    #[test]
    fn test_rotation_onto_opposite() {
        let q = rotation_onto(&Vec3::z(), &-Vec3::z());
        let v = q * Vec3::z();
        assert_relative_eq!(v.z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_axis_rotations_point_up() {
        for axis in AxisDirection::ALL {
            let q = rotation_onto(&axis.vector(), &Vec3::z());
            let v = q * axis.vector();
            assert_relative_eq!(v.z, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_base_stability_full_contact() {
        // 40 × 40 × 5 slab: full contact, footprint/h² × 20 capped at 40.
        let s = base_stability(&cuboid(40.0, 40.0, 5.0));
        assert_relative_eq!(s, 100.0, epsilon = 1e-9);
    }
}
