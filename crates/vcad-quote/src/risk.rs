//! Support-need risk scoring.
//!
//! Answers "should this print use supports?" independently of the support
//! volume estimate. Each factor adds or subtracts points from a base score
//! picked by overhang share; the total is clamped to `0..=100` and mapped to
//! a decision with a confidence level.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use vcad_quote_mesh::{bounding_box, TriangleMesh};

use crate::config::{DetectionMode, SupportDetectionSettings};
use crate::overhang::{estimate_overhangs, OverhangSettings};

/// Scores below this never need supports.
const LOW_CONFIDENCE_THRESHOLD: f64 = 25.0;

/// Shortest gap that counts as a bridge (mm).
const MIN_BRIDGE_GAP: f64 = 5.0;

/// How sure the scorer is about its decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Borderline.
    Low,
    /// Probably right.
    Medium,
    /// Clear-cut.
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Measurements the scorer works from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskInput {
    /// Overhanging share of the surface (0 to 100).
    pub overhang_percentage: f64,
    /// Material name.
    pub material: String,
    /// Layer height (mm).
    pub layer_height: f64,
    /// Longest overhang extent (mm).
    pub max_overhang_length: f64,
    /// Largest detected horizontal gap (mm), if any.
    pub bridge_gap: Option<f64>,
    /// Faces per cm³ of bounding volume, capped at 100.
    pub geometry_complexity: f64,
}

/// Additive terms of a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    /// Base points by overhang bracket.
    pub base: f64,
    /// Material adjustment.
    pub material: f64,
    /// Overhang length adjustment.
    pub length: f64,
    /// Bridging bonus.
    pub bridging: f64,
    /// Layer height adjustment.
    pub layer_height: f64,
    /// Detection mode adjustment.
    pub mode: f64,
    /// Geometry complexity adjustment.
    pub complexity: f64,
}

impl RiskBreakdown {
    /// Unclamped sum of all terms.
    pub fn total(&self) -> f64 {
        self.base
            + self.material
            + self.length
            + self.bridging
            + self.layer_height
            + self.mode
            + self.complexity
    }
}

/// Scored support decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportRiskResult {
    /// Clamped score (0 to 100).
    pub risk_score: f64,
    /// Whether supports are recommended.
    pub needs_supports: bool,
    /// Decision confidence.
    pub confidence: Confidence,
    /// Terms that make up the score.
    pub breakdown: RiskBreakdown,
}

/// Answer of the standalone support check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportDetectionResult {
    /// Whether supports are recommended.
    pub needs_supports: bool,
    /// Decision confidence.
    pub confidence: Confidence,
    /// Overhanging share of the surface (0 to 100).
    pub overhang_percentage: f64,
    /// Full scoring, absent when detection failed.
    pub risk: Option<SupportRiskResult>,
    /// Short explanation.
    pub reason: String,
    /// Printing advice.
    pub recommendations: Vec<String>,
}

impl SupportDetectionResult {
    /// Conservative answer used when detection cannot run.
    pub fn degraded(cause: impl fmt::Display) -> Self {
        Self {
            needs_supports: false,
            confidence: Confidence::Low,
            overhang_percentage: 0.0,
            risk: None,
            reason: format!("support detection unavailable: {cause}"),
            recommendations: vec![
                "Check the model manually for overhangs before printing.".to_string(),
            ],
        }
    }
}

/// Score the need for supports.
pub fn score_support_risk(
    input: &RiskInput,
    settings: &SupportDetectionSettings,
) -> SupportRiskResult {
    let overhang = input.overhang_percentage;
    let base = if overhang > 40.0 {
        90.0
    } else if overhang > 25.0 {
        70.0
    } else if overhang > 15.0 {
        50.0
    } else if overhang > 8.0 {
        30.0
    } else {
        10.0
    };

    let material = (settings.material_risk_factors.factor_for(&input.material) - 1.0) * 30.0;

    let length = if settings.length_analysis {
        let l = input.max_overhang_length;
        if l < 3.0 {
            -20.0
        } else if l > 15.0 {
            25.0
        } else if l > 10.0 {
            15.0
        } else if l > 5.0 {
            5.0
        } else {
            0.0
        }
    } else {
        0.0
    };

    let bridging = match input.bridge_gap {
        Some(gap)
            if settings.bridging_detection
                && gap >= MIN_BRIDGE_GAP
                && gap <= settings.max_bridging_distance =>
        {
            -15.0
        }
        _ => 0.0,
    };

    let layer_height = (layer_height_factor(input.layer_height) - 1.0) * 20.0;

    let mode = match settings.mode {
        DetectionMode::Conservative => 15.0,
        DetectionMode::Aggressive => -15.0,
        DetectionMode::Balanced => 0.0,
    };

    let complexity = if input.geometry_complexity > 80.0 {
        10.0
    } else if input.geometry_complexity > 60.0 {
        5.0
    } else if input.geometry_complexity < 20.0 {
        -5.0
    } else {
        0.0
    };

    let breakdown = RiskBreakdown {
        base,
        material,
        length,
        bridging,
        layer_height,
        mode,
        complexity,
    };
    let risk_score = breakdown.total().clamp(0.0, 100.0);

    let (needs_supports, confidence) = if risk_score >= settings.high_confidence_threshold {
        (true, Confidence::High)
    } else if risk_score >= settings.medium_confidence_threshold {
        (true, Confidence::Medium)
    } else if risk_score >= LOW_CONFIDENCE_THRESHOLD {
        (false, Confidence::Low)
    } else {
        (false, Confidence::High)
    };

    SupportRiskResult {
        risk_score,
        needs_supports,
        confidence,
        breakdown,
    }
}

/// Thicker layers sag more on overhangs.
fn layer_height_factor(layer_height: f64) -> f64 {
    if layer_height <= 0.08 {
        0.8
    } else if layer_height <= 0.12 {
        0.9
    } else if layer_height <= 0.16 {
        1.0
    } else if layer_height <= 0.20 {
        1.1
    } else {
        1.3
    }
}

/// Derive [`RiskInput`] from an oriented mesh.
pub fn measure(
    mesh: &TriangleMesh,
    material: &str,
    layer_height: f64,
    settings: &SupportDetectionSettings,
) -> RiskInput {
    let overhang = estimate_overhangs(
        mesh,
        &OverhangSettings {
            max_overhang_angle: settings.angle_threshold,
            ..OverhangSettings::default()
        },
    );

    RiskInput {
        overhang_percentage: overhang.overhang_percentage,
        material: material.to_string(),
        layer_height,
        max_overhang_length: overhang.max_overhang_length,
        bridge_gap: largest_bridge_gap(mesh, layer_height, settings.max_bridging_distance),
        geometry_complexity: geometry_complexity(mesh),
    }
}

/// Largest X gap between neighbouring vertices in each Z layer.
///
/// Vertices are bucketed by `round(z / layer_height)`. Layers with fewer
/// than two distinct X positions contribute nothing. Gaps come back in
/// ascending Z order.
pub fn layer_gaps(mesh: &TriangleMesh, layer_height: f64) -> Vec<f64> {
    if layer_height <= 0.0 {
        return Vec::new();
    }

    let mut layers: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for v in mesh.vertices() {
        layers
            .entry((v.z / layer_height).round() as i64)
            .or_default()
            .push(v.x);
    }

    layers
        .into_values()
        .filter_map(|mut xs| {
            xs.sort_by(f64::total_cmp);
            xs.dedup();
            xs.windows(2).map(|w| w[1] - w[0]).reduce(f64::max)
        })
        .collect()
}

/// Gap the bridging bonus is judged on.
///
/// The widest per-layer gap inside `[5, max_bridging_distance]` wins, so a
/// wide span on one layer does not hide a bridge on another. Without one,
/// the widest gap overall is returned.
pub fn largest_bridge_gap(
    mesh: &TriangleMesh,
    layer_height: f64,
    max_bridging_distance: f64,
) -> Option<f64> {
    let gaps = layer_gaps(mesh, layer_height);
    gaps.iter()
        .copied()
        .filter(|g| (MIN_BRIDGE_GAP..=max_bridging_distance).contains(g))
        .reduce(f64::max)
        .or_else(|| gaps.iter().copied().reduce(f64::max))
}

/// Faces per cm³ of bounding volume, capped at 100.
///
/// Flat parts have no bounding volume and count as simple.
pub fn geometry_complexity(mesh: &TriangleMesh) -> f64 {
    let bounding_cm3 = bounding_box(mesh).volume() / 1000.0;
    if bounding_cm3 <= 0.0 {
        return 0.0;
    }
    (mesh.num_triangles() as f64 / bounding_cm3).min(100.0)
}

/// Short explanation of a decision.
pub fn reason(result: &SupportRiskResult, overhang_percentage: f64) -> String {
    if result.needs_supports {
        format!(
            "{:.1}% of the surface overhangs; risk score {:.0} calls for supports ({} confidence)",
            overhang_percentage, result.risk_score, result.confidence
        )
    } else {
        format!(
            "{:.1}% of the surface overhangs; risk score {:.0} is printable without supports ({} confidence)",
            overhang_percentage, result.risk_score, result.confidence
        )
    }
}

/// Printing advice matching a decision.
pub fn recommendations(result: &SupportRiskResult, input: &RiskInput) -> Vec<String> {
    let mut out = Vec::new();
    if result.needs_supports {
        out.push("Enable supports for overhanging regions.".to_string());
        if input.max_overhang_length > 15.0 {
            out.push("Long overhangs: consider tree supports to save material.".to_string());
        }
    } else if result.confidence == Confidence::Low {
        out.push("Borderline case: a test print of the overhanging section is advised.".to_string());
    }
    if result.breakdown.bridging < 0.0 {
        out.push("Short bridges detected: enable bridge settings and cooling.".to_string());
    }
    if result.breakdown.layer_height > 0.0 {
        out.push("A thinner layer height improves overhang quality.".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vcad_quote_mesh::primitives::cuboid;
    use vcad_quote_mesh::{Point3, Triangle};

    fn input(overhang: f64) -> RiskInput {
        RiskInput {
            overhang_percentage: overhang,
            material: "PLA".into(),
            layer_height: 0.2,
            max_overhang_length: 1.0,
            bridge_gap: None,
            geometry_complexity: 50.0,
        }
    }

    #[test]
    fn test_flat_pla_part_needs_no_supports() {
        let result = score_support_risk(&input(0.0), &SupportDetectionSettings::default());
        assert!(!result.needs_supports);
        assert_eq!(result.confidence, Confidence::High);
        // 10 base - 20 short overhang + 2 for 0.2 mm layers, clamped at 0
        assert_relative_eq!(result.breakdown.total(), -8.0, epsilon = 1e-9);
        assert_eq!(result.risk_score, 0.0);
    }

    #[test]
    fn test_heavy_overhang_needs_supports() {
        let mut i = input(55.0);
        i.max_overhang_length = 20.0;
        let result = score_support_risk(&i, &SupportDetectionSettings::default());
        // 90 + 25 + 2 = 117 → 100
        assert_eq!(result.risk_score, 100.0);
        assert!(result.needs_supports);
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn test_medium_and_low_bands() {
        let settings = SupportDetectionSettings::default();

        let mut i = input(20.0);
        i.max_overhang_length = 4.0;
        // 50 + 0 + 2 = 52
        let r = score_support_risk(&i, &settings);
        assert!(r.needs_supports);
        assert_eq!(r.confidence, Confidence::Medium);

        let mut i = input(10.0);
        i.max_overhang_length = 4.0;
        // 30 + 0 + 2 = 32
        let r = score_support_risk(&i, &settings);
        assert!(!r.needs_supports);
        assert_eq!(r.confidence, Confidence::Low);
    }

    #[test]
    fn test_mode_and_material_terms() {
        let settings = SupportDetectionSettings {
            mode: DetectionMode::Conservative,
            ..Default::default()
        };
        let mut i = input(10.0);
        i.material = "ABS".into();
        let r = score_support_risk(&i, &settings);
        assert_relative_eq!(r.breakdown.mode, 15.0);
        assert_relative_eq!(r.breakdown.material, 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bridging_bonus_window() {
        let settings = SupportDetectionSettings::default();
        let mut i = input(30.0);

        i.bridge_gap = Some(8.0);
        assert_eq!(score_support_risk(&i, &settings).breakdown.bridging, -15.0);

        i.bridge_gap = Some(12.0);
        assert_eq!(score_support_risk(&i, &settings).breakdown.bridging, 0.0);

        i.bridge_gap = Some(3.0);
        assert_eq!(score_support_risk(&i, &settings).breakdown.bridging, 0.0);

        let off = SupportDetectionSettings {
            bridging_detection: false,
            ..Default::default()
        };
        i.bridge_gap = Some(8.0);
        assert_eq!(score_support_risk(&i, &off).breakdown.bridging, 0.0);
    }

    #[test]
    fn test_length_analysis_toggle() {
        let settings = SupportDetectionSettings {
            length_analysis: false,
            ..Default::default()
        };
        assert_eq!(score_support_risk(&input(0.0), &settings).breakdown.length, 0.0);
    }

    #[test]
    fn test_layer_height_steps() {
        assert_eq!(layer_height_factor(0.05), 0.8);
        assert_eq!(layer_height_factor(0.1), 0.9);
        assert_eq!(layer_height_factor(0.15), 1.0);
        assert_eq!(layer_height_factor(0.2), 1.1);
        assert_eq!(layer_height_factor(0.3), 1.3);
    }

    #[test]
    fn test_bridge_gap_in_box() {
        // Bottom layer of a 12 mm wide box has vertices at x = 0 and x = 12.
        let gap = largest_bridge_gap(&cuboid(12.0, 5.0, 5.0), 0.2, 10.0).unwrap();
        assert_relative_eq!(gap, 12.0);
    }

    #[test]
    fn test_bridge_found_below_wider_layer() {
        // z = 0 spans x = 0..8, z = 10 spans x = 0..20.
        let p = Point3::new;
        let mesh = TriangleMesh::from_triangles(vec![
            Triangle::new(p(0.0, 0.0, 0.0), p(8.0, 0.0, 0.0), p(0.0, 5.0, 0.0)),
            Triangle::new(p(0.0, 0.0, 10.0), p(20.0, 0.0, 10.0), p(0.0, 5.0, 10.0)),
        ]);
        assert_eq!(layer_gaps(&mesh, 0.2), vec![8.0, 20.0]);

        let settings = SupportDetectionSettings::default();
        let input = measure(&mesh, "PLA", 0.2, &settings);
        assert_eq!(input.bridge_gap, Some(8.0));
        assert_eq!(score_support_risk(&input, &settings).breakdown.bridging, -15.0);
    }

    #[test]
    fn test_unbridgeable_gap_falls_back_to_widest() {
        let p = Point3::new;
        let mesh = TriangleMesh::from_triangles(vec![Triangle::new(
            p(0.0, 0.0, 0.0),
            p(20.0, 0.0, 0.0),
            p(0.0, 5.0, 0.0),
        )]);
        assert_eq!(largest_bridge_gap(&mesh, 0.2, 10.0), Some(20.0));
        assert_eq!(largest_bridge_gap(&mesh, 0.0, 10.0), None);
    }

    #[test]
    fn test_geometry_complexity() {
        // 12 faces over 1 cm³
        assert_relative_eq!(geometry_complexity(&cuboid(10.0, 10.0, 10.0)), 12.0, epsilon = 1e-9);
        assert_eq!(geometry_complexity(&TriangleMesh::default()), 0.0);
    }

    #[test]
    fn test_flat_plate_is_simple() {
        let p = Point3::new;
        let plate = TriangleMesh::from_triangles(vec![Triangle::new(
            p(0.0, 0.0, 0.0),
            p(50.0, 0.0, 0.0),
            p(0.0, 50.0, 0.0),
        )]);
        assert_eq!(geometry_complexity(&plate), 0.0);

        let mut i = input(0.0);
        i.geometry_complexity = geometry_complexity(&plate);
        let r = score_support_risk(&i, &SupportDetectionSettings::default());
        assert_eq!(r.breakdown.complexity, -5.0);
    }
}
