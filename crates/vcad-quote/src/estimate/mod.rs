//! Cost and time engine.
//!
//! Runs over an oriented, classified mesh:
//! 1. Decompose the printed volume ([`volume`])
//! 2. Weigh it, from calibration or from density ([`calibration`])
//! 3. Time it with the motion model ([`time`], [`kinematics`])
//! 4. Price it and apply the minimum-price policy ([`pricing`])

pub mod calibration;
pub mod kinematics;
pub mod pricing;
pub mod time;
pub mod volume;

pub use calibration::{
    CalibrationIndex, CalibrationMatch, CalibrationProfile, CalibrationRecord, SizeCategory,
};
pub use kinematics::move_time;
pub use pricing::{apply_minimum_price, compute_costs, CostBreakdown};
pub use time::{estimate_print_time, TimeBreakdown};
pub use volume::{decompose_volume, PartMetrics, VolumeBreakdown};

use serde::{Deserialize, Serialize};
use tracing::debug;
use vcad_quote_mesh::{
    bounding_box, horizontal_area, surface_area, volume as mesh_volume, TriangleMesh,
};

use crate::classify::GeometryClassification;
use crate::config::{MaterialSettings, QuoteSettings};
use crate::overhang::{estimate_overhangs, OverhangAnalysis, OverhangSettings};

/// Extra time when supports are needed but the matched print had none.
const UNSUPPORTED_RECORD_PENALTY: f64 = 1.25;

/// Everything the engine needs for one part.
#[derive(Debug, Clone, Copy)]
pub struct EstimateInput<'a> {
    /// Oriented mesh.
    pub mesh: &'a TriangleMesh,
    /// Classification of the oriented mesh.
    pub classification: &'a GeometryClassification,
    /// Resolved material.
    pub material: &'a MaterialSettings,
    /// Settings snapshot.
    pub settings: &'a QuoteSettings,
    /// Whether supports will be printed.
    pub supports: bool,
    /// Units ordered.
    pub quantity: u32,
    /// Measured prints.
    pub calibration: &'a CalibrationIndex,
    /// Correction profile for this material and geometry type.
    pub profile: Option<&'a CalibrationProfile>,
}

/// Where weight and time came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalibrationSource {
    /// Scaled from a measured print.
    Record {
        /// Volume of the measured part (cm³).
        measured_volume: f64,
        /// `current / measured` volume.
        volume_ratio: f64,
        /// Matched a print without supports while supports are needed.
        supports_adjusted: bool,
    },
    /// Model corrected by a profile.
    Profile {
        /// Time scale.
        time_factor: f64,
        /// Weight scale.
        material_factor: f64,
        /// Profile confidence.
        confidence: f64,
    },
    /// Pure model.
    Model,
}

/// Output of [`estimate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Measurements of the oriented part.
    pub part: PartMetrics,
    /// Volume decomposition.
    pub volumes: VolumeBreakdown,
    /// Model time components.
    pub time: TimeBreakdown,
    /// Overhang statistics, when supports were requested.
    pub overhangs: Option<OverhangAnalysis>,
    /// Source of weight and time.
    pub calibration: CalibrationSource,
    /// Filament weight (g).
    pub weight_grams: f64,
    /// Print time (h).
    pub hours: f64,
    /// Per-unit costs.
    pub costs: CostBreakdown,
    /// Order total after the minimum-price policy (€).
    pub total: f64,
}

/// Estimate weight, time and price for one part.
pub fn estimate(input: &EstimateInput<'_>) -> Estimate {
    let settings = input.settings;
    let print = &settings.print;
    let bbox = bounding_box(input.mesh);

    let part = PartMetrics {
        volume: mesh_volume(input.mesh),
        surface_area: surface_area(input.mesh),
        horizontal_area: horizontal_area(input.mesh),
        height: bbox.height(),
    };
    let volume_cm3 = part.volume / 1000.0;
    let geometry_type = input.classification.geometry_type;

    // Volume decomposition
    let mut volumes = decompose_volume(
        &part,
        print,
        &geometry_type.multipliers(),
        input.classification.surface_complexity,
    );

    let overhangs = if input.supports {
        let analysis =
            estimate_overhangs(input.mesh, &OverhangSettings::from(&settings.supports));
        volumes.add_supports(
            analysis.support_volume,
            part.volume,
            settings.supports.max_fraction,
        );
        Some(analysis)
    } else {
        None
    };

    let time = estimate_print_time(&volumes, &part, print);

    // Calibration: exact support setting first, then an unsupported print
    // when supports are needed.
    let matched = input
        .calibration
        .find(&input.material.name, geometry_type, volume_cm3, input.supports)
        .map(|m| (m, false))
        .or_else(|| {
            if !input.supports {
                return None;
            }
            input
                .calibration
                .find(&input.material.name, geometry_type, volume_cm3, false)
                .map(|m| (m, true))
        });

    let (weight_grams, hours, calibration) = match matched {
        Some((m, supports_adjusted)) => {
            let weight = m.record.actual_material_grams * m.volume_ratio;
            let mut hours = m.record.actual_time_minutes / 60.0 * m.volume_ratio;
            if supports_adjusted {
                hours *= UNSUPPORTED_RECORD_PENALTY;
            }
            let source = CalibrationSource::Record {
                measured_volume: m.record.measured_volume,
                volume_ratio: m.volume_ratio,
                supports_adjusted,
            };
            (weight, hours, source)
        }
        None => {
            let (time_factor, material_factor) = input
                .profile
                .map_or((1.0, 1.0), |p| (p.time_factor, p.material_factor));

            let weight =
                volumes.material_volume() / 1000.0 * input.material.density * material_factor;

            let mut seconds = time.total_seconds() * time::MODEL_SAFETY_FACTOR;
            if input.supports {
                seconds *= time::SUPPORT_TIME_FACTOR;
            }
            seconds *= time_factor;

            let source = match input.profile {
                Some(p) => CalibrationSource::Profile {
                    time_factor: p.time_factor,
                    material_factor: p.material_factor,
                    confidence: p.confidence,
                },
                None => CalibrationSource::Model,
            };
            (weight, seconds / 3600.0, source)
        }
    };

    let costs = compute_costs(
        weight_grams,
        hours,
        input.material,
        &settings.machine,
        &settings.pricing,
    );
    let total = apply_minimum_price(costs.retail, input.quantity, &settings.pricing);

    debug!(
        volume_cm3,
        weight_grams,
        hours,
        retail = costs.retail,
        total,
        "estimate complete"
    );

    Estimate {
        part,
        volumes,
        time,
        overhangs,
        calibration,
        weight_grams,
        hours,
        costs,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_geometry;
    use approx::assert_relative_eq;
    use vcad_quote_mesh::primitives::cuboid;

    struct Fixture {
        mesh: TriangleMesh,
        classification: GeometryClassification,
        settings: QuoteSettings,
        material: MaterialSettings,
    }

    fn fixture(w: f64, d: f64, h: f64) -> Fixture {
        let mesh = cuboid(w, d, h);
        let classification = classify_geometry(
            &bounding_box(&mesh).dimensions(),
            mesh_volume(&mesh),
            surface_area(&mesh),
        );
        Fixture {
            mesh,
            classification,
            settings: QuoteSettings::default(),
            material: MaterialSettings::pla(),
        }
    }

    fn input<'a>(
        f: &'a Fixture,
        index: &'a CalibrationIndex,
        supports: bool,
    ) -> EstimateInput<'a> {
        EstimateInput {
            mesh: &f.mesh,
            classification: &f.classification,
            material: &f.material,
            settings: &f.settings,
            supports,
            quantity: 1,
            calibration: index,
            profile: None,
        }
    }

    #[test]
    fn test_model_estimate_for_cube() {
        let f = fixture(20.0, 20.0, 20.0);
        let index = CalibrationIndex::default();
        let e = estimate(&input(&f, &index, false));

        assert_eq!(e.calibration, CalibrationSource::Model);
        assert_relative_eq!(
            e.weight_grams,
            e.volumes.material_volume() / 1000.0 * 1.24,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            e.hours,
            e.time.total_seconds() * 1.12 / 3600.0,
            epsilon = 1e-12
        );
        assert!(e.total >= f.settings.pricing.minimum_price);
        assert!(e.overhangs.is_none());
    }

    #[test]
    fn test_supports_add_time_and_material() {
        let f = fixture(20.0, 20.0, 20.0);
        let index = CalibrationIndex::default();
        let plain = estimate(&input(&f, &index, false));
        let supported = estimate(&input(&f, &index, true));

        assert!(supported.volumes.support > 0.0);
        assert!(supported.volumes.support <= 0.35 * supported.part.volume + 1e-9);
        assert!(supported.weight_grams > plain.weight_grams);
        assert!(supported.hours > plain.hours);
        assert!(supported.overhangs.is_some());
    }

    #[test]
    fn test_profile_factors() {
        let f = fixture(20.0, 20.0, 20.0);
        let index = CalibrationIndex::default();
        let plain = estimate(&input(&f, &index, false));

        let profile = CalibrationProfile {
            material: "PLA".into(),
            geometry_type: None,
            time_factor: 1.2,
            material_factor: 0.9,
            confidence: 0.8,
        };
        let e = estimate(&EstimateInput {
            profile: Some(&profile),
            ..input(&f, &index, false)
        });

        assert_relative_eq!(e.hours, plain.hours * 1.2, epsilon = 1e-12);
        assert_relative_eq!(e.weight_grams, plain.weight_grams * 0.9, epsilon = 1e-9);
        assert!(matches!(e.calibration, CalibrationSource::Profile { .. }));
    }

    #[test]
    fn test_calibration_record_replaces_model() {
        // 20 mm cube is 8 cm³, a small part
        let f = fixture(20.0, 20.0, 20.0);
        let record = CalibrationRecord {
            material: "pla".into(),
            geometry_type: f.classification.geometry_type,
            size_category: SizeCategory::Small,
            supports_enabled: false,
            measured_volume: 7.0,
            actual_time_minutes: 90.0,
            actual_material_grams: 12.0,
        };
        let index = CalibrationIndex::new(vec![record.clone()]);
        let e = estimate(&input(&f, &index, false));

        let ratio = 8.0 / 7.0;
        assert_relative_eq!(e.weight_grams, 12.0 * ratio, epsilon = 1e-9);
        assert_relative_eq!(e.hours, 1.5 * ratio, epsilon = 1e-9);

        // Supports needed, only an unsupported record: +25 % time
        let e = estimate(&input(&f, &index, true));
        assert_relative_eq!(e.hours, 1.5 * ratio * 1.25, epsilon = 1e-9);
        assert!(matches!(
            e.calibration,
            CalibrationSource::Record {
                supports_adjusted: true,
                ..
            }
        ));

        // Outside the ±30 % window the model is used
        let far = CalibrationRecord {
            measured_volume: 12.0,
            ..record
        };
        let index = CalibrationIndex::new(vec![far]);
        let e = estimate(&input(&f, &index, false));
        assert_eq!(e.calibration, CalibrationSource::Model);
    }

    #[test]
    fn test_quantity_uses_minimum_policy() {
        let f = fixture(5.0, 5.0, 5.0);
        let index = CalibrationIndex::default();
        let one = estimate(&input(&f, &index, false));
        let three = estimate(&EstimateInput {
            quantity: 3,
            ..input(&f, &index, false)
        });

        let retail = three.costs.retail;
        assert!(retail < 5.0);
        assert_relative_eq!(three.total, 5.0 + 2.0 * retail, epsilon = 1e-12);
        assert_relative_eq!(one.total, 5.0);
    }
}
