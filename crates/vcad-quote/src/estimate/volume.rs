//! Material volume decomposition.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::classify::FeatureMultipliers;
use crate::config::PrintSettings;

/// Share of model material charged as support when the estimator finds none.
const SUPPORT_FALLBACK_FRACTION: f64 = 0.10;

/// Measurements of the oriented part (mm, mm², mm³).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartMetrics {
    /// Enclosed volume (mm³).
    pub volume: f64,
    /// Total surface area (mm²).
    pub surface_area: f64,
    /// Bed footprint (mm²).
    pub horizontal_area: f64,
    /// Print height (mm).
    pub height: f64,
}

/// Printed volume split by feature, all in mm³.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBreakdown {
    /// Layer count.
    pub layers: u32,
    /// Average perimeter loop length per layer (mm).
    pub average_perimeter: f64,
    /// Wall volume.
    pub perimeter: f64,
    /// Solid top and bottom volume.
    pub top_bottom: f64,
    /// Sparse infill volume.
    pub infill: f64,
    /// Support volume, zero unless supports were requested.
    pub support: f64,
    /// Whether the support estimate hit the part-volume cap.
    pub support_clamped: bool,
    /// Travel scale after geometry and complexity adjustments.
    pub travel_multiplier: f64,
    /// Retraction scale after geometry adjustment.
    pub retraction_multiplier: f64,
}

impl VolumeBreakdown {
    /// Model material without support.
    pub fn model_volume(&self) -> f64 {
        self.perimeter + self.top_bottom + self.infill
    }

    /// Everything that gets extruded.
    pub fn material_volume(&self) -> f64 {
        self.model_volume() + self.support
    }

    /// Charge support material.
    ///
    /// `estimated_cm3` comes from the overhang estimator. It is capped at
    /// `max_fraction` of `part_volume`; a zero estimate falls back to 10% of
    /// the model material.
    pub fn add_supports(&mut self, estimated_cm3: f64, part_volume: f64, max_fraction: f64) {
        let estimated = (estimated_cm3 * 1000.0).max(0.0);
        let cap = (part_volume * max_fraction).max(0.0);

        self.support = if estimated <= 0.0 {
            self.model_volume() * SUPPORT_FALLBACK_FRACTION
        } else if estimated > cap {
            warn!(
                estimated_mm3 = estimated,
                cap_mm3 = cap,
                "support estimate exceeds part-volume cap, clamping"
            );
            self.support_clamped = true;
            cap
        } else {
            estimated
        };
    }
}

/// Split the part into perimeter, top/bottom and infill volume.
///
/// `surface_complexity` (0 to 10) scales perimeter and travel by
/// `1 + complexity / 20` on top of the per-type `multipliers`.
pub fn decompose_volume(
    part: &PartMetrics,
    print: &PrintSettings,
    multipliers: &FeatureMultipliers,
    surface_complexity: f64,
) -> VolumeBreakdown {
    let layers = layer_count(part.height, print.layer_height);
    let n = f64::from(layers);

    let average_perimeter = if part.horizontal_area > 0.0 {
        let wall_ratio = ((part.surface_area / n) / part.horizontal_area).sqrt();
        2.0 * (std::f64::consts::PI * part.horizontal_area).sqrt() * wall_ratio.min(2.0)
    } else {
        0.0
    };

    let perimeter = average_perimeter
        * f64::from(print.perimeters)
        * n
        * print.extrusion_width
        * print.layer_height;
    let top_bottom = (part.volume / n) * f64::from(print.top_layers + print.bottom_layers);
    let infill =
        (part.volume - perimeter - top_bottom).max(0.0) * print.infill_percent / 100.0;

    let complexity_factor = 1.0 + surface_complexity / 20.0;

    VolumeBreakdown {
        layers,
        average_perimeter,
        perimeter: perimeter * multipliers.perimeter * complexity_factor,
        top_bottom: top_bottom * multipliers.top_bottom,
        infill: infill * multipliers.infill,
        support: 0.0,
        support_clamped: false,
        travel_multiplier: multipliers.travel * complexity_factor,
        retraction_multiplier: multipliers.retractions,
    }
}

/// `ceil(height / layer_height)`, at least one layer.
pub fn layer_count(height: f64, layer_height: f64) -> u32 {
    if layer_height <= 0.0 || !height.is_finite() {
        return 1;
    }
    ((height / layer_height).ceil() as u32).max(1)
}
