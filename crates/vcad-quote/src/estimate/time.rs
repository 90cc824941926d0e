//! Print time model.
//!
//! Converts the volume decomposition into nozzle distances and runs each
//! feature through the trapezoidal motion model, then adds the fixed
//! overheads a real printer spends between extrusion moves.

use serde::{Deserialize, Serialize};

use super::kinematics::{move_time, segmented_time};
use super::volume::{PartMetrics, VolumeBreakdown};
use crate::config::PrintSettings;

/// Safety factor on the summed model time.
pub const MODEL_SAFETY_FACTOR: f64 = 1.12;

/// Extra time when supports are printed.
pub const SUPPORT_TIME_FACTOR: f64 = 1.30;

/// Travel per layer as a multiple of the average perimeter.
const TRAVEL_PERIMETER_RATIO: f64 = 3.5;
/// Real travel paths are longer than the straight-line baseline.
const TRAVEL_REALISM_FACTOR: f64 = 2.0;
const RETRACTION_SECONDS: f64 = 1.5;
const LAYER_CHANGE_SECONDS: f64 = 3.0;
const SLOW_LAYERS: u32 = 5;
const PREPARATION_SECONDS: f64 = 180.0;

/// Per-component print time in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBreakdown {
    /// Wall extrusion.
    pub perimeter: f64,
    /// Solid top/bottom extrusion.
    pub top_bottom: f64,
    /// Infill extrusion.
    pub infill: f64,
    /// Non-extruding travel.
    pub travel: f64,
    /// Retractions.
    pub retractions: f64,
    /// Z moves between layers.
    pub layer_changes: f64,
    /// Penalty for the slow first layers.
    pub first_layers: f64,
    /// Homing, purging and leveling.
    pub preparation: f64,
}

impl TimeBreakdown {
    /// Raw model time before safety factors (s).
    pub fn total_seconds(&self) -> f64 {
        self.perimeter
            + self.top_bottom
            + self.infill
            + self.travel
            + self.retractions
            + self.layer_changes
            + self.first_layers
            + self.preparation
    }
}

/// Estimate per-component print time for a decomposed part.
pub fn estimate_print_time(
    volumes: &VolumeBreakdown,
    part: &PartMetrics,
    print: &PrintSettings,
) -> TimeBreakdown {
    let a = print.acceleration;
    let bead = print.extrusion_width * print.layer_height;
    let distance = |volume: f64| if bead > 0.0 { volume / bead } else { 0.0 };
    let layers = f64::from(volumes.layers);

    // Walls are printed one closed loop per move.
    let perimeter_distance = distance(volumes.perimeter);
    let loops = f64::from(print.perimeters) * layers;
    let perimeter = if loops > 0.0 {
        segmented_time(perimeter_distance, perimeter_distance / loops, print.perimeter_speed, a)
    } else {
        0.0
    };

    // Solid and sparse fill are straight runs across the footprint.
    let run = part.horizontal_area.max(0.0).sqrt();
    let top_bottom = segmented_time(distance(volumes.top_bottom), run, print.top_bottom_speed, a);
    let infill = segmented_time(distance(volumes.infill), run, print.infill_speed, a);

    // The whole travel baseline runs through the motion model as one move.
    let travel_distance =
        volumes.average_perimeter * TRAVEL_PERIMETER_RATIO * volumes.travel_multiplier * layers;
    let travel = move_time(travel_distance, print.travel_speed, a) * TRAVEL_REALISM_FACTOR;

    let retractions = print.retractions_per_layer
        * layers
        * volumes.retraction_multiplier
        * RETRACTION_SECONDS;

    let layer_changes = layers * LAYER_CHANGE_SECONDS;

    let per_layer_distance = distance(volumes.model_volume()) / layers;
    let slow = move_time(per_layer_distance, print.first_layer_speed, a);
    let normal = move_time(per_layer_distance, print.perimeter_speed, a);
    let first_layers = (slow - normal).max(0.0) * f64::from(volumes.layers.min(SLOW_LAYERS));

    TimeBreakdown {
        perimeter,
        top_bottom,
        infill,
        travel,
        retractions,
        layer_changes,
        first_layers,
        preparation: PREPARATION_SECONDS,
    }
}
