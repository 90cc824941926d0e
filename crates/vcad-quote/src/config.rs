//! Typed quote settings.
//!
//! Every parameter has a default, so a settings file only needs to name the
//! values that differ. A settings set that is absent altogether is an error
//! (see [`QuoteError::ConfigurationMissing`](crate::QuoteError)).

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{QuoteError, Result};

/// All settings consumed by one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteSettings {
    /// Filament materials that can be quoted.
    pub materials: Vec<MaterialSettings>,
    /// Slicing-level print parameters.
    pub print: PrintSettings,
    /// Printer running costs.
    pub machine: MachineSettings,
    /// Margin, markup and minimum price.
    pub pricing: PricingPolicy,
    /// Support-volume estimation.
    pub supports: SupportVolumeSettings,
    /// Support-need risk scoring.
    pub support_detection: SupportDetectionSettings,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            materials: MaterialSettings::builtin(),
            print: PrintSettings::default(),
            machine: MachineSettings::default(),
            pricing: PricingPolicy::default(),
            supports: SupportVolumeSettings::default(),
            support_detection: SupportDetectionSettings::default(),
        }
    }
}

impl QuoteSettings {
    /// Parse settings from TOML.
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        let p = &self.print;
        if p.layer_height <= 0.0 || p.layer_height > 1.0 {
            return Err(QuoteError::InvalidSettings(
                "layer_height must be between 0 and 1mm".into(),
            ));
        }
        if p.extrusion_width <= 0.0 {
            return Err(QuoteError::InvalidSettings(
                "extrusion_width must be positive".into(),
            ));
        }
        if !(0.0..=100.0).contains(&p.infill_percent) {
            return Err(QuoteError::InvalidSettings(
                "infill_percent must be between 0 and 100".into(),
            ));
        }
        if self.machine.lifespan_hours <= 0.0 {
            return Err(QuoteError::InvalidSettings(
                "lifespan_hours must be positive".into(),
            ));
        }
        if let Some(m) = self.materials.iter().find(|m| m.density <= 0.0) {
            return Err(QuoteError::InvalidSettings(format!(
                "material {} has a non-positive density",
                m.name
            )));
        }
        Ok(())
    }

    /// Look up a material by name (case-insensitive).
    ///
    /// Unknown names fall back to the built-in table, then to the first
    /// configured material, then to PLA.
    pub fn material(&self, name: &str) -> MaterialSettings {
        let find = |list: &[MaterialSettings]| {
            list.iter()
                .find(|m| m.name.eq_ignore_ascii_case(name))
                .cloned()
        };
        if let Some(m) = find(&self.materials) {
            return m;
        }
        if let Some(m) = find(&MaterialSettings::builtin()) {
            return m;
        }

        let fallback = self
            .materials
            .first()
            .cloned()
            .unwrap_or_else(MaterialSettings::pla);
        warn!(
            requested = name,
            using = %fallback.name,
            "unknown material, using fallback"
        );
        fallback
    }
}

/// Filament material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSettings {
    /// Material name as shown to customers ("PLA", "PETG", ...).
    pub name: String,
    /// Density (g/cm³).
    pub density: f64,
    /// Spool price (€/kg).
    pub cost_per_kg: f64,
}

impl MaterialSettings {
    /// PLA at 1.24 g/cm³.
    pub fn pla() -> Self {
        Self {
            name: "PLA".into(),
            density: 1.24,
            cost_per_kg: 20.0,
        }
    }

    /// Built-in material table.
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::pla(),
            Self {
                name: "PETG".into(),
                density: 1.27,
                cost_per_kg: 24.0,
            },
            Self {
                name: "ABS".into(),
                density: 1.04,
                cost_per_kg: 22.0,
            },
        ]
    }
}

/// Print parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintSettings {
    /// Layer height (mm).
    pub layer_height: f64,
    /// Infill density (0 to 100).
    pub infill_percent: f64,
    /// Number of perimeter walls.
    pub perimeters: u32,
    /// Extrusion line width (mm).
    pub extrusion_width: f64,
    /// Solid layers at the top.
    pub top_layers: u32,
    /// Solid layers at the bottom.
    pub bottom_layers: u32,
    /// Perimeter speed (mm/s).
    pub perimeter_speed: f64,
    /// Infill speed (mm/s).
    pub infill_speed: f64,
    /// Top/bottom solid speed (mm/s).
    pub top_bottom_speed: f64,
    /// Travel speed (mm/s).
    pub travel_speed: f64,
    /// Speed of the first, slow layers (mm/s).
    pub first_layer_speed: f64,
    /// Acceleration (mm/s²).
    pub acceleration: f64,
    /// Retractions per layer.
    pub retractions_per_layer: f64,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            layer_height: 0.2,
            infill_percent: 20.0,
            perimeters: 2,
            extrusion_width: 0.45,
            top_layers: 4,
            bottom_layers: 4,
            perimeter_speed: 45.0,
            infill_speed: 60.0,
            top_bottom_speed: 40.0,
            travel_speed: 150.0,
            first_layer_speed: 20.0,
            acceleration: 1500.0,
            retractions_per_layer: 4.0,
        }
    }
}

/// Machine economics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Electricity price (€/kWh).
    pub electricity_price: f64,
    /// Printer draw while printing (kW).
    pub printer_power_kw: f64,
    /// Heated bed draw while heating (kW).
    pub bed_power_kw: f64,
    /// Expected printer lifespan (hours).
    pub lifespan_hours: f64,
    /// Replacement parts budget over the lifespan (€).
    pub replacement_parts_cost: f64,
    /// Warm-up time per job (minutes).
    pub heating_minutes: f64,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            electricity_price: 0.25,
            printer_power_kw: 0.12,
            bed_power_kw: 0.15,
            lifespan_hours: 5000.0,
            replacement_parts_cost: 250.0,
            heating_minutes: 5.0,
        }
    }
}

/// Pricing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    /// Error margin added on top of the base cost (percent).
    pub error_margin_percent: f64,
    /// Retail markup; values `<= 0` disable it.
    pub profit_multiplier: f64,
    /// Minimum order price (€).
    pub minimum_price: f64,
    /// Consumables added to every unit (€).
    pub supplies_cost: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            error_margin_percent: 10.0,
            profit_multiplier: 1.5,
            minimum_price: 5.0,
            supplies_cost: 0.0,
        }
    }
}

/// Support-volume estimation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportVolumeSettings {
    /// Overhang angle threshold (degrees).
    pub max_overhang_angle: f64,
    /// Average support column height as a fraction of part height.
    pub average_height_ratio: f64,
    /// Fill density of support material (0 to 1).
    pub density: f64,
    /// Largest support volume allowed, as a fraction of part volume.
    pub max_fraction: f64,
}

impl Default for SupportVolumeSettings {
    fn default() -> Self {
        Self {
            max_overhang_angle: 45.0,
            average_height_ratio: 0.4,
            density: 0.10,
            max_fraction: 0.35,
        }
    }
}

/// How eagerly supports are recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Recommend supports more often.
    Conservative,
    /// No bias.
    #[default]
    Balanced,
    /// Recommend supports less often.
    Aggressive,
}

/// Per-material support risk factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialRiskFactors {
    /// PLA factor.
    pub pla: f64,
    /// PETG factor.
    pub petg: f64,
    /// ABS factor.
    pub abs: f64,
}

impl Default for MaterialRiskFactors {
    fn default() -> Self {
        Self {
            pla: 1.0,
            petg: 1.2,
            abs: 1.4,
        }
    }
}

impl MaterialRiskFactors {
    /// Factor for a material name, matched by case-insensitive substring.
    pub fn factor_for(&self, material: &str) -> f64 {
        let name = material.to_ascii_lowercase();
        if name.contains("pla") {
            self.pla
        } else if name.contains("petg") {
            self.petg
        } else if name.contains("abs") {
            self.abs
        } else {
            self.pla
        }
    }
}

/// Support-need risk scoring parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportDetectionSettings {
    /// Overhang angle threshold (degrees).
    pub angle_threshold: f64,
    /// Material risk factors.
    pub material_risk_factors: MaterialRiskFactors,
    /// Detection bias.
    pub mode: DetectionMode,
    /// Reward bridgeable gaps.
    pub bridging_detection: bool,
    /// Longest span that bridges without support (mm).
    pub max_bridging_distance: f64,
    /// Score at or above which supports are needed with high confidence.
    pub high_confidence_threshold: f64,
    /// Score at or above which supports are needed with medium confidence.
    pub medium_confidence_threshold: f64,
    /// Score overhang length.
    pub length_analysis: bool,
}

impl Default for SupportDetectionSettings {
    fn default() -> Self {
        Self {
            angle_threshold: 45.0,
            material_risk_factors: MaterialRiskFactors::default(),
            mode: DetectionMode::Balanced,
            bridging_detection: true,
            max_bridging_distance: 10.0,
            high_confidence_threshold: 75.0,
            medium_confidence_threshold: 40.0,
            length_analysis: true,
        }
    }
}
