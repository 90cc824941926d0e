//! Settings and calibration providers.

use serde::{Deserialize, Serialize};

use crate::classify::GeometryType;
use crate::config::QuoteSettings;
use crate::error::Result;
use crate::estimate::{CalibrationProfile, CalibrationRecord};

/// Read-only store of quote settings and calibration data.
///
/// Each analysis reads the source once and treats the result as a
/// snapshot.
pub trait QuoteDataSource: Send + Sync {
    /// Current settings, or `None` if none are configured.
    fn settings(&self) -> Option<QuoteSettings>;

    /// All calibration records.
    fn calibration_records(&self) -> Vec<CalibrationRecord>;

    /// Profile for a material and geometry type.
    ///
    /// A profile naming the geometry type wins over a material-wide one.
    fn calibration_profile(
        &self,
        material: &str,
        geometry_type: GeometryType,
    ) -> Option<CalibrationProfile>;
}

/// Data source held in memory, typically loaded from a TOML file.
///
/// ```toml
/// [settings.print]
/// layer_height = 0.16
///
/// [[calibration]]
/// material = "PLA"
/// geometry_type = "compact"
/// size_category = "medium"
/// supports_enabled = false
/// measured_volume = 42.0
/// actual_time_minutes = 185.0
/// actual_material_grams = 55.0
///
/// [[profiles]]
/// material = "PETG"
/// time_factor = 1.1
/// material_factor = 1.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryDataSource {
    /// Settings; `None` makes every analysis fail.
    #[serde(default)]
    pub settings: Option<QuoteSettings>,
    /// Measured prints.
    #[serde(default)]
    pub calibration: Vec<CalibrationRecord>,
    /// Correction profiles.
    #[serde(default)]
    pub profiles: Vec<CalibrationProfile>,
}

impl InMemoryDataSource {
    /// Source with the given settings and no calibration data.
    pub fn with_settings(settings: QuoteSettings) -> Self {
        Self {
            settings: Some(settings),
            ..Default::default()
        }
    }

    /// Parse a data file.
    ///
    /// A file without a `[settings]` table gets default settings; pass
    /// [`InMemoryDataSource::default`] for a source with none at all.
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut source: Self = toml::from_str(text)?;
        let settings = source.settings.take().unwrap_or_default();
        settings.validate()?;
        source.settings = Some(settings);
        Ok(source)
    }
}

impl QuoteDataSource for InMemoryDataSource {
    fn settings(&self) -> Option<QuoteSettings> {
        self.settings.clone()
    }

    fn calibration_records(&self) -> Vec<CalibrationRecord> {
        self.calibration.clone()
    }

    fn calibration_profile(
        &self,
        material: &str,
        geometry_type: GeometryType,
    ) -> Option<CalibrationProfile> {
        let for_material = || {
            self.profiles
                .iter()
                .filter(|p| p.material.eq_ignore_ascii_case(material))
        };
        for_material()
            .find(|p| p.geometry_type == Some(geometry_type))
            .or_else(|| for_material().find(|p| p.geometry_type.is_none()))
            .cloned()
    }
}
