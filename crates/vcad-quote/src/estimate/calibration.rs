//! Calibration against measured prints.
//!
//! A calibration record is a physical print with measured time and
//! filament. When a record of the same material, geometry type, size
//! category and support setting lies within ±30% of the part volume, its
//! measurements replace the model, scaled by the volume ratio.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::GeometryType;

/// Largest relative volume difference accepted for a match.
pub const VOLUME_TOLERANCE: f64 = 0.30;

/// Coarse part size by volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeCategory {
    /// Under 10 cm³.
    Small,
    /// 10 to 100 cm³.
    Medium,
    /// Over 100 cm³.
    Large,
}

impl SizeCategory {
    /// Categorize a volume in cm³.
    pub fn from_volume(volume_cm3: f64) -> Self {
        if volume_cm3 < 10.0 {
            Self::Small
        } else if volume_cm3 > 100.0 {
            Self::Large
        } else {
            Self::Medium
        }
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        })
    }
}

/// One measured print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    /// Material name.
    pub material: String,
    /// Geometry type of the printed part.
    pub geometry_type: GeometryType,
    /// Size category of the printed part.
    pub size_category: SizeCategory,
    /// Whether the print used supports.
    pub supports_enabled: bool,
    /// Computed volume of the part (cm³).
    pub measured_volume: f64,
    /// Wall-clock print time (minutes).
    pub actual_time_minutes: f64,
    /// Filament used (g).
    pub actual_material_grams: f64,
}

/// Correction factors for a material, optionally for one geometry type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    /// Material name.
    pub material: String,
    /// Geometry type, or `None` for a material-wide profile.
    #[serde(default)]
    pub geometry_type: Option<GeometryType>,
    /// Scale on model print time.
    pub time_factor: f64,
    /// Scale on model filament weight.
    pub material_factor: f64,
    /// How much the profile is trusted (0 to 1).
    #[serde(default)]
    pub confidence: f64,
}

/// The record chosen for a part.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationMatch<'a> {
    /// Matched record.
    pub record: &'a CalibrationRecord,
    /// `current / record` volume.
    pub volume_ratio: f64,
}

type IndexKey = (String, GeometryType, SizeCategory, bool);

/// Calibration records indexed by material, geometry type, size category
/// and support setting.
#[derive(Debug, Clone, Default)]
pub struct CalibrationIndex {
    buckets: HashMap<IndexKey, Vec<CalibrationRecord>>,
}

impl CalibrationIndex {
    /// Index records, keeping their input order within each bucket.
    pub fn new(records: impl IntoIterator<Item = CalibrationRecord>) -> Self {
        let mut buckets: HashMap<IndexKey, Vec<CalibrationRecord>> = HashMap::new();
        for record in records {
            let key = (
                record.material.to_lowercase(),
                record.geometry_type,
                record.size_category,
                record.supports_enabled,
            );
            buckets.entry(key).or_default().push(record);
        }
        Self { buckets }
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Whether no records are indexed.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Closest-volume record within tolerance.
    ///
    /// Ties go to the record listed first. No interpolation between records.
    pub fn find(
        &self,
        material: &str,
        geometry_type: GeometryType,
        volume_cm3: f64,
        supports: bool,
    ) -> Option<CalibrationMatch<'_>> {
        if volume_cm3 <= 0.0 || !volume_cm3.is_finite() {
            return None;
        }

        let key = (
            material.to_lowercase(),
            geometry_type,
            SizeCategory::from_volume(volume_cm3),
            supports,
        );
        let tolerance = VOLUME_TOLERANCE * volume_cm3;

        let mut best: Option<(&CalibrationRecord, f64)> = None;
        for record in self.buckets.get(&key)? {
            let distance = (record.measured_volume - volume_cm3).abs();
            if record.measured_volume <= 0.0 || distance > tolerance {
                continue;
            }
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((record, distance));
            }
        }

        best.map(|(record, _)| CalibrationMatch {
            record,
            volume_ratio: volume_cm3 / record.measured_volume,
        })
    }
}
