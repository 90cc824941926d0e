//! Geometry classification.
//!
//! Derives a coarse part type from bounding dimensions, volume and area.
//! The type selects a fixed set of multipliers that bend the cost model
//! towards how such parts actually print.

use std::fmt;

use serde::{Deserialize, Serialize};
use vcad_quote_mesh::Dimensions;

/// Denominator floor for aspect ratios (mm).
const MIN_EXTENT_MM: f64 = 0.001;

/// Nominal layer height used for `layer_density` (mm).
const NOMINAL_LAYER_HEIGHT: f64 = 0.2;

/// Coarse part type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryType {
    /// Tall and slender.
    ThinTall,
    /// Flat and roughly square.
    WideShort,
    /// Exceeds 150 × 150 × 100 mm.
    Large,
    /// Thin walls enclosing little material.
    Hollow,
    /// Much more surface than its bounding cube.
    Complex,
    /// Everything else.
    Compact,
}

impl GeometryType {
    /// Snake-case name, as stored with calibration records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThinTall => "thin_tall",
            Self::WideShort => "wide_short",
            Self::Large => "large",
            Self::Hollow => "hollow",
            Self::Complex => "complex",
            Self::Compact => "compact",
        }
    }

    /// Cost-model multipliers for this type.
    pub fn multipliers(&self) -> FeatureMultipliers {
        let base = FeatureMultipliers::default();
        match self {
            Self::ThinTall => FeatureMultipliers {
                perimeter: 1.15,
                top_bottom: 0.7,
                travel: 0.9,
                retractions: 0.85,
                ..base
            },
            Self::WideShort => FeatureMultipliers {
                top_bottom: 1.1,
                perimeter: 0.95,
                travel: 1.15,
                ..base
            },
            Self::Large => FeatureMultipliers {
                travel: 1.3,
                retractions: 1.2,
                ..base
            },
            Self::Hollow => FeatureMultipliers {
                infill: 0.6,
                perimeter: 1.1,
                travel: 1.1,
                retractions: 1.15,
                ..base
            },
            Self::Complex => FeatureMultipliers {
                perimeter: 1.1,
                travel: 1.25,
                retractions: 1.4,
                ..base
            },
            Self::Compact => base,
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-feature scale factors applied by the cost engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureMultipliers {
    /// Perimeter volume.
    pub perimeter: f64,
    /// Top/bottom solid volume.
    pub top_bottom: f64,
    /// Infill volume.
    pub infill: f64,
    /// Travel distance.
    pub travel: f64,
    /// Retraction count.
    pub retractions: f64,
}

impl Default for FeatureMultipliers {
    fn default() -> Self {
        Self {
            perimeter: 1.0,
            top_bottom: 1.0,
            infill: 1.0,
            travel: 1.0,
            retractions: 1.0,
        }
    }
}

/// Pairwise extent ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRatio {
    /// width / depth
    pub xy: f64,
    /// width / height
    pub xz: f64,
    /// height / depth
    pub yz: f64,
}

/// Result of [`classify_geometry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryClassification {
    /// Part type.
    pub geometry_type: GeometryType,
    /// Extent ratios.
    pub aspect_ratio: AspectRatio,
    /// Surface relative to the bounding-volume cube, scaled to 0..=10.
    pub surface_complexity: f64,
    /// `volume / surface_area` (mm).
    pub wall_thickness_ratio: f64,
    /// Volume per nominal 0.2 mm layer (mm³).
    pub layer_density: f64,
    /// Human-readable printing advice.
    pub recommendation: String,
}

/// Classify a part.
///
/// `dimensions` are in centimeters, `volume` in mm³ and `surface_area` in
/// mm². Identical inputs always give the identical classification.
pub fn classify_geometry(
    dimensions: &Dimensions,
    volume: f64,
    surface_area: f64,
) -> GeometryClassification {
    let width = dimensions.width * 10.0;
    let depth = dimensions.depth * 10.0;
    let height = dimensions.height * 10.0;

    let aspect_ratio = AspectRatio {
        xy: width / depth.max(MIN_EXTENT_MM),
        xz: width / height.max(MIN_EXTENT_MM),
        yz: height / depth.max(MIN_EXTENT_MM),
    };

    let bounding_volume = width * depth * height;
    let cube_side = bounding_volume.max(0.0).cbrt();
    let cube_surface = 6.0 * cube_side * cube_side;
    let surface_complexity = if cube_surface > 0.0 {
        (surface_area / cube_surface * 5.0).min(10.0)
    } else {
        0.0
    };

    let wall_thickness_ratio = if surface_area > 0.0 {
        volume / surface_area
    } else {
        0.0
    };

    let layer_density = if height > 0.0 {
        volume / (height / NOMINAL_LAYER_HEIGHT)
    } else {
        0.0
    };

    let geometry_type = if aspect_ratio.yz > 5.0 && wall_thickness_ratio < 1.5 {
        GeometryType::ThinTall
    } else if aspect_ratio.yz < 0.3 && (0.5..=2.0).contains(&aspect_ratio.xy) {
        GeometryType::WideShort
    } else if width > 150.0 && depth > 150.0 && height > 100.0 {
        GeometryType::Large
    } else if wall_thickness_ratio < 0.8 && volume < bounding_volume * 0.4 {
        GeometryType::Hollow
    } else if surface_complexity > 4.0 {
        GeometryType::Complex
    } else {
        GeometryType::Compact
    };

    GeometryClassification {
        geometry_type,
        aspect_ratio,
        surface_complexity,
        wall_thickness_ratio,
        layer_density,
        recommendation: recommendation(geometry_type).to_string(),
    }
}

fn recommendation(geometry_type: GeometryType) -> &'static str {
    match geometry_type {
        GeometryType::ThinTall => {
            "Tall slender part: print slowly, consider a brim and extra perimeters for stiffness."
        }
        GeometryType::WideShort => {
            "Wide flat part: watch first-layer adhesion and warping at the corners."
        }
        GeometryType::Large => {
            "Large part: long print, check the build volume and plan for travel-heavy layers."
        }
        GeometryType::Hollow => {
            "Thin-walled part: little infill is needed, walls dominate the print."
        }
        GeometryType::Complex => {
            "Detailed surface: expect many retractions and slower perimeters."
        }
        GeometryType::Compact => "Compact part: standard settings apply.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(w: f64, d: f64, h: f64) -> Dimensions {
        Dimensions {
            width: w / 10.0,
            depth: d / 10.0,
            height: h / 10.0,
        }
    }

    #[test]
    fn test_thin_tall() {
        // 5 × 5 × 60 mm pin, walls 1 mm thick-ish
        let c = classify_geometry(&dims(5.0, 5.0, 60.0), 600.0, 1250.0);
        assert_eq!(c.geometry_type, GeometryType::ThinTall);
        assert!(c.aspect_ratio.yz > 5.0);
    }

    #[test]
    fn test_wide_short() {
        let c = classify_geometry(&dims(100.0, 80.0, 10.0), 80_000.0, 19_600.0);
        assert_eq!(c.geometry_type, GeometryType::WideShort);
    }

    #[test]
    fn test_large() {
        let c = classify_geometry(&dims(200.0, 180.0, 120.0), 4_320_000.0, 158_400.0);
        assert_eq!(c.geometry_type, GeometryType::Large);
    }

    #[test]
    fn test_hollow() {
        // 50 mm cube shell, 0.5 mm walls
        let c = classify_geometry(&dims(50.0, 50.0, 50.0), 7_500.0, 15_000.0);
        assert_eq!(c.geometry_type, GeometryType::Hollow);
    }

    #[test]
    fn test_solid_cube_is_complex() {
        // A solid cube has exactly the bounding-cube surface: 600/600 × 5 = 5.
        let c = classify_geometry(&dims(10.0, 10.0, 10.0), 1000.0, 600.0);
        assert!((c.surface_complexity - 5.0).abs() < 1e-9);
        assert_eq!(c.geometry_type, GeometryType::Complex);
    }

    #[test]
    fn test_sphere_like_is_compact() {
        // r = 10 mm sphere: V ≈ 4189, A ≈ 1257, bounding cube 20 mm
        let c = classify_geometry(&dims(20.0, 20.0, 20.0), 4188.8, 1256.6);
        assert_eq!(c.geometry_type, GeometryType::Compact);
        assert!(c.surface_complexity < 4.0);
    }

    #[test]
    fn test_complexity_capped() {
        let c = classify_geometry(&dims(10.0, 10.0, 10.0), 900.0, 100_000.0);
        assert_eq!(c.surface_complexity, 10.0);
    }

    #[test]
    fn test_deterministic() {
        let d = dims(42.0, 17.0, 33.0);
        let a = classify_geometry(&d, 12_345.0, 6_789.0);
        let b = classify_geometry(&d, 12_345.0, 6_789.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_multiplier_table() {
        let m = GeometryType::Complex.multipliers();
        assert_eq!(m.perimeter, 1.1);
        assert_eq!(m.travel, 1.25);
        assert_eq!(m.retractions, 1.4);
        assert_eq!(m.infill, 1.0);
        assert_eq!(GeometryType::Compact.multipliers(), FeatureMultipliers::default());
    }
}
