//! Analysis entry points.
//!
//! `analyze` composes parse → orient → classify → estimate and fails hard
//! on bad input. `detect_supports` answers the yes/no support question and
//! never fails.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vcad_quote_mesh::{
    bounding_box, parse_stl, surface_area, volume as mesh_volume, Dimensions, TriangleMesh,
};

use crate::classify::{classify_geometry, GeometryClassification, GeometryType};
use crate::config::QuoteSettings;
use crate::error::{QuoteError, Result};
use crate::estimate::{
    estimate, CalibrationIndex, CalibrationSource, CostBreakdown, EstimateInput, TimeBreakdown,
    VolumeBreakdown,
};
use crate::orientation::{optimize_orientation, CandidateSource};
use crate::overhang::{OverhangAnalysis, OverhangSettings};
use crate::risk::{self, score_support_risk, SupportDetectionResult};
use crate::source::QuoteDataSource;

/// What to quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Material name, matched case-insensitively.
    pub material: String,
    /// Units ordered; zero counts as one.
    pub quantity: u32,
    /// Print with supports.
    pub supports: bool,
    /// Search for the best orientation instead of printing as uploaded.
    pub auto_orient: bool,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            material: "PLA".into(),
            quantity: 1,
            supports: false,
            auto_orient: true,
        }
    }
}

/// Chosen orientation, as reported with a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationSummary {
    /// Candidate that won.
    pub source: CandidateSource,
    /// Its composite score.
    pub score: f64,
    /// Its overhang share.
    pub overhang_percentage: f64,
    /// Its base stability.
    pub base_stability: f64,
    /// Candidates evaluated.
    pub candidates_evaluated: usize,
}

/// Intermediate values behind a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisBreakdown {
    /// Geometry classification of the oriented part.
    pub classification: GeometryClassification,
    /// Orientation search result, if it ran.
    pub orientation: Option<OrientationSummary>,
    /// Volume decomposition (mm³).
    pub volumes: VolumeBreakdown,
    /// Model time components (s).
    pub time: TimeBreakdown,
    /// Overhang statistics, when supports were requested.
    pub overhangs: Option<OverhangAnalysis>,
    /// Source of weight and time.
    pub calibration: CalibrationSource,
    /// Per-unit cost build-up.
    pub costs: CostBreakdown,
}

/// A finished quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Part volume (cm³).
    pub volume_cm3: f64,
    /// Filament weight per unit (g).
    pub weight_grams: f64,
    /// Oriented bounding dimensions (cm).
    pub dimensions: Dimensions,
    /// Part type.
    pub geometry_type: GeometryType,
    /// Resolved material name.
    pub material: String,
    /// Filament cost per unit (€).
    pub material_cost: f64,
    /// Energy cost per unit (€).
    pub electricity_cost: f64,
    /// Machine wear per unit (€).
    pub machine_cost: f64,
    /// Error margin per unit (€).
    pub error_margin_cost: f64,
    /// Supplies per unit (€).
    pub supplies_cost: f64,
    /// Retail price per unit (€).
    pub subtotal: f64,
    /// Print time per unit (h).
    pub estimated_time_hours: f64,
    /// Order total (€).
    pub estimated_total: f64,
    /// Units quoted.
    pub quantity: u32,
    /// Intermediate values.
    pub breakdown: AnalysisBreakdown,
}

/// Quote an STL file.
///
/// Reads settings and calibration once from `source`. Fails on an
/// unparseable buffer or missing settings; nothing partial is returned.
pub fn analyze(
    stl: &[u8],
    request: &AnalysisRequest,
    source: &dyn QuoteDataSource,
) -> Result<AnalysisResult> {
    let settings = load_settings(source)?;
    let mesh = parse_stl(stl)?;
    info!(
        triangles = mesh.num_triangles(),
        material = %request.material,
        quantity = request.quantity,
        supports = request.supports,
        "analyzing part"
    );

    // Orient
    let overhang_settings = OverhangSettings::from(&settings.supports);
    let (oriented, orientation) = if request.auto_orient {
        let result = optimize_orientation(&mesh, &overhang_settings);
        let summary = OrientationSummary {
            source: result.best.source,
            score: result.best.score,
            overhang_percentage: result.best.overhang_percentage,
            base_stability: result.best.base_stability,
            candidates_evaluated: result.candidates.len(),
        };
        (result.oriented_mesh, Some(summary))
    } else {
        (mesh.placed_on_bed(), None)
    };

    // Classify
    let classification = classify(&oriented);
    debug!(geometry_type = %classification.geometry_type, "classified part");

    // Estimate
    let material = settings.material(&request.material);
    let profile = source.calibration_profile(&material.name, classification.geometry_type);
    let index = CalibrationIndex::new(source.calibration_records());

    let result = estimate(&EstimateInput {
        mesh: &oriented,
        classification: &classification,
        material: &material,
        settings: &settings,
        supports: request.supports,
        quantity: request.quantity,
        calibration: &index,
        profile: profile.as_ref(),
    });

    for (name, value) in [
        ("estimated_total", result.total),
        ("estimated_time_hours", result.hours),
        ("weight_grams", result.weight_grams),
    ] {
        if !value.is_finite() {
            return Err(QuoteError::NonFinite(name));
        }
    }

    Ok(AnalysisResult {
        volume_cm3: result.part.volume / 1000.0,
        weight_grams: result.weight_grams,
        dimensions: bounding_box(&oriented).dimensions(),
        geometry_type: classification.geometry_type,
        material: material.name,
        material_cost: result.costs.material,
        electricity_cost: result.costs.electricity,
        machine_cost: result.costs.machine,
        error_margin_cost: result.costs.error_margin,
        supplies_cost: settings.pricing.supplies_cost,
        subtotal: result.costs.retail,
        estimated_time_hours: result.hours,
        estimated_total: result.total,
        quantity: request.quantity.max(1),
        breakdown: AnalysisBreakdown {
            classification,
            orientation,
            volumes: result.volumes,
            time: result.time,
            overhangs: result.overhangs,
            calibration: result.calibration,
            costs: result.costs,
        },
    })
}

/// Decide whether a part needs supports.
///
/// Any failure (unparseable file, missing settings, degenerate
/// measurements) is logged and answered with "no supports, low
/// confidence".
pub fn detect_supports(
    stl: &[u8],
    material: &str,
    source: &dyn QuoteDataSource,
) -> SupportDetectionResult {
    match try_detect_supports(stl, material, source) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "support detection failed, assuming no supports");
            SupportDetectionResult::degraded(e)
        }
    }
}

fn try_detect_supports(
    stl: &[u8],
    material: &str,
    source: &dyn QuoteDataSource,
) -> Result<SupportDetectionResult> {
    let settings = load_settings(source)?;
    let mesh = parse_stl(stl)?;
    let detection = &settings.support_detection;

    let oriented = optimize_orientation(&mesh, &OverhangSettings::from(&settings.supports))
        .oriented_mesh;
    let input = risk::measure(&oriented, material, settings.print.layer_height, detection);
    if !input.overhang_percentage.is_finite() {
        return Err(QuoteError::NonFinite("overhang_percentage"));
    }
    if !input.max_overhang_length.is_finite() {
        return Err(QuoteError::NonFinite("max_overhang_length"));
    }

    let scored = score_support_risk(&input, detection);
    debug!(
        risk_score = scored.risk_score,
        needs_supports = scored.needs_supports,
        confidence = %scored.confidence,
        "support risk scored"
    );

    Ok(SupportDetectionResult {
        needs_supports: scored.needs_supports,
        confidence: scored.confidence,
        overhang_percentage: input.overhang_percentage,
        reason: risk::reason(&scored, input.overhang_percentage),
        recommendations: risk::recommendations(&scored, &input),
        risk: Some(scored),
    })
}

fn load_settings(source: &dyn QuoteDataSource) -> Result<QuoteSettings> {
    let settings = source.settings().ok_or(QuoteError::ConfigurationMissing)?;
    settings.validate()?;
    Ok(settings)
}

fn classify(mesh: &TriangleMesh) -> GeometryClassification {
    classify_geometry(
        &bounding_box(mesh).dimensions(),
        mesh_volume(mesh),
        surface_area(mesh),
    )
}
