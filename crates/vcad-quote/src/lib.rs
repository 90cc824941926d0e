#![warn(missing_docs)]

//! 3D print quoting for vcad.
//!
//! Turns an uploaded STL into a priced, timed quote: the part is oriented to
//! minimize supports, classified by shape, decomposed into printed volume,
//! weighed and timed (from measured calibration prints when one matches,
//! otherwise from a kinematic model) and priced under a minimum-price
//! policy. A separate risk scorer answers whether supports are needed.
//!
//! # Example
//!
//! ```ignore
//! use vcad_quote::{analyze, AnalysisRequest, InMemoryDataSource};
//!
//! let source = InMemoryDataSource::from_toml(&std::fs::read_to_string("quote.toml")?)?;
//! let stl = std::fs::read("bracket.stl")?;
//! let quote = analyze(&stl, &AnalysisRequest::default(), &source)?;
//!
//! println!("{:.2} € for {:.1} h", quote.estimated_total, quote.estimated_time_hours);
//! ```

pub mod analysis;
pub mod classify;
pub mod config;
pub mod error;
pub mod estimate;
pub mod orientation;
pub mod overhang;
pub mod risk;
pub mod source;

pub use analysis::{
    analyze, detect_supports, AnalysisBreakdown, AnalysisRequest, AnalysisResult,
    OrientationSummary,
};
pub use classify::{classify_geometry, GeometryClassification, GeometryType};
pub use config::{
    DetectionMode, MaterialSettings, QuoteSettings, SupportDetectionSettings,
};
pub use error::{QuoteError, Result};
pub use estimate::{
    CalibrationIndex, CalibrationProfile, CalibrationRecord, CalibrationSource, SizeCategory,
};
pub use orientation::{optimize_orientation, OrientationCandidate, OrientationResult};
pub use overhang::{estimate_overhangs, OverhangAnalysis, OverhangSettings};
pub use risk::{
    score_support_risk, Confidence, RiskInput, SupportDetectionResult, SupportRiskResult,
};
pub use source::{InMemoryDataSource, QuoteDataSource};
