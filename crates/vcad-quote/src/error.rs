//! Error types for quoting.

use thiserror::Error;
use vcad_quote_mesh::ParseError;

/// Errors that abort a quote.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// The uploaded file is not a usable STL.
    #[error("mesh parse failed: {0}")]
    Parse(#[from] ParseError),

    /// The settings resultset is entirely absent.
    #[error("quote settings are missing")]
    ConfigurationMissing,

    /// Settings are present but unusable.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings file could not be deserialized.
    #[error("settings file is malformed: {0}")]
    Config(#[from] toml::de::Error),

    /// A measurement came out NaN or infinite.
    #[error("non-finite measurement: {0}")]
    NonFinite(&'static str),
}

/// Result type for quote operations.
pub type Result<T> = std::result::Result<T, QuoteError>;
