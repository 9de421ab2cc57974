//! GHG Core - Data model, configuration, and shared error types
//!
//! This crate defines the types shared by every stage of the emissions
//! extraction system:
//! - Emission records (candidate and final)
//! - Acceptance strictness
//! - Common error types
//! - Configuration management
//! - CSV table output

pub mod config;
pub mod table;

pub use config::{
    AppConfig, ConfigError, ExtractionConfig, GeocoderConfig, LoggingConfig, MapConfig,
    NerBackend, NerConfig,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for extraction operations
#[derive(Error, Debug)]
pub enum GhgError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("NER error: {0}")]
    NerError(String),

    #[error("Document parse error: {0}")]
    ParseError(String),

    #[error("Geocoding error: {0}")]
    GeocodeError(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for GhgError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GhgError>;

// ============================================================================
// Acceptance Policy
// ============================================================================

/// How much evidence a sentence must carry before it becomes a record
///
/// - `Lenient`: a company plus any one of year, location, or emission
/// - `Strict`: a cleaned company plus both year and location
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    #[default]
    Lenient,
    Strict,
}

impl Strictness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

impl std::fmt::Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Strictness {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(ConfigError::InvalidValue {
                key: "GHG_STRICTNESS".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// One company-emissions row extracted from a single sentence
///
/// Every field is a plain string; an empty string means "unknown". The
/// serialized column names match the CSV header written by [`table`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionRecord {
    /// Company name (never empty on a built record)
    #[serde(rename = "Company Name")]
    pub company: String,

    /// Four-digit reporting year
    #[serde(rename = "Year", default)]
    pub year: String,

    /// Place name as written in the source
    #[serde(rename = "Location", default)]
    pub location: String,

    /// Emission quantity and unit, verbatim
    #[serde(rename = "Carbon Emission", default)]
    pub emission: String,
}

impl EmissionRecord {
    /// Create a record for a company with all other fields unknown
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            ..Default::default()
        }
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = year.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_emission(mut self, emission: impl Into<String>) -> Self {
        self.emission = emission.into();
        self
    }

    /// Whether any of year, location, or emission is known
    pub fn has_detail(&self) -> bool {
        !self.year.is_empty() || !self.location.is_empty() || !self.emission.is_empty()
    }
}

/// A record produced by the record builder, before deduplication
pub type CandidateRecord = EmissionRecord;

/// A record that survived deduplication
pub type FinalRecord = EmissionRecord;

// ============================================================================
// Tests
// ============================================================================
