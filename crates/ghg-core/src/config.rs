//! GHG Configuration Management
//!
//! Handles configuration from environment variables and TOML config files,
//! with defaults that reproduce the lenient extraction behavior.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::Strictness;

/// Emission units recognised when no override is configured
pub const DEFAULT_EMISSION_UNITS: &[&str] = &[
    "MtCO2e",
    "million tonnes",
    "tons",
    "tonnes",
    "kilotonnes",
    "kgCO2",
];

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction pipeline configuration
    pub extraction: ExtractionConfig,

    /// NER capability configuration
    pub ner: NerConfig,

    /// Geocoding client configuration
    pub geocoder: GeocoderConfig,

    /// Map rendering configuration
    pub map: MapConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Extraction
        if let Ok(strictness) = std::env::var("GHG_STRICTNESS") {
            self.extraction.strictness = strictness.parse()?;
        }
        if let Ok(fallback) = std::env::var("GHG_YEAR_FALLBACK") {
            self.extraction.year_fallback = parse_bool("GHG_YEAR_FALLBACK", &fallback)?;
        }
        if let Ok(threshold) = std::env::var("GHG_DEDUP_THRESHOLD") {
            self.extraction.dedup_threshold =
                threshold.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "GHG_DEDUP_THRESHOLD".to_string(),
                    value: threshold,
                })?;
        }

        // NER
        if let Ok(backend) = std::env::var("NER_BACKEND") {
            self.ner.backend = backend.parse()?;
        }
        if let Ok(endpoint) = std::env::var("NER_ENDPOINT") {
            self.ner.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("NER_MODEL") {
            self.ner.model = model;
        }
        if let Ok(token) = std::env::var("NER_API_TOKEN") {
            self.ner.api_token = Some(token);
        }

        // Geocoder
        if let Ok(url) = std::env::var("NOMINATIM_URL") {
            self.geocoder.base_url = url;
        }
        if let Ok(agent) = std::env::var("GEOCODER_USER_AGENT") {
            self.geocoder.user_agent = agent;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Check values that serde cannot constrain
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.extraction.dedup_threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ConfigError::InvalidValue {
                key: "extraction.dedup_threshold".to_string(),
                value: threshold.to_string(),
            });
        }
        if self.extraction.emission_units.iter().all(|u| u.trim().is_empty()) {
            return Err(ConfigError::MissingRequired(
                "extraction.emission_units".to_string(),
            ));
        }
        if self.ner.backend == NerBackend::Http && self.ner.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingRequired("ner.endpoint".to_string()));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Extraction pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Acceptance policy for candidate records
    pub strictness: Strictness,

    /// Scan the whole sentence for a year when no DATE span carries one
    pub year_fallback: bool,

    /// Company-name similarity (0-100) above which a record is a duplicate
    pub dedup_threshold: f64,

    /// Emission unit phrases; whitespace inside a phrase is flexible
    pub emission_units: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strictness: Strictness::Lenient,
            year_fallback: false,
            dedup_threshold: 90.0,
            emission_units: DEFAULT_EMISSION_UNITS
                .iter()
                .map(|u| u.to_string())
                .collect(),
        }
    }
}

/// NER capability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    /// Which NER implementation to construct
    pub backend: NerBackend,

    /// Token-classification endpoint for the HTTP backend
    pub endpoint: String,

    /// Model identifier appended to the endpoint
    pub model: String,

    /// Bearer token for the endpoint
    pub api_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            backend: NerBackend::Rules,
            endpoint: "https://api-inference.huggingface.co/models".to_string(),
            model: "dslim/bert-base-NER".to_string(),
            api_token: None,
            timeout_secs: 30,
        }
    }
}

/// Supported NER backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NerBackend {
    Rules,
    Http,
}

impl std::str::FromStr for NerBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rules" | "rule" => Ok(Self::Rules),
            "http" => Ok(Self::Http),
            _ => Err(ConfigError::InvalidValue {
                key: "NER_BACKEND".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Geocoding client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Nominatim base URL
    pub base_url: String,

    /// User-Agent sent with every request (required by Nominatim policy)
    pub user_agent: String,

    /// Attempts made when a request times out
    pub retries: u32,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Pause between timed-out attempts
    pub retry_delay_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "company_location_plotter".to_string(),
            retries: 3,
            timeout_secs: 10,
            retry_delay_ms: 2000,
        }
    }
}

/// Map rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Initial map centre latitude
    pub center_lat: f64,

    /// Initial map centre longitude
    pub center_lon: f64,

    /// Initial zoom level
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        // Centred on India
        Self {
            center_lat: 20.5937,
            center_lon: 78.9629,
            zoom: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Environment variables are process-wide; tests touching them run one at a time
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "GHG_STRICTNESS",
        "GHG_YEAR_FALLBACK",
        "GHG_DEDUP_THRESHOLD",
        "NER_BACKEND",
        "NER_ENDPOINT",
        "NER_MODEL",
        "NER_API_TOKEN",
        "NOMINATIM_URL",
        "GEOCODER_USER_AGENT",
        "LOG_LEVEL",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.extraction.strictness, Strictness::Lenient);
        assert!(!config.extraction.year_fallback);
        assert_eq!(config.extraction.dedup_threshold, 90.0);
        assert_eq!(config.extraction.emission_units.len(), 6);
        assert_eq!(config.ner.backend, NerBackend::Rules);
        assert_eq!(config.geocoder.retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ner_backend_parse() {
        assert_eq!("rules".parse::<NerBackend>().unwrap(), NerBackend::Rules);
        assert_eq!("HTTP".parse::<NerBackend>().unwrap(), NerBackend::Http);
        assert!("bert".parse::<NerBackend>().is_err());
    }

    #[test]
    fn test_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[extraction]\nstrictness = \"strict\"\nyear_fallback = true\n\n[map]\nzoom = 3"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.extraction.strictness, Strictness::Strict);
        assert!(config.extraction.year_fallback);
        assert_eq!(config.extraction.dedup_threshold, 90.0);
        assert_eq!(config.map.zoom, 3);
        assert_eq!(config.map.center_lat, 20.5937);
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = AppConfig::default();
        config.extraction.dedup_threshold = 120.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut config = AppConfig::default();
        config.extraction.emission_units = vec![" ".to_string()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[extraction]\nstrictness = \"lenient\"\ndedup_threshold = 80.0\n\n\
             [ner]\nbackend = \"rules\"\nmodel = \"file-model\"\n\n\
             [logging]\nlevel = \"warn\""
        )
        .unwrap();

        std::env::set_var("GHG_STRICTNESS", "strict");
        std::env::set_var("GHG_YEAR_FALLBACK", "yes");
        std::env::set_var("GHG_DEDUP_THRESHOLD", "95");
        std::env::set_var("NER_BACKEND", "http");
        std::env::set_var("NER_API_TOKEN", "hf_token");
        std::env::set_var("NOMINATIM_URL", "http://localhost:8080");
        std::env::set_var("LOG_LEVEL", "debug");

        // The file alone does not see the environment
        let from_file = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(from_file.extraction.strictness, Strictness::Lenient);
        assert_eq!(from_file.extraction.dedup_threshold, 80.0);

        let config = from_file.with_env_override().unwrap();
        clear_env();

        assert_eq!(config.extraction.strictness, Strictness::Strict);
        assert!(config.extraction.year_fallback);
        assert_eq!(config.extraction.dedup_threshold, 95.0);
        assert_eq!(config.ner.backend, NerBackend::Http);
        assert_eq!(config.ner.api_token.as_deref(), Some("hf_token"));
        assert_eq!(config.geocoder.base_url, "http://localhost:8080");
        assert_eq!(config.logging.level, "debug");
        // Keys without an override keep the file value
        assert_eq!(config.ner.model, "file-model");
    }

    #[test]
    fn test_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.extraction.strictness, Strictness::Lenient);
        assert_eq!(config.ner.model, "dslim/bert-base-NER");

        std::env::set_var("NER_MODEL", "dslim/bert-large-NER");
        std::env::set_var("GEOCODER_USER_AGENT", "ghg-test");
        let config = AppConfig::from_env();
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.ner.model, "dslim/bert-large-NER");
        assert_eq!(config.geocoder.user_agent, "ghg-test");
        assert_eq!(config.extraction.dedup_threshold, 90.0);
    }

    #[test]
    fn test_malformed_env_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let cases = [
            ("GHG_DEDUP_THRESHOLD", "high"),
            ("GHG_STRICTNESS", "loose"),
            ("GHG_YEAR_FALLBACK", "sometimes"),
            ("NER_BACKEND", "spacy"),
        ];
        for (key, value) in cases {
            std::env::set_var(key, value);
            let result = AppConfig::from_env();
            clear_env();

            match result {
                Err(ConfigError::InvalidValue { key: k, value: v }) => {
                    assert_eq!(k, key);
                    assert_eq!(v, value);
                }
                other => panic!("expected InvalidValue for {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("K", "yes").unwrap());
        assert!(!parse_bool("K", "0").unwrap());
        assert!(parse_bool("K", "maybe").is_err());
    }
}
