//! Pattern-based extraction of emission quantities and years
//!
//! Emission strings are returned exactly as they appear in the sentence;
//! no unit conversion or numeric parsing is done.

use once_cell::sync::Lazy;
use regex::Regex;

use ghg_core::config::DEFAULT_EMISSION_UNITS;
use ghg_core::{GhgError, Result};

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)((?:19|20)\d{2})(?:\D|$)").expect("valid regex"));

/// First four-digit year (1900-2099) in the text
///
/// The year must not be part of a longer digit run, but may touch
/// letters ("FY2022").
pub fn find_year(text: &str) -> Option<&str> {
    YEAR.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Case-insensitive matcher for "<number> <unit>" emission quantities
///
/// The number is 1-3 digits with an optional decimal fraction; the unit
/// comes from a closed vocabulary.
#[derive(Debug, Clone)]
pub struct EmissionMatcher {
    regex: Regex,
}

impl EmissionMatcher {
    /// Build a matcher for the given unit phrases
    ///
    /// Whitespace inside a phrase matches any run of whitespace; all
    /// other characters match literally. Longer phrases are tried first.
    pub fn new<S: AsRef<str>>(units: &[S]) -> Result<Self> {
        let mut alternatives: Vec<String> = units
            .iter()
            .map(|u| {
                u.as_ref()
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .filter(|alt| !alt.is_empty())
            .collect();

        if alternatives.is_empty() {
            return Err(GhgError::ConfigError(
                "at least one emission unit is required".to_string(),
            ));
        }

        alternatives.sort_by_key(|alt| std::cmp::Reverse(alt.len()));
        alternatives.dedup();

        let pattern = format!(
            r"(?i)\b\d{{1,3}}(?:\.\d+)?\s*(?:{})\b",
            alternatives.join("|")
        );
        let regex = Regex::new(&pattern)
            .map_err(|e| GhgError::ConfigError(format!("invalid emission pattern: {e}")))?;

        Ok(Self { regex })
    }

    /// First emission quantity in the sentence, verbatim
    pub fn extract<'a>(&self, sentence: &'a str) -> Option<&'a str> {
        self.regex.find(sentence).map(|m| m.as_str())
    }
}

impl Default for EmissionMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_EMISSION_UNITS).expect("default units compile")
    }
}
