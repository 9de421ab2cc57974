//! GHG Extractor - Company emissions extraction pipeline
//!
//! Turns report text into deduplicated emission records:
//! segmentation, named entity recognition, unit pattern matching,
//! record acceptance, and fuzzy company-name deduplication.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ghg_core::Result;

pub mod builder;
pub mod dedup;
pub mod entities;
pub mod http_ner;
pub mod ner;
pub mod patterns;
pub mod pipeline;
pub mod segment;

pub use builder::RecordBuilder;
pub use dedup::{deduplicate, similarity, Deduplicator};
pub use entities::{clean_company, EntityExtractor, SentenceEntities};
pub use http_ner::HttpNer;
pub use ner::RuleBasedNer;
pub use patterns::EmissionMatcher;
pub use pipeline::{ExtractionPipeline, PipelineOutcome};
pub use segment::{segment, Segments};

/// Entity as reported by a NER capability, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    /// Capability-specific label (`ORG`, `GPE`, `LOC`, `DATE`, ...)
    pub label: String,
    /// Surface text of the grouped span
    pub text: String,
    /// Model confidence, if the capability reports one
    pub score: Option<f32>,
}

impl RawEntity {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
            score: None,
        }
    }
}

/// Canonical entity kinds the pipeline reasons about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Organization,
    Location,
    Date,
}

impl EntityKind {
    /// Map a capability label onto a canonical kind
    ///
    /// IOB prefixes (`B-`, `I-`) are ignored. Unmapped labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let upper = label.trim().to_uppercase();
        let base = upper
            .strip_prefix("B-")
            .or_else(|| upper.strip_prefix("I-"))
            .unwrap_or(&upper);

        match base {
            "ORG" | "ORGANIZATION" => Some(Self::Organization),
            "GPE" | "LOC" | "LOCATION" => Some(Self::Location),
            "DATE" => Some(Self::Date),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "ORGANIZATION",
            Self::Location => "LOCATION",
            Self::Date => "DATE",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized entity span
///
/// For `Date` spans `text` holds only the four-digit year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub kind: EntityKind,
    pub text: String,
}

/// External named-entity recognition capability
///
/// Implementations return grouped entities (adjacent tokens of one kind
/// merged into a single span) in the order they occur in the sentence.
/// A capability is constructed once and shared across sentences and
/// documents.
#[async_trait]
pub trait NerCapability: Send + Sync {
    async fn annotate(&self, sentence: &str) -> Result<Vec<RawEntity>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_normalization() {
        assert_eq!(EntityKind::from_label("ORG"), Some(EntityKind::Organization));
        assert_eq!(EntityKind::from_label("GPE"), Some(EntityKind::Location));
        assert_eq!(EntityKind::from_label("LOC"), Some(EntityKind::Location));
        assert_eq!(EntityKind::from_label("DATE"), Some(EntityKind::Date));
        assert_eq!(EntityKind::from_label("B-ORG"), Some(EntityKind::Organization));
        assert_eq!(EntityKind::from_label("i-loc"), Some(EntityKind::Location));
        assert_eq!(EntityKind::from_label("PER"), None);
        assert_eq!(EntityKind::from_label("MISC"), None);
    }

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::Organization.to_string(), "ORGANIZATION");
        assert_eq!(EntityKind::Date.as_str(), "DATE");
    }
}
