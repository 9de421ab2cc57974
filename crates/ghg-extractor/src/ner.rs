//! Rule-based Named Entity Recognition
//!
//! An offline [`NerCapability`] built from regex patterns and a place
//! gazetteer:
//! - Organizations: capitalized names ending in a corporate suffix
//! - Locations: dictionary of cities, states, and countries (with aliases)
//! - Dates: bare years, month-year, and fiscal-year forms
//!
//! Overlapping matches are resolved in favour of the earliest start, then
//! the longest span, then the highest confidence. Output is in text order
//! with one span per mention, like a grouped-entity model.

use async_trait::async_trait;
use regex::Regex;

use ghg_core::Result;

use crate::{EntityKind, NerCapability, RawEntity};

const CORPORATE_SUFFIXES: &str = "Limited|Ltd|Incorporated|Inc|Corporation|Corp|Company|Co|\
    Group|Holdings|Industries|Enterprises|plc|PLC|LLC|LLP|GmbH|AG|SA";

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|\
    November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec";

/// Places recognised out of the box, with alternative spellings
const DEFAULT_PLACES: &[(&str, &[&str])] = &[
    ("Mumbai", &["Bombay"]),
    ("New Delhi", &[]),
    ("Delhi", &[]),
    ("Bengaluru", &["Bangalore"]),
    ("Chennai", &["Madras"]),
    ("Kolkata", &["Calcutta"]),
    ("Hyderabad", &[]),
    ("Pune", &[]),
    ("Ahmedabad", &[]),
    ("Jamnagar", &[]),
    ("Jamshedpur", &[]),
    ("Gujarat", &[]),
    ("Maharashtra", &[]),
    ("Odisha", &["Orissa"]),
    ("India", &[]),
    ("China", &[]),
    ("Beijing", &[]),
    ("Shanghai", &[]),
    ("Japan", &[]),
    ("Tokyo", &[]),
    ("Singapore", &[]),
    ("Indonesia", &[]),
    ("Jakarta", &[]),
    ("Australia", &[]),
    ("Sydney", &[]),
    ("United States", &["USA", "U.S."]),
    ("Texas", &[]),
    ("California", &[]),
    ("New York", &[]),
    ("Canada", &[]),
    ("Toronto", &[]),
    ("Brazil", &[]),
    ("United Kingdom", &["UK", "Britain"]),
    ("London", &[]),
    ("Germany", &[]),
    ("Berlin", &[]),
    ("France", &[]),
    ("Paris", &[]),
    ("Netherlands", &[]),
    ("Rotterdam", &[]),
    ("United Arab Emirates", &["UAE"]),
    ("Dubai", &[]),
    ("Saudi Arabia", &[]),
    ("South Africa", &[]),
    ("Johannesburg", &[]),
];

/// Capitalized words that start sentences but never start company names
const LEADING_FUNCTION_WORDS: &[&str] = &[
    "The", "In", "At", "By", "For", "From", "On", "Of", "And", "During", "While", "Since",
];

const ORG_CONFIDENCE: f32 = 0.85;
const TERM_CONFIDENCE: f32 = 0.95;
const DATE_CONFIDENCE: f32 = 0.9;
const YEAR_CONFIDENCE: f32 = 0.8;

/// Drop sentence-initial function words captured by the organization pattern
fn strip_function_words(mut surface: &str) -> &str {
    while let Some((first, rest)) = surface.split_once(char::is_whitespace) {
        if !LEADING_FUNCTION_WORDS.contains(&first) {
            break;
        }
        surface = rest.trim_start();
    }
    surface
}

/// A match before overlap resolution
#[derive(Debug, Clone)]
struct Candidate {
    kind: EntityKind,
    start: usize,
    end: usize,
    confidence: f32,
}

impl Candidate {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Rule-based NER using regex patterns and a place dictionary
pub struct RuleBasedNer {
    /// Pattern rules (regex -> entity kind)
    patterns: Vec<(Regex, EntityKind, f32)>,
    /// Dictionary rules, one regex per term or alias
    dictionary: Vec<(Regex, EntityKind, f32)>,
}

impl RuleBasedNer {
    /// Create a new rule-based NER with the default rules and places
    pub fn new() -> Self {
        let mut ner = Self::empty();
        ner.init_patterns();
        for (place, aliases) in DEFAULT_PLACES {
            ner.add_term(place, EntityKind::Location, aliases);
        }
        ner
    }

    /// Create a NER with no rules at all
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            dictionary: Vec::new(),
        }
    }

    /// Add a known place
    pub fn with_place(mut self, place: &str, aliases: &[&str]) -> Self {
        self.add_term(place, EntityKind::Location, aliases);
        self
    }

    /// Add a known organization name (for names without a corporate suffix)
    pub fn with_organization(mut self, name: &str, aliases: &[&str]) -> Self {
        self.add_term(name, EntityKind::Organization, aliases);
        self
    }

    fn init_patterns(&mut self) {
        // One to four capitalized words followed by a corporate suffix
        self.add_pattern(
            &format!(r"\b(?:[A-Z][\w&'-]*\s+){{1,4}}(?:{CORPORATE_SUFFIXES})\b"),
            EntityKind::Organization,
            ORG_CONFIDENCE,
        );

        // Month-year and fiscal-year dates
        self.add_pattern(
            &format!(r"\b(?:{MONTHS})\.?\s+(?:19|20)\d{{2}}\b"),
            EntityKind::Date,
            DATE_CONFIDENCE,
        );
        self.add_pattern(
            r"\b(?:FY|[Ff]iscal(?:\s+[Yy]ear)?)\s*(?:19|20)\d{2}(?:[-/]\d{2,4})?\b",
            EntityKind::Date,
            DATE_CONFIDENCE,
        );

        // Bare years
        self.add_pattern(r"\b(?:19|20)\d{2}\b", EntityKind::Date, YEAR_CONFIDENCE);
    }

    /// Add a regex pattern
    fn add_pattern(&mut self, pattern: &str, kind: EntityKind, confidence: f32) {
        match Regex::new(pattern) {
            Ok(regex) => self.patterns.push((regex, kind, confidence)),
            Err(e) => tracing::warn!("Skipping invalid NER pattern {:?}: {}", pattern, e),
        }
    }

    /// Add a dictionary term and its aliases
    fn add_term(&mut self, term: &str, kind: EntityKind, aliases: &[&str]) {
        for surface in std::iter::once(&term).chain(aliases.iter()) {
            // Trailing `\b` would reject terms ending in punctuation ("U.S.")
            let tail = if surface.ends_with(|c: char| c.is_alphanumeric()) {
                r"\b"
            } else {
                ""
            };
            let pattern = format!(r"\b{}{}", regex::escape(surface), tail);
            if let Ok(regex) = Regex::new(&pattern) {
                self.dictionary.push((regex, kind, TERM_CONFIDENCE));
            }
        }
    }

    fn collect(rules: &[(Regex, EntityKind, f32)], text: &str, out: &mut Vec<Candidate>) {
        for (regex, kind, confidence) in rules {
            for mat in regex.find_iter(text) {
                out.push(Candidate {
                    kind: *kind,
                    start: mat.start(),
                    end: mat.end(),
                    confidence: *confidence,
                });
            }
        }
    }

    /// Remove overlapping candidates
    fn resolve_overlaps(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.len().cmp(&a.len()))
                .then(b.confidence.total_cmp(&a.confidence))
        });

        let mut result: Vec<Candidate> = Vec::new();
        for candidate in candidates {
            let overlaps = result
                .iter()
                .any(|kept| candidate.start < kept.end && kept.start < candidate.end);
            if !overlaps {
                result.push(candidate);
            }
        }

        result.sort_by_key(|c| c.start);
        result
    }

    /// Entities in text order
    pub fn recognize(&self, text: &str) -> Vec<RawEntity> {
        let mut candidates = Vec::new();
        Self::collect(&self.patterns, text, &mut candidates);
        Self::collect(&self.dictionary, text, &mut candidates);

        Self::resolve_overlaps(candidates)
            .into_iter()
            .filter_map(|c| {
                let mut surface = &text[c.start..c.end];
                if c.kind == EntityKind::Organization {
                    surface = strip_function_words(surface);
                }
                let label = match c.kind {
                    EntityKind::Organization => "ORG",
                    EntityKind::Location => "LOC",
                    EntityKind::Date => "DATE",
                };
                (!surface.trim().is_empty()).then(|| RawEntity {
                    label: label.to_string(),
                    text: surface.to_string(),
                    score: Some(c.confidence),
                })
            })
            .collect()
    }
}

impl Default for RuleBasedNer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NerCapability for RuleBasedNer {
    async fn annotate(&self, sentence: &str) -> Result<Vec<RawEntity>> {
        Ok(self.recognize(sentence))
    }
}

// ============================================================================
// Tests
// ============================================================================
