//! Entity extraction
//!
//! Wraps a [`NerCapability`], maps its labels onto [`EntityKind`], and
//! reduces each sentence's spans to at most one company, location, and
//! year. Within a kind the first span wins.

use std::sync::Arc;

use ghg_core::Result;

use crate::patterns::find_year;
use crate::{EntityKind, EntitySpan, NerCapability, RawEntity};

/// Label fragments that NER spans over-capture from tabular layouts
const COMPANY_STOP_MARKERS: &[&str] = &["Location", "Carbon Emissions", "\u{2022}"];

/// Strip over-captured label text from a company name
///
/// Everything from the first `Location`, `Carbon Emissions`, or bullet
/// onward is dropped, then surrounding whitespace is trimmed.
pub fn clean_company(name: &str) -> String {
    let cut = COMPANY_STOP_MARKERS
        .iter()
        .filter_map(|marker| name.find(marker))
        .min()
        .unwrap_or(name.len());

    name[..cut].trim().to_string()
}

/// Normalize raw capability output into canonical spans
///
/// Unmapped labels and empty spans are dropped. A `DATE` span is kept
/// only if it contains a year, and is reduced to that year.
pub fn normalize(raw: Vec<RawEntity>) -> Vec<EntitySpan> {
    raw.into_iter()
        .filter_map(|entity| {
            let kind = EntityKind::from_label(&entity.label)?;
            let text = entity.text.trim();
            if text.is_empty() {
                return None;
            }

            match kind {
                EntityKind::Date => match find_year(text) {
                    Some(year) => Some(EntitySpan {
                        kind,
                        text: year.to_string(),
                    }),
                    None => {
                        tracing::trace!("Discarding DATE span without a year: {:?}", text);
                        None
                    }
                },
                _ => Some(EntitySpan {
                    kind,
                    text: text.to_string(),
                }),
            }
        })
        .collect()
}

/// The per-sentence reduction of entity spans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceEntities {
    pub company: Option<String>,
    pub location: Option<String>,
    pub year: Option<String>,
}

impl SentenceEntities {
    /// Keep the first span of each kind, in the order given
    pub fn from_spans(spans: &[EntitySpan]) -> Self {
        let mut reduced = Self::default();

        for span in spans {
            let slot = match span.kind {
                EntityKind::Organization => &mut reduced.company,
                EntityKind::Location => &mut reduced.location,
                EntityKind::Date => &mut reduced.year,
            };
            if slot.is_none() {
                *slot = Some(span.text.clone());
            }
        }

        reduced
    }

    /// Fill a missing year from a scan of the whole sentence
    pub fn with_year_fallback(mut self, sentence: &str) -> Self {
        if self.year.is_none() {
            self.year = find_year(sentence).map(str::to_string);
        }
        self
    }
}

/// Entity extractor backed by an injected NER capability
#[derive(Clone)]
pub struct EntityExtractor {
    ner: Arc<dyn NerCapability>,
    year_fallback: bool,
}

impl EntityExtractor {
    /// Create an extractor without the sentence-wide year fallback
    pub fn new(ner: Arc<dyn NerCapability>) -> Self {
        Self {
            ner,
            year_fallback: false,
        }
    }

    /// Enable or disable the sentence-wide year fallback
    pub fn with_year_fallback(mut self, enabled: bool) -> Self {
        self.year_fallback = enabled;
        self
    }

    /// Normalized spans for one sentence, in capability order
    pub async fn extract_entities(&self, sentence: &str) -> Result<Vec<EntitySpan>> {
        let raw = self.ner.annotate(sentence).await?;
        Ok(normalize(raw))
    }

    /// Company, location, and year for one sentence
    pub async fn extract(&self, sentence: &str) -> Result<SentenceEntities> {
        let spans = self.extract_entities(sentence).await?;
        let reduced = SentenceEntities::from_spans(&spans);

        if self.year_fallback {
            Ok(reduced.with_year_fallback(sentence))
        } else {
            Ok(reduced)
        }
    }
}

impl std::fmt::Debug for EntityExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityExtractor")
            .field("year_fallback", &self.year_fallback)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedNer(Vec<RawEntity>);

    #[async_trait]
    impl NerCapability for FixedNer {
        async fn annotate(&self, _sentence: &str) -> Result<Vec<RawEntity>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_clean_company() {
        assert_eq!(clean_company("Acme Corp \u{2022} Location: Mumbai"), "Acme Corp");
        assert_eq!(clean_company("Acme Corp Carbon Emissions 5 tonnes"), "Acme Corp");
        assert_eq!(clean_company("  Acme Corp Location"), "Acme Corp");
        assert_eq!(clean_company("\u{2022} Acme Corp"), "");
        assert_eq!(clean_company("GreenTech Ltd"), "GreenTech Ltd");
    }

    #[test]
    fn test_normalize_drops_unusable_spans() {
        let spans = normalize(vec![
            RawEntity::new("PER", "Jane Doe"),
            RawEntity::new("DATE", "last year"),
            RawEntity::new("DATE", "fiscal 2021"),
            RawEntity::new("GPE", " Mumbai "),
            RawEntity::new("ORG", "   "),
        ]);

        assert_eq!(
            spans,
            vec![
                EntitySpan {
                    kind: EntityKind::Date,
                    text: "2021".to_string()
                },
                EntitySpan {
                    kind: EntityKind::Location,
                    text: "Mumbai".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_first_match_wins() {
        let spans = normalize(vec![
            RawEntity::new("ORG", "Acme Corp"),
            RawEntity::new("LOC", "Pune"),
            RawEntity::new("ORG", "Globex Inc"),
            RawEntity::new("DATE", "2018"),
            RawEntity::new("LOC", "Delhi"),
            RawEntity::new("DATE", "2022"),
        ]);
        let reduced = SentenceEntities::from_spans(&spans);

        assert_eq!(reduced.company.as_deref(), Some("Acme Corp"));
        assert_eq!(reduced.location.as_deref(), Some("Pune"));
        assert_eq!(reduced.year.as_deref(), Some("2018"));
    }

    #[test]
    fn test_year_fallback_only_fills_missing_year() {
        let reduced = SentenceEntities::default().with_year_fallback("Reported in 2017.");
        assert_eq!(reduced.year.as_deref(), Some("2017"));

        let reduced = SentenceEntities {
            year: Some("2020".to_string()),
            ..Default::default()
        }
        .with_year_fallback("Reported in 2017.");
        assert_eq!(reduced.year.as_deref(), Some("2020"));
    }

    #[tokio::test]
    async fn test_extractor_fallback_toggle() {
        let ner = Arc::new(FixedNer(vec![RawEntity::new("ORG", "Acme Corp")]));
        let sentence = "Acme Corp reported 4 tonnes in 2016.";

        let plain = EntityExtractor::new(ner.clone());
        assert_eq!(plain.extract(sentence).await.unwrap().year, None);

        let with_fallback = EntityExtractor::new(ner).with_year_fallback(true);
        assert_eq!(
            with_fallback.extract(sentence).await.unwrap().year.as_deref(),
            Some("2016")
        );
    }
}
