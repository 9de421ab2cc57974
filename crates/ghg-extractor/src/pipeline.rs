//! Pipeline driver
//!
//! text -> sentences -> {entities, emission} -> candidate -> dedup -> records
//!
//! Sentences are processed strictly in order; deduplication depends on
//! encounter order. A NER failure aborts the run and is returned as is.

use std::sync::Arc;

use ghg_core::{CandidateRecord, ExtractionConfig, FinalRecord, Result, Strictness};

use crate::builder::RecordBuilder;
use crate::dedup::deduplicate;
use crate::entities::EntityExtractor;
use crate::patterns::EmissionMatcher;
use crate::segment::segment;
use crate::NerCapability;

/// Result of running the pipeline over one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// At least one record survived deduplication
    Extracted(Vec<FinalRecord>),
    /// The document produced no records
    NoData,
}

impl PipelineOutcome {
    fn from_records(records: Vec<FinalRecord>) -> Self {
        if records.is_empty() {
            Self::NoData
        } else {
            Self::Extracted(records)
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    /// Final records; empty for `NoData`
    pub fn records(&self) -> &[FinalRecord] {
        match self {
            Self::Extracted(records) => records,
            Self::NoData => &[],
        }
    }

    pub fn into_records(self) -> Vec<FinalRecord> {
        match self {
            Self::Extracted(records) => records,
            Self::NoData => Vec::new(),
        }
    }
}

/// Composes segmentation, extraction, acceptance, and deduplication
///
/// The NER capability is injected at construction and reused for every
/// sentence of every document run through this pipeline.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    entities: EntityExtractor,
    emissions: EmissionMatcher,
    builder: RecordBuilder,
    dedup_threshold: f64,
}

impl ExtractionPipeline {
    /// Build a pipeline from configuration
    pub fn new(ner: Arc<dyn NerCapability>, config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            entities: EntityExtractor::new(ner).with_year_fallback(config.year_fallback),
            emissions: EmissionMatcher::new(&config.emission_units[..])?,
            builder: RecordBuilder::new(config.strictness),
            dedup_threshold: config.dedup_threshold,
        })
    }

    /// Lenient pipeline with the default units and threshold
    pub fn with_defaults(ner: Arc<dyn NerCapability>) -> Self {
        Self {
            entities: EntityExtractor::new(ner),
            emissions: EmissionMatcher::default(),
            builder: RecordBuilder::default(),
            dedup_threshold: crate::dedup::DEFAULT_THRESHOLD,
        }
    }

    pub fn strictness(&self) -> Strictness {
        self.builder.strictness()
    }

    /// Candidate record for a single sentence, if it is accepted
    pub async fn process_sentence(&self, sentence: &str) -> Result<Option<CandidateRecord>> {
        let entities = self.entities.extract(sentence).await?;
        let emission = self.emissions.extract(sentence);
        Ok(self.builder.build(sentence, &entities, emission))
    }

    /// All candidate records of a document, in sentence order
    pub async fn candidates(&self, text: &str) -> Result<Vec<CandidateRecord>> {
        Ok(self.scan(text).await?.1)
    }

    /// Run the full pipeline over a document
    pub async fn run(&self, text: &str) -> Result<PipelineOutcome> {
        tracing::info!(
            "Extraction started: {} chars, {} mode",
            text.len(),
            self.builder.strictness()
        );

        let (sentences, candidates) = self.scan(text).await?;
        let candidate_count = candidates.len();
        let records = deduplicate(candidates, self.dedup_threshold);

        tracing::info!(
            "Extraction finished: {} sentences, {} candidates, {} records",
            sentences,
            candidate_count,
            records.len()
        );

        Ok(PipelineOutcome::from_records(records))
    }

    /// Sentence count and accepted candidates, in order
    async fn scan(&self, text: &str) -> Result<(usize, Vec<CandidateRecord>)> {
        let mut sentences = 0usize;
        let mut candidates = Vec::new();
        for sentence in segment(text) {
            sentences += 1;
            if let Some(record) = self.process_sentence(sentence).await? {
                candidates.push(record);
            }
        }
        Ok((sentences, candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuleBasedNer;

    #[test]
    fn test_outcome_accessors() {
        let outcome = PipelineOutcome::from_records(Vec::new());
        assert!(outcome.is_no_data());
        assert!(outcome.records().is_empty());

        let outcome = PipelineOutcome::from_records(vec![FinalRecord::new("Acme Corp")]);
        assert!(!outcome.is_no_data());
        assert_eq!(outcome.into_records().len(), 1);
    }

    #[test]
    fn test_new_rejects_empty_units() {
        let config = ExtractionConfig {
            emission_units: Vec::new(),
            ..Default::default()
        };
        assert!(ExtractionPipeline::new(Arc::new(RuleBasedNer::new()), &config).is_err());
    }

    #[tokio::test]
    async fn test_process_sentence() {
        let pipeline = ExtractionPipeline::with_defaults(Arc::new(RuleBasedNer::new()));

        let record = pipeline
            .process_sentence("Acme Corp emitted 40 kilotonnes in Pune.")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.company, "Acme Corp");
        assert_eq!(record.location, "Pune");
        assert_eq!(record.emission, "40 kilotonnes");
        assert!(record.year.is_empty());

        assert!(pipeline
            .process_sentence("Emissions fell in Pune.")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_run_is_candidates_then_dedup() {
        let pipeline = ExtractionPipeline::with_defaults(Arc::new(RuleBasedNer::new()));
        let text = "Acme Corp emitted 40 kilotonnes in Pune. \
                    Later, Acme Corp reported 38 kilotonnes in Pune. \
                    Emissions fell in Mumbai. \
                    BlueWave Inc emitted 3 tonnes in Chennai.";

        let candidates = pipeline.candidates(text).await.unwrap();
        let records = pipeline.run(text).await.unwrap().into_records();

        assert_eq!(candidates.len(), 3);
        assert_eq!(records, deduplicate(candidates, crate::dedup::DEFAULT_THRESHOLD));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].emission, "40 kilotonnes");
    }
}
