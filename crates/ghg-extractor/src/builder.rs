//! Record building
//!
//! Fuses one sentence's entity reduction and emission match into a
//! candidate record, or rejects the sentence.

use ghg_core::{CandidateRecord, Strictness};

use crate::entities::{clean_company, SentenceEntities};

/// Applies the acceptance policy to per-sentence signals
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordBuilder {
    strictness: Strictness,
}

impl RecordBuilder {
    pub fn new(strictness: Strictness) -> Self {
        Self { strictness }
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Build a record from one sentence, or `None` if it is not accepted
    ///
    /// - Lenient: company and at least one of year, location, emission
    /// - Strict: cleaned company, year, and location; emission optional
    pub fn build(
        &self,
        sentence: &str,
        entities: &SentenceEntities,
        emission: Option<&str>,
    ) -> Option<CandidateRecord> {
        let company = match self.strictness {
            Strictness::Lenient => entities.company.clone(),
            Strictness::Strict => entities.company.as_deref().map(clean_company),
        }
        .filter(|c| !c.is_empty());

        let Some(company) = company else {
            tracing::trace!("No company in sentence: {:?}", sentence);
            return None;
        };

        let record = CandidateRecord::new(company)
            .with_year(entities.year.clone().unwrap_or_default())
            .with_location(entities.location.clone().unwrap_or_default())
            .with_emission(emission.unwrap_or_default());

        let accepted = match self.strictness {
            Strictness::Lenient => record.has_detail(),
            Strictness::Strict => !record.year.is_empty() && !record.location.is_empty(),
        };

        if accepted {
            Some(record)
        } else {
            tracing::debug!(
                "Rejected {} candidate for {:?}: missing required fields",
                self.strictness,
                record.company
            );
            None
        }
    }
}
