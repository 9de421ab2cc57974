//! Fuzzy deduplication of records by company name
//!
//! Greedy and order-dependent: a record is dropped when its company name
//! is more similar than the threshold to any record already kept. The
//! first record seen for a company is never replaced, even by a later
//! duplicate with more fields filled in.

use ghg_core::{CandidateRecord, FinalRecord};

/// Similarity above which two company names denote the same company
pub const DEFAULT_THRESHOLD: f64 = 90.0;

/// Indel similarity on a 0-100 scale: `2 * lcs / (len_a + len_b)`
///
/// Insertions and deletions only; a substitution counts as one of each.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }

    200.0 * longest_common_subsequence(&a, &b) as f64 / total as f64
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    // Single rolling row of the LCS table
    let mut row = vec![0usize; b.len() + 1];
    for ca in a {
        let mut diagonal = 0;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// Incremental first-seen-wins deduplicator
///
/// Owns the growing list of kept records. Each offer scans every kept
/// record, so a full run is quadratic in the number of candidates.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    threshold: f64,
    kept: Vec<FinalRecord>,
}

impl Deduplicator {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            kept: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The kept record whose company is a near-duplicate of `company`
    pub fn find_duplicate(&self, company: &str) -> Option<&FinalRecord> {
        self.kept
            .iter()
            .find(|kept| similarity(company, &kept.company) > self.threshold)
    }

    /// Keep the record unless it duplicates one already kept
    ///
    /// Returns `true` when the record was kept.
    pub fn offer(&mut self, record: CandidateRecord) -> bool {
        if let Some(existing) = self.find_duplicate(&record.company) {
            tracing::debug!(
                "Dropping {:?} as a duplicate of {:?}",
                record.company,
                existing.company
            );
            return false;
        }

        self.kept.push(record);
        true
    }

    pub fn records(&self) -> &[FinalRecord] {
        &self.kept
    }

    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }

    pub fn into_records(self) -> Vec<FinalRecord> {
        self.kept
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// Deduplicate records in order, keeping the first of each company
pub fn deduplicate<I>(records: I, threshold: f64) -> Vec<FinalRecord>
where
    I: IntoIterator<Item = CandidateRecord>,
{
    let mut dedup = Deduplicator::new(threshold);
    for record in records {
        dedup.offer(record);
    }
    dedup.into_records()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn companies(records: &[FinalRecord]) -> Vec<&str> {
        records.iter().map(|r| r.company.as_str()).collect()
    }

    #[test]
    fn test_similarity_scale() {
        assert_eq!(similarity("Acme Corp", "Acme Corp"), 100.0);
        assert_eq!(similarity("", ""), 100.0);
        assert!(similarity("GreenTech Ltd", "GreenTech Ltd.") > 90.0);
        assert!(similarity("Acme Corp", "Acme Corporation") < 90.0);
        assert!(similarity("abc", "xyz") < 1.0);
        assert_eq!(similarity("Acme Corp", "Acme Corporation"), 72.0);
        assert_eq!(similarity("abc", "cab"), similarity("cab", "abc"));
    }

    #[test]
    fn test_trailing_period_is_duplicate() {
        let pairs = [
            ("Acme Corp", "Acme Corp."),
            ("BP plc", "BP plc."),
            ("Shell plc", "Shell plc."),
        ];
        for (first, second) in pairs {
            assert!(similarity(first, second) > DEFAULT_THRESHOLD, "{first} / {second}");

            let records = vec![
                CandidateRecord::new(first).with_year("2020"),
                CandidateRecord::new(second).with_year("2021"),
            ];
            let result = deduplicate(records, DEFAULT_THRESHOLD);
            assert_eq!(companies(&result), vec![first]);
        }
    }

    #[test]
    fn test_first_seen_wins() {
        let records = vec![
            CandidateRecord::new("Reliance Industries Ltd").with_year("2020"),
            CandidateRecord::new("Tata Steel"),
            CandidateRecord::new("Reliance Industries Ltd.")
                .with_year("2021")
                .with_location("Jamnagar")
                .with_emission("30 MtCO2e"),
        ];

        let result = deduplicate(records, DEFAULT_THRESHOLD);
        assert_eq!(companies(&result), vec!["Reliance Industries Ltd", "Tata Steel"]);
        // The sparser first record is not upgraded
        assert_eq!(result[0].year, "2020");
        assert!(result[0].location.is_empty());
    }

    #[test]
    fn test_order_sensitivity() {
        let forward = vec![
            CandidateRecord::new("Acme Corp").with_year("2020"),
            CandidateRecord::new("Acme Corporation").with_year("2021"),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        // Loose enough that the two names count as one company
        let threshold = 50.0;
        assert_eq!(companies(&deduplicate(forward, threshold)), vec!["Acme Corp"]);
        assert_eq!(
            companies(&deduplicate(backward, threshold)),
            vec!["Acme Corporation"]
        );
    }

    #[test]
    fn test_distinct_names_survive_default_threshold() {
        let records = vec![
            CandidateRecord::new("Acme Corp"),
            CandidateRecord::new("Acme Corporation"),
        ];
        assert_eq!(deduplicate(records, DEFAULT_THRESHOLD).len(), 2);
    }

    #[test]
    fn test_incremental_offer() {
        let mut dedup = Deduplicator::default();
        assert!(dedup.is_empty());
        assert!(dedup.offer(CandidateRecord::new("GreenTech Ltd")));
        assert!(!dedup.offer(CandidateRecord::new("GreenTech Ltd.")));
        assert!(dedup.offer(CandidateRecord::new("BlueWave Inc")));

        assert_eq!(dedup.len(), 2);
        assert_eq!(
            dedup.find_duplicate("BlueWave Inc.").map(|r| r.company.as_str()),
            Some("BlueWave Inc")
        );
        assert!(dedup.find_duplicate("Globex").is_none());
    }

    proptest! {
        #[test]
        fn prop_deduplicate_is_idempotent(names in prop::collection::vec("[ab ]{0,8}", 0..20)) {
            let records: Vec<CandidateRecord> =
                names.into_iter().map(CandidateRecord::new).collect();

            let once = deduplicate(records, DEFAULT_THRESHOLD);
            let twice = deduplicate(once.clone(), DEFAULT_THRESHOLD);
            prop_assert_eq!(&once, &twice);

            for (i, a) in once.iter().enumerate() {
                for b in &once[i + 1..] {
                    prop_assert!(similarity(&a.company, &b.company) <= DEFAULT_THRESHOLD);
                }
            }
        }
    }
}
