//! Query-time orchestration: the reusable matcher and per-partition scorer.
//!
//! A [`HashMatcher`] is built once per query from the hashed query vector
//! and reused across partitions. Each call to [`HashMatcher::scorer`] runs
//! candidate selection on one partition and wraps the result in a
//! [`PartitionScorer`]: a forward-only iterator over the sorted candidate
//! doc ids that applies the partition's score function lazily.

use hashdex_core::config::MatchConfig;
use hashdex_core::error::{MatchError, MatchResult};
use hashdex_core::traits::{IndexPartition, PartitionInfo, ScoreFunction, ScoreFunctionSource};
use hashdex_core::types::{DocId, HashAndFreq, NO_MORE_DOCS};

use crate::selector::{CandidateSelector, ScoreAccumulator, Selection};

/// A reusable top-K matcher for one hashed query vector.
///
/// Construction sorts the hash codes once, establishing the selector's
/// ordering precondition. The matcher holds no per-partition state; scorers
/// are independent and may be produced for different partitions in
/// parallel.
pub struct HashMatcher<S> {
    field: String,
    hashes: Vec<HashAndFreq>,
    candidates: usize,
    exact: bool,
    score_source: S,
}

impl<S: ScoreFunctionSource> HashMatcher<S> {
    /// Build a matcher retaining up to `candidates` docs per partition.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidConfig` when `candidates` is zero.
    pub fn new(
        field: impl Into<String>,
        mut hashes: Vec<HashAndFreq>,
        candidates: usize,
        score_source: S,
    ) -> MatchResult<Self> {
        if candidates == 0 {
            return Err(MatchError::InvalidConfig {
                field: "candidates".to_owned(),
                value: "0".to_owned(),
                reason: "at least one candidate must be requested".to_owned(),
            });
        }
        // The selector requires hash-byte order; establish it here, once.
        hashes.sort_unstable();
        Ok(Self {
            field: field.into(),
            hashes,
            candidates,
            exact: false,
            score_source,
        })
    }

    /// Build a matcher from a [`MatchConfig`] (candidate count and exact
    /// mode).
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidConfig` when the config fails
    /// validation.
    pub fn from_config(
        field: impl Into<String>,
        hashes: Vec<HashAndFreq>,
        config: &MatchConfig,
        score_source: S,
    ) -> MatchResult<Self> {
        config.validate()?;
        Self::new(field, hashes, config.candidates, score_source).map(|m| m.exact(config.exact))
    }

    /// Disable the early exit and always scan to exhaustion.
    #[must_use]
    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    /// The indexed field this matcher queries.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The candidate count (K) per partition.
    #[must_use]
    pub const fn candidates(&self) -> usize {
        self.candidates
    }

    /// The sorted query hash codes.
    #[must_use]
    pub fn hashes(&self) -> &[HashAndFreq] {
        &self.hashes
    }

    /// Scan one partition and build its scorer.
    ///
    /// `ordinal` is the partition's position in the caller's ordering; it
    /// is handed to the score-function source and reported in merged
    /// results.
    ///
    /// # Errors
    ///
    /// Engine failures during the scan and score-function construction
    /// failures propagate unchanged.
    pub fn scorer<P: IndexPartition>(
        &self,
        partition: &P,
        ordinal: usize,
    ) -> MatchResult<PartitionScorer> {
        let selection = CandidateSelector::new(&self.hashes, self.candidates)
            .exact(self.exact)
            .select(&self.field, partition)?;
        let info = PartitionInfo {
            ordinal,
            max_doc: partition.max_doc(),
        };
        let score_fn = self.score_source.score_function(&info)?;
        Ok(PartitionScorer::new(selection, score_fn))
    }
}

/// Forward-only iterator over sorted candidate doc ids.
///
/// Mirrors the engine-iterator convention: `doc_id()` reports the first
/// candidate even before the first `next_doc()` call, the first
/// `next_doc()` returns that same candidate, and both return
/// [`NO_MORE_DOCS`] forever once exhausted.
#[derive(Debug, Clone)]
pub struct CandidateIter {
    docs: Vec<DocId>,
    pos: usize,
    started: bool,
}

impl CandidateIter {
    /// An iterator over ascending candidate ids.
    #[must_use]
    pub const fn new(docs: Vec<DocId>) -> Self {
        Self {
            docs,
            pos: 0,
            started: false,
        }
    }

    /// The current document, or [`NO_MORE_DOCS`] once exhausted.
    #[must_use]
    pub fn doc_id(&self) -> DocId {
        self.docs.get(self.pos).copied().unwrap_or(NO_MORE_DOCS)
    }

    /// Step to the next document and return it.
    pub fn next_doc(&mut self) -> DocId {
        if self.started {
            if self.pos < self.docs.len() {
                self.pos += 1;
            }
        } else {
            self.started = true;
        }
        self.doc_id()
    }

    /// Step until the current document is at or past `target`.
    pub fn advance(&mut self, target: DocId) -> DocId {
        while self.doc_id() < target {
            self.next_doc();
        }
        self.doc_id()
    }

    /// Number of candidates this iterator was built over.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the iterator has no candidates at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// The underlying candidate ids, ascending.
    #[must_use]
    pub fn candidate_ids(&self) -> &[DocId] {
        &self.docs
    }
}

/// One partition's matched candidates with lazy final scoring.
///
/// The score function runs only for documents the caller actually
/// positions on — iterating past a candidate never scores it. Scorers must
/// not be cached across index-generation boundaries: postings change on
/// refresh, and a stale scorer would report candidates the new generation
/// no longer contains ([`PartitionScorer::cacheable`] is always `false`).
pub struct PartitionScorer {
    iter: CandidateIter,
    scores: ScoreAccumulator,
    score_fn: Box<dyn ScoreFunction + Send + Sync>,
    postings_visited: u64,
    early_exit: bool,
}

impl PartitionScorer {
    fn new(selection: Selection, score_fn: Box<dyn ScoreFunction + Send + Sync>) -> Self {
        Self {
            iter: CandidateIter::new(selection.candidates),
            scores: selection.scores,
            score_fn,
            postings_visited: selection.postings_visited,
            early_exit: selection.early_exit,
        }
    }

    /// The current document, or [`NO_MORE_DOCS`] once exhausted.
    #[must_use]
    pub fn doc_id(&self) -> DocId {
        self.iter.doc_id()
    }

    /// Step to the next candidate and return it.
    pub fn next_doc(&mut self) -> DocId {
        self.iter.next_doc()
    }

    /// Step until the current candidate is at or past `target`.
    pub fn advance(&mut self, target: DocId) -> DocId {
        self.iter.advance(target)
    }

    /// Final score of the current document.
    ///
    /// Only meaningful while positioned on a candidate (i.e. `doc_id()` is
    /// not [`NO_MORE_DOCS`]).
    #[must_use]
    pub fn score(&self) -> f32 {
        let doc_id = self.iter.doc_id();
        self.score_fn.score(doc_id, self.scores.get(doc_id))
    }

    /// Accumulated match count for any document in the partition.
    #[must_use]
    pub fn match_count(&self, doc_id: DocId) -> u32 {
        self.scores.get(doc_id)
    }

    /// The sorted candidate ids.
    #[must_use]
    pub fn candidate_ids(&self) -> &[DocId] {
        self.iter.candidate_ids()
    }

    /// The full score accumulator from the scan.
    #[must_use]
    pub const fn accumulator(&self) -> &ScoreAccumulator {
        &self.scores
    }

    /// Number of postings the scan consumed.
    #[must_use]
    pub const fn postings_visited(&self) -> u64 {
        self.postings_visited
    }

    /// Whether the scan stopped on the early-exit heuristic.
    #[must_use]
    pub const fn early_exit(&self) -> bool {
        self.early_exit
    }

    /// Scorers are never cacheable: candidates are only valid for the
    /// index generation they were selected against.
    #[must_use]
    pub const fn cacheable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPartitionBuilder;
    use hashdex_core::traits::{FnScoreSource, FnScorer, MatchCountSource};
    use std::sync::atomic::{AtomicU32, Ordering};

    const FIELD: &str = "vec";

    fn code(byte: u8) -> HashAndFreq {
        HashAndFreq::once(vec![byte])
    }

    fn three_doc_partition() -> crate::memory::MemoryPartition {
        // doc 0 matches codes {1,2}, doc 1 matches {1,2,3}, doc 2 matches {3}.
        let mut builder = MemoryPartitionBuilder::new(FIELD);
        builder.add_document(&[code(1), code(2)]);
        builder.add_document(&[code(1), code(2), code(3)]);
        builder.add_document(&[code(3)]);
        builder.build()
    }

    #[test]
    fn candidate_iter_walks_ascending_ids() {
        let mut iter = CandidateIter::new(vec![2, 5, 9]);
        assert_eq!(iter.doc_id(), 2);
        assert_eq!(iter.next_doc(), 2);
        assert_eq!(iter.next_doc(), 5);
        assert_eq!(iter.next_doc(), 9);
        assert_eq!(iter.next_doc(), NO_MORE_DOCS);
        assert_eq!(iter.next_doc(), NO_MORE_DOCS);
    }

    #[test]
    fn candidate_iter_empty_is_immediately_exhausted() {
        let mut iter = CandidateIter::new(Vec::new());
        assert_eq!(iter.doc_id(), NO_MORE_DOCS);
        assert_eq!(iter.next_doc(), NO_MORE_DOCS);
        assert_eq!(iter.advance(0), NO_MORE_DOCS);
        assert!(iter.is_empty());
    }

    #[test]
    fn candidate_iter_advance_lands_on_first_id_at_or_past_target() {
        let mut iter = CandidateIter::new(vec![2, 5, 9]);
        assert_eq!(iter.advance(4), 5);
        assert_eq!(iter.advance(5), 5, "advance to current is a no-op");
        assert_eq!(iter.advance(10), NO_MORE_DOCS);
    }

    #[test]
    fn candidate_iter_len_is_total_not_remaining() {
        let mut iter = CandidateIter::new(vec![1, 2]);
        iter.next_doc();
        assert_eq!(iter.len(), 2);
    }

    #[test]
    fn matcher_rejects_zero_candidates() {
        let result = HashMatcher::new(FIELD, vec![code(1)], 0, MatchCountSource);
        assert!(result.is_err());
    }

    #[test]
    fn matcher_sorts_unsorted_hashes() {
        let matcher = HashMatcher::new(
            FIELD,
            vec![code(3), code(1), code(2)],
            4,
            MatchCountSource,
        )
        .expect("matcher");
        let hashes: Vec<u8> = matcher.hashes().iter().map(|h| h.hash[0]).collect();
        assert_eq!(hashes, vec![1, 2, 3]);
    }

    #[test]
    fn scorer_iterates_candidates_with_lazy_scores() {
        let partition = three_doc_partition();
        let matcher = HashMatcher::new(
            FIELD,
            vec![code(1), code(2), code(3)],
            3,
            MatchCountSource,
        )
        .expect("matcher");
        let mut scorer = matcher.scorer(&partition, 0).expect("scorer");

        assert_eq!(scorer.candidate_ids(), &[0, 1, 2]);
        assert_eq!(scorer.next_doc(), 0);
        assert!((scorer.score() - 2.0).abs() < f32::EPSILON);
        assert_eq!(scorer.next_doc(), 1);
        assert!((scorer.score() - 3.0).abs() < f32::EPSILON);
        assert_eq!(scorer.next_doc(), 2);
        assert!((scorer.score() - 1.0).abs() < f32::EPSILON);
        assert_eq!(scorer.next_doc(), NO_MORE_DOCS);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn score_function_runs_only_for_scored_docs() {
        static CALLS: AtomicU32 = AtomicU32::new(0);
        let source = FnScoreSource(
            |_info: &PartitionInfo| -> MatchResult<Box<dyn ScoreFunction + Send + Sync>> {
                Ok(Box::new(FnScorer(|_doc: DocId, count: u32| {
                    CALLS.fetch_add(1, Ordering::Relaxed);
                    count as f32
                })))
            },
        );
        let partition = three_doc_partition();
        let matcher =
            HashMatcher::new(FIELD, vec![code(1), code(2), code(3)], 3, source).expect("matcher");
        let mut scorer = matcher.scorer(&partition, 0).expect("scorer");

        scorer.next_doc();
        scorer.score();
        scorer.next_doc();
        scorer.score();
        // The third candidate is skipped without scoring.
        assert_eq!(CALLS.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn scorer_on_unmatched_partition_is_empty() {
        let partition = three_doc_partition();
        let matcher =
            HashMatcher::new(FIELD, vec![code(99)], 5, MatchCountSource).expect("matcher");
        let scorer = matcher.scorer(&partition, 0).expect("scorer");
        assert_eq!(scorer.doc_id(), NO_MORE_DOCS);
        assert!(scorer.candidate_ids().is_empty());
    }

    #[test]
    fn scorer_exposes_accumulator_for_all_docs() {
        let partition = three_doc_partition();
        let matcher = HashMatcher::new(FIELD, vec![code(1), code(2)], 1, MatchCountSource)
            .expect("matcher");
        let scorer = matcher.scorer(&partition, 0).expect("scorer");
        // K = 1 keeps one candidate, but the accumulator covers every doc.
        assert_eq!(scorer.candidate_ids().len(), 1);
        assert_eq!(scorer.match_count(0), 2);
        assert_eq!(scorer.match_count(1), 2);
        assert_eq!(scorer.match_count(2), 0);
    }

    #[test]
    fn scorer_is_never_cacheable() {
        let partition = three_doc_partition();
        let matcher =
            HashMatcher::new(FIELD, vec![code(1)], 2, MatchCountSource).expect("matcher");
        let scorer = matcher.scorer(&partition, 0).expect("scorer");
        assert!(!scorer.cacheable());
    }

    #[test]
    fn from_config_applies_candidates_and_exact() {
        let config = MatchConfig {
            candidates: 2,
            exact: true,
            ..MatchConfig::default()
        };
        let matcher = HashMatcher::from_config(FIELD, vec![code(1)], &config, MatchCountSource)
            .expect("matcher");
        assert_eq!(matcher.candidates(), 2);

        let invalid = MatchConfig {
            candidates: 0,
            ..MatchConfig::default()
        };
        assert!(
            HashMatcher::from_config(FIELD, vec![code(1)], &invalid, MatchCountSource).is_err()
        );
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn score_source_sees_partition_info() {
        let source = FnScoreSource(
            |info: &PartitionInfo| -> MatchResult<Box<dyn ScoreFunction + Send + Sync>> {
                let ordinal = info.ordinal;
                Ok(Box::new(FnScorer(move |_doc: DocId, count: u32| {
                    count as f32 + ordinal as f32 * 100.0
                })))
            },
        );
        let partition = three_doc_partition();
        let matcher = HashMatcher::new(FIELD, vec![code(1)], 3, source).expect("matcher");
        let mut scorer = matcher.scorer(&partition, 2).expect("scorer");
        scorer.next_doc();
        assert!((scorer.score() - 201.0).abs() < f32::EPSILON);
    }
}
