//! Multi-partition search convenience.
//!
//! The matching core scopes itself to one partition at a time; merging is
//! the caller's job. This module is that caller: it runs a matcher over
//! every partition — sequentially, or partition-parallel via rayon once the
//! corpus is large enough — and merges the scored hits into one
//! deterministic descending-score list. Partition scans never share mutable
//! state, so the parallel and sequential paths return identical results.

use rayon::prelude::*;

use hashdex_core::config::MatchConfig;
use hashdex_core::error::MatchResult;
use hashdex_core::tracing_config::TARGET_PREFIX;
use hashdex_core::traits::{HashingModel, IndexPartition, ScoreFunctionSource};
use hashdex_core::types::{HashAndFreq, NO_MORE_DOCS, ScoredHit};
use hashdex_query::matcher::HashMatcher;

/// Runs queries across an ordered slice of partitions.
#[derive(Debug, Clone)]
pub struct Searcher {
    config: MatchConfig,
}

impl Searcher {
    /// A searcher using the given tuning knobs.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidConfig` when the config fails
    /// validation.
    pub fn new(config: MatchConfig) -> MatchResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Match pre-hashed query codes against every partition and merge.
    ///
    /// Retains `config.candidates` docs per partition, scores them with the
    /// per-partition function from `score_source`, and returns up to
    /// `limit` hits ordered best-first (score descending, NaN last, ties by
    /// partition ordinal then doc id).
    ///
    /// # Errors
    ///
    /// Engine and score-function failures from any partition propagate
    /// unchanged; the first failure wins.
    pub fn search<P, S>(
        &self,
        partitions: &[P],
        field: &str,
        hashes: Vec<HashAndFreq>,
        score_source: S,
        limit: usize,
    ) -> MatchResult<Vec<ScoredHit>>
    where
        P: IndexPartition + Sync,
        S: ScoreFunctionSource,
    {
        let matcher = HashMatcher::from_config(field, hashes, &self.config, score_source)?;

        let total_docs: u64 = partitions.iter().map(|p| u64::from(p.max_doc())).sum();
        let threshold = u64::try_from(self.config.parallel_doc_threshold).unwrap_or(u64::MAX);
        let use_parallel = self.config.parallel && partitions.len() > 1 && total_docs >= threshold;

        let mut hits: Vec<ScoredHit> = if use_parallel {
            let per_partition: MatchResult<Vec<Vec<ScoredHit>>> = partitions
                .par_iter()
                .enumerate()
                .map(|(ordinal, partition)| collect_hits(&matcher, partition, ordinal))
                .collect();
            per_partition?.into_iter().flatten().collect()
        } else {
            let mut all = Vec::new();
            for (ordinal, partition) in partitions.iter().enumerate() {
                all.extend(collect_hits(&matcher, partition, ordinal)?);
            }
            all
        };

        hits.sort_by(ScoredHit::cmp_best_first);
        hits.truncate(limit);
        tracing::debug!(
            target: TARGET_PREFIX,
            partitions = partitions.len(),
            doc_count = total_docs,
            result_count = hits.len(),
            parallel = use_parallel,
            "multi-partition search finished"
        );
        Ok(hits)
    }

    /// Hash a query vector with `model`, then [`Self::search`].
    ///
    /// # Errors
    ///
    /// Propagates `MatchError::DimensionMismatch` from hashing in addition
    /// to the failures `search` can raise.
    pub fn search_vector<P, S>(
        &self,
        partitions: &[P],
        field: &str,
        model: &dyn HashingModel,
        query: &[f32],
        score_source: S,
        limit: usize,
    ) -> MatchResult<Vec<ScoredHit>>
    where
        P: IndexPartition + Sync,
        S: ScoreFunctionSource,
    {
        let hashes = model.hash(query)?;
        self.search(partitions, field, hashes, score_source, limit)
    }
}

/// Drain one partition's scorer into scored hits.
fn collect_hits<P, S>(
    matcher: &HashMatcher<S>,
    partition: &P,
    ordinal: usize,
) -> MatchResult<Vec<ScoredHit>>
where
    P: IndexPartition,
    S: ScoreFunctionSource,
{
    let mut scorer = matcher.scorer(partition, ordinal)?;
    let mut hits = Vec::with_capacity(scorer.candidate_ids().len());
    let mut doc_id = scorer.next_doc();
    while doc_id != NO_MORE_DOCS {
        hits.push(ScoredHit {
            partition: ordinal,
            doc_id,
            score: scorer.score(),
        });
        doc_id = scorer.next_doc();
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashdex_core::traits::MatchCountSource;
    use hashdex_query::memory::{MemoryPartition, MemoryPartitionBuilder};

    const FIELD: &str = "vec";

    fn code(byte: u8) -> HashAndFreq {
        HashAndFreq::once(vec![byte])
    }

    /// Two partitions: ordinal 0 holds docs matching {2, 1} codes, ordinal
    /// 1 holds docs matching {3, 1} codes.
    fn two_partitions() -> Vec<MemoryPartition> {
        let mut first = MemoryPartitionBuilder::new(FIELD);
        first.add_document(&[code(1), code(2)]);
        first.add_document(&[code(1)]);

        let mut second = MemoryPartitionBuilder::new(FIELD);
        second.add_document(&[code(1), code(2), code(3)]);
        second.add_document(&[code(3)]);

        vec![first.build(), second.build()]
    }

    fn query() -> Vec<HashAndFreq> {
        vec![code(1), code(2), code(3)]
    }

    #[test]
    fn merged_hits_are_ordered_best_first() {
        let partitions = two_partitions();
        let searcher = Searcher::new(MatchConfig::default()).expect("searcher");
        let hits = searcher
            .search(&partitions, FIELD, query(), MatchCountSource, 10)
            .expect("search");

        let scored: Vec<(usize, u32, i64)> = hits
            .iter()
            .map(|h| {
                #[allow(clippy::cast_possible_truncation)]
                let score = h.score.round() as i64;
                (h.partition, h.doc_id, score)
            })
            .collect();
        assert_eq!(
            scored,
            vec![(1, 0, 3), (0, 0, 2), (0, 1, 1), (1, 1, 1)],
            "score desc, ties by partition then doc id"
        );
    }

    #[test]
    fn limit_truncates_merged_results() {
        let partitions = two_partitions();
        let searcher = Searcher::new(MatchConfig::default()).expect("searcher");
        let hits = searcher
            .search(&partitions, FIELD, query(), MatchCountSource, 2)
            .expect("search");
        assert_eq!(hits.len(), 2);
        assert_eq!((hits[0].partition, hits[0].doc_id), (1, 0));
    }

    #[test]
    fn parallel_and_sequential_paths_match() {
        let partitions = two_partitions();

        let sequential = Searcher::new(MatchConfig {
            parallel: false,
            ..MatchConfig::default()
        })
        .expect("searcher")
        .search(&partitions, FIELD, query(), MatchCountSource, 10)
        .expect("search");

        // Threshold 0 forces the rayon path even for this tiny corpus.
        let parallel = Searcher::new(MatchConfig {
            parallel: true,
            parallel_doc_threshold: 0,
            ..MatchConfig::default()
        })
        .expect("searcher")
        .search(&partitions, FIELD, query(), MatchCountSource, 10)
        .expect("search");

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn no_matches_anywhere_is_empty() {
        let partitions = two_partitions();
        let searcher = Searcher::new(MatchConfig::default()).expect("searcher");
        let hits = searcher
            .search(&partitions, FIELD, vec![code(77)], MatchCountSource, 10)
            .expect("search");
        assert!(hits.is_empty());
    }

    #[test]
    fn empty_partition_slice_is_empty() {
        let partitions: Vec<MemoryPartition> = Vec::new();
        let searcher = Searcher::new(MatchConfig::default()).expect("searcher");
        let hits = searcher
            .search(&partitions, FIELD, query(), MatchCountSource, 10)
            .expect("search");
        assert!(hits.is_empty());
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = MatchConfig {
            candidates: 0,
            ..MatchConfig::default()
        };
        assert!(Searcher::new(config).is_err());
    }
}
