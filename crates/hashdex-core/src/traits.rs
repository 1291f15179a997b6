//! Trait seams of the matching core.
//!
//! - [`HashingModel`]: vector → ordered weighted hash codes. One implementor
//!   per similarity metric; no inheritance hierarchy.
//! - [`ScoreFunction`] / [`ScoreFunctionSource`]: pluggable final scoring,
//!   supplied per partition.
//! - [`IndexPartition`] / [`PostingIterator`]: the thin surface the matching
//!   core needs from the host indexing engine.
//!
//! Vector math helpers (`dot`, `magnitude`, `l2_normalize`) live here
//! alongside the traits that consume them.

use crate::error::MatchResult;
use crate::types::{DocId, HashAndFreq};

// ─── Hashing model ──────────────────────────────────────────────────────────

/// A model that deterministically turns a dense vector into weighted
/// locality-sensitive hash codes.
///
/// # Contract
///
/// - `hash()` returns the same byte-identical codes for the same model
///   state and the same (post-normalization) input vector.
/// - `hash()` never mutates the caller's vector and has no side effects
///   beyond allocation.
/// - `dimension()` is constant for the lifetime of the model; inputs of any
///   other length fail with `MatchError::DimensionMismatch` and produce no
///   partial result.
pub trait HashingModel: Send + Sync {
    /// The vector dimensionality this model was constructed for.
    fn dimension(&self) -> usize;

    /// Hash a vector into its ordered sequence of weighted codes.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::DimensionMismatch` when `vector.len()` does not
    /// equal [`Self::dimension`].
    fn hash(&self, vector: &[f32]) -> MatchResult<Vec<HashAndFreq>>;
}

// ─── Score function ─────────────────────────────────────────────────────────

/// Converts a candidate's match count into its final relevance score.
///
/// Implementations must be deterministic per instance; there is no other
/// constraint. Concrete similarity functions (cosine, Jaccard, Hamming) are
/// host concerns — the core only evaluates this contract, lazily, for
/// documents the caller actually iterates.
pub trait ScoreFunction: Send + Sync {
    /// Score one document given how many weighted query codes it matched.
    fn score(&self, doc_id: DocId, match_count: u32) -> f32;
}

/// Adapter turning any `Fn(DocId, u32) -> f32` closure into a
/// [`ScoreFunction`].
#[derive(Debug, Clone, Copy)]
pub struct FnScorer<F>(pub F);

impl<F> ScoreFunction for FnScorer<F>
where
    F: Fn(DocId, u32) -> f32 + Send + Sync,
{
    fn score(&self, doc_id: DocId, match_count: u32) -> f32 {
        (self.0)(doc_id, match_count)
    }
}

/// Reference score function: the score IS the match count.
///
/// Useful as a test double and for callers that rank purely by code overlap.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchCountScorer;

impl ScoreFunction for MatchCountScorer {
    #[allow(clippy::cast_precision_loss)]
    fn score(&self, _doc_id: DocId, match_count: u32) -> f32 {
        match_count as f32
    }
}

/// Static facts about a partition, handed to [`ScoreFunctionSource`] so a
/// score function can be built per partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionInfo {
    /// Position of the partition in the caller's partition ordering.
    pub ordinal: usize,
    /// One past the largest doc id the partition can expose.
    pub max_doc: DocId,
}

/// Builds one [`ScoreFunction`] per scanned partition.
///
/// Each partition gets its own instance; no state is shared across
/// partition boundaries.
pub trait ScoreFunctionSource: Send + Sync {
    /// Build the score function for one partition.
    ///
    /// # Errors
    ///
    /// Propagates any failure preparing per-partition scoring state.
    fn score_function(
        &self,
        partition: &PartitionInfo,
    ) -> MatchResult<Box<dyn ScoreFunction + Send + Sync>>;
}

/// Adapter turning a per-partition builder closure into a
/// [`ScoreFunctionSource`].
#[derive(Debug, Clone, Copy)]
pub struct FnScoreSource<F>(pub F);

impl<F> ScoreFunctionSource for FnScoreSource<F>
where
    F: Fn(&PartitionInfo) -> MatchResult<Box<dyn ScoreFunction + Send + Sync>> + Send + Sync,
{
    fn score_function(
        &self,
        partition: &PartitionInfo,
    ) -> MatchResult<Box<dyn ScoreFunction + Send + Sync>> {
        (self.0)(partition)
    }
}

/// A source that hands every partition the same [`MatchCountScorer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchCountSource;

impl ScoreFunctionSource for MatchCountSource {
    fn score_function(
        &self,
        _partition: &PartitionInfo,
    ) -> MatchResult<Box<dyn ScoreFunction + Send + Sync>> {
        Ok(Box::new(MatchCountScorer))
    }
}

// ─── Indexing-engine collaborator ───────────────────────────────────────────

/// Forward-only cursor over one term's posting list.
///
/// Postings are ordered by ascending doc id. Exhaustion is reported
/// explicitly (`Ok(None)`); the cursor never rewinds.
pub trait PostingIterator {
    /// Number of documents in this posting list (the term's doc count).
    ///
    /// Constant for the lifetime of the cursor; used as an exact stopping
    /// bound by the selector.
    fn doc_count(&self) -> u32;

    /// Advance to the next document, or `Ok(None)` once exhausted.
    ///
    /// # Errors
    ///
    /// Engine-side read failures propagate as `MatchError::Engine`.
    fn next_doc(&mut self) -> MatchResult<Option<DocId>>;

    /// Document-level frequency at the current position.
    ///
    /// Only meaningful after `next_doc` has returned `Some`.
    fn freq(&self) -> u32;
}

/// One independently scanned shard/segment of the index.
///
/// The matching core works purely over whatever postings the partition
/// currently exposes; filtering deleted documents is the engine's concern.
pub trait IndexPartition {
    /// The posting cursor type this partition hands out.
    type Postings: PostingIterator;

    /// One past the largest doc id in this partition. Bounds the score
    /// accumulator allocation.
    fn max_doc(&self) -> DocId;

    /// Resolve the posting list for a hash code in `field`.
    ///
    /// Returns `Ok(None)` when the field or term does not exist — a
    /// non-fatal condition that simply contributes no candidates.
    ///
    /// # Errors
    ///
    /// Engine-side lookup failures propagate as `MatchError::Engine`.
    fn postings(&self, field: &str, code: &[u8]) -> MatchResult<Option<Self::Postings>>;
}

// ─── Vector math ────────────────────────────────────────────────────────────

/// Dot product of two equal-length vectors.
///
/// Callers guarantee equal lengths; mismatched inputs are truncated to the
/// shorter vector (the hashing model validates dimensions before calling).
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean magnitude of a vector.
#[must_use]
pub fn magnitude(vec: &[f32]) -> f32 {
    vec.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// L2-normalize into a fresh vector.
///
/// Zero or non-finite magnitude yields an all-zero vector of the same
/// length.
#[must_use]
pub fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm_sq: f32 = vec.iter().map(|x| x * x).sum();
    if !norm_sq.is_finite() || norm_sq < f32::EPSILON {
        return vec![0.0; vec.len()];
    }
    let inv_norm = 1.0 / norm_sq.sqrt();
    vec.iter().map(|x| x * inv_norm).collect()
}
