//! # hashdex
//!
//! Approximate nearest-neighbor matching for inverted-index engines:
//! vectors become a handful of weighted locality-sensitive hash codes,
//! the codes become index terms, and top-K retrieval becomes a synchronized
//! scan over the matching posting lists.
//!
//! The core is deliberately engine-agnostic. The host engine supplies
//! postings through the [`IndexPartition`] trait; hashdex supplies the
//! hashing model, the bounded top-K candidate scan with its early-exit
//! heuristic, and lazy final scoring through a pluggable [`ScoreFunction`].
//!
//! # Architecture
//!
//! ```text
//!  Index time                         Query time
//!  ──────────                         ──────────
//!  vector ─► AngularLshModel ─►       vector ─► AngularLshModel
//!            HashAndFreq codes                      │
//!                 │                                 ▼
//!                 ▼                          HashMatcher ──► per partition:
//!        one indexed term per code           CandidateSelector scan
//!        (weight = doc frequency)                   │
//!                                                   ▼
//!                                     PartitionScorer (sorted candidates,
//!                                     lazy ScoreFunction)  ─► caller merge
//!                                     (or the bundled Searcher)
//! ```
//!
//! ## Crate Layout
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | `hashdex-core` | Types, traits, errors, config, tracing conventions |
//! | `hashdex-lsh` | Bit-packed code writer + angular LSH model |
//! | `hashdex-query` | Candidate selector, matcher, in-memory reference engine |
//! | `hashdex` | Facade: re-exports, prelude, multi-partition [`Searcher`] |
//!
//! # Quick Start
//!
//! ```rust
//! use hashdex::prelude::*;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! // One model instance serves both index time and query time.
//! let mut rng = StdRng::seed_from_u64(42);
//! let model = AngularLshModel::new(8, 4, 8, &mut rng).expect("model");
//!
//! // Index a small corpus through the in-memory reference engine.
//! let corpus: Vec<Vec<f32>> = vec![
//!     vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
//!     vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
//!     vec![0.9, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
//! ];
//! let index = MemoryIndex::index_vectors("vec", &model, &corpus, 2).expect("index");
//!
//! // Search near the first document.
//! let searcher = Searcher::new(MatchConfig::default()).expect("searcher");
//! let hits = searcher
//!     .search_vector(
//!         index.partitions(),
//!         "vec",
//!         &model,
//!         &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
//!         MatchCountSource,
//!         3,
//!     )
//!     .expect("search");
//! assert!(!hits.is_empty());
//! assert_eq!((hits[0].partition, hits[0].doc_id), (0, 0));
//! ```
//!
//! # Guarantees and tradeoffs
//!
//! - Hashing is deterministic per model instance and invariant under
//!   positive scaling of the input (angular similarity).
//! - With `MatchConfig::exact` (or `HASHDEX_EXACT=1`) the scan visits every
//!   posting and the per-partition candidates are the true top-K by match
//!   count.
//! - With the default early exit, scans stop once the candidate floor meets
//!   the round threshold — an approximation that trades recall for latency,
//!   because postings are consumed in doc-id order rather than score order.
//! - Scorers are valid only for the index generation they were built
//!   against; never cache them across refreshes.

pub mod searcher;

pub use hashdex_core::{
    DocId, FnScoreSource, FnScorer, HashAndFreq, MatchConfig, MatchCountScorer, MatchCountSource,
    MatchError, MatchResult, NO_MORE_DOCS, PartitionInfo, ScoredHit,
    traits::{HashingModel, IndexPartition, PostingIterator, ScoreFunction, ScoreFunctionSource},
};
pub use hashdex_lsh::{AngularLshModel, CodeWriter};
pub use hashdex_query::{
    CandidateIter, CandidateSelector, HashMatcher, MemoryIndex, MemoryPartition,
    MemoryPartitionBuilder, PartitionScorer, ScoreAccumulator, Selection,
};
pub use searcher::Searcher;

/// One-stop imports for typical usage.
pub mod prelude {
    pub use crate::searcher::Searcher;
    pub use hashdex_core::{
        DocId, FnScoreSource, FnScorer, HashAndFreq, MatchConfig, MatchCountScorer,
        MatchCountSource, MatchError, MatchResult, NO_MORE_DOCS, PartitionInfo, ScoredHit,
        traits::{HashingModel, IndexPartition, PostingIterator, ScoreFunction,
                 ScoreFunctionSource},
    };
    pub use hashdex_lsh::AngularLshModel;
    pub use hashdex_query::{HashMatcher, MemoryIndex, MemoryPartitionBuilder, PartitionScorer};
}
