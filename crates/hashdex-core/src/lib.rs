//! Core traits, types, and errors for the hashdex ANN matching core.
//!
//! This crate defines the shared surface used across the hashdex workspace:
//! the hashing-model and score-function seams (`HashingModel`,
//! `ScoreFunction`), the indexing-engine collaborator abstraction
//! (`IndexPartition`, `PostingIterator`), value types (`HashAndFreq`,
//! `ScoredHit`), the error type (`MatchError`), and configuration
//! (`MatchConfig`).
//!
//! It has minimal external dependencies and is depended on by every other
//! crate in the workspace.

pub mod config;
pub mod error;
pub mod tracing_config;
pub mod traits;
pub mod types;

pub use config::{DEFAULT_CANDIDATES, DEFAULT_PARALLEL_DOC_THRESHOLD, MatchConfig, parse_flag};
pub use error::{MatchError, MatchResult};
pub use traits::{
    FnScoreSource, FnScorer, HashingModel, IndexPartition, MatchCountScorer, MatchCountSource,
    PartitionInfo, PostingIterator, ScoreFunction, ScoreFunctionSource, dot, l2_normalize,
    magnitude,
};
pub use types::{DocId, HashAndFreq, NO_MORE_DOCS, ScoredHit};
