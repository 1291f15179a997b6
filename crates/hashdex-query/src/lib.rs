//! Candidate selection and query orchestration for hashdex.
//!
//! This crate implements the weighted multi-term top-K scan at the heart of
//! the matching core:
//!
//! - [`CandidateSelector`] walks one posting cursor per query hash code in
//!   lock-step, accumulates per-document match scores, and keeps a bounded
//!   heap of the best settled documents, with an optional early exit.
//! - [`HashMatcher`] is the reusable query-time front door: it sorts the
//!   hash codes once and produces one [`PartitionScorer`] per partition.
//! - [`memory`] is the in-memory reference backend used by tests, benches,
//!   and examples.
//!
//! Partitions are independent: every scorer owns its accumulator, cursors,
//! and score function, so callers may scan partitions in parallel and merge
//! however they like.

pub mod matcher;
pub mod memory;
pub mod selector;

pub use matcher::{CandidateIter, HashMatcher, PartitionScorer};
pub use memory::{MemoryIndex, MemoryPartition, MemoryPartitionBuilder, MemoryPostings};
pub use selector::{CandidateSelector, ScoreAccumulator, Selection};
