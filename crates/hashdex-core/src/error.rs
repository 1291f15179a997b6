//! Unified error type for the hashdex matching core.

/// Errors surfaced by the matching core.
///
/// Every variant carries an actionable message. Two conditions are
/// deliberately NOT errors: a partition with no matching terms yields an
/// empty candidate set, and an unsorted hash array is a documented caller
/// precondition with undefined scoring behavior rather than a signaled
/// failure.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// Query or input vector length does not match the model dimension.
    ///
    /// Fatal to the hash call that raised it; no partial codes are returned.
    #[error(
        "Dimension mismatch: model hashes {expected}-dim vectors, input has {found}-dim. Hash with the model the index was built with."
    )]
    DimensionMismatch {
        /// Dimension the model was constructed with.
        expected: usize,
        /// Dimension of the offending input vector.
        found: usize,
    },

    /// A construction-time parameter is invalid.
    #[error("Invalid config: {field} = \"{value}\" — {reason}")]
    InvalidConfig {
        /// Which field.
        field: String,
        /// The invalid value.
        value: String,
        /// Why it is invalid.
        reason: String,
    },

    /// The indexing engine failed while resolving terms or iterating
    /// postings. Propagated unchanged; fatal for that partition's query.
    #[error("Index engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl MatchError {
    /// Wrap an indexing-engine error for propagation through the core.
    pub fn engine(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Engine {
            source: Box::new(source),
        }
    }
}

/// Convenience alias used throughout the hashdex crate hierarchy.
pub type MatchResult<T> = Result<T, MatchError>;
