//! Tracing conventions for hashdex.
//!
//! The library emits spans and events through `tracing` but never installs a
//! subscriber; consumers bring their own. This module pins the target prefix
//! and the span/field names so logs stay queryable across versions.

use tracing::Level;

/// Target prefix used by all hashdex tracing events.
///
/// Filter with:
/// ```text
/// RUST_LOG=hashdex=debug
/// ```
pub const TARGET_PREFIX: &str = "hashdex";

/// Standard span names used across the matching pipeline.
pub mod span_names {
    /// Hashing a vector into weighted codes.
    pub const HASH: &str = "hashdex::hash";
    /// Candidate selection over one partition.
    pub const SELECT: &str = "hashdex::select";
    /// Multi-partition search and merge.
    pub const SEARCH: &str = "hashdex::search";
}

/// Standard structured field names used in tracing events.
pub mod field_names {
    pub const DIMENSION: &str = "dimension";
    pub const TABLES: &str = "tables";
    pub const HASH_LENGTH: &str = "hash_length";
    pub const CANDIDATES: &str = "candidates";
    pub const PARTITION: &str = "partition";
    pub const ROUNDS: &str = "rounds";
    pub const POSTINGS_VISITED: &str = "postings_visited";
    pub const TOTAL_POSTINGS: &str = "total_postings";
    pub const THRESHOLD: &str = "threshold";
    pub const RESULT_COUNT: &str = "result_count";
}

/// Parse a log level string (case-insensitive).
///
/// Recognized values: `trace`, `debug`, `info`, `warn`, `error`.
#[must_use]
pub fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Recommended `tracing::Level` for the current environment.
///
/// Checks `HASHDEX_LOG_LEVEL` first, then falls back to the provided
/// default.
#[must_use]
pub fn level_from_env(default: Level) -> Level {
    std::env::var("HASHDEX_LOG_LEVEL")
        .ok()
        .and_then(|s| parse_level(&s))
        .unwrap_or(default)
}
