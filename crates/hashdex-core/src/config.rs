//! Configuration for the matching core.
//!
//! [`MatchConfig`] carries all tuning knobs. Defaults are sensible; override
//! selectively via struct update, environment variables, or a TOML file.

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, MatchResult};

/// Default candidate count (K) per partition.
pub const DEFAULT_CANDIDATES: usize = 64;

/// Default total-document threshold above which the multi-partition scan
/// switches to the parallel path.
pub const DEFAULT_PARALLEL_DOC_THRESHOLD: usize = 10_000;

/// Tuning knobs for candidate selection and the multi-partition searcher.
///
/// # Environment Variable Overrides
///
/// | Variable                          | Field                    | Default  |
/// |-----------------------------------|--------------------------|----------|
/// | `HASHDEX_CANDIDATES`              | `candidates`             | `64`     |
/// | `HASHDEX_EXACT`                   | `exact`                  | `false`  |
/// | `HASHDEX_PARALLEL`                | `parallel`               | `true`   |
/// | `HASHDEX_PARALLEL_DOC_THRESHOLD`  | `parallel_doc_threshold` | `10000`  |
///
/// Invalid values are silently ignored (current values are kept).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Number of candidates (K) retained per partition.
    /// Default: 64.
    pub candidates: usize,

    /// Disable the early-exit heuristic and always scan postings to
    /// exhaustion. Trades latency for exact top-K by match count.
    /// Default: false.
    pub exact: bool,

    /// Allow the multi-partition searcher to scan partitions in parallel.
    /// Within one partition the scan is always single-threaded.
    /// Default: true.
    pub parallel: bool,

    /// Minimum total document count across partitions before the parallel
    /// path is taken. Default: 10 000.
    pub parallel_doc_threshold: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES,
            exact: false,
            parallel: true,
            parallel_doc_threshold: DEFAULT_PARALLEL_DOC_THRESHOLD,
        }
    }
}

impl MatchConfig {
    /// Load overrides from process environment variables.
    ///
    /// Only overrides fields for which variables are set to valid values.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Factored out of [`Self::with_env_overrides`] so tests can exercise
    /// override parsing without mutating the process environment.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("HASHDEX_CANDIDATES")
            && let Ok(k) = val.trim().parse::<usize>()
            && k >= 1
        {
            self.candidates = k;
        }
        if let Some(val) = lookup("HASHDEX_EXACT")
            && let Some(flag) = parse_flag(&val)
        {
            self.exact = flag;
        }
        if let Some(val) = lookup("HASHDEX_PARALLEL")
            && let Some(flag) = parse_flag(&val)
        {
            self.parallel = flag;
        }
        if let Some(val) = lookup("HASHDEX_PARALLEL_DOC_THRESHOLD")
            && let Ok(threshold) = val.trim().parse::<usize>()
        {
            self.parallel_doc_threshold = threshold;
        }
        self
    }

    /// Load a config from a TOML file, falling back to defaults when the
    /// file is missing or malformed (malformed files log a warning).
    #[must_use]
    pub fn from_file(path: &std::path::Path) -> Self {
        std::fs::read_to_string(path).map_or_else(
            |_| Self::default(),
            |contents| match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to parse match config, using defaults"
                    );
                    Self::default()
                }
            },
        )
    }

    /// Validate field ranges.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidConfig` when `candidates` is zero.
    pub fn validate(&self) -> MatchResult<()> {
        if self.candidates == 0 {
            return Err(MatchError::InvalidConfig {
                field: "candidates".to_owned(),
                value: "0".to_owned(),
                reason: "at least one candidate must be requested".to_owned(),
            });
        }
        Ok(())
    }
}

/// Parse a boolean flag the way the env overrides accept it.
///
/// `1`/`true`/`yes`/`on` enable, `0`/`false`/`no`/`off` disable
/// (case-insensitive); anything else is `None`.
#[must_use]
pub fn parse_flag(raw: &str) -> Option<bool> {
    let normalized = raw.trim();
    if ["1", "true", "yes", "on"]
        .iter()
        .any(|v| normalized.eq_ignore_ascii_case(v))
    {
        Some(true)
    } else if ["0", "false", "no", "off"]
        .iter()
        .any(|v| normalized.eq_ignore_ascii_case(v))
    {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_documented_values() {
        let config = MatchConfig::default();
        assert_eq!(config.candidates, 64);
        assert!(!config.exact);
        assert!(config.parallel);
        assert_eq!(config.parallel_doc_threshold, 10_000);
    }

    #[test]
    fn overrides_apply_valid_values() {
        let config = MatchConfig::default().with_overrides(lookup_from(&[
            ("HASHDEX_CANDIDATES", "10"),
            ("HASHDEX_EXACT", "true"),
            ("HASHDEX_PARALLEL", "off"),
            ("HASHDEX_PARALLEL_DOC_THRESHOLD", "500"),
        ]));
        assert_eq!(config.candidates, 10);
        assert!(config.exact);
        assert!(!config.parallel);
        assert_eq!(config.parallel_doc_threshold, 500);
    }

    #[test]
    fn overrides_ignore_invalid_values() {
        let config = MatchConfig::default().with_overrides(lookup_from(&[
            ("HASHDEX_CANDIDATES", "0"),
            ("HASHDEX_EXACT", "maybe"),
            ("HASHDEX_PARALLEL_DOC_THRESHOLD", "lots"),
        ]));
        assert_eq!(config, MatchConfig::default());
    }

    #[test]
    fn overrides_ignore_unset_keys() {
        let config = MatchConfig::default().with_overrides(|_| None);
        assert_eq!(config, MatchConfig::default());
    }

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" yes "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("Off"), Some(false));
        assert_eq!(parse_flag("no"), Some(false));
    }

    #[test]
    fn parse_flag_rejects_everything_else() {
        assert_eq!(parse_flag(""), None);
        assert_eq!(parse_flag("2"), None);
        assert_eq!(parse_flag("enabled"), None);
    }

    #[test]
    fn validate_rejects_zero_candidates() {
        let config = MatchConfig {
            candidates: 0,
            ..MatchConfig::default()
        };
        let err = config.validate().expect_err("zero candidates must fail");
        assert!(err.to_string().contains("candidates"));
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn from_file_missing_path_yields_defaults() {
        let config = MatchConfig::from_file(std::path::Path::new(
            "/nonexistent/hashdex-match-config.toml",
        ));
        assert_eq!(config, MatchConfig::default());
    }

    #[test]
    fn toml_round_trip() {
        let config = MatchConfig {
            candidates: 7,
            exact: true,
            parallel: false,
            parallel_doc_threshold: 123,
        };
        let raw = toml::to_string(&config).expect("serialize");
        let parsed: MatchConfig = toml::from_str(&raw).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn toml_partial_file_keeps_defaults_for_missing_fields() {
        let parsed: MatchConfig = toml::from_str("candidates = 5\n").expect("parse");
        assert_eq!(parsed.candidates, 5);
        assert!(!parsed.exact);
        assert!(parsed.parallel);
    }
}
