//! Core data types for checking and racing.
//!
//! This module defines the messages exchanged between concurrent units and
//! the orchestrator, the snapshot returned to callers, and the race settings.

use crate::error::ReachCheckError;
use serde::Serialize;
use std::collections::hash_map;
use std::collections::HashMap;
use std::time::Duration;

/// Production default for how long a race waits before giving up.
pub const DEFAULT_RACE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default upper bound on a single HTTP probe request.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Message sent from one concurrent unit to the orchestrator.
///
/// Produced exactly once per submitted identifier and consumed as soon as
/// the orchestrator receives it.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    /// The identifier that was checked
    pub identifier: String,

    /// The predicate's verdict, or why there is none
    pub outcome: Result<bool, ReachCheckError>,
}

/// Per-identifier outcomes when the predicate is allowed to fail.
pub type FallibleResultMap = HashMap<String, Result<bool, ReachCheckError>>;

/// Immutable snapshot mapping each distinct identifier to its verdict.
///
/// When the same identifier was submitted more than once, the retained value
/// is whichever result reached the orchestrator last. That order is
/// unspecified under concurrency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultMap {
    entries: HashMap<String, bool>,
}

impl ResultMap {
    /// Verdict for an identifier, if it was checked.
    pub fn get(&self, identifier: &str) -> Option<bool> {
        self.entries.get(identifier).copied()
    }

    /// Whether an identifier has an entry.
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(identifier, verdict)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Consume the snapshot and return the underlying map.
    pub fn into_inner(self) -> HashMap<String, bool> {
        self.entries
    }
}

impl From<HashMap<String, bool>> for ResultMap {
    fn from(entries: HashMap<String, bool>) -> Self {
        Self { entries }
    }
}

impl IntoIterator for ResultMap {
    type Item = (String, bool);
    type IntoIter = hash_map::IntoIter<String, bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Configuration options for a race between two probes.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceConfig {
    /// How long to wait for either probe before failing
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Whether to abort both probe tasks once the race is decided.
    /// Default: false (losing probes run to completion in the background)
    pub cancel_losers: bool,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_RACE_TIMEOUT,
            cancel_losers: false,
        }
    }
}

impl RaceConfig {
    /// Set the race deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable aborting losing probes.
    pub fn with_cancel_losers(mut self, enabled: bool) -> Self {
        self.cancel_losers = enabled;
        self
    }
}

/// Resolved settings for the HTTP probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    /// Per-request timeout
    /// Default: 30 seconds
    pub timeout: Duration,

    /// User-Agent header, or the HTTP client's default when unset
    pub user_agent: Option<String>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
            user_agent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_config_defaults() {
        let config = RaceConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.cancel_losers);

        let tuned = config
            .with_timeout(Duration::from_millis(20))
            .with_cancel_losers(true);
        assert_eq!(tuned.timeout, Duration::from_millis(20));
        assert!(tuned.cancel_losers);
    }

    #[test]
    fn test_result_map_accessors() {
        let map = ResultMap::from(HashMap::from([
            ("a".to_string(), true),
            ("b".to_string(), false),
        ]));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(true));
        assert_eq!(map.get("b"), Some(false));
        assert_eq!(map.get("c"), None);
        assert!(map.contains("b"));
        assert!(!map.contains("c"));

        let mut pairs: Vec<_> = map.iter().collect();
        pairs.sort();
        assert_eq!(pairs, vec![("a", true), ("b", false)]);
    }
}
