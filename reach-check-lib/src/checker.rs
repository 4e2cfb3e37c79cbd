//! Concurrent checker implementation.
//!
//! This module provides [`ConcurrentChecker`], which fans a batch of
//! identifiers out to a caller-supplied predicate and folds the verdicts
//! into a [`ResultMap`].
//!
//! Every identifier gets its own unit of concurrency. Units never touch the
//! result map: each one sends a [`CheckResult`] down a channel, and the
//! orchestrator drains exactly one message per submitted identifier before
//! returning. The orchestrator is therefore the map's only writer.

use crate::error::ReachCheckError;
use crate::types::{CheckResult, FallibleResultMap, ResultMap};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{debug, warn};

/// A check that answers yes or no for one identifier.
///
/// Any `Fn(&str) -> bool` closure that can be shared across threads is a
/// predicate. Calls may block: each one runs on tokio's blocking pool.
pub trait Predicate: Send + Sync + 'static {
    fn check(&self, identifier: &str) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    fn check(&self, identifier: &str) -> bool {
        self(identifier)
    }
}

/// A check that may fail for an individual identifier.
///
/// Failures are reported per identifier and never abort the rest of the
/// batch.
pub trait FalliblePredicate: Send + Sync + 'static {
    fn try_check(&self, identifier: &str) -> Result<bool>;
}

impl<F> FalliblePredicate for F
where
    F: Fn(&str) -> Result<bool> + Send + Sync + 'static,
{
    fn try_check(&self, identifier: &str) -> Result<bool> {
        self(identifier)
    }
}

/// Runs a predicate over a batch of identifiers concurrently.
///
/// # Example
///
/// ```rust
/// use reach_check_lib::ConcurrentChecker;
///
/// #[tokio::main]
/// async fn main() {
///     let checker = ConcurrentChecker::new(|url: &str| url.starts_with("https://"));
///     let results = checker
///         .check_all(["https://example.com", "http://example.org"])
///         .await;
///
///     assert_eq!(results.get("https://example.com"), Some(true));
///     assert_eq!(results.get("http://example.org"), Some(false));
/// }
/// ```
pub struct ConcurrentChecker<P> {
    predicate: Arc<P>,
}

impl<P> ConcurrentChecker<P> {
    /// Create a checker that owns its predicate.
    pub fn new(predicate: P) -> Self {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Create a checker around a predicate that is already shared.
    pub fn from_arc(predicate: Arc<P>) -> Self {
        Self { predicate }
    }

    /// Get the predicate this checker runs.
    pub fn predicate(&self) -> &P {
        &self.predicate
    }
}

impl<P> Clone for ConcurrentChecker<P> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<P: Predicate> ConcurrentChecker<P> {
    /// Check every identifier concurrently and collect the verdicts.
    ///
    /// The returned map has one entry per distinct identifier. Duplicate
    /// identifiers are allowed; the surviving verdict is last-write-wins,
    /// in an unspecified order.
    ///
    /// A predicate that panics takes down only its own unit: the panic is
    /// logged and that identifier is left out of the map. There is no
    /// timeout, so a predicate that never returns blocks the whole batch.
    pub async fn check_all<I, S>(&self, identifiers: I) -> ResultMap
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let predicate = Arc::clone(&self.predicate);
        let (total, rx) = spawn_units(identifiers, move |id: &str| Ok(predicate.check(id)));

        let mut entries = HashMap::with_capacity(total);
        drain(total, rx, |result| match result.outcome {
            Ok(verdict) => {
                entries.insert(result.identifier, verdict);
            }
            Err(err) => {
                warn!(
                    identifier = %result.identifier,
                    error = %err,
                    "check unit failed, identifier left out of results"
                );
            }
        })
        .await;

        ResultMap::from(entries)
    }
}

impl<P: FalliblePredicate> ConcurrentChecker<P> {
    /// Check every identifier concurrently, keeping per-identifier errors.
    ///
    /// Predicate errors and panics become `Err` entries; the batch always
    /// runs to completion. Duplicate identifiers follow the same
    /// last-write-wins rule as [`ConcurrentChecker::check_all`].
    pub async fn try_check_all<I, S>(&self, identifiers: I) -> FallibleResultMap
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let predicate = Arc::clone(&self.predicate);
        let (total, rx) = spawn_units(identifiers, move |id: &str| predicate.try_check(id));

        let mut entries = HashMap::with_capacity(total);
        drain(total, rx, |result| {
            entries.insert(result.identifier, result.outcome);
        })
        .await;

        entries
    }
}

/// Check every identifier with `predicate` and collect the verdicts.
///
/// Shorthand for `ConcurrentChecker::new(predicate).check_all(identifiers)`.
pub async fn check_all<P, I, S>(predicate: P, identifiers: I) -> ResultMap
where
    P: Predicate,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ConcurrentChecker::new(predicate).check_all(identifiers).await
}

/// Spawn one unit per identifier. Returns how many units were spawned and
/// the receiving end of the channel they report on.
fn spawn_units<I, S, F>(identifiers: I, check: F) -> (usize, mpsc::Receiver<CheckResult>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: Fn(&str) -> Result<bool> + Send + Sync + 'static,
{
    let identifiers: Vec<String> = identifiers.into_iter().map(Into::into).collect();
    let total = identifiers.len();
    let check = Arc::new(check);

    // Capacity for every message, so no unit waits on the orchestrator.
    let (tx, rx) = mpsc::channel(total.max(1));

    for identifier in identifiers {
        let tx = tx.clone();
        let check = Arc::clone(&check);

        tokio::spawn(async move {
            let subject = identifier.clone();
            let outcome = match tokio::task::spawn_blocking(move || (*check)(&subject)).await {
                Ok(outcome) => outcome,
                Err(err) => Err(join_error_to_check_error(&identifier, err)),
            };

            // Only fails if the orchestrator was dropped mid-drain.
            let _ = tx.send(CheckResult { identifier, outcome }).await;
        });
    }

    debug!(total, "spawned check units");
    (total, rx)
}

/// Receive exactly `total` results, handing each to `record`.
async fn drain<R>(total: usize, mut rx: mpsc::Receiver<CheckResult>, mut record: R)
where
    R: FnMut(CheckResult),
{
    for received in 0..total {
        match rx.recv().await {
            Some(result) => record(result),
            None => {
                warn!(received, total, "result channel closed before every unit reported");
                break;
            }
        }
    }

    debug!(total, "drained all check results");
}

fn join_error_to_check_error(identifier: &str, err: JoinError) -> ReachCheckError {
    if err.is_panic() {
        let payload = err.into_panic();
        let message = if let Some(msg) = payload.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "predicate panicked".to_string()
        };
        ReachCheckError::predicate_panicked(identifier, message)
    } else {
        ReachCheckError::internal(format!("check unit for '{}' was cancelled", identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_true_predicate() {
        let results = check_all(|_: &str| true, ["a", "b", "c"]).await;

        let expected = ResultMap::from(HashMap::from([
            ("a".to_string(), true),
            ("b".to_string(), true),
            ("c".to_string(), true),
        ]));
        assert_eq!(results, expected);
    }

    #[tokio::test]
    async fn test_verdicts_follow_predicate() {
        let checker = ConcurrentChecker::new(|url: &str| url != "waat://furhurterwe.geds");
        let results = checker
            .check_all([
                "http://google.com",
                "http://blog.gypsydave5.com",
                "waat://furhurterwe.geds",
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results.get("http://google.com"), Some(true));
        assert_eq!(results.get("http://blog.gypsydave5.com"), Some(true));
        assert_eq!(results.get("waat://furhurterwe.geds"), Some(false));
    }

    #[tokio::test]
    async fn test_duplicates_collapse_to_one_entry() {
        let results = check_all(|_: &str| true, vec!["a url"; 100]).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results.get("a url"), Some(true));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let results = check_all(|_: &str| true, Vec::<String>::new()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_predicate_only_loses_its_own_entry() {
        let checker = ConcurrentChecker::new(|id: &str| {
            if id == "bad" {
                panic!("unreachable host");
            }
            true
        });

        let results = checker.check_all(["good", "bad", "fine"]).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results.get("good"), Some(true));
        assert_eq!(results.get("fine"), Some(true));
        assert!(!results.contains("bad"));
    }

    #[tokio::test]
    async fn test_try_check_all_reports_errors_per_identifier() {
        let checker = ConcurrentChecker::new(|id: &str| -> Result<bool> {
            match id {
                "refused" => Err(ReachCheckError::predicate_failed(id, "connection refused")),
                "boom" => panic!("predicate exploded"),
                _ => Ok(id.len() > 3),
            }
        });

        let results = checker
            .try_check_all(["long-name", "abc", "refused", "boom"])
            .await;

        assert_eq!(results.len(), 4);
        assert_eq!(results["long-name"], Ok(true));
        assert_eq!(results["abc"], Ok(false));
        assert_eq!(
            results["refused"],
            Err(ReachCheckError::predicate_failed("refused", "connection refused"))
        );
        assert_eq!(
            results["boom"],
            Err(ReachCheckError::predicate_panicked("boom", "predicate exploded"))
        );
    }

    #[tokio::test]
    async fn test_try_check_all_duplicates_collapse_to_one_entry() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let checker = ConcurrentChecker::new(move |id: &str| -> Result<bool> {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(id.starts_with("http"))
        });

        let results = checker.try_check_all(vec!["http://a.test"; 100]).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results["http://a.test"], Ok(true));
        assert_eq!(calls.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn test_try_check_all_empty_batch() {
        let checker = ConcurrentChecker::new(|_: &str| -> Result<bool> { Ok(true) });

        let results = checker.try_check_all(Vec::<String>::new()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_checker_is_reusable_and_cloneable() {
        let checker = ConcurrentChecker::new(|id: &str| id.ends_with(".com"));
        let copy = checker.clone();

        let first = checker.check_all(["a.com", "b.org"]).await;
        let second = copy.check_all(["a.com", "b.org"]).await;
        assert_eq!(first, second);
        assert!(checker.predicate().check("x.com"));
    }
}
