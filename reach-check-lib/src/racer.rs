//! Timed race between two probes.
//!
//! A [`Racer`] starts two probes at once and waits on three events: probe A
//! finishing, probe B finishing, and the deadline. Whichever happens first
//! decides the outcome.

use crate::error::ReachCheckError;
use crate::types::{RaceConfig, DEFAULT_RACE_TIMEOUT};
use crate::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Something that can be pinged and reports only when it is done.
///
/// The returned future resolves once the target has been probed. Its output
/// carries no payload: only the time of completion matters to a race.
///
/// Closures of the form `|target: &str| async move { ... }` are probes,
/// provided the returned future does not borrow `target`.
pub trait Probe: Send + Sync + 'static {
    fn ping(&self, target: &str) -> BoxFuture<'static, ()>;
}

impl<F, Fut> Probe for F
where
    F: Fn(&str) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn ping(&self, target: &str) -> BoxFuture<'static, ()> {
        self(target).boxed()
    }
}

/// Races two probe targets against each other and a deadline.
///
/// # Example
///
/// ```rust
/// use reach_check_lib::{RaceConfig, Racer};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let probe = |target: &str| {
///         let delay = if target == "slow" { 50 } else { 0 };
///         async move { tokio::time::sleep(Duration::from_millis(delay)).await }
///     };
///
///     let racer = Racer::with_config(probe, RaceConfig::default().with_timeout(Duration::from_secs(1)));
///     assert_eq!(racer.race("slow", "fast").await.unwrap(), "fast");
/// }
/// ```
pub struct Racer<P> {
    probe: P,
    config: RaceConfig,
}

impl<P: Probe> Racer<P> {
    /// Create a racer with the production default timeout.
    pub fn new(probe: P) -> Self {
        Self::with_config(probe, RaceConfig::default())
    }

    /// Create a racer with custom settings.
    pub fn with_config(probe: P, config: RaceConfig) -> Self {
        Self { probe, config }
    }

    /// Get the current configuration for this racer.
    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// Race `a` against `b` and return whichever target answers first.
    ///
    /// # Errors
    ///
    /// Returns [`ReachCheckError::TimeoutExceeded`] naming both targets if
    /// neither probe finishes within the configured timeout.
    ///
    /// Unless `cancel_losers` is set, probes that did not win keep running in
    /// the background after this returns.
    pub async fn race(&self, a: &str, b: &str) -> Result<String> {
        let timeout = self.config.timeout;
        debug!(target_a = a, target_b = b, ?timeout, "starting race");

        let mut probe_a = tokio::spawn(self.probe.ping(a));
        let mut probe_b = tokio::spawn(self.probe.ping(b));

        // A probe task that panicked never signalled completion, so its
        // branch is disabled instead of declaring a winner. Probe branches
        // are polled before the deadline: a probe that finished counts even
        // if this task was polled after the timeout elapsed.
        let outcome = tokio::select! {
            biased;

            Ok(()) = &mut probe_a => Ok(a.to_string()),
            Ok(()) = &mut probe_b => Ok(b.to_string()),
            _ = tokio::time::sleep(timeout) => {
                Err(ReachCheckError::timeout_exceeded(a, b, timeout))
            }
        };

        if self.config.cancel_losers {
            probe_a.abort();
            probe_b.abort();
        }

        match &outcome {
            Ok(winner) => info!(winner = %winner, "race decided"),
            Err(err) => warn!(error = %err, "race timed out"),
        }

        outcome
    }
}

/// Race two targets with the production default timeout of ten seconds.
pub async fn race<P: Probe>(probe: P, a: &str, b: &str) -> Result<String> {
    configurable_race(probe, a, b, DEFAULT_RACE_TIMEOUT).await
}

/// Race two targets with a caller-chosen timeout.
pub async fn configurable_race<P: Probe>(
    probe: P,
    a: &str,
    b: &str,
    timeout: Duration,
) -> Result<String> {
    Racer::with_config(probe, RaceConfig::default().with_timeout(timeout))
        .race(a, b)
        .await
}
