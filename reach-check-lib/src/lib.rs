//! # Reach Check Library
//!
//! Concurrent reachability checking and timed probe races.
//!
//! The library offers two independent tools:
//!
//! - [`ConcurrentChecker`] fans a batch of identifiers out to a predicate,
//!   one unit of concurrency per identifier, and collects the verdicts into
//!   a [`ResultMap`] without any shared mutable state.
//! - [`Racer`] pings two targets at once and reports whichever answers
//!   first, or [`ReachCheckError::TimeoutExceeded`] if the deadline passes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reach_check_lib::{check_all, race, HttpProbe};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     reach_check_lib::init();
//!
//!     let results = check_all(|url: &str| url.starts_with("https://"), [
//!         "https://example.com",
//!         "http://example.org",
//!     ])
//!     .await;
//!     println!("{:?}", results);
//!
//!     let winner = race(HttpProbe::new()?, "https://example.com", "https://example.org").await?;
//!     println!("Fastest: {}", winner);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Single-writer aggregation**: results travel over a channel to one owner
//! - **Configurable deadlines**: race timeouts from code, TOML files or `RC_*` variables
//! - **Cooperative cancellation**: [`Store`] fetches observe a cancellation token
//! - **HTTP probe** (feature `http`): reqwest-backed [`Probe`] implementation

// Re-export main public API types and functions
// This makes them available as reach_check_lib::TypeName
pub use checker::{check_all, ConcurrentChecker, FalliblePredicate, Predicate};
pub use config::{
    load_env_config, parse_duration, resolve_probe_settings, resolve_race_config, ConfigManager,
    EnvConfig, FileConfig, ProbeConfig, RacerConfig,
};
pub use counter::Counter;
pub use error::ReachCheckError;
#[cfg(feature = "http")]
pub use probe::HttpProbe;
pub use racer::{configurable_race, race, Probe, Racer};
pub use store::{serve, Store};
pub use types::{
    CheckResult, FallibleResultMap, ProbeSettings, RaceConfig, ResultMap, DEFAULT_PROBE_TIMEOUT,
    DEFAULT_RACE_TIMEOUT,
};

// Re-exported so callers can construct tokens without naming tokio-util
pub use tokio_util::sync::CancellationToken;

// Internal modules - these are not part of the public API
mod checker;
mod config;
mod counter;
mod error;
#[cfg(feature = "http")]
mod probe;
mod racer;
mod store;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ReachCheckError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Initialize logging for the library.
///
/// Installs a `tracing` subscriber filtered by `RUST_LOG` (default `warn`).
/// Calling it more than once, or after the host application installed its
/// own subscriber, is a no-op.
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        features: get_enabled_features(),
    }
}

/// Information about the library build and features
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    pub features: Vec<&'static str>,
}

/// Get list of enabled features at compile time
#[allow(clippy::vec_init_then_push)]
fn get_enabled_features() -> Vec<&'static str> {
    let mut features = Vec::new();

    #[cfg(feature = "http")]
    features.push("http");

    features
}
