//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `RC_*`
//! environment variables, and merging them with proper precedence rules:
//! environment beats local file, local file beats global file, global file
//! beats XDG file, and anything unset falls back to the built-in defaults.

use crate::error::ReachCheckError;
use crate::types::{ProbeSettings, RaceConfig};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

lazy_static! {
    static ref DURATION_RE: Regex =
        Regex::new(r"^(\d+)\s*(ms|s|m)?$").expect("duration pattern is valid");
}

/// Configuration loaded from TOML files.
///
/// ```toml
/// [racer]
/// timeout = "10s"
/// cancel_losers = false
///
/// [probe]
/// timeout = "30s"
/// user_agent = "reach-check/0.1"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Race settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub racer: Option<RacerConfig>,

    /// HTTP probe settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeConfig>,
}

/// `[racer]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RacerConfig {
    /// Race deadline (as string, e.g., "500ms", "10s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Abort losing probes once the race is decided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_losers: Option<bool>,
}

/// `[probe]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProbeConfig {
    /// Per-request timeout for the HTTP probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// User-Agent header sent by the HTTP probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which config files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if parsing fails.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ReachCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ReachCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ReachCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            ReachCheckError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Looks for configuration files in standard locations and merges them.
    /// Files that exist but fail to load are skipped with a warning.
    pub fn discover_and_load(&self) -> FileConfig {
        let mut merged_config = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        // Lowest precedence first, so later files override earlier ones
        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    if self.verbose {
                        info!(path = %path.display(), "loaded configuration file");
                    }
                    merged_config = self.merge_configs(merged_config, config);
                }
                Err(err) => warn!(path = %path.display(), error = %err, "skipping configuration file"),
            }
        }

        merged_config
    }

    /// Load the file named by `RC_CONFIG` if set, otherwise discover one.
    ///
    /// An explicitly named file must exist and parse; discovered files are
    /// best-effort.
    pub fn load_for_env(&self, env: &EnvConfig) -> Result<FileConfig, ReachCheckError> {
        match &env.config {
            Some(path) => self.load_file(path),
            None => Ok(self.discover_and_load()),
        }
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./reach-check.toml", "./.reach-check.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".reach-check.toml", "reach-check.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("reach-check").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            racer: match (lower.racer, higher.racer) {
                (Some(mut lower_racer), Some(higher_racer)) => {
                    if higher_racer.timeout.is_some() {
                        lower_racer.timeout = higher_racer.timeout;
                    }
                    if higher_racer.cancel_losers.is_some() {
                        lower_racer.cancel_losers = higher_racer.cancel_losers;
                    }
                    Some(lower_racer)
                }
                (lower_racer, higher_racer) => higher_racer.or(lower_racer),
            },
            probe: match (lower.probe, higher.probe) {
                (Some(mut lower_probe), Some(higher_probe)) => {
                    if higher_probe.timeout.is_some() {
                        lower_probe.timeout = higher_probe.timeout;
                    }
                    if higher_probe.user_agent.is_some() {
                        lower_probe.user_agent = higher_probe.user_agent;
                    }
                    Some(lower_probe)
                }
                (lower_probe, higher_probe) => higher_probe.or(lower_probe),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ReachCheckError> {
        let timeouts = [
            ("racer.timeout", config.racer.as_ref().and_then(|r| r.timeout.as_deref())),
            ("probe.timeout", config.probe.as_ref().and_then(|p| p.timeout.as_deref())),
        ];

        for (key, value) in timeouts {
            if let Some(value) = value {
                match parse_duration(value) {
                    Some(d) if !d.is_zero() => {}
                    Some(_) => {
                        return Err(ReachCheckError::config(format!(
                            "'{}' must be greater than zero",
                            key
                        )));
                    }
                    None => {
                        return Err(ReachCheckError::config(format!(
                            "Invalid {} '{}'. Use format like '500ms', '5s', '2m'",
                            key, value
                        )));
                    }
                }
            }
        }

        if let Some(user_agent) = config.probe.as_ref().and_then(|p| p.user_agent.as_deref()) {
            if user_agent.trim().is_empty() {
                return Err(ReachCheckError::config("probe.user_agent cannot be empty"));
            }
        }

        Ok(())
    }
}

/// Environment variable configuration.
///
/// Values that can be set via `RC_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub timeout: Option<Duration>,
    pub cancel_losers: Option<bool>,
    pub probe_timeout: Option<Duration>,
    pub config: Option<String>,
}

/// Load configuration from environment variables.
///
/// Reads `RC_TIMEOUT`, `RC_CANCEL_LOSERS`, `RC_PROBE_TIMEOUT` and
/// `RC_CONFIG`. Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

/// Build an [`EnvConfig`] from any variable lookup.
fn env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    // RC_TIMEOUT - race deadline
    if let Some(val) = lookup("RC_TIMEOUT") {
        match parse_duration(&val) {
            Some(d) if !d.is_zero() => env_config.timeout = Some(d),
            _ => warn!(value = %val, "invalid RC_TIMEOUT, use format like '500ms', '5s', '2m'"),
        }
    }

    // RC_CANCEL_LOSERS - abort losing probes
    if let Some(val) = lookup("RC_CANCEL_LOSERS") {
        match parse_bool(&val) {
            Some(flag) => env_config.cancel_losers = Some(flag),
            None => warn!(value = %val, "invalid RC_CANCEL_LOSERS, use true/false"),
        }
    }

    // RC_PROBE_TIMEOUT - per-request probe timeout
    if let Some(val) = lookup("RC_PROBE_TIMEOUT") {
        match parse_duration(&val) {
            Some(d) if !d.is_zero() => env_config.probe_timeout = Some(d),
            _ => warn!(value = %val, "invalid RC_PROBE_TIMEOUT, use format like '500ms', '5s', '2m'"),
        }
    }

    // RC_CONFIG - explicit config file
    if let Some(path) = lookup("RC_CONFIG") {
        if !path.trim().is_empty() {
            env_config.config = Some(path);
        }
    }

    env_config
}

/// Resolve the effective race settings.
///
/// Precedence: environment, then file, then [`RaceConfig::default`].
/// File values are validated on load, so an unparsable one here is simply
/// treated as unset.
pub fn resolve_race_config(file: &FileConfig, env: &EnvConfig) -> RaceConfig {
    let mut config = RaceConfig::default();

    if let Some(racer) = &file.racer {
        if let Some(timeout) = racer.timeout.as_deref().and_then(parse_duration) {
            config.timeout = timeout;
        }
        if let Some(cancel_losers) = racer.cancel_losers {
            config.cancel_losers = cancel_losers;
        }
    }

    if let Some(timeout) = env.timeout {
        config.timeout = timeout;
    }
    if let Some(cancel_losers) = env.cancel_losers {
        config.cancel_losers = cancel_losers;
    }

    config
}

/// Resolve the effective HTTP probe settings.
///
/// Precedence: environment, then file, then [`ProbeSettings::default`].
pub fn resolve_probe_settings(file: &FileConfig, env: &EnvConfig) -> ProbeSettings {
    let mut settings = ProbeSettings::default();

    if let Some(probe) = &file.probe {
        if let Some(timeout) = probe.timeout.as_deref().and_then(parse_duration) {
            settings.timeout = timeout;
        }
        settings.user_agent = probe.user_agent.clone();
    }

    if let Some(timeout) = env.probe_timeout {
        settings.timeout = timeout;
    }

    settings
}

/// Parse a duration string like "500ms", "5s", "2m" or a bare number of
/// seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();
    let caps = DURATION_RE.captures(&value)?;
    let amount: u64 = caps[1].parse().ok()?;

    match caps.get(2).map(|m| m.as_str()) {
        Some("ms") => Some(Duration::from_millis(amount)),
        Some("m") => amount.checked_mul(60).map(Duration::from_secs),
        _ => Some(Duration::from_secs(amount)),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
