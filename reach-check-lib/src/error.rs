//! Error handling for checking and racing operations.
//!
//! Every failure mode is a variant of [`ReachCheckError`]. Variants carry
//! their context as fields and compare structurally, so callers match on
//! the shape of an error rather than on a shared sentinel value.

use std::fmt;
use std::time::Duration;

/// Main error type for reach-check operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ReachCheckError {
    /// Neither probe completed before the race deadline.
    TimeoutExceeded {
        target_a: String,
        target_b: String,
        duration: Duration,
    },

    /// A fallible predicate reported an error for one identifier.
    PredicateFailed {
        identifier: String,
        message: String,
    },

    /// A predicate panicked while checking one identifier.
    PredicatePanicked {
        identifier: String,
        message: String,
    },

    /// Work was abandoned because its cancellation token fired.
    Cancelled {
        operation: String,
    },

    /// Network-related errors (client construction, connection, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// Configuration errors (invalid settings, unparsable values, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors when reading configuration
    FileError {
        path: String,
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl ReachCheckError {
    /// Create a new race timeout error naming both targets.
    pub fn timeout_exceeded<A: Into<String>, B: Into<String>>(
        target_a: A,
        target_b: B,
        duration: Duration,
    ) -> Self {
        Self::TimeoutExceeded {
            target_a: target_a.into(),
            target_b: target_b.into(),
            duration,
        }
    }

    /// Create a new predicate failure for an identifier.
    pub fn predicate_failed<I: Into<String>, M: Into<String>>(identifier: I, message: M) -> Self {
        Self::PredicateFailed {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Create a new predicate panic error for an identifier.
    pub fn predicate_panicked<I: Into<String>, M: Into<String>>(identifier: I, message: M) -> Self {
        Self::PredicatePanicked {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Create a new cancellation error.
    pub fn cancelled<O: Into<String>>(operation: O) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is a race timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimeoutExceeded { .. })
    }

    /// Check if this error suggests the operation should be retried.
    ///
    /// Timeouts and network failures are transient; a panicking or failing
    /// predicate will most likely fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TimeoutExceeded { .. } | Self::NetworkError { .. }
        )
    }

    /// The identifier this error belongs to, for per-identifier failures.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::PredicateFailed { identifier, .. } | Self::PredicatePanicked { identifier, .. } => {
                Some(identifier)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ReachCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeoutExceeded {
                target_a,
                target_b,
                duration,
            } => {
                write!(
                    f,
                    "Timed out after {:?} waiting for '{}' and '{}'",
                    duration, target_a, target_b
                )
            }
            Self::PredicateFailed {
                identifier,
                message,
            } => {
                write!(f, "Check failed for '{}': {}", identifier, message)
            }
            Self::PredicatePanicked {
                identifier,
                message,
            } => {
                write!(f, "Check panicked for '{}': {}", identifier, message)
            }
            Self::Cancelled { operation } => {
                write!(f, "Cancelled during: {}", operation)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ReachCheckError {}

impl From<std::io::Error> for ReachCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ReachCheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}
