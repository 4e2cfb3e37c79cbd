//! HTTP probe implementation.
//!
//! [`HttpProbe`] pings a target by issuing a GET request. The race only
//! cares about when the request finishes, so the response (or the error)
//! is discarded once it arrives.

use crate::error::ReachCheckError;
use crate::racer::Probe;
use crate::types::{ProbeSettings, DEFAULT_PROBE_TIMEOUT};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;
use tracing::debug;

/// Probe that signals completion once an HTTP GET to the target returns.
#[derive(Clone)]
pub struct HttpProbe {
    /// HTTP client shared by every ping
    http_client: reqwest::Client,
}

impl HttpProbe {
    /// Create a new HTTP probe with default settings.
    pub fn new() -> Result<Self, ReachCheckError> {
        Self::with_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    /// Create a new HTTP probe whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ReachCheckError> {
        Self::from_settings(&ProbeSettings {
            timeout,
            ..Default::default()
        })
    }

    /// Create a new HTTP probe from resolved configuration.
    pub fn from_settings(settings: &ProbeSettings) -> Result<Self, ReachCheckError> {
        let mut builder = reqwest::Client::builder().timeout(settings.timeout);
        if let Some(user_agent) = &settings.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        let http_client = builder
            .build()
            .map_err(|e| {
                ReachCheckError::network_with_source("Failed to create probe HTTP client", e.to_string())
            })?;

        Ok(Self { http_client })
    }

    /// Create a new HTTP probe around an existing client.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

impl Probe for HttpProbe {
    fn ping(&self, target: &str) -> BoxFuture<'static, ()> {
        let client = self.http_client.clone();
        let url = target.to_string();

        async move {
            // Completion is the signal; the outcome of the request is not.
            match client.get(&url).send().await {
                Ok(response) => debug!(url = %url, status = %response.status(), "probe answered"),
                Err(err) => debug!(url = %url, error = %ReachCheckError::from(err), "probe failed"),
            }
        }
        .boxed()
    }
}
