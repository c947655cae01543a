//! Page fetching for probes.
//!
//! The dispatcher talks to the network only through [`PageFetcher`], so
//! probes can be driven by a scripted fetcher in tests and by the shared
//! `reqwest` client ([`HttpFetcher`]) in production.

use crate::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// A page returned by a probe, whatever its HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,
    /// Response body decoded as text
    pub body: String,
}

impl FetchedPage {
    /// Create a page from a status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Why a probe produced no page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeFailure {
    /// The per-probe timeout elapsed
    Timeout {
        /// Timeout that elapsed, in milliseconds
        after_ms: u64,
    },
    /// The scan-level deadline elapsed before the probe finished
    DeadlineExceeded,
    /// Connection, TLS, redirect or body read failure
    Transport(String),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { after_ms } => write!(f, "timed out after {after_ms}ms"),
            Self::DeadlineExceeded => write!(f, "scan deadline exceeded"),
            Self::Transport(reason) => write!(f, "transport error: {reason}"),
        }
    }
}

/// Raw result of one probe, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResponse {
    /// The site answered
    Page(FetchedPage),
    /// The probe failed before a page was read
    Failed(ProbeFailure),
}

/// Fetches the page behind a bound probe URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Issue one GET for `url` and read the body.
    ///
    /// Implementations must not retry. Timeouts are enforced by the caller;
    /// an implementation may also enforce its own.
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, ProbeFailure>;
}

/// Production fetcher backed by one shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher with a client-level timeout and user agent.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ScanError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    fn map_error(&self, error: &reqwest::Error) -> ProbeFailure {
        if error.is_timeout() {
            ProbeFailure::Timeout {
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            ProbeFailure::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, ProbeFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(&e))?;

        Ok(FetchedPage { status, body })
    }
}
