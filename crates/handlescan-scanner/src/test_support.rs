//! Scripted fetcher for unit tests.

use crate::fetcher::{FetchedPage, PageFetcher, ProbeFailure};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What the scripted fetcher does for one URL.
#[derive(Debug, Clone)]
pub enum Script {
    /// Answer after `delay` with a 200 and `body`
    Page { delay: Duration, body: String },
    /// Fail after `delay` with a transport error
    Fail { delay: Duration, reason: String },
    /// Never answer
    Hang,
}

impl Script {
    pub fn page(body: &str) -> Self {
        Self::Page {
            delay: Duration::ZERO,
            body: body.to_string(),
        }
    }

    pub fn slow_page(delay: Duration, body: &str) -> Self {
        Self::Page {
            delay,
            body: body.to_string(),
        }
    }

    pub fn fail(reason: &str) -> Self {
        Self::Fail {
            delay: Duration::ZERO,
            reason: reason.to_string(),
        }
    }
}

/// Fetcher answering from a per-URL script and tracking concurrency.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
    fallback: Option<Script>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, script: Script) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }

    pub fn with_fallback(mut self, script: Script) -> Self {
        self.fallback = Some(script);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ProbeFailure> {
        self.calls.lock().expect("calls lock").push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let script = self
            .scripts
            .get(url)
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or_else(|| Script::fail("no script for url"));

        match script {
            Script::Page { delay, body } => {
                tokio::time::sleep(delay).await;
                Ok(FetchedPage::new(200, body))
            }
            Script::Fail { delay, reason } => {
                tokio::time::sleep(delay).await;
                Err(ProbeFailure::Transport(reason))
            }
            Script::Hang => std::future::pending().await,
        }
    }
}
