//! Probe dispatcher for concurrent site checks.
//!
//! This module provides the `ProbeDispatcher`, which fetches every bound
//! probe through a [`PageFetcher`] with a concurrency cap, a per-probe
//! timeout and an optional scan-level deadline. Each probe yields exactly one
//! response; probe futures are polled by the calling task, so none outlives
//! the dispatch call.

use crate::classifier::{classify_for, ProbeOutcome};
use crate::fetcher::{PageFetcher, ProbeFailure, ProbeResponse};
use crate::url_builder::BoundProbe;
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default per-probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of probes in flight at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 64;

/// Dispatches bound probes concurrently.
#[derive(Clone)]
pub struct ProbeDispatcher {
    /// Fetcher shared by every probe
    fetcher: Arc<dyn PageFetcher>,
    /// Timeout applied to each probe
    probe_timeout: Duration,
    /// Maximum probes in flight (0 = unbounded)
    max_concurrent: usize,
    /// Deadline for the whole dispatch
    scan_deadline: Option<Duration>,
}

impl ProbeDispatcher {
    /// Create a dispatcher with the default concurrency cap and no scan deadline.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, probe_timeout: Duration) -> Self {
        Self {
            fetcher,
            probe_timeout,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            scan_deadline: None,
        }
    }

    /// Set the maximum number of probes in flight. `0` removes the cap.
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Set a deadline for the whole dispatch.
    #[must_use]
    pub fn with_scan_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.scan_deadline = deadline;
        self
    }

    /// Per-probe timeout.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Effective number of probes in flight for a batch of `probe_count`.
    #[must_use]
    pub fn concurrency_for(&self, probe_count: usize) -> usize {
        if self.max_concurrent == 0 {
            probe_count.max(1)
        } else {
            self.max_concurrent
        }
    }

    /// Fetch every probe and return the raw responses in completion order.
    pub async fn dispatch_all(
        &self,
        probes: Vec<BoundProbe>,
    ) -> Vec<(BoundProbe, ProbeResponse)> {
        self.responses(probes).collect().await
    }

    /// Fetch every probe, classify each response as it completes and send it
    /// to the single consumer behind `sender`.
    ///
    /// Returns the number of outcomes delivered. Stops early if the consumer
    /// hangs up.
    pub async fn dispatch_to(
        &self,
        probes: Vec<BoundProbe>,
        sender: mpsc::Sender<(BoundProbe, ProbeOutcome)>,
    ) -> usize {
        let total = probes.len();
        let mut responses = std::pin::pin!(self.responses(probes));
        let mut delivered = 0;

        while let Some((probe, response)) = responses.next().await {
            let outcome = classify_for(probe.definition(), &response);

            if sender.send((probe, outcome)).await.is_err() {
                warn!(delivered, total, "outcome consumer dropped, stopping dispatch");
                break;
            }
            delivered += 1;
        }

        delivered
    }

    fn responses(
        &self,
        probes: Vec<BoundProbe>,
    ) -> impl Stream<Item = (BoundProbe, ProbeResponse)> + '_ {
        let scan_deadline = self.scan_deadline.map(|deadline| Instant::now() + deadline);
        let limit = self.concurrency_for(probes.len());

        debug!(
            probes = probes.len(),
            limit,
            timeout = ?self.probe_timeout,
            "dispatching probes"
        );

        stream::iter(probes)
            .map(move |probe| self.probe_one(probe, scan_deadline))
            .buffer_unordered(limit)
    }

    /// Fetch a single probe under its own timeout.
    async fn probe_one(
        &self,
        probe: BoundProbe,
        scan_deadline: Option<Instant>,
    ) -> (BoundProbe, ProbeResponse) {
        let probe_deadline = Instant::now() + self.probe_timeout;
        let (deadline, cut_by_scan) = match scan_deadline {
            Some(scan) if scan < probe_deadline => (scan, true),
            _ => (probe_deadline, false),
        };

        let response =
            match tokio::time::timeout_at(deadline, self.fetcher.fetch(probe.url())).await {
                Ok(Ok(page)) => ProbeResponse::Page(page),
                Ok(Err(failure)) => ProbeResponse::Failed(failure),
                Err(_) if cut_by_scan => ProbeResponse::Failed(ProbeFailure::DeadlineExceeded),
                Err(_) => ProbeResponse::Failed(ProbeFailure::Timeout {
                    after_ms: u64::try_from(self.probe_timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            };

        match &response {
            ProbeResponse::Page(page) => {
                debug!(
                    site = probe.name(),
                    url = probe.url(),
                    status = page.status,
                    "probe answered"
                );
            }
            ProbeResponse::Failed(failure) => {
                debug!(site = probe.name(), url = probe.url(), %failure, "probe failed");
            }
        }

        (probe, response)
    }
}
