//! Result aggregation.
//!
//! Outcomes are folded into three disjoint buckets keyed by site identity
//! (the host of the resolved URL). The aggregator is a single writer: in a
//! scan it drains the dispatcher's channel, so bucket state is never shared
//! between probe units.

use crate::classifier::ProbeOutcome;
use crate::url_builder::BoundProbe;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::mpsc;
use tracing::debug;

/// User-facing state a site ends up in.
///
/// Variant order is precedence: when two probes share a site identity the
/// greater bucket wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Neither marker matched, or the probe failed
    Indeterminate,
    /// The missing marker matched
    Absent,
    /// The existence marker matched
    Present,
}

impl From<&ProbeOutcome> for Bucket {
    fn from(outcome: &ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Present => Self::Present,
            ProbeOutcome::Absent => Self::Absent,
            ProbeOutcome::Indeterminate | ProbeOutcome::Failed(_) => Self::Indeterminate,
        }
    }
}

/// Aggregate of one scan: three disjoint `site identity -> URL` maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Sites where the account exists
    pub present: BTreeMap<String, String>,
    /// Sites where the account is missing
    pub absent: BTreeMap<String, String>,
    /// Sites that could not be decided, failures included
    pub indeterminate: BTreeMap<String, String>,
    /// Distinct probes folded
    pub total_sites: usize,
    /// Distinct probes that failed outright
    pub failure_count: usize,
}

impl ScanResult {
    /// Bucket holding `identity`, if any.
    #[must_use]
    pub fn bucket_of(&self, identity: &str) -> Option<Bucket> {
        if self.present.contains_key(identity) {
            Some(Bucket::Present)
        } else if self.absent.contains_key(identity) {
            Some(Bucket::Absent)
        } else if self.indeterminate.contains_key(identity) {
            Some(Bucket::Indeterminate)
        } else {
            None
        }
    }

    /// Map for one bucket.
    #[must_use]
    pub fn bucket(&self, bucket: Bucket) -> &BTreeMap<String, String> {
        match bucket {
            Bucket::Present => &self.present,
            Bucket::Absent => &self.absent,
            Bucket::Indeterminate => &self.indeterminate,
        }
    }

    /// Number of distinct site identities across all buckets.
    #[must_use]
    pub fn identity_count(&self) -> usize {
        self.present.len() + self.absent.len() + self.indeterminate.len()
    }
}

/// Site identity of a probe: the resolved URL's host, else the site name.
#[must_use]
pub fn site_identity(probe: &BoundProbe) -> String {
    url::Url::parse(probe.url())
        .ok()
        .and_then(|url| url.host_str().map(ToString::to_string))
        .unwrap_or_else(|| probe.name().to_string())
}

/// Folds probe outcomes into a [`ScanResult`].
#[derive(Debug, Default)]
pub struct ResultAggregator {
    sites: BTreeMap<String, (Bucket, String)>,
    folded: HashSet<(String, String)>,
    failure_count: usize,
}

impl ResultAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome. Returns `false` if this probe was already folded.
    ///
    /// When two probes resolve to the same identity the stronger bucket wins,
    /// and within a bucket the smaller URL wins, so the final state does not
    /// depend on the order outcomes arrive in.
    pub fn record(&mut self, probe: &BoundProbe, outcome: &ProbeOutcome) -> bool {
        let key = (probe.name().to_string(), probe.url().to_string());
        if !self.folded.insert(key) {
            debug!(site = probe.name(), "ignoring duplicate outcome");
            return false;
        }

        if outcome.is_failure() {
            self.failure_count += 1;
        }

        let bucket = Bucket::from(outcome);
        let identity = site_identity(probe);
        let url = probe.url();

        match self.sites.entry(identity) {
            Entry::Vacant(entry) => {
                entry.insert((bucket, url.to_string()));
            }
            Entry::Occupied(mut entry) => {
                let (current, current_url) = entry.get();
                if bucket > *current || (bucket == *current && url < current_url.as_str()) {
                    entry.insert((bucket, url.to_string()));
                }
            }
        }

        true
    }

    /// Fold a whole sequence of outcomes.
    pub fn fold<'a>(
        pairs: impl IntoIterator<Item = (&'a BoundProbe, &'a ProbeOutcome)>,
    ) -> ScanResult {
        let mut aggregator = Self::new();
        for (probe, outcome) in pairs {
            aggregator.record(probe, outcome);
        }
        aggregator.finish()
    }

    /// Drain a channel of outcomes until every sender is dropped.
    pub async fn collect(
        mut self,
        mut receiver: mpsc::Receiver<(BoundProbe, ProbeOutcome)>,
    ) -> ScanResult {
        while let Some((probe, outcome)) = receiver.recv().await {
            self.record(&probe, &outcome);
        }
        self.finish()
    }

    /// Number of distinct probes folded so far.
    #[must_use]
    pub fn folded_count(&self) -> usize {
        self.folded.len()
    }

    /// Produce the final result.
    #[must_use]
    pub fn finish(self) -> ScanResult {
        let mut result = ScanResult {
            total_sites: self.folded.len(),
            failure_count: self.failure_count,
            ..ScanResult::default()
        };

        for (identity, (bucket, url)) in self.sites {
            let map = match bucket {
                Bucket::Present => &mut result.present,
                Bucket::Absent => &mut result.absent,
                Bucket::Indeterminate => &mut result.indeterminate,
            };
            map.insert(identity, url);
        }

        result
    }
}
