//! Scan sessions.
//!
//! A `ScanSession` owns everything one scan needs: a shared registry
//! snapshot, the account name, dispatch settings and a site filter. Sessions
//! hold no mutable shared state, so any number of them may run at once
//! against the same `Arc<Registry>`.

use crate::aggregator::{ResultAggregator, ScanResult};
use crate::dispatcher::ProbeDispatcher;
use crate::error::{Result, ScanError};
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::filter::{SiteFilter, SiteSelection};
use crate::url_builder::bind_all;
use chrono::{DateTime, Utc};
use handlescan_core::{AccountName, ScanningConfig};
use handlescan_registry::Registry;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Dispatch settings for one session.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Timeout applied to each probe
    pub probe_timeout: Duration,
    /// Maximum probes in flight (0 = unbounded)
    pub max_concurrent: usize,
    /// Deadline for the whole scan
    pub scan_deadline: Option<Duration>,
    /// User agent sent by the HTTP fetcher
    pub user_agent: String,
    /// Skip entries flagged as not valid
    pub valid_only: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self::from(&ScanningConfig::default())
    }
}

impl From<&ScanningConfig> for ScanSettings {
    fn from(config: &ScanningConfig) -> Self {
        Self {
            probe_timeout: config.probe_timeout(),
            max_concurrent: config.max_concurrent_probes,
            scan_deadline: config.scan_deadline(),
            user_agent: config.user_agent.clone(),
            valid_only: config.valid_only,
        }
    }
}

/// Outcome of one finished scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Unique identifier of this scan
    pub scan_id: Uuid,
    /// Account that was probed
    pub account: AccountName,
    /// Sites selected for probing
    pub sites_selected: usize,
    /// Bucketed results
    pub result: ScanResult,
    /// When dispatch started
    pub started_at: DateTime<Utc>,
    /// When the last outcome was folded
    pub finished_at: DateTime<Utc>,
    /// Wall time of the scan in milliseconds
    pub elapsed_ms: u64,
}

/// One scan of one account against a registry snapshot.
#[derive(Debug, Clone)]
pub struct ScanSession {
    registry: Arc<Registry>,
    account: AccountName,
    settings: ScanSettings,
    filter: SiteFilter,
}

impl ScanSession {
    /// Create a session that probes every site in `registry`.
    #[must_use]
    pub fn new(registry: Arc<Registry>, account: AccountName, settings: ScanSettings) -> Self {
        Self {
            registry,
            account,
            settings,
            filter: SiteFilter::all(),
        }
    }

    /// Restrict the sites this session probes.
    #[must_use]
    pub fn with_filter(mut self, filter: SiteFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Account this session probes for.
    #[must_use]
    pub fn account(&self) -> &AccountName {
        &self.account
    }

    /// Settings this session dispatches with.
    #[must_use]
    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Run the scan with an HTTP fetcher built from the session settings.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created or the filter
    /// selects no site.
    pub async fn run_with_client(&self) -> Result<ScanReport> {
        let fetcher = HttpFetcher::new(self.settings.probe_timeout, &self.settings.user_agent)?;
        self.run(Arc::new(fetcher)).await
    }

    /// Bind, dispatch and aggregate every selected site.
    ///
    /// Probe failures never fail the scan; they land in the indeterminate
    /// bucket and are counted in `failure_count`.
    ///
    /// # Errors
    /// Returns error if an explicit category or site selection matches
    /// nothing in the registry.
    pub async fn run(&self, fetcher: Arc<dyn PageFetcher>) -> Result<ScanReport> {
        let filter = self
            .filter
            .clone()
            .with_valid_only(self.filter.valid_only || self.settings.valid_only);
        let selected = filter.apply(&self.registry);

        if selected.is_empty() && filter.selection != SiteSelection::All {
            return Err(ScanError::NoSitesSelected {
                total: self.registry.count(),
            });
        }

        let probes = bind_all(&selected, &self.account);
        let sites_selected = probes.len();

        let dispatcher = ProbeDispatcher::new(fetcher, self.settings.probe_timeout)
            .with_max_concurrent(self.settings.max_concurrent)
            .with_scan_deadline(self.settings.scan_deadline);
        let (sender, receiver) = mpsc::channel(dispatcher.concurrency_for(sites_selected));

        let scan_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            %scan_id,
            account = %self.account,
            sites = sites_selected,
            registry_size = self.registry.count(),
            "starting scan"
        );

        let (delivered, result) = tokio::join!(
            dispatcher.dispatch_to(probes, sender),
            ResultAggregator::new().collect(receiver),
        );

        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            %scan_id,
            delivered,
            present = result.present.len(),
            absent = result.absent.len(),
            indeterminate = result.indeterminate.len(),
            failures = result.failure_count,
            elapsed_ms,
            "scan complete"
        );

        Ok(ScanReport {
            scan_id,
            account: self.account.clone(),
            sites_selected,
            result,
            started_at,
            finished_at: Utc::now(),
            elapsed_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Bucket;
    use crate::test_support::{Script, ScriptedFetcher};
    use handlescan_registry::ProbeDefinition;

    fn account(name: &str) -> AccountName {
        AccountName::new(name).expect("valid account name")
    }

    fn example_registry() -> Arc<Registry> {
        Arc::new(
            Registry::from_definitions(
                vec![],
                vec![],
                vec![ProbeDefinition::new(
                    "ExampleSite",
                    "https://example.test/u/{account}",
                    "profile-found",
                    "no-such-user",
                )
                .with_category("social")],
            )
            .expect("valid test registry"),
        )
    }

    fn mixed_registry() -> Arc<Registry> {
        Arc::new(
            Registry::from_definitions(
                vec!["CC BY-SA 4.0".to_string()],
                vec!["tester".to_string()],
                vec![
                    ProbeDefinition::new("Alpha", "https://alpha.test/{account}", "found", "missing")
                        .with_category("coding"),
                    ProbeDefinition::new("Beta", "https://beta.test/{account}", "found", "missing")
                        .with_category("coding")
                        .with_valid(false),
                    ProbeDefinition::new("Gamma", "https://gamma.test/{account}", "found", "missing")
                        .with_category("social"),
                ],
            )
            .expect("valid test registry"),
        )
    }

    #[tokio::test]
    async fn test_example_site_present() {
        let fetcher = Arc::new(ScriptedFetcher::new().with(
            "https://example.test/u/alice",
            Script::page("<div>profile-found</div>"),
        ));
        let session = ScanSession::new(example_registry(), account("alice"), ScanSettings::default());

        let report = session.run(fetcher).await.expect("scan should succeed");

        assert_eq!(report.sites_selected, 1);
        assert_eq!(
            report.result.present.get("example.test").map(String::as_str),
            Some("https://example.test/u/alice")
        );
        assert!(report.result.absent.is_empty());
        assert!(report.result.indeterminate.is_empty());
        assert_eq!(report.result.failure_count, 0);
        assert!(report.finished_at >= report.started_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_indeterminate_failure() {
        let fetcher = Arc::new(ScriptedFetcher::new().with_fallback(Script::Hang));
        let settings = ScanSettings {
            probe_timeout: Duration::from_secs(5),
            ..ScanSettings::default()
        };
        let session = ScanSession::new(example_registry(), account("alice"), settings);

        let report = session.run(fetcher).await.expect("scan should succeed");

        assert!(report.result.present.is_empty());
        assert!(report.result.absent.is_empty());
        assert_eq!(report.result.indeterminate.len(), 1);
        assert_eq!(report.result.failure_count, 1);
        assert_eq!(
            report.result.bucket_of("example.test"),
            Some(Bucket::Indeterminate)
        );
    }

    #[tokio::test]
    async fn test_every_site_lands_in_one_bucket() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .with("https://alpha.test/bob", Script::page("found"))
                .with("https://beta.test/bob", Script::page("missing"))
                .with("https://gamma.test/bob", Script::fail("connection refused")),
        );
        let session = ScanSession::new(mixed_registry(), account("bob"), ScanSettings::default());

        let report = session.run(fetcher.clone()).await.expect("scan should succeed");

        assert_eq!(report.result.total_sites, 3);
        assert_eq!(report.result.identity_count(), 3);
        assert_eq!(report.result.bucket_of("alpha.test"), Some(Bucket::Present));
        assert_eq!(report.result.bucket_of("beta.test"), Some(Bucket::Absent));
        assert_eq!(
            report.result.bucket_of("gamma.test"),
            Some(Bucket::Indeterminate)
        );
        assert_eq!(report.result.failure_count, 1);
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_valid_only_setting_skips_invalid_sites() {
        let fetcher = Arc::new(ScriptedFetcher::new().with_fallback(Script::page("found")));
        let settings = ScanSettings {
            valid_only: true,
            ..ScanSettings::default()
        };
        let session = ScanSession::new(mixed_registry(), account("bob"), settings);

        let report = session.run(fetcher.clone()).await.expect("scan should succeed");

        assert_eq!(report.sites_selected, 2);
        assert!(!fetcher.calls().contains(&"https://beta.test/bob".to_string()));
    }

    #[tokio::test]
    async fn test_category_filter() {
        let fetcher = Arc::new(ScriptedFetcher::new().with_fallback(Script::page("found")));
        let session = ScanSession::new(mixed_registry(), account("bob"), ScanSettings::default())
            .with_filter(SiteFilter::category("social"));

        let report = session.run(fetcher).await.expect("scan should succeed");

        assert_eq!(report.sites_selected, 1);
        assert!(report.result.present.contains_key("gamma.test"));
    }

    #[tokio::test]
    async fn test_unmatched_selection_is_an_error() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let session = ScanSession::new(mixed_registry(), account("bob"), ScanSettings::default())
            .with_filter(SiteFilter::specific(["nowhere"]));

        let err = session.run(fetcher).await.expect_err("nothing selected");
        assert!(matches!(err, ScanError::NoSitesSelected { total: 3 }));
    }

    #[tokio::test]
    async fn test_empty_registry_yields_empty_result() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let session = ScanSession::new(
            Arc::new(Registry::new()),
            account("bob"),
            ScanSettings::default(),
        );

        let report = session.run(fetcher).await.expect("scan should succeed");
        assert_eq!(report.result, ScanResult::default());
    }

    #[tokio::test]
    async fn test_concurrent_sessions_are_independent() {
        let registry = mixed_registry();
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .with("https://alpha.test/alice", Script::page("found"))
                .with_fallback(Script::page("missing")),
        );

        let alice = ScanSession::new(Arc::clone(&registry), account("alice"), ScanSettings::default());
        let bob = ScanSession::new(Arc::clone(&registry), account("bob"), ScanSettings::default());

        let (alice, bob) = tokio::join!(alice.run(fetcher.clone()), bob.run(fetcher.clone()));
        let alice = alice.expect("alice scan");
        let bob = bob.expect("bob scan");

        assert_ne!(alice.scan_id, bob.scan_id);
        assert_eq!(alice.result.present.len(), 1);
        assert!(bob.result.present.is_empty());
        assert_eq!(bob.result.absent.len(), 3);
    }

    #[test]
    fn test_settings_from_config() {
        let config = ScanningConfig {
            probe_timeout_secs: 9,
            max_concurrent_probes: 0,
            scan_deadline_secs: 30,
            valid_only: true,
            ..ScanningConfig::default()
        };

        let settings = ScanSettings::from(&config);
        assert_eq!(settings.probe_timeout, Duration::from_secs(9));
        assert_eq!(settings.max_concurrent, 0);
        assert_eq!(settings.scan_deadline, Some(Duration::from_secs(30)));
        assert!(settings.valid_only);
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let fetcher = Arc::new(ScriptedFetcher::new().with_fallback(Script::page("profile-found")));
        let session = ScanSession::new(example_registry(), account("alice"), ScanSettings::default());

        let report = session.run(fetcher).await.expect("scan should succeed");
        let json = serde_json::to_value(&report).expect("report serializes");

        assert_eq!(json["account"], "alice");
        assert_eq!(
            json["result"]["present"]["example.test"],
            "https://example.test/u/alice"
        );
    }
}
