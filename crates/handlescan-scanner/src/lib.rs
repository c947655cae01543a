//! Handlescan Scanner - Concurrent account probing.
//!
//! This crate checks one account name against every site in a registry. Each
//! site's check URL is bound to the account, fetched under its own timeout,
//! classified by body markers and folded into present/absent/indeterminate
//! buckets keyed by site.
//!
//! # Features
//!
//! - Concurrent probing with a configurable in-flight cap
//! - Per-probe timeouts plus an optional scan-level deadline
//! - Order-independent aggregation through a single channel consumer
//! - Category, site-name and validity filtering
//!
//! # Example
//!
//! ```rust,no_run
//! use handlescan_core::AccountName;
//! use handlescan_registry::RegistryLoader;
//! use handlescan_scanner::{ScanSession, ScanSettings};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = RegistryLoader::load(
//!     "https://raw.githubusercontent.com/WebBreacher/WhatsMyName/main/wmn-data.json",
//!     Duration::from_secs(2),
//! )
//! .await?;
//!
//! let session = ScanSession::new(
//!     Arc::new(registry),
//!     AccountName::new("alice")?,
//!     ScanSettings::default(),
//! );
//! let report = session.run_with_client().await?;
//!
//! for (site, url) in &report.result.present {
//!     println!("{site}: {url}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod aggregator;
pub mod classifier;
pub mod dispatcher;
#[allow(missing_docs)]
pub mod error;
pub mod fetcher;
#[allow(missing_docs)]
pub mod filter;
pub mod session;
#[allow(missing_docs)]
pub mod url_builder;

#[cfg(test)]
#[allow(missing_docs)]
mod test_support;

// Re-export commonly used types
pub use aggregator::{site_identity, Bucket, ResultAggregator, ScanResult};
pub use classifier::{classify, classify_for, ProbeOutcome};
pub use dispatcher::{ProbeDispatcher, DEFAULT_MAX_CONCURRENT, DEFAULT_PROBE_TIMEOUT};
pub use error::{Result, ScanError};
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher, ProbeFailure, ProbeResponse};
pub use filter::{SiteFilter, SiteSelection};
pub use session::{ScanReport, ScanSession, ScanSettings};
pub use url_builder::{bind, bind_all, BoundProbe};
