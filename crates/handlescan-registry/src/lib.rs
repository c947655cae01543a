//! Handlescan Registry - Site probe definitions for account discovery.
//!
//! This crate provides the types and loading logic for the site registry: the
//! JSON document (WhatsMyName format) listing every site that can be probed
//! for an account, how to build its check URL, and which response markers
//! mean "account exists" or "account missing".
//!
//! # Architecture
//!
//! - **Definition Types** ([`definition`]): one typed row of the registry
//! - **Loader** ([`loader`]): remote fetch or local file, per-entry decoding
//! - **Registry** ([`registry`]): ordered read-only snapshot with queries
//! - **Errors** ([`error`]): registry-specific error types
//!
//! # Example
//!
//! ```rust,no_run
//! use handlescan_registry::RegistryLoader;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = RegistryLoader::load(
//!     "https://raw.githubusercontent.com/WebBreacher/WhatsMyName/main/wmn-data.json",
//!     Duration::from_secs(2),
//! )
//! .await?;
//!
//! println!("{} sites", registry.count());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod definition;
pub mod error;
pub mod loader;
pub mod registry;

// Re-export commonly used types
pub use definition::{ProbeDefinition, ACCOUNT_PLACEHOLDER};
pub use error::{RegistryError, Result};
pub use loader::{parse_registry, RegistryLoader, RegistrySource};
pub use registry::Registry;
