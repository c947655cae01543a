//! Handlescan Core - Foundation crate for the handlescan workspace.
//!
//! This crate provides the shared types, error handling and configuration
//! management that the registry, scanner and CLI crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes (`AccountName`)
//!
//! # Example
//!
//! ```rust
//! use handlescan_core::{AccountName, AppConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let account = AccountName::new("alice")?;
//!
//! println!("probing for {account} with {:?} per site", config.scanning.probe_timeout());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, LoggingConfig, RegistryConfig, ScanningConfig, DEFAULT_REGISTRY_URL};
pub use error::{ConfigError, ConfigResult, HandlescanError, Result};
pub use types::{AccountName, MAX_ACCOUNT_NAME_LEN};
