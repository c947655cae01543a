//! Configuration management for handlescan.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default registry document (WhatsMyName site list).
pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/WebBreacher/WhatsMyName/main/wmn-data.json";

/// Main application configuration.
///
/// This is loaded from `~/.config/handlescan/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the site registry comes from
    pub registry: RegistryConfig,
    /// Probe dispatch settings
    pub scanning: ScanningConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file path.
    ///
    /// The result is not validated: callers apply overrides first and then
    /// call [`AppConfig::validate`].
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `HANDLESCAN_REGISTRY_URL`: Override the registry source URL
    /// - `HANDLESCAN_REGISTRY_FILE`: Read the registry from a local file instead
    /// - `HANDLESCAN_PROBE_TIMEOUT_SECS`: Override the per-probe timeout
    /// - `HANDLESCAN_MAX_CONCURRENT`: Override the concurrency cap (0 = unbounded)
    /// - `HANDLESCAN_LOG_JSON`: Emit JSON log lines (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to an already-loaded config.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("HANDLESCAN_REGISTRY_URL") {
            if !val.is_empty() {
                tracing::debug!("Override registry.source_url from env: {}", val);
                self.registry.source_url = val;
            }
        }

        if let Ok(val) = std::env::var("HANDLESCAN_REGISTRY_FILE") {
            if !val.is_empty() {
                tracing::debug!("Override registry.local_path from env: {}", val);
                self.registry.local_path = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = std::env::var("HANDLESCAN_PROBE_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.scanning.probe_timeout_secs = secs;
                tracing::debug!("Override scanning.probe_timeout_secs from env: {}", secs);
            }
        }

        if let Ok(val) = std::env::var("HANDLESCAN_MAX_CONCURRENT") {
            if let Ok(max) = val.parse() {
                self.scanning.max_concurrent_probes = max;
                tracing::debug!("Override scanning.max_concurrent_probes from env: {}", max);
            }
        }

        if let Ok(val) = std::env::var("HANDLESCAN_LOG_JSON") {
            if let Ok(json) = val.parse() {
                self.logging.json = json;
                tracing::debug!("Override logging.json from env: {}", json);
            }
        }
    }

    /// Check values that would make a scan impossible.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.registry.source_url.trim().is_empty() && self.registry.local_path.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "registry.source_url".to_string(),
                reason: "cannot be empty when no local_path is set".to_string(),
            });
        }

        if self.registry.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "registry.fetch_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.scanning.probe_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanning.probe_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Serialize the configuration as pretty TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/handlescan/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("org", "handlescan", "handlescan")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Registry source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// URL of the registry document
    pub source_url: String,
    /// Timeout for fetching the registry, in seconds
    pub fetch_timeout_secs: u64,
    /// Read the registry from this file instead of fetching it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl RegistryConfig {
    /// Registry fetch timeout as a `Duration`.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_REGISTRY_URL.to_string(),
            fetch_timeout_secs: 2,
            local_path: None,
        }
    }
}

/// Probe dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// Per-probe timeout in seconds
    pub probe_timeout_secs: u64,
    /// Maximum probes in flight at once (0 = unbounded)
    pub max_concurrent_probes: usize,
    /// Deadline for a whole scan in seconds (0 = none)
    pub scan_deadline_secs: u64,
    /// User agent sent with every probe
    pub user_agent: String,
    /// Skip registry entries flagged as not valid
    pub valid_only: bool,
}

impl ScanningConfig {
    /// Per-probe timeout as a `Duration`.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Scan deadline, if one is configured.
    #[must_use]
    pub fn scan_deadline(&self) -> Option<Duration> {
        (self.scan_deadline_secs > 0).then(|| Duration::from_secs(self.scan_deadline_secs))
    }
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 5,
            max_concurrent_probes: 64,
            scan_deadline_secs: 0,
            user_agent: concat!("handlescan/", env!("CARGO_PKG_VERSION")).to_string(),
            valid_only: false,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON-formatted log lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
