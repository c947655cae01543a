//! Error types for the registry subsystem.

use thiserror::Error;

/// Errors that can occur while loading or querying the site registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Transport failure or timeout fetching the registry document
    #[error("failed to fetch registry from {url}: {source}")]
    Fetch {
        /// Registry source URL
        url: String,
        /// Underlying HTTP error
        #[source]
        source: reqwest::Error,
    },

    /// Registry source answered with a non-success status
    #[error("registry source {url} returned HTTP {status}")]
    Status {
        /// Registry source URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Registry document is not a well-formed container
    #[error("failed to parse registry document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read a local registry file
    #[error("failed to read registry file {path}: {source}")]
    Io {
        /// Path to the registry file
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A definition failed validation
    #[error("invalid site definition for '{name}': {reason}")]
    ValidationError {
        /// Site name being validated
        name: String,
        /// Reason for validation failure
        reason: String,
    },

    /// Site not present in the registry
    #[error("site not found in registry: {name}")]
    NotFound {
        /// The site name that was not found
        name: String,
    },

    /// HTTP client could not be constructed
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl RegistryError {
    /// Whether this error came from fetching the document (transport or status).
    #[must_use]
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Status { .. })
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
