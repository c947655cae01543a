use thiserror::Error;

/// Errors that abort a scan.
///
/// Per-site failures are not errors: they are recorded as
/// [`ProbeFailure`](crate::ProbeFailure) outcomes and never abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("No sites selected for scanning ({total} in registry)")]
    NoSitesSelected { total: usize },
}

pub type Result<T> = std::result::Result<T, ScanError>;
