//! Registry loading from a remote source or a local file.
//!
//! The document is decoded at the granularity of individual site records:
//! the top level must be a well-formed object, but each entry of `sites` is
//! decoded on its own and dropped if it fails to decode or validate.

use crate::{
    definition::ProbeDefinition,
    error::{RegistryError, Result},
    registry::Registry,
};
use handlescan_core::RegistryConfig;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Top-level shape of the registry document.
#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(default, deserialize_with = "null_as_empty")]
    license: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    authors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    sites: Vec<serde_json::Value>,
}

/// A `null` list reads as an empty one.
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Where a loader reads the registry document from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// Fetch over HTTP
    Remote {
        /// Document URL
        url: String,
        /// Hard timeout for the fetch
        timeout: Duration,
    },
    /// Read from disk
    File(std::path::PathBuf),
}

/// Loader for the site registry document.
pub struct RegistryLoader {
    source: RegistrySource,
}

impl RegistryLoader {
    /// Create a loader that fetches the registry from `url`.
    #[must_use]
    pub fn remote(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            source: RegistrySource::Remote {
                url: url.into(),
                timeout,
            },
        }
    }

    /// Create a loader that reads the registry from a local file.
    #[must_use]
    pub fn file(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            source: RegistrySource::File(path.into()),
        }
    }

    /// Create a loader from configuration, preferring a configured local file.
    #[must_use]
    pub fn from_config(config: &RegistryConfig) -> Self {
        match &config.local_path {
            Some(path) => Self::file(path.clone()),
            None => Self::remote(config.source_url.clone(), config.fetch_timeout()),
        }
    }

    /// The source this loader reads from.
    #[must_use]
    pub fn source(&self) -> &RegistrySource {
        &self.source
    }

    /// Load the registry from the configured source.
    pub async fn load_registry(&self) -> Result<Registry> {
        match &self.source {
            RegistrySource::Remote { url, timeout } => Self::load(url, *timeout).await,
            RegistrySource::File(path) => Self::load_file(path).await,
        }
    }

    /// Fetch and parse the registry document at `source_url`.
    ///
    /// Issues a single GET bounded by `fetch_timeout`. Transport failures,
    /// timeouts and non-2xx statuses are fetch errors; a body that is not a
    /// registry object is a parse error. Malformed site entries are skipped.
    pub async fn load(source_url: &str, fetch_timeout: Duration) -> Result<Registry> {
        let client = Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| RegistryError::Client(e.to_string()))?;

        debug!(url = %source_url, timeout = ?fetch_timeout, "fetching registry");

        let response = client
            .get(source_url)
            .send()
            .await
            .map_err(|e| RegistryError::Fetch {
                url: source_url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                url: source_url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| RegistryError::Fetch {
            url: source_url.to_string(),
            source: e,
        })?;

        let registry = parse_registry(&body)?;

        info!(
            count = registry.count(),
            url = %source_url,
            "loaded site registry"
        );

        Ok(registry)
    }

    /// Read and parse a registry document from disk.
    pub async fn load_file(path: &Path) -> Result<Registry> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RegistryError::Io {
                path: path.display().to_string(),
                source: e,
            })?;

        let registry = parse_registry(&contents)?;

        info!(
            count = registry.count(),
            path = %path.display(),
            "loaded site registry"
        );

        Ok(registry)
    }
}

/// Parse a registry document.
///
/// Entries that fail to decode or validate are skipped; an empty or missing
/// `sites` array yields an empty registry.
pub fn parse_registry(document: &str) -> Result<Registry> {
    let document: RegistryDocument = serde_json::from_str(document)?;
    let total = document.sites.len();

    let mut sites = Vec::with_capacity(total);
    for (index, entry) in document.sites.into_iter().enumerate() {
        match serde_json::from_value::<ProbeDefinition>(entry) {
            Ok(definition) => {
                if let Err(e) = definition.validate() {
                    debug!(index, error = %e, "skipping invalid site entry");
                    continue;
                }
                sites.push(definition);
            }
            Err(e) => {
                debug!(index, error = %e, "skipping malformed site entry");
            }
        }
    }

    let skipped = total - sites.len();
    if skipped > 0 {
        warn!(skipped, total, "dropped malformed registry entries");
    }

    Registry::from_definitions(document.license, document.authors, sites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TWO_SITES: &str = r#"{
        "license": ["Creative Commons Attribution-ShareAlike 4.0"],
        "authors": ["WebBreacher", "Micah Hoffman"],
        "sites": [
            {
                "name": "ExampleSite",
                "check_uri": "https://example.test/u/{account}",
                "account_existence_string": "profile-found",
                "account_missing_string": "no-such-user",
                "category": "social",
                "valid": true
            },
            {
                "name": "Other",
                "check_uri": "https://other.test/{account}",
                "category": "coding"
            }
        ]
    }"#;

    #[test]
    fn test_parse_registry() {
        let registry = parse_registry(TWO_SITES).expect("parse registry");
        assert_eq!(registry.count(), 2);
        assert_eq!(registry.authors().len(), 2);
        assert_eq!(
            registry.license(),
            ["Creative Commons Attribution-ShareAlike 4.0".to_string()]
        );
        assert_eq!(registry.sites()[0].name, "ExampleSite");
    }

    #[test]
    fn test_parse_skips_entry_without_template() {
        let document = r#"{
            "license": [],
            "authors": [],
            "sites": [
                {
                    "name": "ExampleSite",
                    "check_uri": "https://example.test/u/{account}",
                    "account_existence_string": "profile-found",
                    "account_missing_string": "no-such-user"
                },
                {
                    "name": "NoTemplate",
                    "account_existence_string": "profile-found"
                }
            ]
        }"#;

        let registry = parse_registry(document).expect("parse registry");
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.sites()[0].name, "ExampleSite");
    }

    #[test]
    fn test_parse_skips_malformed_types_and_empty_fields() {
        let document = r#"{
            "sites": [
                42,
                "not an object",
                {"name": ["array"], "check_uri": "https://x.test/{account}"},
                {"name": "", "check_uri": "https://empty-name.test/{account}"},
                {"name": "EmptyTemplate", "check_uri": ""},
                {"name": "Valid", "check_uri": "https://valid.test/{account}", "valid": "yes"},
                {"name": "Good", "check_uri": "https://good.test/{account}"}
            ]
        }"#;

        let registry = parse_registry(document).expect("parse registry");
        let names: Vec<_> = registry.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Good"]);
    }

    #[test]
    fn test_parse_empty_sites() {
        let registry =
            parse_registry(r#"{"license": [], "authors": [], "sites": []}"#).expect("parse");
        assert!(registry.is_empty());

        let registry = parse_registry(r#"{"license": ["MIT"]}"#).expect("parse");
        assert!(registry.is_empty());
        assert_eq!(registry.license().len(), 1);
    }

    #[test]
    fn test_parse_null_lists_are_empty() {
        let registry = parse_registry(r#"{"license": [], "authors": [], "sites": null}"#)
            .expect("null sites is an empty registry");
        assert!(registry.is_empty());

        let registry = parse_registry(
            r#"{
                "license": null,
                "authors": null,
                "sites": [{"name": "Bare", "check_uri": "https://bare.test/{account}"}]
            }"#,
        )
        .expect("null provenance is empty");
        assert_eq!(registry.count(), 1);
        assert!(registry.license().is_empty());
        assert!(registry.authors().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_container() {
        for document in ["", "[1, 2, 3]", "\"sites\"", "{\"sites\": 5}", "{not json"] {
            let result = parse_registry(document);
            assert!(
                matches!(result, Err(RegistryError::Parse(_))),
                "expected parse error for {document:?}"
            );
        }
    }

    #[test]
    fn test_from_config_prefers_local_file() {
        let mut config = RegistryConfig::default();
        let loader = RegistryLoader::from_config(&config);
        assert!(matches!(loader.source(), RegistrySource::Remote { .. }));

        config.local_path = Some("wmn-data.json".into());
        let loader = RegistryLoader::from_config(&config);
        assert_eq!(
            loader.source(),
            &RegistrySource::File("wmn-data.json".into())
        );
    }

    #[tokio::test]
    async fn test_load_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("wmn-data.json");
        std::fs::write(&path, TWO_SITES).expect("write registry file");

        let registry = RegistryLoader::file(&path)
            .load_registry()
            .await
            .expect("load registry file");
        assert_eq!(registry.count(), 2);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = RegistryLoader::load_file(Path::new("/nonexistent/wmn-data.json")).await;
        assert!(matches!(result, Err(RegistryError::Io { .. })));
    }

    #[tokio::test]
    async fn test_load_unreachable_source_is_fetch_error() {
        // Reserve a loopback port, then release it so nothing is listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind listener");
            listener.local_addr().expect("local addr").port()
        };

        let url = format!("http://127.0.0.1:{port}/wmn-data.json");
        let result = RegistryLoader::load(&url, Duration::from_secs(2)).await;
        let err = result.unwrap_err();
        assert!(err.is_fetch_error(), "unexpected error: {err}");
    }
}
