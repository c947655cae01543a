//! In-memory site registry with query support.

use crate::{
    definition::ProbeDefinition,
    error::{RegistryError, Result},
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Ordered, read-only collection of probe definitions plus provenance.
///
/// A registry is a snapshot: it is built once by the loader and then shared
/// (`Arc<Registry>`) with every probe of a scan. Definitions are held behind
/// `Arc` so bound probes can reference them without copying.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    license: Vec<String>,
    authors: Vec<String>,
    sites: Vec<Arc<ProbeDefinition>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from already-validated definitions.
    ///
    /// # Errors
    /// Returns error if any definition fails validation.
    pub fn from_definitions(
        license: Vec<String>,
        authors: Vec<String>,
        definitions: impl IntoIterator<Item = ProbeDefinition>,
    ) -> Result<Self> {
        let sites = definitions
            .into_iter()
            .map(|def| def.validate().map(|()| Arc::new(def)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            license,
            authors,
            sites,
        })
    }

    /// License lines carried by the registry document.
    #[must_use]
    pub fn license(&self) -> &[String] {
        &self.license
    }

    /// Authors credited by the registry document.
    #[must_use]
    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    /// All definitions in document order.
    #[must_use]
    pub fn sites(&self) -> &[Arc<ProbeDefinition>] {
        &self.sites
    }

    /// Iterate over definitions in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ProbeDefinition>> {
        self.sites.iter()
    }

    /// Total number of definitions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.sites.len()
    }

    /// Whether the registry holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Look up a definition by site name (case-insensitive).
    ///
    /// # Errors
    /// Returns error if no site carries that name.
    pub fn get(&self, name: &str) -> Result<Arc<ProbeDefinition>> {
        self.sites
            .iter()
            .find(|def| def.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    /// Query definitions by category tag (case-insensitive).
    #[must_use]
    pub fn get_by_category(&self, category: &str) -> Vec<Arc<ProbeDefinition>> {
        self.sites
            .iter()
            .filter(|def| def.category.eq_ignore_ascii_case(category))
            .cloned()
            .collect()
    }

    /// Distinct category tags, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.count_by_category().into_keys().collect()
    }

    /// Number of definitions per category tag.
    #[must_use]
    pub fn count_by_category(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();

        for definition in &self.sites {
            *counts.entry(definition.category.clone()).or_insert(0) += 1;
        }

        counts
    }

    /// Number of definitions flagged as not valid by the registry maintainers.
    #[must_use]
    pub fn invalid_count(&self) -> usize {
        self.sites.iter().filter(|def| !def.valid).count()
    }
}
