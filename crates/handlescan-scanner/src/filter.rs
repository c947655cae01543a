#![allow(clippy::must_use_candidate)]

use handlescan_registry::{ProbeDefinition, Registry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which registry entries a scan probes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteSelection {
    #[default]
    All,
    Category(String),
    Specific(Vec<String>),
}

/// Selection plus the registry validity flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteFilter {
    pub selection: SiteSelection,
    /// Drop entries the registry marks as not valid
    #[serde(default)]
    pub valid_only: bool,
}

impl SiteFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            selection: SiteSelection::Category(category.into()),
            valid_only: false,
        }
    }

    pub fn specific<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selection: SiteSelection::Specific(names.into_iter().map(Into::into).collect()),
            valid_only: false,
        }
    }

    #[must_use]
    pub fn with_valid_only(mut self, valid_only: bool) -> Self {
        self.valid_only = valid_only;
        self
    }

    pub fn matches(&self, site: &ProbeDefinition) -> bool {
        if self.valid_only && !site.valid {
            return false;
        }

        match &self.selection {
            SiteSelection::All => true,
            SiteSelection::Category(cat) => site.category.eq_ignore_ascii_case(cat),
            SiteSelection::Specific(names) => names
                .iter()
                .any(|name| site.name.eq_ignore_ascii_case(name)),
        }
    }

    /// Matching definitions in registry order.
    pub fn apply(&self, registry: &Registry) -> Vec<Arc<ProbeDefinition>> {
        registry
            .iter()
            .filter(|site| self.matches(site))
            .cloned()
            .collect()
    }
}
