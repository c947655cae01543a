//! Site probe definition types.
//!
//! This module defines the data structure for one row of the registry
//! document. Both the legacy WhatsMyName field names (`check_uri`,
//! `account_existence_string`, ...) and the current ones (`uri_check`,
//! `e_string`, ...) are accepted.

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder token replaced by the account name in a check URL.
pub const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// One site probe definition loaded from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeDefinition {
    /// Human-readable site name
    pub name: String,

    /// Check URL template containing `{account}`
    #[serde(rename = "check_uri", alias = "uri_check")]
    pub check_uri: String,

    /// HTTP status expected when the account exists
    #[serde(
        default,
        rename = "account_existence_code",
        alias = "e_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub exists_code: Option<u16>,

    /// Body substring expected when the account exists
    #[serde(default, rename = "account_existence_string", alias = "e_string")]
    pub exists_marker: String,

    /// HTTP status expected when the account is missing
    #[serde(
        default,
        rename = "account_missing_code",
        alias = "m_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub missing_code: Option<u16>,

    /// Body substring expected when the account is missing
    #[serde(default, rename = "account_missing_string", alias = "m_string")]
    pub missing_marker: String,

    /// Accounts known to exist on the site
    #[serde(default, rename = "known_accounts", alias = "known")]
    pub known_accounts: Vec<String>,

    /// Category tag (e.g. "social", "coding")
    #[serde(default, alias = "cat")]
    pub category: String,

    /// Whether the registry maintainers consider this probe reliable
    #[serde(default = "default_valid")]
    pub valid: bool,

    /// Free-text maintainer notes
    #[serde(default, deserialize_with = "deserialize_comments")]
    pub comments: Vec<String>,
}

impl ProbeDefinition {
    /// Create a definition with the required fields and empty optional ones.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        check_uri: impl Into<String>,
        exists_marker: impl Into<String>,
        missing_marker: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            check_uri: check_uri.into(),
            exists_code: None,
            exists_marker: exists_marker.into(),
            missing_code: None,
            missing_marker: missing_marker.into(),
            known_accounts: Vec::new(),
            category: String::new(),
            valid: true,
            comments: Vec::new(),
        }
    }

    /// Set the category tag.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the validity flag.
    #[must_use]
    pub fn with_valid(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }

    /// Validate the structural invariants every registry entry must hold.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::ValidationError {
                name: self.name.clone(),
                reason: "site name cannot be empty".to_string(),
            });
        }

        if self.check_uri.trim().is_empty() {
            return Err(RegistryError::ValidationError {
                name: self.name.clone(),
                reason: "check URL template cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn default_valid() -> bool {
    true
}

/// Accept status codes as JSON numbers or numeric strings; `""` and `null` mean none.
fn deserialize_status_code<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCode {
        Number(u16),
        Text(String),
    }

    match Option::<RawCode>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawCode::Number(code)) => Ok(Some(code)),
        Some(RawCode::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else {
                text.parse().map(Some).map_err(serde::de::Error::custom)
            }
        }
    }
}

/// Accept comments as a list of strings or a single string.
fn deserialize_comments<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawComments {
        Many(Vec<String>),
        One(String),
    }

    Ok(match Option::<RawComments>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(RawComments::Many(comments)) => comments,
        Some(RawComments::One(comment)) if comment.is_empty() => Vec::new(),
        Some(RawComments::One(comment)) => vec![comment],
    })
}
