//! Shared types used across handlescan.

use crate::error::HandlescanError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Maximum length of an account name, in characters.
pub const MAX_ACCOUNT_NAME_LEN: usize = 100;

/// Newtype for the account name being searched, with validation.
///
/// The name is substituted verbatim into every site's check URL, so it must
/// not contain whitespace, URL-structural characters (`/ ? # & %`) or template
/// braces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
    /// Create a new `AccountName` from a string.
    ///
    /// # Errors
    /// Returns error if the name is empty, too long, or contains characters
    /// that would change the structure of a URL.
    pub fn new(name: impl Into<String>) -> Result<Self, HandlescanError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(name: &str) -> Result<(), HandlescanError> {
        static ACCOUNT_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = ACCOUNT_REGEX
            .get_or_init(|| Regex::new(r"^[^\s/?#&%{}]+$").expect("valid regex"));

        let len = name.chars().count();
        if len == 0 || len > MAX_ACCOUNT_NAME_LEN {
            return Err(HandlescanError::Validation(format!(
                "invalid account name: must be 1-{MAX_ACCOUNT_NAME_LEN} characters, got {len}"
            )));
        }

        if regex.is_match(name) {
            Ok(())
        } else {
            Err(HandlescanError::Validation(format!(
                "invalid account name: whitespace and / ? # & % {{ }} are not allowed, got '{name}'"
            )))
        }
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AccountName {
    type Error = HandlescanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountName> for String {
    fn from(value: AccountName) -> Self {
        value.0
    }
}

impl std::str::FromStr for AccountName {
    type Err = HandlescanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
