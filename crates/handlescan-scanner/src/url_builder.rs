use handlescan_core::AccountName;
use handlescan_registry::{ProbeDefinition, ACCOUNT_PLACEHOLDER};
use std::sync::Arc;

/// A probe definition bound to one account name, ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundProbe {
    definition: Arc<ProbeDefinition>,
    url: String,
}

impl BoundProbe {
    pub fn definition(&self) -> &ProbeDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// The check URL with the account name substituted in.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Substitute `account` for every `{account}` in the definition's template.
///
/// The account name is inserted verbatim; `AccountName` validation keeps it
/// free of characters that would change the URL's structure.
pub fn bind(definition: &Arc<ProbeDefinition>, account: &AccountName) -> BoundProbe {
    BoundProbe {
        definition: Arc::clone(definition),
        url: definition
            .check_uri
            .replace(ACCOUNT_PLACEHOLDER, account.as_str()),
    }
}

/// Bind every definition, preserving order.
pub fn bind_all<'a>(
    definitions: impl IntoIterator<Item = &'a Arc<ProbeDefinition>>,
    account: &AccountName,
) -> Vec<BoundProbe> {
    definitions
        .into_iter()
        .map(|definition| bind(definition, account))
        .collect()
}
