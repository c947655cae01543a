//! Response classification.

use crate::fetcher::{ProbeFailure, ProbeResponse};
use handlescan_registry::ProbeDefinition;
use serde::Serialize;

/// Classified result of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "failure", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The existence marker was found
    Present,
    /// The missing marker was found
    Absent,
    /// Neither marker was found
    Indeterminate,
    /// No page was read
    Failed(ProbeFailure),
}

impl ProbeOutcome {
    /// Whether the probe produced no page.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Classify a probe response against a site's markers.
///
/// The existence marker is checked first, so a body containing both markers
/// is `Present`. Matching is case-sensitive substring containment and the
/// HTTP status is not consulted. An empty marker is contained in every body.
#[must_use]
pub fn classify(
    response: &ProbeResponse,
    exists_marker: &str,
    missing_marker: &str,
) -> ProbeOutcome {
    let page = match response {
        ProbeResponse::Failed(failure) => return ProbeOutcome::Failed(failure.clone()),
        ProbeResponse::Page(page) => page,
    };

    if page.body.contains(exists_marker) {
        ProbeOutcome::Present
    } else if page.body.contains(missing_marker) {
        ProbeOutcome::Absent
    } else {
        ProbeOutcome::Indeterminate
    }
}

/// Classify a response using the markers of `definition`.
#[must_use]
pub fn classify_for(definition: &ProbeDefinition, response: &ProbeResponse) -> ProbeOutcome {
    classify(
        response,
        &definition.exists_marker,
        &definition.missing_marker,
    )
}
