//! Classification output.

use super::SalienceLevel;
use serde::Serialize;

/// Result of running one event through the classification pipeline.
///
/// Produced once per event and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    /// Assigned importance tier.
    pub salience: SalienceLevel,
    /// One-line, rule-derived summary of the event.
    pub gist: String,
    /// Whether secret material was found (and withheld or redacted).
    pub contains_secrets: bool,
}

impl ClassificationResult {
    /// Creates a result for an event that carried no secrets.
    #[must_use]
    pub fn new(salience: SalienceLevel, gist: impl Into<String>) -> Self {
        Self {
            salience,
            gist: gist.into(),
            contains_secrets: false,
        }
    }

    /// Marks the result as having contained secrets.
    #[must_use]
    pub const fn with_secrets(mut self, contains_secrets: bool) -> Self {
        self.contains_secrets = contains_secrets;
        self
    }
}
