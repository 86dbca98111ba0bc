//! Memory types and identifiers.

use super::SalienceLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds in a day, for age calculations.
const SECONDS_PER_DAY: u64 = 86_400;

/// Unique identifier for a memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(String);

impl MemoryId {
    /// Creates a new memory ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MemoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MemoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Metadata recorded with every remembered event.
///
/// Serialized with a `type` tag so stored memories stay self-describing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemoryMetadata {
    /// Produced by a `file_edit` event.
    FileEdit {
        /// Edited file path.
        file: String,
        /// Assigned salience.
        salience: SalienceLevel,
    },
    /// Produced by a `terminal_output` event.
    Terminal {
        /// Command line.
        command: String,
        /// Exit code.
        exit_code: i64,
        /// Assigned salience.
        salience: SalienceLevel,
    },
    /// Produced by a `diagnostic` event.
    Diagnostic {
        /// File path.
        file: String,
        /// Severity as reported by the editor.
        severity: String,
        /// Assigned salience.
        salience: SalienceLevel,
    },
}

impl MemoryMetadata {
    /// Returns the source identifier (file path or command line).
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::FileEdit { file, .. } | Self::Diagnostic { file, .. } => file,
            Self::Terminal { command, .. } => command,
        }
    }
}

/// A persisted unit in the memory store.
///
/// Owned by the store; the bridge only reads the fields returned by recall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    /// Unique identifier.
    pub id: MemoryId,
    /// Condensed form, when the store keeps one separately.
    #[serde(default)]
    pub gist: Option<String>,
    /// The content as it was handed to the store.
    pub verbatim: String,
    /// Importance tier.
    pub salience: SalienceLevel,
    /// Creation timestamp (Unix epoch seconds).
    pub created_at: u64,
    /// Event metadata.
    pub metadata: MemoryMetadata,
}

impl Memory {
    /// Returns the gist if present, otherwise the verbatim content.
    #[must_use]
    pub fn gist_or_verbatim(&self) -> &str {
        self.gist.as_deref().unwrap_or(&self.verbatim)
    }

    /// Whole days elapsed between creation and `now` (Unix seconds).
    #[must_use]
    pub const fn age_days(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at) / SECONDS_PER_DAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(gist: Option<&str>) -> Memory {
        Memory {
            id: MemoryId::new("m-1"),
            gist: gist.map(ToString::to_string),
            verbatim: "Edited main.rs".to_string(),
            salience: SalienceLevel::Medium,
            created_at: 1_000_000,
            metadata: MemoryMetadata::FileEdit {
                file: "src/main.rs".to_string(),
                salience: SalienceLevel::Medium,
            },
        }
    }

    #[test]
    fn test_gist_or_verbatim() {
        assert_eq!(sample(None).gist_or_verbatim(), "Edited main.rs");
        assert_eq!(sample(Some("short")).gist_or_verbatim(), "short");
    }

    #[test]
    fn test_age_days() {
        let memory = sample(None);
        assert_eq!(memory.age_days(1_000_000), 0);
        assert_eq!(memory.age_days(1_000_000 + 86_399), 0);
        assert_eq!(memory.age_days(1_000_000 + 3 * 86_400), 3);
        // Clock skew never underflows
        assert_eq!(memory.age_days(0), 0);
    }

    #[test]
    fn test_metadata_wire_shape() {
        let metadata = MemoryMetadata::Terminal {
            command: "pytest".to_string(),
            exit_code: 1,
            salience: SalienceLevel::High,
        };
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "terminal",
                "command": "pytest",
                "exit_code": 1,
                "salience": "HIGH"
            })
        );
        assert_eq!(metadata.source(), "pytest");
    }
}
