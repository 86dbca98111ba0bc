//! Editor events and their schema validation.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Number of memories returned by `recall_context` when `top_k` is absent.
pub const DEFAULT_TOP_K: usize = 10;

/// An event sent by the editor, keyed by its `type` field.
///
/// Unknown extra fields (including the `_id` correlation token) are ignored
/// here; the protocol layer extracts the token separately.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A file was edited.
    FileEdit {
        /// Path of the edited file.
        file: String,
        /// Full content after the edit.
        content: String,
    },
    /// A terminal command finished.
    TerminalOutput {
        /// The command line that was run.
        command: String,
        /// Captured output.
        output: String,
        /// Process exit code.
        #[serde(rename = "exitCode")]
        exit_code: i64,
    },
    /// A language-server diagnostic was reported.
    Diagnostic {
        /// File the diagnostic belongs to.
        file: String,
        /// Severity name (`error`, `warning`, `info`, ...).
        severity: String,
        /// Diagnostic message.
        message: String,
    },
    /// The editor asks for relevant memories.
    RecallContext {
        /// Free-text query; empty means "most recent".
        query: String,
        /// Maximum number of memories to return.
        #[serde(default)]
        top_k: Option<usize>,
    },
    /// The editor asks for store statistics.
    GetStats,
    /// Liveness check.
    Ping,
}

impl Event {
    /// Validates a parsed JSON value and converts it into an event.
    ///
    /// Checks run in order: the value must be an object, `type` must name a
    /// known event, every field required by that type must be present, and
    /// finally every field must have the right JSON type.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

        let kind = match object.get("type") {
            None => return Err(ValidationError::MissingType),
            Some(Value::String(name)) => {
                EventKind::parse(name).ok_or_else(|| ValidationError::UnknownType(name.clone()))?
            },
            Some(other) => return Err(ValidationError::UnknownType(other.to_string())),
        };

        if let Some(&field) = kind
            .required_fields()
            .iter()
            .find(|field| !object.contains_key(**field))
        {
            return Err(ValidationError::MissingField {
                event_type: kind.as_str(),
                field,
            });
        }

        serde_json::from_value(value).map_err(|e| ValidationError::InvalidField {
            event_type: kind.as_str(),
            cause: e.to_string(),
        })
    }

    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::FileEdit { .. } => EventKind::FileEdit,
            Self::TerminalOutput { .. } => EventKind::TerminalOutput,
            Self::Diagnostic { .. } => EventKind::Diagnostic,
            Self::RecallContext { .. } => EventKind::RecallContext,
            Self::GetStats => EventKind::GetStats,
            Self::Ping => EventKind::Ping,
        }
    }
}

/// The recognised values of an event's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `file_edit`
    FileEdit,
    /// `terminal_output`
    TerminalOutput,
    /// `diagnostic`
    Diagnostic,
    /// `recall_context`
    RecallContext,
    /// `get_stats`
    GetStats,
    /// `ping`
    Ping,
}

impl EventKind {
    /// Returns all event kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::FileEdit,
            Self::TerminalOutput,
            Self::Diagnostic,
            Self::RecallContext,
            Self::GetStats,
            Self::Ping,
        ]
    }

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FileEdit => "file_edit",
            Self::TerminalOutput => "terminal_output",
            Self::Diagnostic => "diagnostic",
            Self::RecallContext => "recall_context",
            Self::GetStats => "get_stats",
            Self::Ping => "ping",
        }
    }

    /// Parses a wire name. Matching is exact.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|kind| kind.as_str() == s)
    }

    /// Fields that must be present besides `type`.
    #[must_use]
    pub const fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::FileEdit => &["file", "content"],
            Self::TerminalOutput => &["command", "output", "exitCode"],
            Self::Diagnostic => &["file", "severity", "message"],
            Self::RecallContext => &["query"],
            Self::GetStats | Self::Ping => &[],
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a well-formed JSON line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The line parsed to an array, string, number, ...
    #[error("event must be a JSON object")]
    NotAnObject,

    /// No `type` field.
    #[error("missing required field 'type'")]
    MissingType,

    /// `type` is not one of the recognised event kinds.
    #[error("unknown event type '{0}'")]
    UnknownType(String),

    /// A field required by the event's schema is absent.
    #[error("missing required field '{field}' in {event_type}")]
    MissingField {
        /// The event type being validated.
        event_type: &'static str,
        /// The missing field.
        field: &'static str,
    },

    /// A field is present but has the wrong JSON type.
    #[error("{event_type}: {cause}")]
    InvalidField {
        /// The event type being validated.
        event_type: &'static str,
        /// Decoder message.
        cause: String,
    },
}
