//! Response envelope.
//!
//! Every response serializes as `status` first, then the body fields, then
//! `_id` when the request carried one.

use crate::Error;
use crate::models::{ClassificationResult, Memory, MemoryId, MemoryMetadata, SalienceLevel};
use crate::storage::Statistics;
use serde::Serialize;
use serde_json::Value;

/// Response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The request was handled.
    Ok,
    /// The request was rejected or failed.
    Error,
}

/// A memory as returned to the editor by `recall_context`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecalledMemory {
    /// Gist if the store kept one, else the verbatim content.
    pub gist: String,
    /// Stored content.
    pub verbatim: String,
    /// Salience name.
    pub salience: SalienceLevel,
    /// Whole days since the memory was created.
    pub age_days: u64,
    /// Event metadata.
    pub metadata: MemoryMetadata,
}

impl RecalledMemory {
    /// Builds the wire form of `memory` as seen at `now` (Unix seconds).
    #[must_use]
    pub fn from_memory(memory: Memory, now: u64) -> Self {
        let age_days = memory.age_days(now);
        let gist = memory.gist_or_verbatim().to_string();
        Self {
            gist,
            verbatim: memory.verbatim,
            salience: memory.salience,
            age_days,
            metadata: memory.metadata,
        }
    }
}

/// Type-specific response fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// Reply to `ping`.
    Pong {
        /// Always `pong`.
        message: &'static str,
    },
    /// An event was classified and stored.
    Remembered {
        /// Identifier assigned by the store.
        memory_id: MemoryId,
        /// Assigned salience.
        salience: SalienceLevel,
        /// Stored gist.
        gist: String,
        /// Whether secret material was found.
        secrets_detected: bool,
    },
    /// Reply to `recall_context`.
    Recalled {
        /// Returned memories, best first.
        memories: Vec<RecalledMemory>,
        /// Number of memories.
        count: usize,
    },
    /// Reply to `get_stats`.
    Stats {
        /// Store counters.
        stats: Statistics,
    },
    /// Any failure.
    Error {
        /// Human-readable message.
        error: String,
    },
}

impl ResponseBody {
    /// The `ping` reply.
    #[must_use]
    pub const fn pong() -> Self {
        Self::Pong { message: "pong" }
    }

    /// Reply for a stored event.
    #[must_use]
    pub fn remembered(memory_id: MemoryId, result: ClassificationResult) -> Self {
        Self::Remembered {
            memory_id,
            salience: result.salience,
            gist: result.gist,
            secrets_detected: result.contains_secrets,
        }
    }

    /// Reply for a recall.
    #[must_use]
    pub fn recalled(memories: Vec<RecalledMemory>) -> Self {
        let count = memories.len();
        Self::Recalled { memories, count }
    }
}

/// One line written to the output channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Outcome.
    pub status: Status,
    /// Type-specific fields.
    #[serde(flatten)]
    pub body: ResponseBody,
    /// Correlation token copied from the request.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl Response {
    /// A successful response.
    #[must_use]
    pub const fn ok(body: ResponseBody) -> Self {
        Self {
            status: Status::Ok,
            body,
            id: None,
        }
    }

    /// An error response carrying the error's display text.
    #[must_use]
    pub fn error(error: &Error) -> Self {
        Self {
            status: Status::Error,
            body: ResponseBody::Error {
                error: error.to_string(),
            },
            id: None,
        }
    }

    /// Attaches a correlation token.
    #[must_use]
    pub fn with_id(mut self, id: Option<Value>) -> Self {
        self.id = id;
        self
    }

    /// Serializes to a single JSON line without the trailing newline.
    ///
    /// Serialization cannot fail for these types in practice; if it ever does,
    /// a generic error envelope is returned so the caller still gets a line.
    #[must_use]
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Response serialization failed");
            let mut fallback = serde_json::json!({
                "status": "error",
                "error": format!("response serialization failed: {e}"),
            });
            if let (Some(object), Some(id)) = (fallback.as_object_mut(), &self.id) {
                object.insert("_id".to_string(), id.clone());
            }
            fallback.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pong_is_exact() {
        let line = Response::ok(ResponseBody::pong()).to_json_line();
        assert_eq!(line, r#"{"status":"ok","message":"pong"}"#);
    }

    #[test]
    fn test_id_comes_last() {
        let line = Response::ok(ResponseBody::pong())
            .with_id(Some(json!("abc")))
            .to_json_line();
        assert_eq!(line, r#"{"status":"ok","message":"pong","_id":"abc"}"#);
    }

    #[test]
    fn test_error_envelope() {
        let error = Error::Protocol("expected value at line 1 column 1".to_string());
        let line = Response::error(&error).with_id(Some(json!(3))).to_json_line();
        assert_eq!(
            line,
            r#"{"status":"error","error":"Invalid JSON: expected value at line 1 column 1","_id":3}"#
        );
    }

    #[test]
    fn test_remembered_fields() {
        let result = ClassificationResult::new(SalienceLevel::High, "Command failed: pytest");
        let response = Response::ok(ResponseBody::remembered(MemoryId::new("m-1"), result));
        let value: Value = serde_json::from_str(&response.to_json_line()).unwrap();

        assert_eq!(
            value,
            json!({
                "status": "ok",
                "memory_id": "m-1",
                "salience": "HIGH",
                "gist": "Command failed: pytest",
                "secrets_detected": false
            })
        );
    }

    #[test]
    fn test_recalled_memory_prefers_gist() {
        let memory = Memory {
            id: MemoryId::new("m-1"),
            gist: None,
            verbatim: "Edited a.rs".to_string(),
            salience: SalienceLevel::Medium,
            created_at: 0,
            metadata: MemoryMetadata::FileEdit {
                file: "a.rs".to_string(),
                salience: SalienceLevel::Medium,
            },
        };
        let recalled = RecalledMemory::from_memory(memory, 2 * 86_400);
        assert_eq!(recalled.gist, "Edited a.rs");
        assert_eq!(recalled.age_days, 2);

        let body = ResponseBody::recalled(vec![recalled]);
        let value = serde_json::to_value(Response::ok(body)).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["memories"][0]["metadata"]["type"], "file_edit");
    }
}
