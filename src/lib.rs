//! # Engram Bridge
//!
//! A long-lived subprocess that turns raw development events from an editor
//! into compact, risk-screened summaries before they reach a memory store.
//!
//! The parent editor writes one JSON object per line to standard input and
//! reads exactly one JSON response per line from standard output. Every
//! event passes through a deterministic pipeline first:
//!
//! - secret detection and redaction ([`security`])
//! - salience classification ([`services::SalienceClassifier`])
//! - rule-based gist extraction ([`services::GistExtractor`])
//!
//! Only the resulting gist is handed to the memory store.
//!
//! ## Example
//!
//! ```rust,ignore
//! use engram_bridge::{Bridge, EventProcessor, SessionStore};
//!
//! let store = SessionStore::open("default", "/tmp/engram");
//! let mut bridge = Bridge::new(EventProcessor::new(), store);
//! bridge.run(std::io::BufReader::new(std::io::stdin()), std::io::stdout())?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod bridge;
pub mod config;
pub mod models;
pub mod observability;
pub mod security;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use bridge::{Bridge, LoopState, ShutdownSignal};
pub use config::BridgeConfig;
pub use models::{
    ClassificationResult, Event, Memory, MemoryId, MemoryMetadata, SalienceLevel, ValidationError,
};
pub use services::{EventProcessor, GistExtractor, SalienceClassifier};
pub use storage::{MemoryStore, SessionStore, Statistics};

/// Error type for bridge operations.
///
/// Every variant is caught at the protocol loop boundary and rendered as an
/// error response; none of them terminates the process on its own.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Protocol` | A line is not valid JSON |
/// | `Validation` | Unknown `type`, missing or ill-typed required field |
/// | `Processing` | Classification, gist or secret logic panicked |
/// | `Storage` | The memory store failed to persist or query |
/// | `Persistence` | The session could not be written durably |
/// | `Channel` | Standard input or output failed |
/// | `Config` | The configuration file is unreadable or malformed |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A line could not be parsed as JSON.
    #[error("Invalid JSON: {0}")]
    Protocol(String),

    /// The event is well-formed JSON but violates its schema.
    #[error("Invalid event format: {0}")]
    Validation(#[from] ValidationError),

    /// A failure inside the classification pipeline.
    ///
    /// The pipeline is made of pure functions, so this only surfaces when
    /// one of them panics.
    #[error("processing failed: {0}")]
    Processing(String),

    /// The memory store failed.
    #[error("storage operation '{operation}' failed: {cause}")]
    Storage {
        /// The store operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The session could not be saved.
    #[error("session persistence failed: {0}")]
    Persistence(String),

    /// Reading from or writing to a protocol channel failed.
    #[error("{channel} channel failed: {cause}")]
    Channel {
        /// Which channel failed (`stdin` or `stdout`).
        channel: &'static str,
        /// The underlying cause.
        cause: String,
    },

    /// The configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
