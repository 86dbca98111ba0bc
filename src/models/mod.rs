//! Data models for the bridge.
//!
//! Events arrive from the editor, are classified into a
//! [`ClassificationResult`], and are persisted by the store as [`Memory`]
//! entries.

mod classification;
mod event;
mod memory;
mod salience;

pub use classification::ClassificationResult;
pub use event::{DEFAULT_TOP_K, Event, EventKind, ValidationError};
pub use memory::{Memory, MemoryId, MemoryMetadata};
pub use salience::SalienceLevel;
