//! Memory store trait.

use crate::Result;
use crate::models::{Memory, MemoryId, MemoryMetadata, SalienceLevel};

/// Summary counters returned by [`MemoryStore::statistics`].
///
/// Kept as an open JSON map so stores can report whatever they track.
pub type Statistics = serde_json::Map<String, serde_json::Value>;

/// The narrow interface the protocol loop uses to reach a memory store.
///
/// The loop is strictly sequential, so methods take `&mut self` where they
/// mutate and implementations need no internal locking.
pub trait MemoryStore: Send {
    /// Stores `content` and returns the new memory's identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) if the backend fails.
    fn remember(
        &mut self,
        content: &str,
        metadata: MemoryMetadata,
        salience: SalienceLevel,
    ) -> Result<MemoryId>;

    /// Returns up to `top_k` memories, most relevant (or most recent) first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) if the backend fails.
    fn recall(&self, query: &str, top_k: usize) -> Result<Vec<Memory>>;

    /// Returns summary counters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) if the backend fails.
    fn statistics(&self) -> Result<Statistics>;

    /// Writes the session durably.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`](crate::Error::Persistence) if the write fails.
    fn save_session(&mut self) -> Result<()>;
}
