//! Memory store abstraction.
//!
//! The protocol loop only sees the [`MemoryStore`] trait. [`SessionStore`] is
//! the default in-process implementation, saving one JSON file per session.

mod session;
mod traits;

pub use session::SessionStore;
pub use traits::{MemoryStore, Statistics};
