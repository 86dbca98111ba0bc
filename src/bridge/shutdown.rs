//! Shutdown signalling.
//!
//! The signal handler never does I/O. It flips an atomic flag and posts a
//! message to the loop's inbox; the loop then saves the session on its own
//! thread.

use crate::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

/// Messages delivered to the protocol loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopInput {
    /// One line from the input channel, without its terminator.
    Line(String),
    /// The input channel reached end of file.
    Eof,
    /// Reading the input channel failed.
    ReadError(String),
    /// A shutdown was requested.
    Shutdown,
}

/// Cloneable handle that asks a running loop to stop.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
    inbox: Sender<LoopInput>,
}

impl ShutdownSignal {
    pub(crate) fn new(inbox: Sender<LoopInput>) -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            inbox,
        }
    }

    /// Requests shutdown. Only the first call posts to the loop.
    pub fn trigger(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            // The loop may already be gone; nothing left to notify then.
            let _ = self.inbox.send(LoopInput::Shutdown);
        }
    }

    /// Returns true once shutdown has been requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Routes SIGINT and SIGTERM to `signal`.
///
/// # Errors
///
/// Returns [`Error::Channel`] if a handler is already installed or the
/// platform refuses it.
pub fn install_signal_handler(signal: ShutdownSignal) -> Result<()> {
    ctrlc::set_handler(move || {
        signal.trigger();
    })
    .map_err(|e| Error::Channel {
        channel: "signal",
        cause: e.to_string(),
    })
}
