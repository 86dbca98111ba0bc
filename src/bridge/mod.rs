//! Protocol loop.
//!
//! Reads one JSON object per line, answers each with exactly one JSON line,
//! and saves the session exactly once on the way out.
//!
//! # State machine
//!
//! ```text
//! Running --(EOF | signal | output failure)--> ShuttingDown --(save)--> Stopped
//! ```
//!
//! Input is read by a dedicated thread that pulls a single line each time the
//! loop asks for one. The loop asks only after the previous response has been
//! flushed, so requests are strictly sequential. Signals arrive on the same
//! inbox as lines, which lets the loop wake up while the reader is blocked.

mod codec;
mod response;
mod shutdown;

pub use codec::{CORRELATION_FIELD, DecodedLine, decode_line, recover_correlation_id};
pub use response::{RecalledMemory, Response, ResponseBody, Status};
pub use shutdown::{LoopInput, ShutdownSignal, install_signal_handler};

use crate::models::{ClassificationResult, DEFAULT_TOP_K, Event, MemoryMetadata};
use crate::services::EventProcessor;
use crate::storage::MemoryStore;
use crate::{Error, Result, current_timestamp};
use std::any::Any;
use std::io::{BufRead, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

/// Lifecycle of the protocol loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Accepting input.
    Running,
    /// No more input is read; the session is being saved.
    ShuttingDown,
    /// The session has been saved (or the save failed) and the loop is done.
    Stopped,
}

/// The protocol loop, generic over the memory store.
pub struct Bridge<S: MemoryStore> {
    processor: EventProcessor,
    store: S,
    state: LoopState,
    inbox_tx: Sender<LoopInput>,
    inbox_rx: Receiver<LoopInput>,
    shutdown: ShutdownSignal,
}

impl<S: MemoryStore> Bridge<S> {
    /// Creates a bridge in the `Running` state.
    #[must_use]
    pub fn new(processor: EventProcessor, store: S) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::channel();
        let shutdown = ShutdownSignal::new(inbox_tx.clone());
        Self {
            processor,
            store,
            state: LoopState::Running,
            inbox_tx,
            inbox_rx,
            shutdown,
        }
    }

    /// Returns a handle that stops the loop from another thread or a signal
    /// handler.
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Returns the memory store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Runs the loop until end of input, a shutdown request, or an output
    /// failure, then saves the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Channel`] if writing a response fails. The session is
    /// still saved first. End of input and shutdown requests return `Ok`.
    pub fn run<R, W>(&mut self, input: R, mut output: W) -> Result<()>
    where
        R: BufRead + Send + 'static,
        W: Write,
    {
        if self.state == LoopState::Stopped {
            return Ok(());
        }

        let demand = spawn_reader(input, self.inbox_tx.clone())?;
        let mut outcome = Ok(());

        tracing::info!("Protocol loop started");
        while self.state == LoopState::Running {
            if self.shutdown.is_requested() {
                tracing::info!("Shutdown requested");
                self.state = LoopState::ShuttingDown;
                break;
            }

            // A closed demand channel means the reader has exited; its final
            // message is already in the inbox.
            let _ = demand.send(());

            match self.inbox_rx.recv() {
                Ok(LoopInput::Line(line)) => {
                    let response = self.handle_line(&line);
                    if let Err(e) = write_response(&mut output, &response) {
                        tracing::error!(error = %e, "Failed to write response");
                        outcome = Err(e);
                        self.state = LoopState::ShuttingDown;
                    }
                },
                Ok(LoopInput::Eof) => {
                    tracing::info!("Input closed");
                    self.state = LoopState::ShuttingDown;
                },
                Ok(LoopInput::ReadError(cause)) => {
                    tracing::warn!(error = %cause, "Failed to read input, shutting down");
                    self.state = LoopState::ShuttingDown;
                },
                Ok(LoopInput::Shutdown) | Err(_) => {
                    tracing::info!("Shutdown requested");
                    self.state = LoopState::ShuttingDown;
                },
            }
        }

        self.finish();
        outcome
    }

    /// Handles one raw line and returns its response.
    pub fn handle_line(&mut self, line: &str) -> Response {
        let decoded = decode_line(line);
        let response = match decoded.event {
            Ok(event) => self.dispatch_guarded(event),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected line");
                Response::error(&e)
            },
        };
        response.with_id(decoded.correlation_id)
    }

    /// Dispatches a valid event, turning failures and panics into error
    /// responses.
    fn dispatch_guarded(&mut self, event: Event) -> Response {
        let kind = event.kind();
        let _span = tracing::info_span!("event", kind = %kind).entered();

        match catch_unwind(AssertUnwindSafe(|| self.dispatch(event))) {
            Ok(Ok(body)) => Response::ok(body),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Event failed");
                Response::error(&e)
            },
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(panic_message = %message, "Event handler panicked");
                Response::error(&Error::Processing(message))
            },
        }
    }

    fn dispatch(&mut self, event: Event) -> Result<ResponseBody> {
        match event {
            Event::Ping => Ok(ResponseBody::pong()),
            Event::FileEdit { file, content } => {
                let result = self.processor.process_file_edit(&file, &content);
                let metadata = MemoryMetadata::FileEdit {
                    file,
                    salience: result.salience,
                };
                self.remember(result, metadata)
            },
            Event::TerminalOutput {
                command,
                output,
                exit_code,
            } => {
                let result = self
                    .processor
                    .process_terminal_output(&command, &output, exit_code);
                let metadata = MemoryMetadata::Terminal {
                    command,
                    exit_code,
                    salience: result.salience,
                };
                self.remember(result, metadata)
            },
            Event::Diagnostic {
                file,
                severity,
                message,
            } => {
                let result = self.processor.process_diagnostic(&file, &severity, &message);
                let metadata = MemoryMetadata::Diagnostic {
                    file,
                    severity,
                    salience: result.salience,
                };
                self.remember(result, metadata)
            },
            Event::RecallContext { query, top_k } => {
                let top_k = top_k.unwrap_or(DEFAULT_TOP_K);
                let now = current_timestamp();
                let memories = self
                    .store
                    .recall(&query, top_k)?
                    .into_iter()
                    .map(|memory| RecalledMemory::from_memory(memory, now))
                    .collect();
                Ok(ResponseBody::recalled(memories))
            },
            Event::GetStats => Ok(ResponseBody::Stats {
                stats: self.store.statistics()?,
            }),
        }
    }

    fn remember(
        &mut self,
        result: ClassificationResult,
        metadata: MemoryMetadata,
    ) -> Result<ResponseBody> {
        let memory_id = self
            .store
            .remember(&result.gist, metadata, result.salience)?;
        tracing::debug!(
            memory_id = %memory_id,
            salience = %result.salience,
            secrets_detected = result.contains_secrets,
            "Event stored"
        );
        Ok(ResponseBody::remembered(memory_id, result))
    }

    /// Saves the session and moves to `Stopped`. Runs at most once.
    fn finish(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.state = LoopState::ShuttingDown;

        match self.store.save_session() {
            Ok(()) => tracing::info!("Session saved"),
            Err(e) => tracing::error!(error = %e, "Failed to save session"),
        }
        self.state = LoopState::Stopped;
    }
}

/// Starts the input reader and returns its demand channel.
///
/// The reader reads exactly one line per demand and exits after end of
/// input, a read error, or when either channel closes.
fn spawn_reader<R>(mut input: R, inbox: Sender<LoopInput>) -> Result<Sender<()>>
where
    R: BufRead + Send + 'static,
{
    let (demand_tx, demand_rx) = mpsc::channel::<()>();

    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let mut buf = Vec::new();
            while demand_rx.recv().is_ok() {
                buf.clear();
                let message = match input.read_until(b'\n', &mut buf) {
                    Ok(0) => LoopInput::Eof,
                    Ok(_) => LoopInput::Line(strip_line_ending(&buf)),
                    Err(e) => LoopInput::ReadError(e.to_string()),
                };
                let last = !matches!(message, LoopInput::Line(_));
                if inbox.send(message).is_err() || last {
                    break;
                }
            }
        })
        .map_err(|e| Error::Channel {
            channel: "stdin",
            cause: e.to_string(),
        })?;

    Ok(demand_tx)
}

/// Decodes a raw line lossily and drops the trailing `\n` or `\r\n`.
fn strip_line_ending(buf: &[u8]) -> String {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Writes one response line and flushes it.
fn write_response<W: Write>(output: &mut W, response: &Response) -> Result<()> {
    let line = response.to_json_line();
    writeln!(output, "{line}")
        .and_then(|()| output.flush())
        .map_err(|e| Error::Channel {
            channel: "stdout",
            cause: e.to_string(),
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
