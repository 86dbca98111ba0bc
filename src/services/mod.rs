//! Classification services.
//!
//! Stateless rule engines that turn an event into a
//! [`ClassificationResult`](crate::models::ClassificationResult).

mod classifier;
mod gist;
mod processor;

pub use classifier::{MAX_TERMINAL_OUTPUT_CHARS, SalienceClassifier};
pub use gist::{GistExtractor, MAX_GIST_FRAGMENT_CHARS, truncate_chars};
pub use processor::EventProcessor;
