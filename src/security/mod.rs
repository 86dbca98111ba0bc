//! Security features.
//!
//! Secret detection, redaction, and the file ignore list.

mod ignore;
mod redactor;
mod secrets;

pub use ignore::{DEFAULT_IGNORED_FILES, FileIgnorePolicy, WildcardMode};
pub use redactor::{ContentRedactor, REDACTION_MARKER};
pub use secrets::{
    SECRET_REGISTRY_VERSION, SecretCategory, SecretDetector, SecretMatch, SecretPattern,
    secret_patterns,
};
