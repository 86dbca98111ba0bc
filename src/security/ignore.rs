//! Files that hold secrets by convention.
// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]
//!
//! Edits to these files are never classified from their content: the
//! processor short-circuits with a placeholder gist instead.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Built-in ignore list.
///
/// Plain entries match a file name exactly. Entries containing `/` match a
/// trailing path segment. Entries containing `*` are wildcards.
pub const DEFAULT_IGNORED_FILES: &[&str] = &[
    ".env",
    ".env.local",
    ".env.production",
    ".env.development",
    "secrets.yaml",
    "secrets.json",
    "credentials.json",
    ".aws/credentials",
    "*.pem",
];

/// How `*` entries are matched against a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WildcardMode {
    /// `*` becomes `.*` and the pattern is anchored at the start of the name
    /// only, so `*.pem` also matches `server.pem.bak`.
    #[default]
    Prefix,
    /// Shell-glob semantics: anchored at both ends.
    FullGlob,
}

/// A wildcard entry compiled in both modes.
struct WildcardEntry {
    prefix: Regex,
    full: Regex,
}

impl WildcardEntry {
    fn compile(entry: &str) -> Self {
        let body = entry
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        Self {
            prefix: Regex::new(&format!("^{body}")).expect("static regex: ignore wildcard"),
            full: Regex::new(&format!("^{body}$")).expect("static regex: ignore wildcard"),
        }
    }

    fn is_match(&self, name: &str, mode: WildcardMode) -> bool {
        match mode {
            WildcardMode::Prefix => self.prefix.is_match(name),
            WildcardMode::FullGlob => self.full.is_match(name),
        }
    }
}

static DEFAULT_WILDCARDS: LazyLock<Vec<WildcardEntry>> = LazyLock::new(|| {
    DEFAULT_IGNORED_FILES
        .iter()
        .filter(|entry| entry.contains('*'))
        .map(|entry| WildcardEntry::compile(entry))
        .collect()
});

/// Decides whether a file's content must never be processed.
#[derive(Debug, Clone, Copy)]
pub struct FileIgnorePolicy {
    wildcard_mode: WildcardMode,
}

impl FileIgnorePolicy {
    /// Creates a policy over [`DEFAULT_IGNORED_FILES`] with prefix wildcards.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            wildcard_mode: WildcardMode::Prefix,
        }
    }

    /// Sets the wildcard mode.
    #[must_use]
    pub const fn with_wildcard_mode(mut self, mode: WildcardMode) -> Self {
        self.wildcard_mode = mode;
        self
    }

    /// Returns the wildcard mode.
    #[must_use]
    pub const fn wildcard_mode(&self) -> WildcardMode {
        self.wildcard_mode
    }

    /// Returns true if the file at `path` is on the ignore list.
    ///
    /// Exact file-name entries are checked first, then relative-path entries,
    /// then wildcards.
    #[must_use]
    pub fn should_ignore(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        let name = Path::new(&normalized)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&normalized);

        let exact = DEFAULT_IGNORED_FILES
            .iter()
            .filter(|entry| !entry.contains('*') && !entry.contains('/'))
            .any(|entry| *entry == name);
        if exact {
            return true;
        }

        let relative = DEFAULT_IGNORED_FILES
            .iter()
            .filter(|entry| entry.contains('/'))
            .any(|entry| {
                normalized == *entry
                    || normalized
                        .strip_suffix(entry)
                        .is_some_and(|head| head.ends_with('/'))
            });
        if relative {
            return true;
        }

        DEFAULT_WILDCARDS
            .iter()
            .any(|entry| entry.is_match(name, self.wildcard_mode))
    }
}

impl Default for FileIgnorePolicy {
    fn default() -> Self {
        Self::new()
    }
}
