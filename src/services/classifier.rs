//! Salience classification.
//!
//! Pure rule tables, one per event kind. Rules are evaluated in order and the
//! first match wins.

use crate::models::SalienceLevel;
use crate::security::SecretDetector;

/// Terminal output longer than this (in characters) is treated as spam.
pub const MAX_TERMINAL_OUTPUT_CHARS: usize = 10_000;

/// Extensions that mark a configuration file.
const CONFIG_EXTENSIONS: &[&str] = &[".json", ".yaml", ".yml", ".toml", ".env"];

/// Package manifests, compared against the lowercased file name.
const MANIFEST_NAMES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "cargo.toml",
    "go.mod",
    "pom.xml",
];

/// Documentation extensions.
const DOC_EXTENSIONS: &[&str] = &[".md", ".txt", ".rst"];

/// Assigns a [`SalienceLevel`] to events.
#[derive(Debug, Clone, Copy, Default)]
pub struct SalienceClassifier {
    secret_detector: SecretDetector,
}

impl SalienceClassifier {
    /// Creates a new classifier.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            secret_detector: SecretDetector::new(),
        }
    }

    /// Classifies a file edit, scanning `content` for secrets.
    #[must_use]
    pub fn classify_file_edit(&self, path: &str, content: &str) -> SalienceLevel {
        self.classify_file_edit_with_secrets(path, self.secret_detector.contains_secrets(content))
    }

    /// Classifies a file edit whose content has already been scanned.
    ///
    /// Lets the caller classify after redaction without losing the fact that
    /// the original content held a secret.
    #[must_use]
    pub fn classify_file_edit_with_secrets(
        &self,
        path: &str,
        contains_secrets: bool,
    ) -> SalienceLevel {
        if contains_secrets {
            return SalienceLevel::Critical;
        }

        let path_lower = path.to_lowercase();
        let name = file_name(path).to_lowercase();

        if path_lower.contains("test") {
            return SalienceLevel::High;
        }
        if CONFIG_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            return SalienceLevel::High;
        }
        if MANIFEST_NAMES.contains(&name.as_str()) {
            return SalienceLevel::High;
        }
        if DOC_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            return SalienceLevel::Low;
        }

        SalienceLevel::Medium
    }

    /// Classifies terminal output.
    #[must_use]
    pub fn classify_terminal(&self, exit_code: i64, output: &str) -> SalienceLevel {
        if exit_code != 0 {
            return SalienceLevel::High;
        }
        // Progress bars and colour codes
        if output.contains('\r') || output.contains("\x1b[") {
            return SalienceLevel::Noise;
        }
        if output.chars().count() > MAX_TERMINAL_OUTPUT_CHARS {
            return SalienceLevel::Noise;
        }

        SalienceLevel::Medium
    }

    /// Classifies a diagnostic by severity. Matching is exact.
    #[must_use]
    pub fn classify_diagnostic(&self, severity: &str) -> SalienceLevel {
        match severity {
            "error" => SalienceLevel::Critical,
            "warning" => SalienceLevel::High,
            _ => SalienceLevel::Medium,
        }
    }
}

/// Returns the final path component, accepting either separator.
pub(crate) fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    let name = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    if name.is_empty() {
        path
    } else {
        name
    }
}
