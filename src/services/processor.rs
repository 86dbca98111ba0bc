//! Event processing pipeline.
//!
//! Runs each event through the ignore list, the secret scanner, the salience
//! classifier and the gist extractor. Performs no I/O and keeps no state
//! between calls.

use super::{GistExtractor, SalienceClassifier};
use crate::models::{ClassificationResult, SalienceLevel};
use crate::security::{ContentRedactor, FileIgnorePolicy, SecretDetector};
use tracing::instrument;

/// Orchestrates classification for the three content-bearing event kinds.
#[derive(Debug, Clone)]
pub struct EventProcessor {
    ignore_policy: FileIgnorePolicy,
    secret_detector: SecretDetector,
    redactor: ContentRedactor,
    classifier: SalienceClassifier,
    gist_extractor: GistExtractor,
}

impl EventProcessor {
    /// Creates a processor with the built-in ignore list and secret registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ignore_policy: FileIgnorePolicy::new(),
            secret_detector: SecretDetector::new(),
            redactor: ContentRedactor::new(),
            classifier: SalienceClassifier::new(),
            gist_extractor: GistExtractor::new(),
        }
    }

    /// Replaces the ignore policy.
    #[must_use]
    pub const fn with_ignore_policy(mut self, policy: FileIgnorePolicy) -> Self {
        self.ignore_policy = policy;
        self
    }

    /// Processes a file edit.
    ///
    /// Ignored files short-circuit before the content is looked at. Otherwise
    /// content holding a secret is redacted before the gist is built, and the
    /// result is flagged.
    #[instrument(skip(self, content), fields(content_len = content.len()))]
    pub fn process_file_edit(&self, path: &str, content: &str) -> ClassificationResult {
        if self.ignore_policy.should_ignore(path) {
            tracing::info!(file = path, "Ignoring file on the ignore list");
            return ClassificationResult::new(
                SalienceLevel::Noise,
                self.gist_extractor.ignored_file(path),
            )
            .with_secrets(true);
        }

        let contains_secrets = self.secret_detector.contains_secrets(content);
        let sanitized;
        let content = if contains_secrets {
            tracing::warn!(
                file = path,
                secret_types = ?self.secret_detector.detect_types(content),
                "Secrets detected, content sanitized"
            );
            sanitized = self.redactor.redact(content);
            sanitized.as_str()
        } else {
            content
        };

        let salience = self
            .classifier
            .classify_file_edit_with_secrets(path, contains_secrets);
        let gist = self.gist_extractor.file_edit(path, content);

        ClassificationResult::new(salience, gist).with_secrets(contains_secrets)
    }

    /// Processes terminal output.
    ///
    /// Output is not scanned for secrets; only the command line reaches the
    /// gist.
    #[instrument(skip(self, output), fields(output_len = output.len()))]
    pub fn process_terminal_output(
        &self,
        command: &str,
        output: &str,
        exit_code: i64,
    ) -> ClassificationResult {
        ClassificationResult::new(
            self.classifier.classify_terminal(exit_code, output),
            self.gist_extractor.terminal(command, exit_code),
        )
    }

    /// Processes a diagnostic.
    #[instrument(skip(self, message))]
    pub fn process_diagnostic(
        &self,
        path: &str,
        severity: &str,
        message: &str,
    ) -> ClassificationResult {
        ClassificationResult::new(
            self.classifier.classify_diagnostic(severity),
            self.gist_extractor.diagnostic(path, severity, message),
        )
    }
}

impl Default for EventProcessor {
    fn default() -> Self {
        Self::new()
    }
}
