//! Property-based tests for the intake pipeline.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Detected secrets never survive redaction
//! - Ignore-listed files never expose their content
//! - Secrets outrank every other file-edit rule
//! - Classification is deterministic
//! - Gist fragments stay bounded
//! - Correlation recovery never panics and finds well-formed tokens

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use engram_bridge::bridge::{decode_line, recover_correlation_id};
use engram_bridge::security::{ContentRedactor, FileIgnorePolicy, SecretDetector};
use engram_bridge::services::{MAX_GIST_FRAGMENT_CHARS, truncate_chars};
use engram_bridge::{EventProcessor, SalienceLevel};
use proptest::prelude::*;
use serde_json::json;

/// Credential-shaped values the detector must recognize, one generator per
/// registry entry.
fn secret() -> impl Strategy<Value = String> {
    prop_oneof![
        "api_key: [a-z0-9_]{20,30}",
        "secret_key=[a-z0-9_]{20,30}",
        "sk-[a-z0-9]{48}",
        "sk-proj-[a-z0-9_-]{48,60}",
        "sk-ant-api[0-9]{2}-[a-z0-9_-]{95,100}",
        "gh[op]_[a-zA-Z0-9]{36}",
        "AKIA[0-9A-Z]{16}",
        "aws_secret_access_key = [a-z]{5}",
        "AIza[0-9a-zA-Z_-]{35}",
        "xox[baprs]-[0-9]{10,14}",
        "(sk|pk)_(live|test)_[a-z0-9]{24,30}",
        "password = [a-zA-Z0-9]{8,20}",
        "(postgres|postgresql|mysql|mongodb|mongodb\\+srv|redis)://[a-z]{3,8}:[a-z0-9]{6,12}@db",
        "-----BEGIN (RSA |DSA |EC |OPENSSH |PGP )?PRIVATE KEY-----",
        "eyJ[a-zA-Z0-9_-]{5,20}\\.eyJ[a-zA-Z0-9_-]{5,20}\\.[a-zA-Z0-9_-]{5,20}",
    ]
}

/// Ignore-list entries that match on the file name alone.
fn ignored_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        ".env",
        ".env.local",
        ".env.production",
        ".env.development",
        "secrets.yaml",
        "secrets.json",
        "credentials.json",
    ])
}

// ============================================================================
// Secret handling
// ============================================================================

proptest! {
    /// Property: any text carrying a secret is flagged, and its redacted form
    /// is not.
    #[test]
    fn prop_redaction_removes_every_secret(
        prefix in "[a-z ]{0,20}",
        secret in secret(),
        suffix in "[a-z ]{0,20}",
    ) {
        let detector = SecretDetector::new();
        let input = format!("{prefix} {secret} {suffix}");

        prop_assert!(detector.contains_secrets(&input));

        let redacted = ContentRedactor::new().redact(&input);
        prop_assert!(!detector.contains_secrets(&redacted));
        prop_assert!(!redacted.contains(&secret));
    }

    /// Property: a secret makes any file edit CRITICAL, whatever the path.
    #[test]
    fn prop_secret_outranks_path_rules(
        path in prop::sample::select(vec![
            "tests/test_auth.py",
            "config.toml",
            "package.json",
            "README.md",
            "src/main.rs",
        ]),
        secret in secret(),
    ) {
        let result = EventProcessor::new().process_file_edit(path, &secret);
        prop_assert_eq!(result.salience, SalienceLevel::Critical);
        prop_assert!(result.contains_secrets);
        prop_assert!(!result.gist.contains(&secret));
    }

    /// Property: ignore-listed files are NOISE under any directory, and the
    /// gist never depends on their content.
    #[test]
    fn prop_ignored_files_hide_content(
        dirs in prop::collection::vec("[a-z]{1,8}", 0..4),
        name in ignored_name(),
        content in "[ -~]{0,80}",
    ) {
        let mut path = dirs.join("/");
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(name);

        prop_assert!(FileIgnorePolicy::new().should_ignore(&path));

        let result = EventProcessor::new().process_file_edit(&path, &content);
        prop_assert_eq!(result.salience, SalienceLevel::Noise);
        prop_assert!(result.contains_secrets);
        prop_assert_eq!(result.gist, format!("Ignored file: {path}"));
    }

    /// Property: any `.pem` file is ignored.
    #[test]
    fn prop_pem_files_ignored(stem in "[a-z0-9_-]{1,12}") {
        let policy = FileIgnorePolicy::new();
        let path = format!("certs/{stem}.pem");
        prop_assert!(policy.should_ignore(&path));
    }
}

// ============================================================================
// Classification
// ============================================================================

proptest! {
    /// Property: the same file edit always yields the same result.
    #[test]
    fn prop_file_edit_deterministic(
        path in "[a-zA-Z0-9_./-]{1,40}",
        content in "[ -~\n]{0,200}",
    ) {
        let processor = EventProcessor::new();
        prop_assert_eq!(
            processor.process_file_edit(&path, &content),
            processor.process_file_edit(&path, &content)
        );
    }

    /// Property: any non-zero exit code is HIGH regardless of output.
    #[test]
    fn prop_failed_command_is_high(
        exit_code in any::<i64>().prop_filter("non-zero", |c| *c != 0),
        output in "\\PC{0,100}",
    ) {
        let result = EventProcessor::new().process_terminal_output("make", &output, exit_code);
        prop_assert_eq!(result.salience, SalienceLevel::High);
        prop_assert_eq!(result.gist, "Command failed: make");
    }

    /// Property: unknown severities are MEDIUM.
    #[test]
    fn prop_unknown_severity_is_medium(severity in "[a-z]{1,12}") {
        prop_assume!(severity != "error" && severity != "warning");
        let result = EventProcessor::new().process_diagnostic("a.rs", &severity, "msg");
        prop_assert_eq!(result.salience, SalienceLevel::Medium);
    }
}

// ============================================================================
// Gist bounds
// ============================================================================

proptest! {
    /// Property: truncation never exceeds the limit and leaves short text
    /// untouched, including multi-byte text.
    #[test]
    fn prop_truncate_bounded(text in "\\PC{0,300}") {
        let truncated = truncate_chars(&text, MAX_GIST_FRAGMENT_CHARS);
        prop_assert!(truncated.chars().count() <= MAX_GIST_FRAGMENT_CHARS);
        if text.chars().count() <= MAX_GIST_FRAGMENT_CHARS {
            prop_assert_eq!(truncated, text);
        } else {
            prop_assert!(truncated.ends_with("..."));
        }
    }

    /// Property: diagnostic gists carry at most a bounded message.
    #[test]
    fn prop_diagnostic_gist_bounded(message in "\\PC{0,300}") {
        let result = EventProcessor::new().process_diagnostic("main.py", "error", &message);
        let prefix = "Error in main.py: ";
        prop_assert!(result.gist.starts_with(prefix));
        prop_assert!(
            result.gist.chars().count() <= prefix.chars().count() + MAX_GIST_FRAGMENT_CHARS
        );
    }
}

// ============================================================================
// Correlation
// ============================================================================

proptest! {
    /// Property: decoding arbitrary text never panics.
    #[test]
    fn prop_decode_never_panics(line in "\\PC{0,200}") {
        let _ = decode_line(&line);
        let _ = recover_correlation_id(&line);
    }

    /// Property: a string `_id` is recovered from a truncated line.
    #[test]
    fn prop_string_id_recovered(id in "[a-zA-Z0-9 _-]{0,20}") {
        let line = format!(r#"{{"type":"ping","_id":"{id}""#);
        let decoded = decode_line(&line);
        prop_assert!(decoded.event.is_err());
        prop_assert_eq!(decoded.correlation_id, Some(json!(id)));
    }

    /// Property: an integer `_id` is recovered from a truncated line.
    #[test]
    fn prop_integer_id_recovered(id in any::<i32>()) {
        let line = format!(r#"{{"_id":{id},"type":"ping""#);
        prop_assert_eq!(recover_correlation_id(&line), Some(json!(id)));
    }
}
