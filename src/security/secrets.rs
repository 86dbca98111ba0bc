//! Secret detection patterns.
// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]
//!
//! Detects credential-shaped substrings so they never reach the memory store.
//! The registry is compiled once on first use and shared read-only.

use regex::Regex;
use std::sync::LazyLock;

/// Version of the pattern registry. Bump whenever a pattern changes.
pub const SECRET_REGISTRY_VERSION: u32 = 3;

/// Broad family a secret pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretCategory {
    /// `api_key = ...`, `secret_key: ...`
    GenericAssignment,
    /// Provider-specific key formats.
    VendorKey,
    /// `password = ...`
    Password,
    /// Database URLs carrying a user and password.
    ConnectionString,
    /// PEM private-key headers.
    PrivateKey,
    /// Three dot-separated base64url segments.
    BearerToken,
}

/// A detected secret match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretMatch {
    /// Type of secret detected.
    pub secret_type: &'static str,
    /// Category of the pattern that matched.
    pub category: SecretCategory,
    /// Start position in content.
    pub start: usize,
    /// End position in content.
    pub end: usize,
}

/// A named pattern in the registry.
pub struct SecretPattern {
    /// Human-readable pattern name.
    pub name: &'static str,
    /// Category label.
    pub category: SecretCategory,
    regex: Regex,
}

impl SecretPattern {
    fn new(name: &'static str, category: SecretCategory, pattern: &str) -> Self {
        let regex =
            Regex::new(&format!("(?i){pattern}")).expect("static regex: secret pattern");
        Self {
            name,
            category,
            regex,
        }
    }

    /// Returns the compiled regex.
    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }
}

// Note: These patterns are static and guaranteed to compile. Order matters for
// redaction, which applies them one after another.
static REGISTRY: LazyLock<Vec<SecretPattern>> = LazyLock::new(|| {
    use SecretCategory::{
        BearerToken, ConnectionString, GenericAssignment, Password, PrivateKey, VendorKey,
    };

    vec![
        SecretPattern::new(
            "Generic API Key",
            GenericAssignment,
            r#"api[_-]?key\s*[:=]\s*["']?[a-z0-9_\-]{20,}"#,
        ),
        SecretPattern::new(
            "Generic Secret Key",
            GenericAssignment,
            r#"secret[_-]?key\s*[:=]\s*["']?[a-z0-9_\-]{20,}"#,
        ),
        SecretPattern::new("OpenAI API Key", VendorKey, r"sk-[a-z0-9]{48}"),
        SecretPattern::new("OpenAI Project Key", VendorKey, r"sk-proj-[a-z0-9_\-]{48,}"),
        SecretPattern::new(
            "Anthropic API Key",
            VendorKey,
            r"sk-ant-api[0-9]{2}-[a-z0-9_\-]{95,}",
        ),
        SecretPattern::new("GitHub Token", VendorKey, r"gh[op]_[a-z0-9]{36}"),
        SecretPattern::new("AWS Access Key ID", VendorKey, r"AKIA[0-9A-Z]{16}"),
        SecretPattern::new(
            "AWS Secret Access Key",
            VendorKey,
            r"aws[_-]?secret[_-]?access[_-]?key",
        ),
        SecretPattern::new("Google API Key", VendorKey, r"AIza[0-9a-z_\-]{35}"),
        SecretPattern::new("Slack Token", VendorKey, r"xox[baprs]-[0-9a-z\-]{10,}"),
        SecretPattern::new("Stripe API Key", VendorKey, r"(?:sk|pk)_(?:live|test)_[a-z0-9]{24,}"),
        SecretPattern::new(
            "Generic Password",
            Password,
            r#"password\s*[:=]\s*["']?[^"'\s]{8,}"#,
        ),
        SecretPattern::new(
            "Database URL with Credentials",
            ConnectionString,
            r"(?:postgres(?:ql)?|mysql|mongodb(?:\+srv)?|redis)://[^@\s:/]+:[^@\s]+@",
        ),
        SecretPattern::new(
            "Private Key",
            PrivateKey,
            r"-----BEGIN (?:RSA |DSA |EC |OPENSSH |PGP )?PRIVATE KEY-----",
        ),
        SecretPattern::new(
            "JWT Token",
            BearerToken,
            r"eyJ[a-z0-9_\-]+\.eyJ[a-z0-9_\-]+\.[a-z0-9_\-]+",
        ),
    ]
});

/// Returns the pattern registry in application order.
#[must_use]
pub fn secret_patterns() -> &'static [SecretPattern] {
    &REGISTRY
}

/// Detector for secrets in content.
///
/// Stateless; safe to share and call from anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretDetector;

impl SecretDetector {
    /// Creates a new secret detector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Checks if content contains any secrets.
    ///
    /// Stops at the first pattern that matches.
    #[must_use]
    pub fn contains_secrets(&self, content: &str) -> bool {
        secret_patterns()
            .iter()
            .any(|pattern| pattern.regex.is_match(content))
    }

    /// Returns all detected secret matches, sorted by position.
    ///
    /// Overlapping matches are collapsed, keeping the earliest.
    #[must_use]
    pub fn detect(&self, content: &str) -> Vec<SecretMatch> {
        let mut matches = Vec::new();

        for pattern in secret_patterns() {
            for m in pattern.regex.find_iter(content) {
                matches.push(SecretMatch {
                    secret_type: pattern.name,
                    category: pattern.category,
                    start: m.start(),
                    end: m.end(),
                });
            }
        }

        matches.sort_by_key(|m| m.start);

        let mut result = Vec::new();
        let mut last_end = 0;
        for m in matches {
            if m.start >= last_end {
                last_end = m.end;
                result.push(m);
            }
        }

        result
    }

    /// Returns the distinct types of secrets detected, in order of first
    /// appearance.
    #[must_use]
    pub fn detect_types(&self, content: &str) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = Vec::new();
        for m in self.detect(content) {
            if !types.contains(&m.secret_type) {
                types.push(m.secret_type);
            }
        }
        types
    }
}
