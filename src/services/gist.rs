//! Rule-based gist extraction.
//!
//! Every event gets a one-line summary built from fixed templates. Nothing
//! here can fail, and the same input always yields the same gist.

use super::classifier::file_name;

/// Longest message or command kept verbatim in a gist, in characters.
pub const MAX_GIST_FRAGMENT_CHARS: usize = 100;

/// Literal markers counted as one test definition each.
const TEST_MARKERS: &[&str] = &["def test_", "fn test_", "func Test"];

const FUNCTION_MARKERS: &[&str] = &["def ", "function ", "fn "];
const TYPE_MARKERS: &[&str] = &["class ", "struct "];
const IMPORT_MARKERS: &[&str] = &["import ", "from ", "require("];
const CONFIG_EXTENSIONS: &[&str] = &[".json", ".yaml", ".yml", ".toml"];

/// Builds short descriptions of events.
#[derive(Debug, Clone, Copy, Default)]
pub struct GistExtractor;

impl GistExtractor {
    /// Creates a new extractor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Summarizes a file edit.
    ///
    /// `content` must already be redacted; only the file name and fixed
    /// phrases end up in the gist.
    #[must_use]
    pub fn file_edit(&self, path: &str, content: &str) -> String {
        let name = file_name(path);
        let name_lower = name.to_lowercase();

        if name_lower.contains("test") {
            let count: usize = TEST_MARKERS
                .iter()
                .map(|marker| content.matches(marker).count())
                .sum();
            return if count > 0 {
                format!("Modified {count} test(s) in {name}")
            } else {
                format!("Updated test file: {name}")
            };
        }

        if contains_any(content, FUNCTION_MARKERS) {
            return format!("Added/modified functions in {name}");
        }
        if contains_any(content, TYPE_MARKERS) {
            return format!("Modified class definitions in {name}");
        }
        if contains_any(content, IMPORT_MARKERS) {
            return format!("Updated imports in {name}");
        }
        if CONFIG_EXTENSIONS.iter().any(|ext| name_lower.ends_with(ext)) {
            return format!("Updated configuration: {name}");
        }
        if name_lower.ends_with(".md") {
            return format!("Updated documentation: {name}");
        }

        format!("Edited {name}")
    }

    /// Summarizes a finished terminal command.
    #[must_use]
    pub fn terminal(&self, command: &str, exit_code: i64) -> String {
        let command = truncate_chars(command, MAX_GIST_FRAGMENT_CHARS);
        if exit_code == 0 {
            format!("Ran command: {command}")
        } else {
            format!("Command failed: {command}")
        }
    }

    /// Summarizes a diagnostic as `<Severity> in <file>: <message>`.
    #[must_use]
    pub fn diagnostic(&self, path: &str, severity: &str, message: &str) -> String {
        format!(
            "{} in {}: {}",
            capitalize(severity),
            file_name(path),
            truncate_chars(message, MAX_GIST_FRAGMENT_CHARS)
        )
    }

    /// Placeholder for files on the ignore list. Never looks at content.
    #[must_use]
    pub fn ignored_file(&self, path: &str) -> String {
        format!("Ignored file: {path}")
    }
}

fn contains_any(content: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| content.contains(marker))
}

/// Truncates to `max` characters, ending with `...` when shortened.
///
/// Counts `char`s so multi-byte text is never split.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str("...");
    truncated
}

/// First character upper case, the rest lower case.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("test_x.py", "def test_one(): pass\ndef test_two(): pass", "Modified 2 test(s) in test_x.py" ; "python tests")]
    #[test_case("src/lib_test.rs", "#[test]\nfn test_parse() {}", "Modified 1 test(s) in lib_test.rs" ; "rust tests")]
    #[test_case("pkg/handler_test.go", "func TestA(t *testing.T) {}\nfunc TestB(t *testing.T) {}", "Modified 2 test(s) in handler_test.go" ; "go tests")]
    #[test_case("tests/conftest.py", "import pytest", "Updated test file: conftest.py" ; "test file without tests")]
    #[test_case("app.js", "function main() {}", "Added/modified functions in app.js" ; "functions")]
    #[test_case("models.py", "class User:\n    pass", "Modified class definitions in models.py" ; "classes")]
    #[test_case("point.rs", "struct Point { x: i32 }", "Modified class definitions in point.rs" ; "structs")]
    #[test_case("index.js", "const fs = require('fs');", "Updated imports in index.js" ; "imports")]
    #[test_case("config/app.yaml", "port: 8080", "Updated configuration: app.yaml" ; "configuration")]
    #[test_case("README.md", "# Title", "Updated documentation: README.md" ; "documentation")]
    #[test_case("Makefile", "all:\n\tcc main.c", "Edited Makefile" ; "fallback")]
    fn test_file_edit_gist(path: &str, content: &str, expected: &str) {
        assert_eq!(GistExtractor::new().file_edit(path, content), expected);
    }

    #[test]
    fn test_file_edit_rule_order() {
        let extractor = GistExtractor::new();
        // Functions win over classes and imports
        let content = "import os\nclass A:\n    def run(self): pass";
        assert_eq!(
            extractor.file_edit("app.py", content),
            "Added/modified functions in app.py"
        );
        // Content rules win over the config extension
        assert_eq!(
            extractor.file_edit("tool.toml", "from = 'x'"),
            "Updated imports in tool.toml"
        );
        // Test rule looks at the name only
        assert_eq!(
            extractor.file_edit("tests/main.py", "print(1)"),
            "Edited main.py"
        );
    }

    #[test]
    fn test_terminal_gist() {
        let extractor = GistExtractor::new();
        assert_eq!(extractor.terminal("pytest", 1), "Command failed: pytest");
        assert_eq!(extractor.terminal("ls -la", 0), "Ran command: ls -la");
        assert_eq!(extractor.terminal("kill", -9), "Command failed: kill");
    }

    #[test]
    fn test_terminal_gist_bounds_command() {
        let command = "x".repeat(300);
        let gist = GistExtractor::new().terminal(&command, 0);
        assert_eq!(gist.chars().count(), "Ran command: ".len() + MAX_GIST_FRAGMENT_CHARS);
        assert!(gist.ends_with("..."));
    }

    #[test]
    fn test_diagnostic_gist() {
        let extractor = GistExtractor::new();
        assert_eq!(
            extractor.diagnostic("src/main.py", "error", "Syntax error"),
            "Error in main.py: Syntax error"
        );
        assert_eq!(
            extractor.diagnostic("a.ts", "WARNING", "unused variable"),
            "Warning in a.ts: unused variable"
        );
        assert_eq!(extractor.diagnostic("a.ts", "", "m"), " in a.ts: m");
    }

    #[test]
    fn test_diagnostic_gist_truncates_long_message() {
        let message = "m".repeat(150);
        let gist = GistExtractor::new().diagnostic("main.py", "error", &message);

        let expected = format!("Error in main.py: {}...", "m".repeat(97));
        assert_eq!(gist, expected);
    }

    #[test]
    fn test_ignored_file_gist() {
        assert_eq!(
            GistExtractor::new().ignored_file("app/.env"),
            "Ignored file: app/.env"
        );
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars(&"a".repeat(100), 100), "a".repeat(100));
        assert_eq!(truncate_chars(&"a".repeat(101), 100), format!("{}...", "a".repeat(97)));

        // Multi-byte characters are counted, not bytes
        let text = "é".repeat(120);
        let truncated = truncate_chars(&text, 100);
        assert_eq!(truncated.chars().count(), 100);
        assert!(truncated.starts_with("ééé"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("error"), "Error");
        assert_eq!(capitalize("wARNING"), "Warning");
        assert_eq!(capitalize(""), "");
    }
}
