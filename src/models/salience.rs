//! Salience levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete importance tier assigned to every event.
///
/// Variants are declared in ascending order, so the derived `Ord` gives
/// `Noise < Low < Medium < High < Critical`. The same order is used for
/// classification output and for recall thresholds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum SalienceLevel {
    /// Progress bars, spam, ignored files.
    Noise,
    /// Documentation edits.
    Low,
    /// Ordinary code edits and successful commands.
    #[default]
    Medium,
    /// Failed commands, tests, configuration, warnings.
    High,
    /// Errors and anything that contained a secret.
    Critical,
}

impl SalienceLevel {
    /// Returns all levels in ascending order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Noise,
            Self::Low,
            Self::Medium,
            Self::High,
            Self::Critical,
        ]
    }

    /// Returns the wire name of the level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Noise => "NOISE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Parses a level name, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NOISE" => Some(Self::Noise),
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for SalienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        assert!(SalienceLevel::Noise < SalienceLevel::Low);
        assert!(SalienceLevel::Low < SalienceLevel::Medium);
        assert!(SalienceLevel::Medium < SalienceLevel::High);
        assert!(SalienceLevel::High < SalienceLevel::Critical);

        let mut sorted = SalienceLevel::all().to_vec();
        sorted.sort();
        assert_eq!(sorted, SalienceLevel::all());
    }

    #[test]
    fn test_parse_roundtrip() {
        for level in SalienceLevel::all() {
            assert_eq!(SalienceLevel::parse(level.as_str()), Some(*level));
        }
        assert_eq!(SalienceLevel::parse("high"), Some(SalienceLevel::High));
        assert_eq!(SalienceLevel::parse("urgent"), None);
    }

    #[test]
    fn test_serializes_as_name() {
        let json = serde_json::to_string(&SalienceLevel::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");

        let level: SalienceLevel = serde_json::from_str("\"NOISE\"").unwrap();
        assert_eq!(level, SalienceLevel::Noise);
    }
}
