//! Line decoding.
// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]

use crate::models::Event;
use crate::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Name of the correlation field echoed on every response.
pub const CORRELATION_FIELD: &str = "_id";

/// `"_id": <json scalar>` at the start of the text.
static CORRELATION_SCAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^"_id"\s*:\s*("(?:[^"\\]|\\.)*"|-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?|true|false|null)"#,
    )
    .expect("static regex: correlation scan")
});

/// One decoded input line.
#[derive(Debug)]
pub struct DecodedLine {
    /// Correlation token to echo, if one was found.
    pub correlation_id: Option<Value>,
    /// The validated event, or why the line was rejected.
    pub event: Result<Event>,
}

/// Parses and validates one line.
///
/// For well-formed JSON the correlation token is taken from the parsed
/// object. For malformed JSON it is recovered from the raw text when
/// possible; the parse error is reported either way.
#[must_use]
pub fn decode_line(line: &str) -> DecodedLine {
    match serde_json::from_str::<Value>(line) {
        Ok(value) => {
            let correlation_id = value.get(CORRELATION_FIELD).cloned();
            DecodedLine {
                correlation_id,
                event: Event::from_value(value).map_err(Error::from),
            }
        },
        Err(e) => DecodedLine {
            correlation_id: recover_correlation_id(line),
            event: Err(Error::Protocol(e.to_string())),
        },
    }
}

/// Best-effort extraction of `_id` from text that is not valid JSON.
///
/// Only scalar keys of the outermost object are considered, and the last one
/// wins, as it would for a well-formed line. Anything that does not parse as
/// a JSON scalar yields `None`. Integers beyond the `i64`/`u64` range come
/// back as floats, exactly as they would from a well-formed line.
#[must_use]
pub fn recover_correlation_id(line: &str) -> Option<Value> {
    top_level_strings(line).into_iter().rev().find_map(|offset| {
        let captures = CORRELATION_SCAN.captures(&line[offset..])?;
        serde_json::from_str(captures.get(1)?.as_str()).ok()
    })
}

/// Byte offsets of every string that opens directly inside the outermost
/// object.
fn top_level_strings(line: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in line.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {},
            }
            continue;
        }
        match c {
            '"' => {
                if depth == 1 {
                    offsets.push(offset);
                }
                in_string = true;
            },
            '{' | '[' => depth += 1,
            '}' | ']' => depth = depth.saturating_sub(1),
            _ => {},
        }
    }

    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;
    use serde_json::json;

    #[test]
    fn test_decode_valid_event_with_id() {
        let decoded = decode_line(r#"{"type":"ping","_id":"abc"}"#);
        assert_eq!(decoded.correlation_id, Some(json!("abc")));
        assert!(matches!(decoded.event, Ok(Event::Ping)));
    }

    #[test]
    fn test_decode_keeps_structured_id_verbatim() {
        let decoded = decode_line(r#"{"type":"ping","_id":{"seq":[1,2]}}"#);
        assert_eq!(decoded.correlation_id, Some(json!({"seq": [1, 2]})));
    }

    #[test]
    fn test_decode_validation_error_keeps_id() {
        let decoded = decode_line(r#"{"type":"file_edit","file":"a.rs","_id":7}"#);
        assert_eq!(decoded.correlation_id, Some(json!(7)));
        assert!(matches!(
            decoded.event,
            Err(Error::Validation(ValidationError::MissingField {
                field: "content",
                ..
            }))
        ));
    }

    #[test]
    fn test_decode_malformed_recovers_id() {
        let decoded = decode_line(r#"{"type":"ping","_id":"abc""#);
        assert_eq!(decoded.correlation_id, Some(json!("abc")));
        assert!(matches!(
            decoded.event,
            Err(Error::Protocol(ref message)) if !message.is_empty()
        ));
    }

    #[test]
    fn test_decode_malformed_without_id() {
        let decoded = decode_line(r#"{"type":"ping""#);
        assert_eq!(decoded.correlation_id, None);
        assert!(matches!(decoded.event, Err(Error::Protocol(_))));
    }

    #[test]
    fn test_decode_empty_line_is_protocol_error() {
        assert!(matches!(decode_line("").event, Err(Error::Protocol(_))));
        assert!(matches!(decode_line("   ").event, Err(Error::Protocol(_))));
    }

    #[test]
    fn test_decode_non_object_is_validation_error() {
        assert!(matches!(
            decode_line("[1,2]").event,
            Err(Error::Validation(ValidationError::NotAnObject))
        ));
    }

    #[test]
    fn test_recover_scalars() {
        assert_eq!(recover_correlation_id(r#"{"_id": 42, "x": "#), Some(json!(42)));
        assert_eq!(recover_correlation_id(r#"{"_id":-1.5e3,"#), Some(json!(-1500.0)));
        assert_eq!(recover_correlation_id(r#"{"_id":null,"#), Some(Value::Null));
        assert_eq!(recover_correlation_id(r#"{"_id":true"#), Some(json!(true)));
        assert_eq!(
            recover_correlation_id(r#"{"_id":"a\"b" oops"#),
            Some(json!("a\"b"))
        );
    }

    #[test]
    fn test_recover_rejects_unparseable() {
        // Unterminated string
        assert_eq!(recover_correlation_id(r#"{"_id":"abc"#), None);
        // Objects are not recovered from broken lines
        assert_eq!(recover_correlation_id(r#"{"_id":{"a":1"#), None);
        // Invalid escape inside the captured string
        assert_eq!(recover_correlation_id(r#"{"_id":"\q"}"#), None);
        assert_eq!(recover_correlation_id("not json at all"), None);
    }

    #[test]
    fn test_recover_prefers_last_top_level_id() {
        assert_eq!(
            recover_correlation_id(r#"{"meta":{"_id":1},"_id":"real""#),
            Some(json!("real"))
        );
        assert_eq!(
            recover_correlation_id(r#"{"_id":1,"type":"ping","_id":2"#),
            Some(json!(2))
        );
        assert_eq!(recover_correlation_id(r#"{"meta":{"_id":1},"type":"#), None);
        // Key text inside a string value is not a key
        assert_eq!(
            recover_correlation_id(r#"{"note":"\"_id\": 9","_id":3"#),
            Some(json!(3))
        );
        assert_eq!(recover_correlation_id(r#"{"list":[{"_id":4}],"#), None);
    }
}
