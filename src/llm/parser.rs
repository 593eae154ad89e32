//! Extraction of JSON payloads from free-form LLM output
//!
//! Models wrap their JSON in prose, fence it inconsistently, leave comments
//! from the schema in place and break strings across lines. The parser looks
//! for a ```json fence first, then for the first balanced `{...}` object, and
//! decodes with a JSON5 parser. When nothing decodes the result is `None`.

use serde_json::Value;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Opening braces tried before the brace scan gives up
const MAX_CANDIDATES: usize = 32;

/// Decode the JSON payload of an LLM response, if there is one
pub fn parse_response(raw: &str) -> Option<Value> {
    if let Some(block) = fenced_block(raw) {
        if let Some(value) = decode(block) {
            return Some(value);
        }
        tracing::debug!("Fenced JSON block did not decode, falling back to brace scan");
    }

    if let Some(value) = first_decodable_object(raw) {
        return Some(value);
    }

    tracing::warn!(
        "No structured JSON found in LLM response ({} chars)",
        raw.len()
    );
    None
}

/// Interior of the first ```json fence; an unclosed fence runs to the end
fn fenced_block(raw: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets aligned with `raw`
    let lower = raw.to_ascii_lowercase();
    let open = lower.find(FENCE_OPEN)?;
    let body_start = open + FENCE_OPEN.len();
    let body = &raw[body_start..];
    let body = match body.find(FENCE_CLOSE) {
        Some(close) => &body[..close],
        None => body,
    };
    Some(body.trim())
}

/// First balanced `{...}` object that decodes
///
/// A complete object that fails to decode is skipped as a whole, so its
/// inner fragments are never taken for the payload. At most
/// [`MAX_CANDIDATES`] opening braces are tried.
fn first_decodable_object(raw: &str) -> Option<Value> {
    let mut from = 0;

    for _ in 0..MAX_CANDIDATES {
        let start = from + raw[from..].find('{')?;
        match matching_brace(raw, start) {
            Some(end) => {
                if let Some(value) = decode(&raw[start..=end]) {
                    return Some(value);
                }
                from = end + 1;
            }
            None => from = start + 1,
        }
    }

    tracing::debug!("Gave up after {} JSON candidates", MAX_CANDIDATES);
    None
}

/// Byte offset of the brace closing the object opened at `start`
///
/// Braces inside string literals (either quote style) and comments are
/// ignored.
fn matching_brace(raw: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = raw[start..].char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                for (_, skipped) in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut prev = '\0';
                for (_, skipped) in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
            }
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

/// Lenient decode of one candidate
fn decode(candidate: &str) -> Option<Value> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    let cleaned = strip_string_newlines(candidate);
    match json5::from_str::<Value>(&cleaned) {
        Ok(value) => Some(value),
        Err(first) => {
            // Last resort for payloads broken in ways the string pass misses
            let flattened = cleaned.replace(['\n', '\r'], " ");
            match json5::from_str::<Value>(&flattened) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::debug!("Candidate JSON did not decode: {}", first);
                    None
                }
            }
        }
    }
}

/// Replace raw line breaks inside string literals with spaces
fn strip_string_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut line_comment = false;
    let mut block_comment = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if line_comment {
            line_comment = c != '\n';
        } else if block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                out.push(c);
                if let Some(slash) = chars.next() {
                    out.push(slash);
                }
                block_comment = false;
                continue;
            }
        } else if let Some(q) = quote {
            if c == '\n' || c == '\r' {
                out.push(' ');
                escaped = false;
                continue;
            }
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
        } else if c == '"' || c == '\'' {
            quote = Some(c);
        } else if c == '/' {
            match chars.peek() {
                Some('/') => line_comment = true,
                Some('*') => block_comment = true,
                _ => {}
            }
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_block() {
        let raw = "noise ```json\n{\"title\":\"A\",\"tasks\":[\"x\",\"y\"]}\n``` trailing";
        assert_eq!(
            parse_response(raw),
            Some(json!({"title": "A", "tasks": ["x", "y"]}))
        );
    }

    #[test]
    fn test_unfenced_object() {
        assert_eq!(
            parse_response(r#"{"title":"A","tasks":["x"]}"#),
            Some(json!({"title": "A", "tasks": ["x"]}))
        );
    }

    #[test]
    fn test_not_json() {
        assert_eq!(parse_response("not json at all"), None);
        assert_eq!(parse_response(""), None);
        assert_eq!(parse_response("{ unbalanced"), None);
    }

    #[test]
    fn test_schema_comments_and_trailing_commas() {
        let raw = r#"Here you go:
```json
{
    "title": "Audit", // the checklist's title
    "tasks": [
        {"title": "Plan",}, /* first */
    ],
}
```"#;
        assert_eq!(
            parse_response(raw),
            Some(json!({"title": "Audit", "tasks": [{"title": "Plan"}]}))
        );
    }

    #[test]
    fn test_nested_braces_and_braces_in_strings() {
        let raw = r#"Result: {"title": "Use {curly} braces", "tasks": [{"title": "a", "tasks": [{"title": "b"}]}]} done {"other": 1}"#;
        assert_eq!(
            parse_response(raw),
            Some(json!({
                "title": "Use {curly} braces",
                "tasks": [{"title": "a", "tasks": [{"title": "b"}]}]
            }))
        );
    }

    #[test]
    fn test_newlines_inside_strings() {
        let raw = "```json\n{\"title\": \"Line one\nline two\", \"tasks\": [\"x\r\ny\"]}\n```";
        assert_eq!(
            parse_response(raw),
            Some(json!({"title": "Line one line two", "tasks": ["x  y"]}))
        );
    }

    #[test]
    fn test_broken_fence_falls_back_to_braces() {
        let raw = "```json\nnot really json\n```\nBut here: {\"title\": \"B\", \"tasks\": [\"z\"]}";
        assert_eq!(
            parse_response(raw),
            Some(json!({"title": "B", "tasks": ["z"]}))
        );
    }

    #[test]
    fn test_skips_undecodable_prefix_object() {
        let raw = "{not: valid: at all} then {\"title\": \"C\"}";
        assert_eq!(parse_response(raw), Some(json!({"title": "C"})));
    }

    #[test]
    fn test_skips_many_broken_fragments() {
        let raw = format!("{}{{\"title\": \"F\"}}", "{x} ".repeat(20));
        assert_eq!(parse_response(&raw), Some(json!({"title": "F"})));
    }

    #[test]
    fn test_inner_object_of_broken_payload_ignored() {
        let raw = r#"{"title": "X", oops {"title": "inner"}} and then {"title": "G"}"#;
        assert_eq!(parse_response(raw), Some(json!({"title": "G"})));
    }

    #[test]
    fn test_brace_scan_is_bounded() {
        let raw = format!("{}{{\"title\": \"H\"}}", "{".repeat(MAX_CANDIDATES + 10));
        assert_eq!(parse_response(&raw), None);

        let within = format!("{}{{\"title\": \"H\"}}", "{".repeat(MAX_CANDIDATES - 1));
        assert_eq!(parse_response(&within), Some(json!({"title": "H"})));
    }

    #[test]
    fn test_unclosed_fence() {
        let raw = "```JSON\n{\"title\": \"D\", \"tasks\": []}";
        assert_eq!(parse_response(raw), Some(json!({"title": "D", "tasks": []})));
    }

    #[test]
    fn test_apostrophes_in_prose_before_object() {
        let raw = "Here's the checklist you asked for: {\"title\": \"E\"}";
        assert_eq!(parse_response(raw), Some(json!({"title": "E"})));
    }
}
