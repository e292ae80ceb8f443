//! Best-effort extraction of a JSON object from free-form model output.
//!
//! Secondary parser behind the structured-output path: models asked for JSON
//! sometimes wrap it in prose or a fenced code block. Extraction is
//! best-effort and callers must handle `None`.

use std::sync::LazyLock;

use regex::Regex;

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid regex"));

/// Pull the first JSON object out of `text`.
///
/// Tries the whole text, then a fenced code block, then a brace scan over the
/// raw text. Only objects are accepted; bare arrays and scalars are not a
/// useful classification payload.
pub fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    if let Some(value) = parse_object(text.trim()) {
        return Some(value);
    }

    if let Some(caps) = FENCED_JSON.captures(text) {
        if let Some(value) = caps.get(1).and_then(|m| parse_object(m.as_str())) {
            return Some(value);
        }
    }

    brace_scan(text)
}

fn parse_object(candidate: &str) -> Option<serde_json::Value> {
    match serde_json::from_str(candidate) {
        Ok(value @ serde_json::Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Scan for balanced `{...}` spans and try to parse each one.
fn brace_scan(text: &str) -> Option<serde_json::Value> {
    let bytes = text.as_bytes();
    let mut start = 0;

    while let Some(open) = text[start..].find('{').map(|i| i + start) {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (offset, &b) in bytes[open..].iter().enumerate() {
            if escaped {
                escaped = false;
                continue;
            }
            match b {
                b'\\' if in_string => escaped = true,
                b'"' => in_string = !in_string,
                b'{' if !in_string => depth += 1,
                b'}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        let candidate = &text[open..=open + offset];
                        if let Some(value) = parse_object(candidate) {
                            return Some(value);
                        }
                        break;
                    }
                }
                _ => {}
            }
        }

        start = open + 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bare_object() {
        let value = extract_json_object(r#"{"intent": "chat", "confidence": 0.8}"#).unwrap();
        assert_eq!(value["intent"], "chat");
    }

    #[test]
    fn extracts_fenced_block() {
        let text = "分類結果です。\n```json\n{\"intent\": \"empathy\", \"confidence\": 0.9}\n```\n以上です。";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["intent"], "empathy");
    }

    #[test]
    fn extracts_object_embedded_in_prose() {
        let text = r#"The result is {"intent": "knowledge", "confidence": 0.7} as requested."#;
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["intent"], "knowledge");
    }

    #[test]
    fn handles_braces_inside_strings() {
        let text = r#"prefix {"note": "contains } brace", "ok": true} suffix"#;
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn returns_none_without_object() {
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("[1, 2, 3]").is_none());
        assert!(extract_json_object("{broken").is_none());
    }
}
