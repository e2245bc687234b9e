//! Locate-and-replace strategies, tried in order by the patcher
//!
//! Each strategy takes `(content, old, new)` and returns the patched content
//! if it could locate `old`, or `None` to let the next strategy try. An empty
//! `old` never matches.

use serde_json::{Map, Value};

/// Signature shared by every strategy
pub type StrategyFn = fn(&str, &str, &str) -> Option<String>;

/// Minimum length of `old` (exclusive, in characters) before anchoring is attempted
pub const ANCHOR_MIN_CHARS: usize = 50;
const ANCHOR_STEP: usize = 10;

/// Replace the first verbatim occurrence of `old`
pub fn exact(content: &str, old: &str, new: &str) -> Option<String> {
    if old.is_empty() || !content.contains(old) {
        return None;
    }
    Some(content.replacen(old, new, 1))
}

/// Match after stripping trailing whitespace from every line of all inputs
///
/// The replacement is spliced into the normalized content, so trailing
/// whitespace elsewhere in the file is dropped as a side effect. Leading
/// indentation is compared verbatim.
pub fn whitespace_normalized(content: &str, old: &str, new: &str) -> Option<String> {
    let old = strip_trailing_whitespace(old);
    if old.is_empty() {
        return None;
    }
    let content = strip_trailing_whitespace(content);
    if !content.contains(&old) {
        return None;
    }
    let new = strip_trailing_whitespace(new);
    Some(content.replacen(&old, &new, 1))
}

/// Match on key-sorted, whitespace-free JSON serializations
///
/// All three inputs must parse as JSON; the result is the canonical form of
/// the patched document.
pub fn canonical_json(content: &str, old: &str, new: &str) -> Option<String> {
    let content = canonical_json_string(content)?;
    let old = canonical_json_string(old)?;
    let new = canonical_json_string(new)?;
    if !content.contains(&old) {
        return None;
    }
    Some(content.replacen(&old, &new, 1))
}

/// Slide a window of `old`'s lines over the content's lines
pub fn line_window(content: &str, old: &str, new: &str) -> Option<String> {
    if old.is_empty() {
        return None;
    }
    let old_lines: Vec<&str> = old.split('\n').collect();
    let content_lines: Vec<&str> = content.split('\n').collect();
    if old_lines.len() > content_lines.len() {
        return None;
    }

    let start = content_lines
        .windows(old_lines.len())
        .position(|window| window == old_lines.as_slice())?;

    let mut lines: Vec<&str> = Vec::with_capacity(content_lines.len());
    lines.extend_from_slice(&content_lines[..start]);
    lines.extend(new.split('\n'));
    lines.extend_from_slice(&content_lines[start + old_lines.len()..]);
    Some(lines.join("\n"))
}

/// Find a long substring of `old` in the content and confirm `old` sits near it
///
/// Candidate anchors are taken from `old` at sizes from its full length down
/// to (exclusive) `max(50, len / 2)` in steps of ten, at offsets stepping by
/// ten. The first anchor present in the content decides: if the whole of
/// `old` lies within one `old`-length before to two `old`-lengths after the
/// anchor, the first occurrence of `old` is replaced. Because that requires
/// `old` to appear verbatim, this never succeeds where [`exact`] failed.
pub fn anchor(content: &str, old: &str, new: &str) -> Option<String> {
    let old_chars: Vec<char> = old.chars().collect();
    let len = old_chars.len();
    if len <= ANCHOR_MIN_CHARS {
        return None;
    }

    let floor = ANCHOR_MIN_CHARS.max(len / 2);
    let mut size = len;
    while size > floor {
        let mut offset = 0;
        while offset + size < len {
            let candidate: String = old_chars[offset..offset + size].iter().collect();
            if let Some(pos) = content.find(&candidate) {
                let pos = content[..pos].chars().count();
                let window_start = char_to_byte(content, pos.saturating_sub(len));
                let window_end = char_to_byte(content, pos + 2 * len);
                if content[window_start..window_end].contains(old) {
                    return exact(content, old, new);
                }
                return None;
            }
            offset += ANCHOR_STEP;
        }
        size = match size.checked_sub(ANCHOR_STEP) {
            Some(next) => next,
            None => break,
        };
    }

    None
}

/// Remove trailing whitespace from each `\n`-separated line, keeping blank lines
pub fn strip_trailing_whitespace(text: &str) -> String {
    text.split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize a JSON document compactly with object keys sorted at every level
pub fn canonical_json_string(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    serde_json::to_string(&sort_keys(value)).ok()
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Byte offset of the `idx`-th character, clamped to the end of `s`
fn char_to_byte(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map_or(s.len(), |(b, _)| b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_replaces_first_occurrence_only() {
        let out = exact("a b a b", "a", "x").unwrap();
        assert_eq!(out, "x b a b");
    }

    #[test]
    fn test_exact_missing_or_empty() {
        assert!(exact("hello", "bye", "x").is_none());
        assert!(exact("hello", "", "x").is_none());
    }

    #[test]
    fn test_whitespace_trailing_drift() {
        let content = "function f() {   \n  return 1;\t\n}\n";
        let old = "function f() {\n  return 1;\n}";
        let out = whitespace_normalized(content, old, "function f() {\n  return 2;\n}").unwrap();
        assert_eq!(out, "function f() {\n  return 2;\n}\n");
    }

    #[test]
    fn test_whitespace_splices_into_normalized_content() {
        let content = "a   \nb\nc  ";
        let out = whitespace_normalized(content, "b  ", "B").unwrap();
        assert_eq!(out, "a\nB\nc");
    }

    #[test]
    fn test_whitespace_leading_drift_not_tolerated() {
        let content = "if (ok) {\n  return 1;\n}\n";
        assert!(whitespace_normalized(content, "  return 1;   ", "x").is_some());
        assert!(whitespace_normalized(content, "    return 1;", "x").is_none());
        assert!(whitespace_normalized(content, "\treturn 1;", "x").is_none());
    }

    #[test]
    fn test_whitespace_blank_old() {
        assert!(whitespace_normalized("a\n\nb", "   ", "x").is_none());
    }

    #[test]
    fn test_canonical_json_reordered_keys() {
        let content = r#"{"b": {"y": 2, "x": 1}, "a": 1}"#;
        let old = r#"{"x": 1, "y": 2}"#;
        let new = r#"{"x": 10, "y": 2}"#;
        let out = canonical_json(content, old, new).unwrap();
        assert_eq!(out, r#"{"a":1,"b":{"x":10,"y":2}}"#);
    }

    #[test]
    fn test_canonical_json_requires_all_inputs_to_parse() {
        let content = r#"{"a": 1}"#;
        assert!(canonical_json(content, "1", "not json").is_none());
        assert!(canonical_json("not json", "1", "2").is_none());
        assert!(canonical_json(content, "{", "2").is_none());
    }

    #[test]
    fn test_canonical_json_string_sorts_nested() {
        let canonical = canonical_json_string(r#"[{"z": 1, "a": [ {"k": 1, "b": 2} ]}]"#).unwrap();
        assert_eq!(canonical, r#"[{"a":[{"b":2,"k":1}],"z":1}]"#);
    }

    #[test]
    fn test_line_window_replaces_lines() {
        let content = "one\ntwo\nthree\nfour";
        let out = line_window(content, "two\nthree", "2\n3\n3.5").unwrap();
        assert_eq!(out, "one\n2\n3\n3.5\nfour");
    }

    #[test]
    fn test_line_window_requires_whole_lines() {
        assert!(line_window("one\ntwo", "on", "x").is_none());
        assert!(line_window("one", "one\ntwo", "x").is_none());
        assert!(line_window("one", "", "x").is_none());
    }

    #[test]
    fn test_anchor_short_old_skipped() {
        let old = "x".repeat(50);
        assert!(anchor(&old, &old, "y").is_none());
    }

    #[test]
    fn test_anchor_finds_old_near_anchor() {
        let old: String = (0..80).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let content = format!("prefix\n{}\nsuffix", old);
        let out = anchor(&content, &old, "NEW").unwrap();
        assert_eq!(out, "prefix\nNEW\nsuffix");
    }

    #[test]
    fn test_anchor_fails_when_old_absent() {
        let old: String = (0..80).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let mut drifted = old.clone();
        drifted.replace_range(75..76, "#");
        let content = format!("start {} end", drifted);
        assert!(anchor(&content, &old, "NEW").is_none());
    }

    #[test]
    fn test_anchor_handles_multibyte_content() {
        let old = format!("{}{}", "é".repeat(30), "ü".repeat(30));
        let content = format!("→ {} ←", old);
        let out = anchor(&content, &old, "ok").unwrap();
        assert_eq!(out, "→ ok ←");
    }

    #[test]
    fn test_strip_trailing_whitespace_keeps_blank_lines() {
        assert_eq!(strip_trailing_whitespace("a \n  \n\tb\t"), "a\n\n\tb");
    }
}
