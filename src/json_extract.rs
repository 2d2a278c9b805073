//! Pulling a JSON object out of free-form model output.
//!
//! Completion models wrap JSON in prose or markdown fences more often than
//! not, so extraction runs a prioritized list of strategies:
//!   1. a ```json fenced block
//!   2. any ``` fenced block whose content parses as JSON
//!   3. the greedy brace span (first `{` to last `}`)
//!   4. the whole trimmed text
//!
//! The brace-span scan is NOT depth aware: a stray `{` in prose before the
//! real object widens the span and can break the parse. Kept that way on
//! purpose; callers treat a failed extraction as a failed model attempt.

use serde_json::Value;

/// Run the strategies in order; first successful parse wins.
pub fn extract_json_object(text: &str) -> Option<Value> {
  if let Some(block) = fenced_json_block(text) {
    if let Ok(v) = serde_json::from_str::<Value>(&block) {
      return Some(v);
    }
  }
  if let Some(block) = any_fenced_block(text) {
    if let Ok(v) = serde_json::from_str::<Value>(&block) {
      return Some(v);
    }
  }
  if let Some(span) = brace_span(text) {
    if let Ok(v) = serde_json::from_str::<Value>(span) {
      return Some(v);
    }
  }
  serde_json::from_str::<Value>(text.trim()).ok()
}

/// Content of a ```json fenced block, if present.
fn fenced_json_block(text: &str) -> Option<String> {
  let rest = text.split_once("```json")?.1;
  let inner = rest.split_once("```")?.0;
  Some(inner.trim().to_string())
}

/// Content of the first generic ``` fenced block, if present.
/// The caller still has to validate it parses as JSON.
fn any_fenced_block(text: &str) -> Option<String> {
  let rest = text.split_once("```")?.1;
  let inner = rest.split_once("```")?.0;
  Some(inner.trim().to_string())
}

/// Greedy span from the first `{` to the last `}`.
fn brace_span(text: &str) -> Option<&str> {
  let start = text.find('{')?;
  let end = text.rfind('}')?;
  if end < start {
    return None;
  }
  Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn bare_and_fenced_extract_identically() {
    let bare = r#"{"question": "Q?", "expected_answer": "A"}"#;
    let fenced = format!("Here you go:\n```json\n{}\n```\nHope that helps!", bare);
    assert_eq!(extract_json_object(bare), extract_json_object(&fenced));
    assert_eq!(
      extract_json_object(bare).unwrap(),
      json!({"question": "Q?", "expected_answer": "A"})
    );
  }

  #[test]
  fn generic_fence_must_parse_as_json() {
    let text = "```\nnot json at all\n```\nbut later {\"ok\": true} appears";
    // Strategy 2 rejects the non-JSON fence; strategy 3 finds the brace span.
    assert_eq!(extract_json_object(text).unwrap(), json!({"ok": true}));
  }

  #[test]
  fn brace_span_is_greedy_first_to_last() {
    assert_eq!(brace_span("x {a} y {b} z"), Some("{a} y {b}"));
    assert_eq!(brace_span("no braces"), None);
    assert_eq!(brace_span("} reversed {"), None);
  }

  #[test]
  fn prose_wrapped_object_is_found() {
    let text = "The evaluation follows. {\"is_correct\": false, \"explanation\": \"Missing detail.\"} Done.";
    let v = extract_json_object(text).unwrap();
    assert_eq!(v["is_correct"], json!(false));
  }

  #[test]
  fn earlier_stray_brace_poisons_the_span() {
    // Documented limitation of the greedy scan: the stray '{' pulls prose
    // into the span and no strategy recovers the object.
    let text = "weird { prose, then {\"ok\": true}";
    assert_eq!(extract_json_object(text), None);
  }

  #[test]
  fn garbage_yields_none() {
    assert_eq!(extract_json_object("no json here"), None);
    assert_eq!(extract_json_object(""), None);
  }
}
