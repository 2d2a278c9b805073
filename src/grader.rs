//! Deterministic keyword-overlap grader, used when the remote evaluation
//! call fails entirely. No network access, no state.
//!
//! The signal is crude on purpose: substring containment of the long words
//! from the expected answer, no stemming or semantic matching. It is a safety
//! net that always produces a verdict and an explanation, not a quality
//! grader. The thresholds (keyword length > 4, match ratio >= 0.5) are part
//! of its contract.

use std::collections::HashSet;

use crate::domain::Evaluation;

/// Punctuation stripped from both ends of each candidate keyword.
const EDGE_PUNCT: &[char] = &['.', ',', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\''];

/// Grade a (normalized, textual) student answer against expected key points.
pub fn grade(expected_answer: &str, student_answer: &str) -> Evaluation {
  let student = student_answer.to_lowercase();
  let expected = expected_answer.to_lowercase();

  let keywords: HashSet<&str> = expected
    .split_whitespace()
    .map(|w| w.trim_matches(|c| EDGE_PUNCT.contains(&c)))
    .filter(|w| w.len() > 4)
    .collect();

  let matches = keywords.iter().filter(|k| student.contains(**k)).count();
  let ratio = if keywords.is_empty() { 0.0 } else { matches as f64 / keywords.len() as f64 };
  let percent = (ratio * 100.0).round() as i64;

  let is_correct = ratio >= 0.5;
  let explanation = if is_correct {
    format!("The answer covers approximately {percent}% of the key concepts expected.")
  } else {
    format!(
      "The answer is missing several important concepts (only covers about {percent}% of expected key points)."
    )
  };

  Evaluation { is_correct, explanation }
}
