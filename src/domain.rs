//! Domain models used by the backend: the skill catalog, difficulty levels,
//! media kinds, and the question/answer/evaluation values the pipeline produces.

use serde::{Deserialize, Serialize};

/// The fixed catalog of soft skills that can be assessed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
  Communication,
  Leadership,
  CriticalThinking,
  ProblemSolving,
  Teamwork,
  TimeManagement,
  Adaptability,
  EmotionalIntelligence,
  Creativity,
  DecisionMaking,
  ConflictResolution,
  Negotiation,
}

impl Skill {
  pub const ALL: [Skill; 12] = [
    Skill::Communication,
    Skill::Leadership,
    Skill::CriticalThinking,
    Skill::ProblemSolving,
    Skill::Teamwork,
    Skill::TimeManagement,
    Skill::Adaptability,
    Skill::EmotionalIntelligence,
    Skill::Creativity,
    Skill::DecisionMaking,
    Skill::ConflictResolution,
    Skill::Negotiation,
  ];

  /// Human-readable name, used verbatim inside prompts and rendered media.
  pub fn name(&self) -> &'static str {
    match self {
      Skill::Communication => "Communication",
      Skill::Leadership => "Leadership",
      Skill::CriticalThinking => "Critical Thinking",
      Skill::ProblemSolving => "Problem Solving",
      Skill::Teamwork => "Teamwork",
      Skill::TimeManagement => "Time Management",
      Skill::Adaptability => "Adaptability",
      Skill::EmotionalIntelligence => "Emotional Intelligence",
      Skill::Creativity => "Creativity",
      Skill::DecisionMaking => "Decision Making",
      Skill::ConflictResolution => "Conflict Resolution",
      Skill::Negotiation => "Negotiation",
    }
  }
}

impl std::fmt::Display for Skill {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// Difficulty tier. Ordinal in name only; the pipeline treats it as a label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
  Beginner,
  Intermediate,
  Advanced,
}

impl Level {
  pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

  pub fn name(&self) -> &'static str {
    match self {
      Level::Beginner => "Beginner",
      Level::Intermediate => "Intermediate",
      Level::Advanced => "Advanced",
    }
  }

  /// Parse a free-form label. Unknown labels resolve to Intermediate, the
  /// same default branch the static fallback bank uses.
  pub fn from_label(label: &str) -> Level {
    match label.trim().to_lowercase().as_str() {
      "beginner" => Level::Beginner,
      "advanced" => Level::Advanced,
      _ => Level::Intermediate,
    }
  }
}

impl std::fmt::Display for Level {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// Modality of a question or an answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
  Text,
  Audio,
  Image,
}

impl MediaKind {
  pub fn name(&self) -> &'static str {
    match self {
      MediaKind::Text => "Text",
      MediaKind::Audio => "Audio",
      MediaKind::Image => "Image",
    }
  }
}

impl std::fmt::Display for MediaKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// A generated assessment question. Immutable once produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
  pub kind: MediaKind,
  pub content: String,
  /// Key points a good answer should cover, not a literal match target.
  pub expected_answer: String,
  /// Textual surrogate for non-text media (audio scenario, image description).
  #[serde(default)] pub media_description: Option<String>,
  /// Opaque storage reference for rendered/uploaded media.
  #[serde(default)] pub media_ref: Option<String>,
}

/// A learner's submitted answer. Consumed once by the evaluator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Answer {
  pub kind: MediaKind,
  pub content: String,
  #[serde(default)] pub media_ref: Option<String>,
}

/// Verdict plus explanation, produced exactly once per answer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Evaluation {
  pub is_correct: bool,
  pub explanation: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn level_label_defaults_to_intermediate() {
    assert_eq!(Level::from_label("Beginner"), Level::Beginner);
    assert_eq!(Level::from_label("advanced"), Level::Advanced);
    assert_eq!(Level::from_label("expert"), Level::Intermediate);
    assert_eq!(Level::from_label(""), Level::Intermediate);
  }

  #[test]
  fn skill_names_are_title_case() {
    assert_eq!(Skill::CriticalThinking.name(), "Critical Thinking");
    assert_eq!(Skill::ALL.len(), 12);
  }
}
