//! Question generation: type-specific prompts against the completion
//! endpoint, with a static per-level fallback bank so callers always get a
//! usable question.
//!
//! `generate` never fails outward. Remote generation can fail in two ways
//! (the client exhausts its model list, or the returned object is missing a
//! required key) and both route to the same canned content.

use serde_json::Value;
use tracing::{error, instrument};

use crate::completion::CompletionClient;
use crate::config::Prompts;
use crate::domain::{Level, MediaKind, Question, Skill};
use crate::util::fill_template;

#[derive(Clone)]
pub struct QuestionGenerator {
  client: Option<CompletionClient>,
  prompts: Prompts,
  temperature: f32,
}

impl QuestionGenerator {
  pub fn new(client: Option<CompletionClient>, prompts: Prompts, temperature: f32) -> Self {
    Self { client, prompts, temperature }
  }

  /// Generate a question of the requested kind. Always returns a usable
  /// question; degraded results come from the static fallback bank.
  #[instrument(level = "info", skip(self), fields(%skill, %level, %kind))]
  pub async fn generate(&self, skill: Skill, level: Level, kind: MediaKind) -> Question {
    match kind {
      MediaKind::Text => self.generate_text(skill, level).await,
      MediaKind::Audio => self.generate_audio(skill, level).await,
      MediaKind::Image => self.generate_image(skill, level).await,
    }
  }

  async fn generate_text(&self, skill: Skill, level: Level) -> Question {
    let prompt = self.fill(&self.prompts.text_question_template, skill, level);
    if let Some(data) = self.request(&prompt, skill, level).await {
      if let Some([question, expected]) = required_strings(&data, ["question", "expected_answer"]) {
        return Question {
          kind: MediaKind::Text,
          content: question,
          expected_answer: expected,
          media_description: None,
          media_ref: None,
        };
      }
      error!(target: "assessment", %skill, %level, "Text generation returned wrong shape; using fallback");
    }

    let (question, expected) = fallback_bank(skill, level);
    Question {
      kind: MediaKind::Text,
      content: question,
      expected_answer: expected,
      media_description: None,
      media_ref: None,
    }
  }

  async fn generate_audio(&self, skill: Skill, level: Level) -> Question {
    let prompt = self.fill(&self.prompts.audio_question_template, skill, level);
    if let Some(data) = self.request(&prompt, skill, level).await {
      if let Some([scenario, question, expected]) =
        required_strings(&data, ["audio_scenario", "question", "expected_answer"])
      {
        // The scenario stays textual; no audio is synthesized.
        return Question {
          kind: MediaKind::Audio,
          content: format!("Audio Scenario: {scenario}\n\nQuestion: {question}"),
          expected_answer: expected,
          media_description: Some(scenario),
          media_ref: None,
        };
      }
      error!(target: "assessment", %skill, %level, "Audio generation returned wrong shape; using fallback");
    }

    let (question, expected) = fallback_bank(skill, level);
    let scenario = format!(
      "Imagine you are listening to a conversation about {skill}. The speakers are discussing key aspects and challenges."
    );
    Question {
      kind: MediaKind::Audio,
      content: format!("Audio Scenario: {scenario}\n\nQuestion: {question}"),
      expected_answer: expected,
      media_description: Some(scenario),
      media_ref: None,
    }
  }

  async fn generate_image(&self, skill: Skill, level: Level) -> Question {
    let prompt = self.fill(&self.prompts.image_question_template, skill, level);
    if let Some(data) = self.request(&prompt, skill, level).await {
      if let Some([description, question, expected]) =
        required_strings(&data, ["image_description", "question", "expected_answer"])
      {
        return Question {
          kind: MediaKind::Image,
          content: format!("Look at the image and answer the following question:\n\n{question}"),
          expected_answer: expected,
          media_description: Some(description),
          media_ref: None,
        };
      }
      error!(target: "assessment", %skill, %level, "Image generation returned wrong shape; using fallback");
    }

    let (question, expected) = fallback_bank(skill, level);
    let description = format!(
      "A professional workplace scene showing people demonstrating {skill} in different ways."
    );
    Question {
      kind: MediaKind::Image,
      content: format!("Look at the image and answer: {question}"),
      expected_answer: expected,
      media_description: Some(description),
      media_ref: None,
    }
  }

  fn fill(&self, template: &str, skill: Skill, level: Level) -> String {
    fill_template(template, &[("skill", skill.name()), ("level", level.name())])
  }

  async fn request(&self, prompt: &str, skill: Skill, level: Level) -> Option<Value> {
    let client = self.client.as_ref()?;
    match client.complete(prompt, self.temperature).await {
      Ok(data) => Some(data),
      Err(e) => {
        error!(target: "assessment", %skill, %level, error = %e, "Question generation failed; using fallback");
        None
      }
    }
  }
}

/// Pull N required string fields out of a generated object. Any missing or
/// non-string field invalidates the whole response.
fn required_strings<const N: usize>(data: &Value, keys: [&str; N]) -> Option<[String; N]> {
  let mut out = [(); N].map(|_| String::new());
  for (slot, key) in out.iter_mut().zip(keys) {
    *slot = data.get(key)?.as_str()?.to_string();
  }
  Some(out)
}

/// Static question/expected-answer pairs per level, independent of skill
/// beyond name interpolation. The Intermediate arm doubles as the default for
/// labels that fail to parse upstream (`Level::from_label`).
pub fn fallback_bank(skill: Skill, level: Level) -> (String, String) {
  let skill = skill.name();
  match level {
    Level::Beginner => (
      format!(
        "Explain the core concepts of {skill} at a beginner level. What are the fundamental ideas someone new to {skill} should understand?"
      ),
      format!(
        "A good answer should cover the basic principles of {skill}, define key terminology, and explain foundational concepts without advanced jargon. The answer should be accessible to someone with no prior knowledge of {skill}."
      ),
    ),
    Level::Intermediate => (
      format!(
        "Describe the practical applications of {skill} at an intermediate level. How would you implement {skill} techniques in real-world scenarios?"
      ),
      format!(
        "A good answer should demonstrate clear understanding of {skill} concepts, explain how to apply them in practice, include examples of common use cases, and show awareness of limitations or challenges when implementing {skill}."
      ),
    ),
    Level::Advanced => (
      format!(
        "Analyze how {skill} has evolved over time and discuss current cutting-edge developments. What advanced techniques distinguish expert practitioners in this field?"
      ),
      format!(
        "A comprehensive answer should demonstrate deep knowledge of {skill}, including its historical development, current state-of-the-art techniques, ability to critically evaluate different approaches, and awareness of ongoing research or innovations in the field."
      ),
    ),
  }
}
