//! Answer evaluation: normalize question and answer into text, grade through
//! the completion endpoint, and fall back to the keyword-overlap grader.
//!
//! `evaluate` never fails outward. The worst case is a degraded verdict with
//! an explanation saying so.

use serde_json::Value;
use tracing::{error, instrument, warn};

use crate::completion::CompletionClient;
use crate::config::Prompts;
use crate::domain::{Evaluation, Level, MediaKind, Skill};
use crate::grader;
use crate::media::MediaStore;
use crate::transcription::{placeholder_transcript, AudioTranscriber, ImageCaptioner};
use crate::util::fill_template;

/// Everything the evaluator needs to judge one answer.
pub struct EvaluationInput<'a> {
  pub question: &'a str,
  pub expected_answer: &'a str,
  pub answer: &'a str,
  pub skill: Skill,
  pub level: Level,
  pub question_kind: MediaKind,
  pub answer_kind: MediaKind,
  /// Storage reference of the question's media, when it has any.
  pub question_media: Option<&'a str>,
  /// Storage reference of the learner's uploaded media answer.
  pub answer_media: Option<&'a str>,
}

#[derive(Clone)]
pub struct AnswerEvaluator {
  client: Option<CompletionClient>,
  transcriber: Option<AudioTranscriber>,
  captioner: ImageCaptioner,
  media: MediaStore,
  prompts: Prompts,
  temperature: f32,
  heuristic_fallback: bool,
}

impl AnswerEvaluator {
  pub fn new(
    client: Option<CompletionClient>,
    transcriber: Option<AudioTranscriber>,
    media: MediaStore,
    prompts: Prompts,
    temperature: f32,
    heuristic_fallback: bool,
  ) -> Self {
    Self {
      client,
      transcriber,
      captioner: ImageCaptioner,
      media,
      prompts,
      temperature,
      heuristic_fallback,
    }
  }

  /// Evaluate one answer. Both result fields are always populated.
  #[instrument(level = "info", skip(self, input), fields(%input.skill, %input.level, question_kind = %input.question_kind, answer_kind = %input.answer_kind))]
  pub async fn evaluate(&self, input: EvaluationInput<'_>) -> Evaluation {
    let question = self.normalize_question(&input).await;
    let answer = self.normalize_answer(&input).await;

    if let Some(client) = &self.client {
      let prompt = self.evaluation_prompt(&input, &question, &answer);
      match client.complete(&prompt, self.temperature).await {
        Ok(verdict) => {
          if let Some(eval) = parse_verdict(&verdict) {
            return eval;
          }
          warn!(target: "assessment", "Evaluation response missing verdict fields; falling back");
        }
        Err(e) => {
          error!(target: "assessment", error = %e, "Remote evaluation failed; falling back");
        }
      }
    }

    self.fallback(input.expected_answer, &answer)
  }

  /// Question side: only audio gets a textual supplement. Image questions
  /// pass through; their content already tells the learner what to look at.
  async fn normalize_question(&self, input: &EvaluationInput<'_>) -> String {
    match (input.question_kind, input.question_media) {
      (MediaKind::Audio, Some(reference)) => {
        let transcript = self.transcript(reference).await;
        format!("{}\n\nAudio Transcript: {transcript}", input.question)
      }
      _ => input.question.to_string(),
    }
  }

  /// Answer side: media answers are replaced by their textual surrogate; a
  /// fully empty submission becomes an explicit placeholder.
  async fn normalize_answer(&self, input: &EvaluationInput<'_>) -> String {
    match (input.answer_kind, input.answer_media) {
      (MediaKind::Audio, Some(reference)) => {
        let transcript = self.transcript(reference).await;
        format!("Audio Answer Transcript: {transcript}")
      }
      (MediaKind::Image, Some(reference)) => {
        let caption = self.captioner.caption(&self.media.resolve(reference)).await;
        format!("Image Answer Description: {caption}")
      }
      _ => {
        if input.answer.trim().is_empty() {
          "No answer provided".to_string()
        } else {
          input.answer.to_string()
        }
      }
    }
  }

  async fn transcript(&self, reference: &str) -> String {
    match &self.transcriber {
      Some(t) => t.transcribe(&self.media.resolve(reference)).await,
      None => placeholder_transcript(),
    }
  }

  fn evaluation_prompt(
    &self,
    input: &EvaluationInput<'_>,
    question: &str,
    answer: &str,
  ) -> String {
    fill_template(
      &self.prompts.evaluation_template,
      &[
        ("skill", input.skill.name()),
        ("level", input.level.name()),
        ("question_kind", input.question_kind.name()),
        ("answer_kind", input.answer_kind.name()),
        ("question", question),
        ("expected_answer", input.expected_answer),
        ("student_answer", answer),
      ],
    )
  }

  fn fallback(&self, expected_answer: &str, answer: &str) -> Evaluation {
    if self.heuristic_fallback {
      grader::grade(expected_answer, answer)
    } else {
      Evaluation {
        is_correct: false,
        explanation: "Automatic evaluation was unavailable for this answer. Please review it manually."
          .to_string(),
      }
    }
  }
}

/// Accept `{"is_correct": ..., "explanation": ...}` with the bool possibly
/// spelled as a string ("true"/"false", any case). Anything else is treated
/// as a malformed verdict.
fn parse_verdict(value: &Value) -> Option<Evaluation> {
  let explanation = value.get("explanation")?.as_str()?.to_string();
  let is_correct = match value.get("is_correct")? {
    Value::Bool(b) => *b,
    Value::String(s) => s.eq_ignore_ascii_case("true"),
    _ => return None,
  };
  Some(Evaluation { is_correct, explanation })
}
