//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Starting/finishing assessment sessions
//!   - Generating the next question (and rendering image placeholders)
//!   - Accepting answers (text or base64 media) and evaluating them
//!   - Serving the assessment history
//!
//! Pipeline failures never surface here; the only errors callers see are
//! unknown session ids, out-of-order submissions, and undecodable uploads.

use tracing::{error, instrument};

use crate::domain::{Level, MediaKind, Skill};
use crate::evaluator::EvaluationInput;
use crate::media::StoredKind;
use crate::protocol::{
  CatalogEntry, CatalogOut, EvaluationOut, FinishOut, QuestionOut, SessionOut,
};
use crate::session::SessionSummary;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 10;

#[instrument(level = "info", skip(state), fields(%skill, level = %level_label))]
pub async fn start_session(state: &AppState, skill: Skill, level_label: &str) -> SessionOut {
  let level = Level::from_label(level_label);
  let session = state.sessions.start(skill, level).await;
  SessionOut {
    session_id: session.id,
    skill: session.skill,
    level: session.level,
    started_at: session.started_at,
  }
}

#[instrument(level = "info", skip(state), fields(%session_id, %kind))]
pub async fn next_question(
  state: &AppState,
  session_id: &str,
  kind: MediaKind,
) -> Result<QuestionOut, String> {
  let session = state
    .sessions
    .get(session_id)
    .await
    .ok_or_else(|| format!("Unknown sessionId: {session_id}"))?;

  let mut question = state.generator.generate(session.skill, session.level, kind).await;

  // Image questions get a rendered stand-in illustration; losing the render
  // only loses the media reference, never the question.
  if kind == MediaKind::Image {
    if let Some(description) = question.media_description.clone() {
      match state
        .media
        .render_placeholder_image(&description, session.skill, session.level)
        .await
      {
        Ok(reference) => question.media_ref = Some(reference),
        Err(e) => {
          error!(target: "assessment", %session_id, error = %e, "Placeholder image rendering failed");
        }
      }
    }
  }

  if !state.sessions.record_question(session_id, question.clone()).await {
    return Err(format!("Unknown sessionId: {session_id}"));
  }
  Ok(crate::protocol::to_out(&question))
}

#[instrument(level = "info", skip(state, answer, media_base64), fields(%session_id, %answer_kind, answer_len = answer.len(), has_media = media_base64.is_some()))]
pub async fn submit_answer(
  state: &AppState,
  session_id: &str,
  answer: &str,
  answer_kind: MediaKind,
  media_base64: Option<&str>,
  media_ext: Option<&str>,
) -> Result<EvaluationOut, String> {
  let session = state
    .sessions
    .get(session_id)
    .await
    .ok_or_else(|| format!("Unknown sessionId: {session_id}"))?;
  let question = session
    .open_question()
    .ok_or_else(|| format!("No open question for session {session_id}"))?
    .clone();

  let answer_media = match (answer_kind, media_base64) {
    (MediaKind::Audio | MediaKind::Image, Some(payload)) => {
      let bytes = crate::media::MediaStore::decode_base64(payload)
        .map_err(|_| "Could not decode media payload".to_string())?;
      let stored_kind =
        if answer_kind == MediaKind::Audio { StoredKind::Audio } else { StoredKind::Image };
      let reference = state
        .media
        .save(stored_kind, &bytes, media_ext)
        .await
        .map_err(|e| format!("Could not store media upload: {e}"))?;
      Some(reference)
    }
    _ => None,
  };

  let evaluation = state
    .evaluator
    .evaluate(EvaluationInput {
      question: &question.content,
      expected_answer: &question.expected_answer,
      answer,
      skill: session.skill,
      level: session.level,
      question_kind: question.kind,
      answer_kind,
      question_media: question.media_ref.as_deref(),
      answer_media: answer_media.as_deref(),
    })
    .await;

  if !state.sessions.record_evaluation(session_id, evaluation.clone()).await {
    return Err(format!("Unknown sessionId: {session_id}"));
  }
  Ok(EvaluationOut { is_correct: evaluation.is_correct, explanation: evaluation.explanation })
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn finish_session(state: &AppState, session_id: &str) -> Result<FinishOut, String> {
  match state.sessions.finish(session_id).await {
    Some(score) => Ok(FinishOut { session_id: session_id.to_string(), score }),
    None => Err(format!("Unknown sessionId: {session_id}")),
  }
}

pub async fn history(state: &AppState, limit: Option<usize>) -> Vec<SessionSummary> {
  state.sessions.recent(limit.unwrap_or(DEFAULT_HISTORY_LIMIT)).await
}

/// The fixed skill/level/kind catalog, with serde ids alongside display names.
pub fn catalog() -> CatalogOut {
  fn entry<T: serde::Serialize>(id: &T, name: &str) -> CatalogEntry {
    CatalogEntry { id: serde_json::to_value(id).unwrap_or_default(), name: name.to_string() }
  }
  CatalogOut {
    skills: Skill::ALL.iter().map(|s| entry(s, s.name())).collect(),
    levels: Level::ALL.iter().map(|l| entry(l, l.name())).collect(),
    question_kinds: [MediaKind::Text, MediaKind::Audio, MediaKind::Image]
      .iter()
      .map(|k| entry(k, k.name()))
      .collect(),
  }
}
