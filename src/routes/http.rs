//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{State, Query}, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::state::AppState;
use crate::logic;

/// Map a logic-layer error message onto a status code. Unknown sessions are
/// 404; everything else (bad uploads, out-of-order submissions) is 400.
fn err_response(message: String) -> (StatusCode, String) {
  if message.starts_with("Unknown sessionId") {
    (StatusCode::NOT_FOUND, message)
  } else {
    (StatusCode::BAD_REQUEST, message)
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info")]
pub async fn http_get_catalog() -> impl IntoResponse { Json(logic::catalog()) }

#[instrument(level = "info", skip(state, body), fields(skill = %body.skill, level = %body.level))]
pub async fn http_start_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartSessionIn>,
) -> impl IntoResponse {
  let session = logic::start_session(&state, body.skill, &body.level).await;
  info!(target: "assessment", session_id = %session.session_id, "HTTP session started");
  Json(session)
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, kind = %body.kind))]
pub async fn http_next_question(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuestionIn>,
) -> Result<Json<QuestionOut>, (StatusCode, String)> {
  let question = logic::next_question(&state, &body.session_id, body.kind)
    .await
    .map_err(err_response)?;
  info!(target: "assessment", id = %body.session_id, kind = %question.kind, "HTTP question served");
  Ok(Json(question))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, answer_kind = %body.answer_kind, answer_len = body.answer.len()))]
pub async fn http_submit_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<EvaluationOut>, (StatusCode, String)> {
  let evaluation = logic::submit_answer(
    &state,
    &body.session_id,
    &body.answer,
    body.answer_kind,
    body.media_base64.as_deref(),
    body.media_ext.as_deref(),
  )
  .await
  .map_err(err_response)?;
  info!(target: "assessment", id = %body.session_id, is_correct = evaluation.is_correct, "HTTP answer evaluated");
  Ok(Json(evaluation))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_finish_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<FinishIn>,
) -> Result<Json<FinishOut>, (StatusCode, String)> {
  let out = logic::finish_session(&state, &body.session_id).await.map_err(err_response)?;
  info!(target: "assessment", id = %out.session_id, score = out.score, "HTTP session finished");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_history(
  State(state): State<Arc<AppState>>,
  Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
  Json(logic::history(&state, q.limit).await)
}
