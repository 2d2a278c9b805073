//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::logic;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "skillgauge_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "skillgauge_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target = "skillgauge_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "skillgauge_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "skillgauge_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartSession { skill, level } => {
      let session = logic::start_session(state, skill, &level).await;
      tracing::info!(target: "assessment", id = %session.session_id, "WS session started");
      ServerWsMessage::SessionStarted { session }
    }

    ClientWsMessage::NextQuestion { session_id, kind } => {
      match logic::next_question(state, &session_id, kind).await {
        Ok(question) => {
          tracing::info!(target: "assessment", id = %session_id, %kind, "WS question served");
          ServerWsMessage::Question { question }
        }
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::SubmitAnswer { session_id, answer, answer_kind, media_base64, media_ext } => {
      match logic::submit_answer(
        state,
        &session_id,
        &answer,
        answer_kind,
        media_base64.as_deref(),
        media_ext.as_deref(),
      )
      .await
      {
        Ok(evaluation) => {
          tracing::info!(target: "assessment", id = %session_id, is_correct = evaluation.is_correct, "WS answer evaluated");
          ServerWsMessage::AnswerResult {
            is_correct: evaluation.is_correct,
            explanation: evaluation.explanation,
          }
        }
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::FinishSession { session_id } => {
      match logic::finish_session(state, &session_id).await {
        Ok(out) => {
          tracing::info!(target: "assessment", id = %out.session_id, score = out.score, "WS session finished");
          ServerWsMessage::SessionFinished { session_id: out.session_id, score: out.score }
        }
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::History { limit } => {
      ServerWsMessage::History { sessions: logic::history(state, limit).await }
    }
  }
}
