//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Level, MediaKind, Question, Skill};
use crate::session::SessionSummary;

fn default_kind() -> MediaKind {
    MediaKind::Text
}

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartSession {
        skill: Skill,
        /// Free-form label; unknown values resolve to Intermediate.
        level: String,
    },
    NextQuestion {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(default = "default_kind")]
        kind: MediaKind,
    },
    SubmitAnswer {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(default)]
        answer: String,
        #[serde(default = "default_kind")]
        answer_kind: MediaKind,
        /// Base64 payload for audio/image answers.
        #[serde(rename = "mediaBase64")]
        #[serde(default)]
        media_base64: Option<String>,
        #[serde(rename = "mediaExt")]
        #[serde(default)]
        media_ext: Option<String>,
    },
    FinishSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    History {
        #[serde(default)]
        limit: Option<usize>,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    SessionStarted {
        session: SessionOut,
    },
    Question {
        question: QuestionOut,
    },
    AnswerResult {
        is_correct: bool,
        explanation: String,
    },
    SessionFinished {
        #[serde(rename = "sessionId")]
        session_id: String,
        score: i32,
    },
    History {
        sessions: Vec<SessionSummary>,
    },
    Error {
        message: String,
    },
}

/// DTO used by both WS and HTTP for question delivery.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub kind: MediaKind,
    pub content: String,
    /// Shown to proctors; a learner-facing frontend hides this field.
    pub expected_answer: String,
    pub media_description: Option<String>,
    pub media_ref: Option<String>,
}

/// Convert the internal `Question` to the public DTO.
pub fn to_out(q: &Question) -> QuestionOut {
    QuestionOut {
        kind: q.kind,
        content: q.content.clone(),
        expected_answer: q.expected_answer.clone(),
        media_description: q.media_description.clone(),
        media_ref: q.media_ref.clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct StartSessionIn {
    pub skill: Skill,
    /// Free-form label; unknown values resolve to Intermediate.
    pub level: String,
}

#[derive(Debug, Serialize)]
pub struct SessionOut {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub skill: Skill,
    pub level: Level,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default = "default_kind")]
    pub kind: MediaKind,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default = "default_kind")]
    pub answer_kind: MediaKind,
    #[serde(rename = "mediaBase64")]
    #[serde(default)]
    pub media_base64: Option<String>,
    #[serde(rename = "mediaExt")]
    #[serde(default)]
    pub media_ext: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EvaluationOut {
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
pub struct FinishIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct FinishOut {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub score: i32,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Catalog entry: machine id (serde form) plus display name.
#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub id: serde_json::Value,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogOut {
    pub skills: Vec<CatalogEntry>,
    pub levels: Vec<CatalogEntry>,
    pub question_kinds: Vec<CatalogEntry>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
