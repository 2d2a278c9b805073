//! Explicit session registry.
//!
//! A session aggregates one (skill, level) pair with the ordered questions
//! asked and the evaluations produced, then gets finalized into an integer
//! score. The registry is an owned object with create/get/record/finish
//! operations rather than a process-global map, and it has a defined expiry
//! policy: any session untouched for longer than the TTL is evicted during
//! the sweep that runs on each `start`, so an abandoned browser tab cannot
//! grow the map forever.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Evaluation, Level, Question, Skill};

#[derive(Clone, Debug, Serialize)]
pub struct Session {
  pub id: String,
  pub skill: Skill,
  pub level: Level,
  pub started_at: DateTime<Utc>,
  pub ended_at: Option<DateTime<Utc>>,
  pub questions: Vec<Question>,
  pub evaluations: Vec<Evaluation>,
  /// Percent of correct evaluations; present only after `finish`.
  pub score: Option<i32>,
  #[serde(skip)]
  last_activity: DateTime<Utc>,
}

impl Session {
  /// The question currently awaiting an answer, if any.
  pub fn open_question(&self) -> Option<&Question> {
    if self.questions.len() > self.evaluations.len() { self.questions.last() } else { None }
  }
}

/// Compact row for the assessment-history view.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
  pub id: String,
  pub skill: Skill,
  pub level: Level,
  pub started_at: DateTime<Utc>,
  pub ended_at: Option<DateTime<Utc>>,
  pub questions_asked: usize,
  pub score: Option<i32>,
}

#[derive(Clone)]
pub struct SessionStore {
  sessions: Arc<RwLock<HashMap<String, Session>>>,
  ttl: chrono::Duration,
}

impl SessionStore {
  pub fn new(ttl: Duration) -> Self {
    Self {
      sessions: Arc::new(RwLock::new(HashMap::new())),
      ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(1)),
    }
  }

  /// Create a session and return a snapshot of it. Also sweeps expired
  /// sessions so the registry stays bounded.
  #[instrument(level = "info", skip(self), fields(%skill, %level))]
  pub async fn start(&self, skill: Skill, level: Level) -> Session {
    let now = Utc::now();
    let session = Session {
      id: Uuid::new_v4().to_string(),
      skill,
      level,
      started_at: now,
      ended_at: None,
      questions: Vec::new(),
      evaluations: Vec::new(),
      score: None,
      last_activity: now,
    };

    let mut sessions = self.sessions.write().await;
    let cutoff = now - self.ttl;
    let before = sessions.len();
    sessions.retain(|_, s| s.last_activity > cutoff);
    let evicted = before - sessions.len();
    if evicted > 0 {
      warn!(target: "assessment", evicted, "Evicted expired sessions");
    }

    sessions.insert(session.id.clone(), session.clone());
    info!(target: "assessment", id = %session.id, "Assessment session started");
    session
  }

  pub async fn get(&self, id: &str) -> Option<Session> {
    self.sessions.read().await.get(id).cloned()
  }

  /// Append a question to the session. Returns false for unknown ids.
  #[instrument(level = "debug", skip(self, question), fields(%id))]
  pub async fn record_question(&self, id: &str, question: Question) -> bool {
    let mut sessions = self.sessions.write().await;
    match sessions.get_mut(id) {
      Some(s) => {
        s.questions.push(question);
        s.last_activity = Utc::now();
        true
      }
      None => false,
    }
  }

  /// Append an evaluation, closing the current question's cycle.
  #[instrument(level = "debug", skip(self, evaluation), fields(%id))]
  pub async fn record_evaluation(&self, id: &str, evaluation: Evaluation) -> bool {
    let mut sessions = self.sessions.write().await;
    match sessions.get_mut(id) {
      Some(s) => {
        if s.evaluations.len() >= s.questions.len() {
          warn!(target: "assessment", %id, "Evaluation recorded without an open question");
        }
        s.evaluations.push(evaluation);
        s.last_activity = Utc::now();
        true
      }
      None => false,
    }
  }

  /// Finalize the session: set the end time and compute the score as the
  /// rounded percentage of correct evaluations (0 when nothing was answered).
  /// Finishing twice keeps the first result.
  #[instrument(level = "info", skip(self), fields(%id))]
  pub async fn finish(&self, id: &str) -> Option<i32> {
    let mut sessions = self.sessions.write().await;
    let s = sessions.get_mut(id)?;
    if let Some(score) = s.score {
      return Some(score);
    }
    let score = compute_score(&s.evaluations);
    s.score = Some(score);
    s.ended_at = Some(Utc::now());
    s.last_activity = Utc::now();
    info!(target: "assessment", %id, score, answered = s.evaluations.len(), "Assessment session finished");
    Some(score)
  }

  /// Most recently started finalized sessions, newest first.
  pub async fn recent(&self, limit: usize) -> Vec<SessionSummary> {
    let sessions = self.sessions.read().await;
    let mut finished: Vec<&Session> = sessions.values().filter(|s| s.score.is_some()).collect();
    finished.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    finished
      .into_iter()
      .take(limit)
      .map(|s| SessionSummary {
        id: s.id.clone(),
        skill: s.skill,
        level: s.level,
        started_at: s.started_at,
        ended_at: s.ended_at,
        questions_asked: s.questions.len(),
        score: s.score,
      })
      .collect()
  }
}

fn compute_score(evaluations: &[Evaluation]) -> i32 {
  if evaluations.is_empty() {
    return 0;
  }
  let correct = evaluations.iter().filter(|e| e.is_correct).count();
  ((correct as f64 / evaluations.len() as f64) * 100.0).round() as i32
}
