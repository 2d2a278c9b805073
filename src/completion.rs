//! Client for the remote text-completion endpoint.
//!
//! The service's live model name is not reliably known in advance, so every
//! call walks an ordered candidate list: the configured primary model first,
//! then the alternates. A 404 carrying "Model not found" advances to the next
//! candidate; so does any other HTTP error, network failure, or unusable
//! response body. Only when the whole list is spent does the caller see an
//! error, and both call sites (generation and evaluation) catch that and
//! fall back to deterministic local content.
//!
//! Calls are instrumented and log model names and outcome sizes, never the
//! API key or full payloads.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::config::ApiConfig;
use crate::json_extract::extract_json_object;
use crate::util::trunc_for_log;

#[derive(Error, Debug)]
pub enum CompletionError {
  /// HTTP 404 with the service's "Model not found" marker.
  #[error("model not available: {0}")]
  ModelUnavailable(String),
  /// Any other non-success status.
  #[error("HTTP {status}: {body}")]
  Http { status: u16, body: String },
  /// Transport-level failure, including the request timeout.
  #[error("network error: {0}")]
  Network(String),
  /// A 200 response with no parseable JSON object inside.
  #[error("no JSON object found in model output")]
  Malformed,
  /// Every candidate model failed. The only variant that escapes `complete`.
  #[error("all candidate models failed")]
  Exhausted,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
  model: &'a str,
  prompt: &'a str,
  max_tokens: u32,
  temperature: f32,
}

/// Shape matchers for the success body, tried in order. The endpoint has
/// answered with several layouts over time; the last resort is stringifying
/// the whole body and letting JSON excavation dig through it.
const SHAPE_MATCHERS: &[fn(&Value) -> Option<String>] = &[shape_top_level_text, shape_choices_text];

fn shape_top_level_text(body: &Value) -> Option<String> {
  body.get("text").and_then(|t| t.as_str()).map(str::to_string)
}

fn shape_choices_text(body: &Value) -> Option<String> {
  body
    .get("choices")
    .and_then(|c| c.get(0))
    .and_then(|c| c.get("text"))
    .and_then(|t| t.as_str())
    .map(str::to_string)
}

fn response_content(body: &Value) -> String {
  for matcher in SHAPE_MATCHERS {
    if let Some(content) = matcher(body) {
      return content;
    }
  }
  body.to_string()
}

#[derive(Clone)]
pub struct CompletionClient {
  client: reqwest::Client,
  api_url: String,
  api_key: String,
  models: Vec<String>,
  max_tokens: u32,
}

impl CompletionClient {
  /// Construct the client if an API key is configured; otherwise None and
  /// the pipeline runs in fallback-only mode.
  pub fn from_config(cfg: &ApiConfig) -> Option<Self> {
    let api_key = cfg.api_key.clone()?;
    let client = reqwest::Client::builder().timeout(cfg.timeout).build().ok()?;
    Some(Self {
      client,
      api_url: cfg.api_url.clone(),
      api_key,
      models: cfg.candidate_models(),
      max_tokens: cfg.max_tokens,
    })
  }

  /// Send the prompt, walking the candidate model list until one returns a
  /// usable JSON object. There is no backoff and no same-model retry; "retry"
  /// here always means "next model name".
  #[instrument(level = "info", skip(self, prompt), fields(prompt_len = prompt.len(), temperature))]
  pub async fn complete(&self, prompt: &str, temperature: f32) -> Result<Value, CompletionError> {
    for model in &self.models {
      info!(target: "assessment", %model, "Trying model");
      match self.attempt(model, prompt, temperature).await {
        Ok(value) => {
          info!(target: "assessment", %model, "Model produced a usable JSON object");
          return Ok(value);
        }
        Err(CompletionError::ModelUnavailable(m)) => {
          warn!(target: "assessment", model = %m, "Model not found, trying next model");
        }
        Err(e) => {
          error!(target: "assessment", %model, error = %e, "Model attempt failed");
        }
      }
    }
    Err(CompletionError::Exhausted)
  }

  async fn attempt(
    &self,
    model: &str,
    prompt: &str,
    temperature: f32,
  ) -> Result<Value, CompletionError> {
    let req = CompletionRequest { model, prompt, max_tokens: self.max_tokens, temperature };

    let res = self
      .client
      .post(&self.api_url)
      .header(USER_AGENT, "skillgauge-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req)
      .send()
      .await
      .map_err(|e| CompletionError::Network(e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      if status == StatusCode::NOT_FOUND && body.contains("Model not found") {
        return Err(CompletionError::ModelUnavailable(model.to_string()));
      }
      return Err(CompletionError::Http {
        status: status.as_u16(),
        body: trunc_for_log(&body, 200),
      });
    }

    let body: Value = res.json().await.map_err(|e| CompletionError::Network(e.to_string()))?;
    let content = response_content(&body);
    extract_json_object(&content).ok_or(CompletionError::Malformed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ApiConfig;
  use mockito::Matcher;
  use serde_json::json;

  fn test_config(url: String) -> ApiConfig {
    ApiConfig {
      api_url: url,
      api_key: Some("test-key".into()),
      model: "primary".into(),
      alt_models: vec!["alternate".into()],
      ..ApiConfig::default()
    }
  }

  #[tokio::test]
  async fn falls_through_to_alternate_on_model_not_found() {
    let mut server = mockito::Server::new_async().await;

    let primary = server
      .mock("POST", "/")
      .match_body(Matcher::PartialJson(json!({"model": "primary"})))
      .with_status(404)
      .with_body("Model not found")
      .expect(1)
      .create_async()
      .await;
    let alternate = server
      .mock("POST", "/")
      .match_body(Matcher::PartialJson(json!({"model": "alternate"})))
      .with_status(200)
      .with_body(r#"{"text": "{\"question\": \"Q\", \"expected_answer\": \"A\"}"}"#)
      .expect(1)
      .create_async()
      .await;

    let client = CompletionClient::from_config(&test_config(server.url())).unwrap();
    let value = client.complete("prompt", 0.7).await.unwrap();

    assert_eq!(value["question"], json!("Q"));
    // The primary is hit exactly once and never retried after the alternate wins.
    primary.assert_async().await;
    alternate.assert_async().await;
  }

  #[tokio::test]
  async fn exhausts_when_every_model_fails() {
    let mut server = mockito::Server::new_async().await;
    let all = server
      .mock("POST", "/")
      .with_status(500)
      .with_body("boom")
      .expect(2)
      .create_async()
      .await;

    let client = CompletionClient::from_config(&test_config(server.url())).unwrap();
    let err = client.complete("prompt", 0.3).await.unwrap_err();

    assert!(matches!(err, CompletionError::Exhausted));
    all.assert_async().await;
  }

  #[tokio::test]
  async fn reads_choices_shape_and_fenced_json() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/")
      .with_status(200)
      .with_body(
        r#"{"choices": [{"text": "Sure!\n```json\n{\"is_correct\": true, \"explanation\": \"ok\"}\n```"}]}"#,
      )
      .create_async()
      .await;

    let client = CompletionClient::from_config(&test_config(server.url())).unwrap();
    let value = client.complete("prompt", 0.3).await.unwrap();
    assert_eq!(value["is_correct"], json!(true));
  }

  #[tokio::test]
  async fn unusable_body_advances_past_the_model() {
    let mut server = mockito::Server::new_async().await;
    let primary = server
      .mock("POST", "/")
      .match_body(Matcher::PartialJson(json!({"model": "primary"})))
      .with_status(200)
      .with_body(r#"{"text": "no json in this reply"}"#)
      .expect(1)
      .create_async()
      .await;
    server
      .mock("POST", "/")
      .match_body(Matcher::PartialJson(json!({"model": "alternate"})))
      .with_status(200)
      .with_body(r#"{"text": "{\"ok\": 1}"}"#)
      .create_async()
      .await;

    let client = CompletionClient::from_config(&test_config(server.url())).unwrap();
    let value = client.complete("prompt", 0.7).await.unwrap();
    assert_eq!(value["ok"], json!(1));
    primary.assert_async().await;
  }

  #[test]
  fn no_api_key_disables_the_client() {
    let cfg = ApiConfig { api_key: None, ..ApiConfig::default() };
    assert!(CompletionClient::from_config(&cfg).is_none());
  }
}
