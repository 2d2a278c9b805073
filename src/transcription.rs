//! Media-to-text collaborators: audio transcription and image captioning.
//!
//! Both are no-throw by contract. The evaluation pipeline only ever sees a
//! string; every internal failure collapses into a placeholder so media
//! problems can never become a distinct failure mode upstream.

use std::path::Path;

use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::multipart::{Form, Part};
use tracing::{error, info, instrument, warn};

use crate::config::ApiConfig;

/// Returned when the transcription endpoint declined the audio.
const FALLBACK_TRANSCRIPT: &str =
  "This is a fallback transcription. The transcription service could not process this audio.";
/// Returned when the audio could not even be read or sent.
const UNREADABLE_TRANSCRIPT: &str = "Unable to transcribe audio content.";

/// Transcribes stored audio via the completion service's transcription
/// endpoint (a sibling of the completions URL).
#[derive(Clone)]
pub struct AudioTranscriber {
  client: reqwest::Client,
  url: String,
  api_key: String,
  model: String,
}

impl AudioTranscriber {
  /// Construct if an API key is configured; otherwise None and callers use
  /// placeholder transcripts.
  pub fn from_config(cfg: &ApiConfig) -> Option<Self> {
    let api_key = cfg.api_key.clone()?;
    let client = reqwest::Client::builder().timeout(cfg.timeout).build().ok()?;
    Some(Self {
      client,
      url: transcription_url(&cfg.api_url),
      api_key,
      model: cfg.transcribe_model.clone(),
    })
  }

  /// Transcribe the audio file at `path`. Never fails; degraded results are
  /// placeholder strings.
  #[instrument(level = "info", skip(self), fields(model = %self.model))]
  pub async fn transcribe(&self, path: &Path) -> String {
    let bytes = match tokio::fs::read(path).await {
      Ok(b) => b,
      Err(e) => {
        error!(target: "assessment", error = %e, ?path, "Could not read audio for transcription");
        return UNREADABLE_TRANSCRIPT.to_string();
      }
    };
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "answer.wav".into());

    let form = Form::new()
      .text("model", self.model.clone())
      .part("file", Part::bytes(bytes).file_name(file_name));

    let res = self
      .client
      .post(&self.url)
      .header(USER_AGENT, "skillgauge-backend/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .multipart(form)
      .send()
      .await;

    match res {
      Ok(res) if res.status().is_success() => {
        let text = res
          .json::<serde_json::Value>()
          .await
          .ok()
          .and_then(|v| v.get("text").and_then(|t| t.as_str()).map(str::to_string))
          .unwrap_or_default();
        if text.is_empty() {
          warn!(target: "assessment", "Transcription response carried no text");
          FALLBACK_TRANSCRIPT.to_string()
        } else {
          info!(target: "assessment", transcript_len = text.len(), "Audio transcribed");
          text
        }
      }
      Ok(res) => {
        warn!(target: "assessment", status = %res.status(), "Transcription endpoint declined the audio");
        FALLBACK_TRANSCRIPT.to_string()
      }
      Err(e) => {
        error!(target: "assessment", error = %e, "Transcription request failed");
        UNREADABLE_TRANSCRIPT.to_string()
      }
    }
  }
}

/// Placeholder transcript used when no transcriber is configured at all.
pub fn placeholder_transcript() -> String {
  UNREADABLE_TRANSCRIPT.to_string()
}

/// Derive the transcription endpoint from the completions URL.
fn transcription_url(api_url: &str) -> String {
  let base = api_url.trim_end_matches('/').trim_end_matches("/completions");
  format!("{base}/audio/transcriptions")
}

/// Produces a textual description of an image answer. No remote vision model
/// is wired up; the description is a canned surrogate with the same no-throw
/// contract, so the evaluator's answer-side handling stays uniform.
#[derive(Clone, Default)]
pub struct ImageCaptioner;

impl ImageCaptioner {
  #[instrument(level = "info", skip(self))]
  pub async fn caption(&self, path: &Path) -> String {
    match tokio::fs::metadata(path).await {
      Ok(_) => {
        "An image showing a person demonstrating soft skills in a professional environment."
          .to_string()
      }
      Err(e) => {
        error!(target: "assessment", error = %e, ?path, "Could not read image for captioning");
        "Unable to generate image description.".to_string()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn transcription_url_is_a_sibling_of_completions() {
    assert_eq!(
      transcription_url("https://api.example.com/v1/completions"),
      "https://api.example.com/v1/audio/transcriptions"
    );
    assert_eq!(
      transcription_url("https://api.example.com/v1/completions/"),
      "https://api.example.com/v1/audio/transcriptions"
    );
  }

  #[tokio::test]
  async fn transcribe_missing_file_yields_placeholder() {
    let cfg = ApiConfig { api_key: Some("k".into()), ..ApiConfig::default() };
    let t = AudioTranscriber::from_config(&cfg).unwrap();
    let out = t.transcribe(Path::new("/nonexistent/answer.wav")).await;
    assert_eq!(out, "Unable to transcribe audio content.");
  }

  #[tokio::test]
  async fn caption_missing_file_yields_placeholder() {
    let out = ImageCaptioner.caption(Path::new("/nonexistent/answer.png")).await;
    assert_eq!(out, "Unable to generate image description.");
  }

  #[tokio::test]
  async fn transcribe_uses_endpoint_response() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/audio/transcriptions")
      .with_status(200)
      .with_body(r#"{"text": "I would stay calm and listen."}"#)
      .create_async()
      .await;

    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"fake-wav-bytes").unwrap();

    let cfg = ApiConfig {
      api_url: format!("{}/completions", server.url()),
      api_key: Some("k".into()),
      ..ApiConfig::default()
    };
    let t = AudioTranscriber::from_config(&cfg).unwrap();
    assert_eq!(t.transcribe(file.path()).await, "I would stay calm and listen.");
  }
}
