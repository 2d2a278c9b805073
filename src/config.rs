//! Configuration: completion-API settings from the environment plus prompt
//! templates, optionally overridden from a TOML file.
//!
//! See `ApiConfig` for the env variables and `Prompts` for the TOML schema.

use serde::Deserialize;
use std::time::Duration;
use tracing::{info, error};

/// Completion-endpoint settings, read once at startup.
#[derive(Clone, Debug)]
pub struct ApiConfig {
  pub api_url: String,
  /// Absent key disables the remote client entirely (fallback-only mode).
  pub api_key: Option<String>,
  /// Primary model id, tried first on every call.
  pub model: String,
  /// Alternates tried in order when a model is rejected or errors.
  pub alt_models: Vec<String>,
  pub timeout: Duration,
  pub max_tokens: u32,
  pub generation_temperature: f32,
  pub evaluation_temperature: f32,
  /// When false, a dead API yields a degraded verdict instead of the
  /// keyword-overlap grader.
  pub heuristic_fallback: bool,
  pub transcribe_model: String,
  pub upload_dir: String,
  pub session_ttl: Duration,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      api_url: "https://api.sambanova.ai/v1/completions".into(),
      api_key: None,
      model: "sambanova-llm".into(),
      alt_models: vec![
        "sambanova-chat".into(),
        "sambanova-1.5-chat".into(),
        "llama-7b".into(),
        "llama2-7b".into(),
      ],
      timeout: Duration::from_secs(30),
      max_tokens: 512,
      generation_temperature: 0.7,
      evaluation_temperature: 0.3,
      heuristic_fallback: true,
      transcribe_model: "sambanova-audio".into(),
      upload_dir: "uploads".into(),
      session_ttl: Duration::from_secs(3600),
    }
  }
}

impl ApiConfig {
  /// Read settings from the environment, falling back to defaults per field.
  pub fn from_env() -> Self {
    let d = ApiConfig::default();
    Self {
      api_url: std::env::var("COMPLETION_API_URL").unwrap_or(d.api_url),
      api_key: std::env::var("COMPLETION_API_KEY").ok().filter(|k| !k.is_empty()),
      model: std::env::var("COMPLETION_MODEL").unwrap_or(d.model),
      alt_models: std::env::var("COMPLETION_ALT_MODELS")
        .map(|s| {
          s.split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect()
        })
        .unwrap_or(d.alt_models),
      timeout: std::env::var("COMPLETION_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(d.timeout),
      max_tokens: std::env::var("COMPLETION_MAX_TOKENS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(d.max_tokens),
      generation_temperature: std::env::var("GENERATION_TEMPERATURE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(d.generation_temperature),
      evaluation_temperature: std::env::var("EVALUATION_TEMPERATURE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(d.evaluation_temperature),
      heuristic_fallback: std::env::var("HEURISTIC_FALLBACK")
        .map(|s| !matches!(s.trim(), "0" | "false" | "off"))
        .unwrap_or(d.heuristic_fallback),
      transcribe_model: std::env::var("TRANSCRIBE_MODEL").unwrap_or(d.transcribe_model),
      upload_dir: std::env::var("UPLOAD_DIR").unwrap_or(d.upload_dir),
      session_ttl: std::env::var("SESSION_TTL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(d.session_ttl),
    }
  }

  /// Candidate models in trial order: primary first, then alternates.
  pub fn candidate_models(&self) -> Vec<String> {
    let mut all = Vec::with_capacity(1 + self.alt_models.len());
    all.push(self.model.clone());
    all.extend(self.alt_models.iter().cloned());
    all
  }
}

/// Wrapper for the optional TOML config file.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct AssessmentConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompt templates sent to the completion endpoint. Placeholders are filled
/// with `util::fill_template`. Override them in TOML to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub text_question_template: String,
  pub audio_question_template: String,
  pub image_question_template: String,
  pub evaluation_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      text_question_template: "As an expert educator, create a single assessment question to evaluate a student's knowledge of {skill} at a {level} level.\n\nThe question should:\n1. Be clear and direct\n2. Be appropriate for the {level} level\n3. Focus specifically on {skill}\n4. Be answerable in 1-3 paragraphs\n\nProvide your response in this exact JSON format:\n{\"question\": \"The complete question text\", \"expected_answer\": \"Key points that should be included in a correct answer\"}\n\nThe JSON must be valid. No markdown formatting. No additional text before or after the JSON.".into(),
      audio_question_template: "Create a realistic audio scenario to assess {skill} at a {level} level.\n\nThe scenario should:\n1. Be a situation that would be presented as an audio recording\n2. Require the student to demonstrate their {skill} skills at a {level} level\n3. Be specific and detailed enough for clear assessment\n\nProvide your response in this exact JSON format:\n{\"audio_scenario\": \"Detailed description of what the audio would contain\", \"question\": \"The specific question to ask the student after they hear the audio\", \"expected_answer\": \"Key points that should be included in a correct answer\"}".into(),
      image_question_template: "Create a detailed description of an image that could be used to assess {skill} at a {level} level.\n\nThe image description should:\n1. Be clear and visualizable\n2. Relate directly to {skill}\n3. Present a scenario appropriate for {level} assessment\n\nProvide your response in this exact JSON format:\n{\"image_description\": \"Detailed description of what the image would show\", \"question\": \"The specific question to ask the student about the image\", \"expected_answer\": \"Key points that should be included in a correct answer\"}".into(),
      evaluation_template: "You are an expert educator evaluating student responses for soft skills assessment.\n\nAssessment Context:\n- Skill being assessed: {skill}\n- Level: {level}\n- Question Type: {question_kind}\n- Answer Type: {answer_kind}\n\nQuestion: {question}\n\nExpected key points in the answer: {expected_answer}\n\nStudent's answer: {student_answer}\n\nYour task:\n1. Compare the student's answer to the expected key points\n2. Determine if the student demonstrated sufficient understanding of {skill} at a {level} level\n3. Provide a brief explanation justifying your assessment\n4. Consider the format of both question and answer in your evaluation\n\nReturn ONLY this exact JSON format with no additional text:\n{\"is_correct\": true or false, \"explanation\": \"Brief explanation of the assessment\"}".into(),
    }
  }
}

/// Attempt to load `AssessmentConfig` from ASSESSMENT_CONFIG_PATH.
/// On any parsing/IO error, returns None.
pub fn load_assessment_config_from_env() -> Option<AssessmentConfig> {
  let path = std::env::var("ASSESSMENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AssessmentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "skillgauge_backend", %path, "Loaded assessment config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "skillgauge_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "skillgauge_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
