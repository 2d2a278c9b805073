//! Application state: configuration, the optional completion client, the
//! generation/evaluation pipeline, media storage, and the session registry.
//!
//! When no API key is configured the remote client is absent and the whole
//! pipeline runs on its deterministic fallbacks, so the service stays usable
//! offline.

use std::io;

use tracing::{info, instrument};

use crate::completion::CompletionClient;
use crate::config::{load_assessment_config_from_env, ApiConfig, Prompts};
use crate::evaluator::AnswerEvaluator;
use crate::generator::QuestionGenerator;
use crate::media::MediaStore;
use crate::session::SessionStore;
use crate::transcription::AudioTranscriber;

#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub generator: QuestionGenerator,
    pub evaluator: AnswerEvaluator,
    pub sessions: SessionStore,
    pub media: MediaStore,
}

impl AppState {
    /// Build state from the environment: API config, optional TOML prompt
    /// overrides, media store, and the pipeline components.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> io::Result<Self> {
        let config = ApiConfig::from_env();
        let prompts = load_assessment_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();
        Self::build(config, prompts)
    }

    /// Assemble state from explicit parts. Tests use this to point the
    /// pipeline at stub servers and temp directories.
    pub fn build(config: ApiConfig, prompts: Prompts) -> io::Result<Self> {
        let media = MediaStore::open(&config.upload_dir)?;

        let client = CompletionClient::from_config(&config);
        match &client {
            Some(_) => {
                info!(target: "skillgauge_backend", api_url = %config.api_url, model = %config.model, alternates = config.alt_models.len(), "Completion client enabled");
            }
            None => {
                info!(target: "skillgauge_backend", "Completion client disabled (no COMPLETION_API_KEY). Using fallback generation and grading.");
            }
        }

        let transcriber = AudioTranscriber::from_config(&config);
        let generator = QuestionGenerator::new(
            client.clone(),
            prompts.clone(),
            config.generation_temperature,
        );
        let evaluator = AnswerEvaluator::new(
            client,
            transcriber,
            media.clone(),
            prompts,
            config.evaluation_temperature,
            config.heuristic_fallback,
        );
        let sessions = SessionStore::new(config.session_ttl);

        Ok(Self { config, generator, evaluator, sessions, media })
    }
}
