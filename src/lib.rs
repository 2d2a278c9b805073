//! Soft-skills assessment backend: question generation and answer evaluation
//! against a remote completion endpoint, with deterministic fallbacks so the
//! service degrades instead of failing.

pub mod telemetry;
pub mod util;
pub mod domain;
pub mod config;
pub mod json_extract;
pub mod completion;
pub mod grader;
pub mod generator;
pub mod evaluator;
pub mod transcription;
pub mod media;
pub mod session;
pub mod state;
pub mod protocol;
pub mod logic;
pub mod routes;

pub use routes::build_router;
pub use state::AppState;
