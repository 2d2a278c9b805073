//! Skillgauge · Soft-Skills Assessment Backend
//!
//! - Axum HTTP + WebSocket API
//! - Optional remote completion endpoint (via environment variables)
//! - Deterministic fallbacks when the endpoint is unreachable
//!
//! Important env variables:
//!   PORT                   : u16 (default 3000)
//!   COMPLETION_API_KEY     : enables the remote completion client if present
//!   COMPLETION_API_URL     : default "https://api.sambanova.ai/v1/completions"
//!   COMPLETION_MODEL       : primary model id
//!   COMPLETION_ALT_MODELS  : comma-separated alternates tried in order
//!   ASSESSMENT_CONFIG_PATH : path to TOML config (prompt template overrides)
//!   UPLOAD_DIR             : media storage root (default "uploads")
//!   LOG_LEVEL              : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT             : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use skillgauge_backend::routes::build_router;
use skillgauge_backend::state::AppState;
use skillgauge_backend::telemetry;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (pipeline, media store, session registry).
  let state = Arc::new(AppState::new()?);

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "skillgauge_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
