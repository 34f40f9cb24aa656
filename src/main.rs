//! Syntax Sweep · sentence-cleaning game backend
//!
//! - Axum HTTP + WebSocket API driving one learner's game
//! - Optional OpenAI integration for sentence generation and hints (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   OPENAI_API_KEY      : enables OpenAI integration if present
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_FAST_MODEL   : default "gpt-4o-mini" (hints)
//!   OPENAI_STRONG_MODEL : default "gpt-4o" (sentence generation)
//!   AGENT_CONFIG_PATH   : path to TOML config (prompts, game tuning, optional sentence bank)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod taxonomy;
mod domain;
mod history;
mod landfill;
mod game;
mod progress;
mod diagnosis;
mod ports;
mod config;
mod seeds;
mod session;
mod player;
mod state;
mod protocol;
mod logic;
mod openai;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: player, static pool, generator ports.
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "syntax_sweep", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
