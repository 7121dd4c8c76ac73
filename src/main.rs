//! codetandem · Progress & Gating Engine server
//!
//! - Axum HTTP API over the learner's project documents
//! - Optional OpenAI review/hint/solution capability (via environment variables)
//!
//! Important env variables:
//!   PORT                   : u16 (default 3000)
//!   CODETANDEM_PROJECT_DIR : learner project root (default ".")
//!   CODETANDEM_CONFIG_PATH : path to TOML config (prompts, gating, paths)
//!   OPENAI_API_KEY         : enables OpenAI integration if present
//!   OPENAI_BASE_URL        : default "https://api.openai.com/v1"
//!   OPENAI_FAST_MODEL      : default "gpt-4o-mini" (hints)
//!   OPENAI_STRONG_MODEL    : default "gpt-4o" (reviews, solutions)
//!   LOG_LEVEL              : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT             : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use codetandem::routes::build_router;
use codetandem::state::AppState;
use codetandem::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let state = Arc::new(AppState::new());
  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "codetandem", %addr, project_dir = %state.paths.project_dir.display(), "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "codetandem", error = %e, "Failed to listen for shutdown signal");
    return;
  }
  info!(target: "codetandem", "Shutdown signal received");
}
