//! Interview Prep · coding-interview practice server
//!
//! - Axum HTTP server with cookie sessions backed by SQLite
//! - Question bank filtered by company / topic / difficulty
//! - Optional OpenAI integration to format questions and judge solutions
//!
//! Important env variables:
//!   PORT                   : u16 (default 3000)
//!   DATABASE_URL           : default "sqlite://interview_prep.db?mode=rwc"
//!   SECRET_KEY             : session signing secret (random per process if unset)
//!   SESSION_EXPIRY_MINUTES : inactivity expiry (default 60)
//!   COOKIE_SECURE          : "true" behind HTTPS
//!   OPENAI_API_KEY         : enables OpenAI integration if present
//!   OPENAI_BASE_URL        : default "https://api.openai.com/v1"
//!   OPENAI_MODEL           : default "gpt-4o-mini"
//!   OPENAI_TIMEOUT_SECS    : default 20
//!   PROMPTS_CONFIG_PATH    : path to TOML prompt overrides
//!   LOG_LEVEL              : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT             : "pretty" (default) or "json"

mod auth;
mod config;
mod db;
mod domain;
mod error;
mod gateway;
mod import;
mod logic;
mod openai;
mod protocol;
mod routes;
mod selector;
mod state;
mod store;
mod telemetry;
mod util;
mod views;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Settings;
use crate::routes::{build_router, session_layer};
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about = "Coding-interview practice server")]
struct Cli {
  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run the HTTP server (default)
  Serve,
  /// Load questions from a CSV file with columns company,difficulty,topic,question
  Import {
    /// Path to the CSV file; the first row is treated as a header
    path: PathBuf,
  },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  dotenvy::dotenv().ok();
  telemetry::init_tracing();

  let cli = Cli::parse();
  let settings = Settings::from_env()?;
  let pool = db::connect(&settings.database_url).await?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Import { path } => {
      let written = import::import_file(&pool, &path).await?;
      info!(target: "interview_prep", written, path = %path.display(), "Import finished");
      Ok(())
    }
    Command::Serve => serve(settings, pool).await,
  }
}

async fn serve(settings: Settings, pool: sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
  let sessions = session_layer(&settings, &pool).await?;

  // Shared application state (pool, optional OpenAI client, prompts).
  let state = Arc::new(AppState::new(&settings, pool));
  let app = build_router(state, sessions);

  let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "interview_prep", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      info!(target: "interview_prep", "Shutdown signal received");
    })
    .await?;
  Ok(())
}
