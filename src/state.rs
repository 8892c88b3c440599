//! Application state shared by every request: the database pool, the optional
//! text generator, and the prompt templates. Immutable after startup.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{error, info, instrument};

use crate::config::{load_prompts, Prompts, Settings};
use crate::gateway::TextGenerator;
use crate::openai::OpenAI;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from settings: load prompts and init the OpenAI client
    /// when an API key is configured.
    #[instrument(level = "info", skip_all)]
    pub fn new(settings: &Settings, db: SqlitePool) -> Self {
        let prompts = load_prompts(settings.prompts_path.as_ref());

        let generator: Option<Arc<dyn TextGenerator>> = match &settings.openai {
            Some(cfg) => match OpenAI::new(cfg, prompts.temperature) {
                Ok(oa) => {
                    info!(target: "interview_prep", base_url = %oa.base_url, model = %oa.model, timeout = ?cfg.timeout, "OpenAI enabled.");
                    Some(Arc::new(oa))
                }
                Err(e) => {
                    error!(target: "interview_prep", error = %e, "Failed to build OpenAI HTTP client; generation disabled.");
                    None
                }
            },
            None => {
                info!(target: "interview_prep", "OpenAI disabled (no OPENAI_API_KEY). Generation requests will report it.");
                None
            }
        };

        Self { db, generator, prompts }
    }

    #[cfg(test)]
    pub fn for_tests(db: SqlitePool, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { db, generator, prompts: Prompts::default() }
    }
}
