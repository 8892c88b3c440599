//! Generation gateway: templated prompts in, model text (or a classified failure) out.
//!
//! The transport sits behind `TextGenerator` so the OpenAI client can be
//! swapped for a fixed-response generator in tests.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::util::fill_template;

/// Exact reply the judge prompt asks for when a solution is correct.
pub const CORRECT_MARKER: &str = "Correct ✅";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
  #[error("the text-generation service is not configured")]
  NotConfigured,
  #[error("could not reach the text-generation service: {0}")]
  Network(String),
  #[error("the text-generation service quota is exhausted: {0}")]
  Quota(String),
  #[error("the text-generation service returned HTTP {status}: {message}")]
  Http { status: u16, message: String },
  #[error("the text-generation service sent an unusable response: {0}")]
  MalformedResponse(String),
}

impl GenerationError {
  /// Text rendered in place of the expected content when a call fails.
  pub fn user_message(&self) -> String {
    format!("Could not generate a response: {self}")
  }
}

/// Single-prompt text completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
  async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// How a judge reply should be presented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
  Correct,
  Feedback(String),
}

impl Verdict {
  pub fn from_reply(reply: &str) -> Self {
    let reply = reply.trim();
    if reply == CORRECT_MARKER {
      Verdict::Correct
    } else {
      Verdict::Feedback(reply.to_string())
    }
  }
}

/// Ask the model to rewrite a raw bank question into the fixed
/// problem / `param:` / two-examples layout.
#[instrument(level = "info", skip(generator, prompts, question), fields(question_len = question.len()))]
pub async fn format_question(
  generator: &dyn TextGenerator,
  prompts: &Prompts,
  question: &str,
) -> Result<String, GenerationError> {
  let prompt = fill_template(&prompts.question_format_template, &[("question", question)]);
  run(generator, "format_question", &prompt).await
}

/// Ask the model to judge `code` against `question`. A correct solution
/// comes back as exactly `CORRECT_MARKER`.
#[instrument(level = "info", skip(generator, prompts, question, code), fields(question_len = question.len(), code_len = code.len()))]
pub async fn check_solution(
  generator: &dyn TextGenerator,
  prompts: &Prompts,
  question: &str,
  code: &str,
) -> Result<String, GenerationError> {
  let prompt = fill_template(
    &prompts.solution_check_template,
    &[("question", question), ("code", code), ("correct_marker", CORRECT_MARKER)],
  );
  run(generator, "check_solution", &prompt).await
}

async fn run(generator: &dyn TextGenerator, task: &'static str, prompt: &str) -> Result<String, GenerationError> {
  let start = std::time::Instant::now();
  let result = generator.complete(prompt).await.map(|text| text.trim().to_string());
  let elapsed = start.elapsed();
  match &result {
    Ok(text) => info!(target: "gateway", task, ?elapsed, reply_len = text.len(), "Generation succeeded"),
    Err(e) => error!(target: "gateway", task, ?elapsed, error = %e, "Generation failed"),
  }
  result
}
