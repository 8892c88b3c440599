//! Process configuration (environment) and prompt templates (TOML).
//!
//! Settings are read once at startup. `Settings::from_lookup` takes any
//! key → value function so tests don't have to mutate the real environment.

use std::{path::PathBuf, str::FromStr, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("{key} has invalid value {value:?}")]
  Invalid { key: &'static str, value: String },
}

/// OpenAI connection settings. Absent when no API key is configured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenAIConfig {
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub timeout: Duration,
  pub max_tokens: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
  pub port: u16,
  pub database_url: String,
  pub session_secret: Option<String>,
  pub session_expiry: Duration,
  pub cookie_secure: bool,
  pub prompts_path: Option<PathBuf>,
  pub openai: Option<OpenAIConfig>,
}

impl Settings {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let openai = match non_empty("OPENAI_API_KEY") {
      Some(api_key) => Some(OpenAIConfig {
        api_key,
        base_url: non_empty("OPENAI_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".into()),
        model: non_empty("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".into()),
        timeout: Duration::from_secs(parse_or(&non_empty, "OPENAI_TIMEOUT_SECS", 20u64)?),
        max_tokens: parse_or(&non_empty, "OPENAI_MAX_TOKENS", 500u32)?,
      }),
      None => None,
    };

    let expiry_minutes = parse_or(&non_empty, "SESSION_EXPIRY_MINUTES", 60u64)?;
    let expiry_secs = expiry_minutes.checked_mul(60).ok_or_else(|| ConfigError::Invalid {
      key: "SESSION_EXPIRY_MINUTES",
      value: expiry_minutes.to_string(),
    })?;

    Ok(Self {
      port: parse_or(&non_empty, "PORT", 3000u16)?,
      database_url: non_empty("DATABASE_URL").unwrap_or_else(|| "sqlite://interview_prep.db?mode=rwc".into()),
      session_secret: non_empty("SECRET_KEY"),
      session_expiry: Duration::from_secs(expiry_secs),
      cookie_secure: parse_or(&non_empty, "COOKIE_SECURE", false)?,
      prompts_path: non_empty("PROMPTS_CONFIG_PATH").map(PathBuf::from),
      openai,
    })
  }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
  T: FromStr,
  F: Fn(&str) -> Option<String>,
{
  match lookup(key) {
    None => Ok(default),
    Some(value) => value.parse::<T>().map_err(|_| ConfigError::Invalid { key, value }),
  }
}

/// Prompt templates for the generation gateway.
///
/// Placeholders: `{question}` in both templates, plus `{code}` and
/// `{correct_marker}` in the solution check.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Prompts {
  pub question_format_template: String,
  pub solution_check_template: String,
  pub temperature: f32,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      question_format_template: "You are given a coding interview question: '{question}'.
Rewrite it in exactly this layout, with one blank line between parts and no section labels:

Two sentences describing the task clearly, in the style of a LeetCode problem statement.

A line starting with \"param:\" followed by the function name and its parameter(s).

Exactly two examples, each written as:
Input: <example input> Output: <example output>

Rules:
- Do NOT add explanations, headings, or extra text.
- Do NOT write code.
- Keep the wording minimal and consistent.
- Always give exactly two examples.".into(),
      solution_check_template: "You are validating a coding interview solution.
Question: {question}
User's code:
{code}

Instructions:
- If the solution is fully correct, reply with only: \"{correct_marker}\"
- If it is wrong:
  1. Explain briefly why it is incorrect in 1-2 lines.
  2. Provide the corrected solution in the same language as the user's code.
  3. Keep the response concise. No headings, no markdown, no extra explanations.".into(),
      temperature: 0.7,
    }
  }
}

/// Load prompt overrides from `path`. Missing keys keep their defaults; on
/// any read/parse error the defaults are used and the error is logged.
pub fn load_prompts(path: Option<&PathBuf>) -> Prompts {
  let Some(path) = path else { return Prompts::default() };
  match std::fs::read_to_string(path) {
    Ok(s) => match toml::from_str::<Prompts>(&s) {
      Ok(prompts) => {
        info!(target: "interview_prep", path = %path.display(), "Loaded prompt config (TOML)");
        prompts
      }
      Err(e) => {
        error!(target: "interview_prep", path = %path.display(), error = %e, "Failed to parse prompt config; using defaults");
        Prompts::default()
      }
    },
    Err(e) => {
      error!(target: "interview_prep", path = %path.display(), error = %e, "Failed to read prompt config; using defaults");
      Prompts::default()
    }
  }
}
