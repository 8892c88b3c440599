//! Infrastructure failures that end a request with a 500.
//!
//! User-facing failures (bad credentials, no matching question, generation
//! trouble) are rendered as page content and never reach this type.

use axum::{
  http::StatusCode,
  response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::views;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("database error: {0}")]
  Storage(#[from] sqlx::Error),
  #[error("session error: {0}")]
  Session(#[from] tower_sessions::session::Error),
  #[error("password hashing failed: {0}")]
  Hashing(String),
  #[error("background task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    error!(target: "interview_prep", error = %self, "Request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Html(views::error_page())).into_response()
  }
}
