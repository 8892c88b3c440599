//! Domain models: users, questions, and the session payload that points at a user.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row. The password hash never leaves the server.
#[derive(Clone, Debug, FromRow)]
pub struct User {
  pub id: i64,
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub password_hash: String,
}

/// Signup input after normalization; the password is already hashed.
#[derive(Clone, Debug)]
pub struct NewUser {
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub password_hash: String,
}

/// One entry of the question bank.
#[derive(Clone, Debug, PartialEq, Eq, FromRow)]
pub struct Question {
  pub id: i64,
  pub company: String,
  pub difficulty: String,
  pub topic: String,
  pub question: String,
}

/// Question row as read from the bulk import file (no id yet).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewQuestion {
  pub company: String,
  pub difficulty: String,
  pub topic: String,
  pub question: String,
}

/// Exact-match filter used by the selector. All three tags must match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionFilter {
  pub company: String,
  pub topic: String,
  pub difficulty: String,
}

/// Distinct tag values present in the bank, for populating the request form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionCatalog {
  pub companies: Vec<String>,
  pub topics: Vec<String>,
  pub difficulties: Vec<String>,
}

/// What the session remembers about the signed-in user.
/// `user_id` is a lookup key only; the session does not own the user row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
  pub user_id: i64,
  pub email: String,
}

impl From<&User> for SessionUser {
  fn from(user: &User) -> Self {
    Self { user_id: user.id, email: user.email.clone() }
  }
}
