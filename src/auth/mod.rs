//! Email + password authentication.
//!
//! `register` / `authenticate` work purely against the user store and are
//! what the tests exercise; `signup` / `login` additionally bind the result
//! to the request's session.

mod password;
mod session;

pub use session::CurrentUser;

use password::{hash_password, verify_password};
use session::{clear, establish};

use sqlx::SqlitePool;
use thiserror::Error;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::domain::{NewUser, SessionUser, User};
use crate::error::AppError;
use crate::protocol::{LoginForm, SignupForm};
use crate::store::{self, InsertUser};

/// Authentication failures. Everything but `Internal` is shown to the user
/// as a form error.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("An account with this email already exists.")]
    DuplicateEmail,
    #[error("No account exists for this email.")]
    UnknownEmail,
    #[error("Incorrect email or password.")]
    InvalidCredentials,
    #[error("Please fill in every field.")]
    MissingFields,
    #[error(transparent)]
    Internal(#[from] AppError),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Internal(AppError::Storage(e))
    }
}

impl From<tower_sessions::session::Error> for AuthError {
    fn from(e: tower_sessions::session::Error) -> Self {
        AuthError::Internal(AppError::Session(e))
    }
}

/// Emails compare case-insensitively and ignore surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create a user from a signup form. Fails with `DuplicateEmail` if the
/// email is already registered; no row is written in that case.
#[instrument(level = "info", skip(pool, form), fields(email_len = form.email.len()))]
pub async fn register(pool: &SqlitePool, form: &SignupForm) -> Result<User, AuthError> {
    let first_name = form.first_name.trim();
    let last_name = form.last_name.trim();
    let email = normalize_email(&form.email);
    if first_name.is_empty() || last_name.is_empty() || email.is_empty() || form.password.is_empty() {
        return Err(AuthError::MissingFields);
    }

    if store::find_user_by_email(pool, &email).await?.is_some() {
        warn!(target: "auth", "Signup rejected: email already registered");
        return Err(AuthError::DuplicateEmail);
    }

    let plaintext = form.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&plaintext))
        .await
        .map_err(AppError::from)?
        .map_err(AppError::Hashing)?;

    let new_user = NewUser {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email,
        password_hash,
    };
    match store::insert_user(pool, new_user).await? {
        InsertUser::Created(user) => {
            info!(target: "auth", user_id = user.id, "User registered");
            Ok(user)
        }
        InsertUser::EmailTaken => {
            warn!(target: "auth", "Signup lost a race on the unique email constraint");
            Err(AuthError::DuplicateEmail)
        }
    }
}

/// Check an email/password pair against the store.
#[instrument(level = "info", skip(pool, email, password), fields(email_len = email.len()))]
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> Result<User, AuthError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }

    let user = store::find_user_by_email(pool, &email)
        .await?
        .ok_or(AuthError::UnknownEmail)?;

    let plaintext = password.to_string();
    let stored = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&plaintext, &stored))
        .await
        .map_err(AppError::from)?
        .map_err(AppError::Hashing)?;

    if verified {
        Ok(user)
    } else {
        warn!(target: "auth", user_id = user.id, "Password did not verify");
        Err(AuthError::InvalidCredentials)
    }
}

pub async fn signup(pool: &SqlitePool, session: &Session, form: &SignupForm) -> Result<SessionUser, AuthError> {
    let user = register(pool, form).await?;
    Ok(establish(session, &user).await?)
}

pub async fn login(pool: &SqlitePool, session: &Session, form: &LoginForm) -> Result<SessionUser, AuthError> {
    let user = authenticate(pool, &form.email, &form.password).await?;
    let current = establish(session, &user).await?;
    info!(target: "auth", user_id = current.user_id, "User logged in");
    Ok(current)
}

/// Clear the session. Safe to call with no session at all.
pub async fn logout(session: &Session) -> Result<(), AppError> {
    clear(session).await?;
    Ok(())
}
