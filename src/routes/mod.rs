//! Router assembly: page routes, session layer, no-cache headers, static files, and HTTP tracing.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use sha2::{Digest, Sha512};
use sqlx::SqlitePool;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tower_sessions::{
    cookie::{Key, SameSite},
    service::SignedCookie,
    Expiry, SessionManagerLayer,
};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::{info_span, warn, Level};
use uuid::Uuid;

use crate::config::Settings;
use crate::state::AppState;

pub mod http;

/// Session layer with signed cookies over the SQLite store.
pub type Sessions = SessionManagerLayer<SqliteStore, SignedCookie>;

/// Build the application router with:
/// - public pages (`/`, `/login`, `/signup`, `/logout`, `/health`)
/// - session-gated pages (`/logged_in`, `/generate_question`, `/generate_solution`)
/// - static assets under `/static`
/// - no-cache headers on every response, so back-navigation after logout
///   can't show a cached authenticated page
/// - HTTP trace layer (per-request span with a request id, method, path, status, latency)
pub fn build_router(state: Arc<AppState>, sessions: Sessions) -> Router {
    Router::new()
        .route("/", get(http::home))
        .route("/login", get(http::login_form).post(http::login_submit))
        .route("/signup", get(http::signup_form).post(http::signup_submit))
        .route("/logged_in", get(http::logged_in).post(http::logged_in))
        .route("/generate_question", get(http::logged_in).post(http::generate_question))
        .route("/generate_solution", get(http::logged_in).post(http::generate_solution))
        .route("/logout", get(http::logout))
        .route("/health", get(http::http_health))
        .nest_service("/static", ServeDir::new("./static"))
        .fallback(http::not_found)
        .with_state(state)
        .layer(sessions)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, max-age=0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(header::PRAGMA, HeaderValue::from_static("no-cache")))
        .layer(SetResponseHeaderLayer::overriding(header::EXPIRES, HeaderValue::from_static("0")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    info_span!(
                        "http_request",
                        method = %req.method(),
                        path = %req.uri().path(),
                        request_id = %Uuid::new_v4(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Session layer backed by the same SQLite database, with signed cookies and
/// an inactivity expiry.
pub async fn session_layer(
    settings: &Settings,
    pool: &SqlitePool,
) -> Result<Sessions, sqlx::Error> {
    let store = SqliteStore::new(pool.clone());
    store.migrate().await?;

    let expiry_secs = i64::try_from(settings.session_expiry.as_secs()).unwrap_or(i64::MAX);
    Ok(SessionManagerLayer::new(store)
        .with_secure(settings.cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(expiry_secs)))
        .with_signed(signing_key(settings.session_secret.as_deref())))
}

/// Stretch the configured secret to the 64 bytes a cookie key needs. Without
/// a secret, a random key is used and sessions end with the process.
fn signing_key(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) => Key::from(Sha512::digest(secret.as_bytes()).as_slice()),
        None => {
            warn!(target: "interview_prep", "SECRET_KEY not set; using a random session key (sessions won't survive a restart)");
            Key::generate()
        }
    }
}
