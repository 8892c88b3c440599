//! Session payload helpers and the `CurrentUser` extractor that gates
//! protected routes.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::{session, Session};
use tracing::{debug, error};

use crate::domain::{SessionUser, User};

/// Key under which the signed-in user is stored in the session.
pub const SESSION_USER_KEY: &str = "user";

/// Bind `user` to the session. The session id is cycled first so a
/// pre-login id cannot be reused after authentication.
pub async fn establish(session: &Session, user: &User) -> Result<SessionUser, session::Error> {
    let current = SessionUser::from(user);
    session.cycle_id().await?;
    session.insert(SESSION_USER_KEY, &current).await?;
    Ok(current)
}

/// Drop all session state and delete the record from the store.
pub async fn clear(session: &Session) -> Result<(), session::Error> {
    session.flush().await
}

/// The authenticated user of the current request.
///
/// Extraction fails with a redirect to `/login` when the session carries no
/// user, so handlers taking this argument only run for signed-in callers.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match session.get::<SessionUser>(SESSION_USER_KEY).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                debug!(target: "interview_prep", path = %parts.uri.path(), "No session user; redirecting to login");
                Err(Redirect::to("/login").into_response())
            }
            Err(e) => {
                error!(target: "interview_prep", error = %e, "Session lookup failed; treating as signed out");
                Err(Redirect::to("/login").into_response())
            }
        }
    }
}
