//! Session gate for the account pages

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::{error, info};

use crate::{
    AppState,
    models::{Identity, SessionState},
    views::View,
};

/// The authenticated session of the current request
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub token: String,
    pub identity: Identity,
}

/// Let the request through only if its cookie names a live session.
///
/// Anonymous requests get a 401 "Access denied" page and never reach the
/// handler. On success the session is placed in the request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let session = match state.sessions.resolve(&jar).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to resolve session: {:#}", e);
            return state.templates.page(
                StatusCode::INTERNAL_SERVER_ERROR,
                View::home().with_error("Something went wrong, please try again"),
            );
        }
    };

    match session {
        SessionState::Authenticated { token, identity } => {
            req.extensions_mut()
                .insert(AuthenticatedSession { token, identity });
            next.run(req).await
        }
        SessionState::Anonymous => {
            info!("Rejected anonymous request to {}", req.uri().path());
            state
                .templates
                .page(StatusCode::UNAUTHORIZED, View::access_denied())
        }
    }
}
