//! Account service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::{
    AppState,
    error::{AccountError, AccountResult},
    extract::{Submission, SubmissionRejection},
    middleware::{AuthenticatedSession, require_session},
    models::{Identity, NewUser},
    password::{hash_password, verify_password},
    views::View,
};

/// Submitted login form
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Submitted registration form
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "passwordConfirmation")]
    pub password_confirmation: Option<String>,
}

/// Create the router for the account service
pub fn create_router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/profile", get(profile))
        .route("/logout", post(logout))
        .route("/users/delete", post(delete_account))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/login", get(login_form).post(login))
        .route("/register", get(register_form).post(register))
        .merge(guarded)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = state
        .users
        .health_check()
        .await
        .inspect_err(|e| error!("Credential store health check failed: {}", e))
        .unwrap_or(false);
    let sessions = state
        .sessions
        .health_check()
        .await
        .inspect_err(|e| error!("Session store health check failed: {:#}", e))
        .unwrap_or(false);

    let healthy = database && sessions;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if healthy { "ok" } else { "degraded" },
            "service": "accounts",
            "database": database,
            "sessions": sessions,
        })),
    )
}

pub async fn home(State(state): State<AppState>) -> Response {
    state.templates.page(StatusCode::OK, View::home())
}

/// Login page; clients that are already logged in go straight to their profile
pub async fn login_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    match state.sessions.resolve(&jar).await {
        Ok(session) if session.is_authenticated() => return found("/profile"),
        Ok(_) => {}
        Err(e) => warn!("Failed to resolve session, treating as anonymous: {:#}", e),
    }

    state.templates.page(StatusCode::OK, View::login())
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    submission: Result<Submission<LoginForm>, SubmissionRejection>,
) -> Response {
    let result = async {
        let form = accept(submission)?;
        let identity = authenticate(&state, form).await?;
        let jar = state.sessions.establish(jar, &identity).await?;
        Ok::<_, AccountError>((jar, identity))
    }
    .await;

    match result {
        Ok((jar, identity)) => {
            info!("User logged in: {}", identity.username);
            (jar, found("/profile")).into_response()
        }
        Err(e) => {
            log_failure("Login", &e);
            state
                .templates
                .page(StatusCode::OK, View::login().with_error(e.to_string()))
        }
    }
}

pub async fn register_form(State(state): State<AppState>) -> Response {
    state.templates.page(StatusCode::OK, View::register())
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    submission: Result<Submission<RegisterForm>, SubmissionRejection>,
) -> Response {
    let result = match accept(submission) {
        Ok(form) => register_user(&state, form).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(identity) => {
            info!("Registered user: {} ({})", identity.username, identity.uid);
            found("/login")
        }
        Err(e) => {
            log_failure("Registration", &e);
            state
                .templates
                .page(StatusCode::OK, View::register().with_error(e.to_string()))
        }
    }
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(session): Extension<AuthenticatedSession>,
) -> Response {
    state.templates.page(
        StatusCode::OK,
        View::profile(&session.identity.username),
    )
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AuthenticatedSession>,
    jar: CookieJar,
) -> Response {
    match state.sessions.destroy(jar, &session.token).await {
        Ok(jar) => {
            info!("User logged out: {}", session.identity.username);
            (jar, found("/")).into_response()
        }
        Err(e) => {
            error!("Failed to destroy session: {:#}", e);
            state.templates.page(
                StatusCode::INTERNAL_SERVER_ERROR,
                View::home().with_error(AccountError::Internal(e).to_string()),
            )
        }
    }
}

/// Delete the logged in user's account and end the session
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(session): Extension<AuthenticatedSession>,
    jar: CookieJar,
) -> Response {
    let identity = &session.identity;
    let result = async {
        let rows = state.users.delete(identity.uid, &identity.username).await?;
        if rows == 0 {
            return Err(AccountError::Deletion);
        }
        Ok::<_, AccountError>(())
    }
    .await;

    match result {
        Ok(()) => {
            info!("Deleted user: {} ({})", identity.username, identity.uid);
            // The account is gone, so the client is logged out either way
            let jar = match state.sessions.destroy(jar.clone(), &session.token).await {
                Ok(jar) => jar,
                Err(e) => {
                    error!("Failed to destroy session of deleted user: {:#}", e);
                    state.sessions.expire(jar)
                }
            };
            (jar, found("/")).into_response()
        }
        Err(e) => {
            log_failure("Account deletion", &e);
            state.templates.page(
                StatusCode::OK,
                View::profile(&identity.username).with_error(e.to_string()),
            )
        }
    }
}

async fn authenticate(state: &AppState, form: LoginForm) -> AccountResult<Identity> {
    let username = required(form.username, "Username is Required")?;
    let password = required(form.password, "Password is Required")?;

    let user = state
        .users
        .find_by_name(&username)
        .await?
        .ok_or(AccountError::NotFound)?;

    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AccountError::Internal(e.into()))??;
    if !matches {
        return Err(AccountError::InvalidCredentials);
    }

    Ok(Identity::from(&user))
}

async fn register_user(state: &AppState, form: RegisterForm) -> AccountResult<Identity> {
    let username = required(form.username, "Username is Required")?;
    let password = required(form.password, "Password is Required")?;
    if form.password_confirmation.as_deref() != Some(password.as_str()) {
        return Err(AccountError::Validation("Passwords do not match"));
    }

    if state.users.find_by_name(&username).await?.is_some() {
        return Err(AccountError::Conflict);
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AccountError::Internal(e.into()))??;

    // A concurrent registration of the same name surfaces as Duplicate here
    let user = state
        .users
        .insert(&NewUser {
            name: username,
            password_hash,
        })
        .await?;

    Ok(Identity::from(&user))
}

/// Unwrap a decoded submission; bodies that do not decode are a validation failure
fn accept<T>(submission: Result<Submission<T>, SubmissionRejection>) -> AccountResult<T> {
    submission
        .map(|Submission(form)| form)
        .map_err(|e| {
            warn!("Discarding malformed submission: {}", e);
            AccountError::Validation("Invalid form submission")
        })
}

/// A present, non-empty form field
fn required(value: Option<String>, message: &'static str) -> AccountResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(AccountError::Validation(message))
}

/// `302 Found` redirect
fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn log_failure(action: &str, error: &AccountError) {
    match error {
        AccountError::Internal(cause) => error!("{} failed: {:#}", action, cause),
        other => warn!("{} rejected: {}", action, other),
    }
}
