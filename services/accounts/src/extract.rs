//! Request body extractor accepting both HTML forms and JSON

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// A submitted form.
///
/// The body is decoded as JSON when the request says `application/json`
/// and as `application/x-www-form-urlencoded` otherwise. An empty body
/// decodes as a form with no fields.
#[derive(Debug, Clone)]
pub struct Submission<T>(pub T);

/// Why a submission could not be decoded
#[derive(Error, Debug)]
pub enum SubmissionRejection {
    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),
}

impl IntoResponse for SubmissionRejection {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for Submission<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = SubmissionRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| SubmissionRejection::Body(e.body_text()))?;

        let value = if is_json && !body.is_empty() {
            serde_json::from_slice(&body)?
        } else {
            serde_urlencoded::from_bytes(&body)?
        };

        Ok(Self(value))
    }
}
