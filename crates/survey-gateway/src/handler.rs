//! Submission endpoint
//!
//! One pass per request, no state kept between requests. Every exit is a
//! single JSON envelope carrying the main-request CORS headers.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;

use survey_core::storage::object_key;
use survey_core::{ResponseEnvelope, StorageError, Submission, VerificationError};

use crate::cors;
use crate::gateway::GatewayState;

/// Message of the success envelope
pub const THANK_YOU: &str = "thank you";

/// Header whose value is passed to the verifier as the caller IP
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Ways a submission can be turned away
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("must supply a payload")]
    UnreadableBody(String),

    #[error("error parsing input")]
    Malformed(String),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("recaptcha thinks you are a bot")]
    BotSuspected(Vec<String>),

    #[error("failed to upload data {0}")]
    Storage(#[from] StorageError),
}

impl SubmissionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SubmissionError::UnreadableBody(_)
            | SubmissionError::Malformed(_)
            | SubmissionError::BotSuspected(_) => StatusCode::BAD_REQUEST,
            SubmissionError::Verification(_) | SubmissionError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SubmissionError {
    fn into_response(self) -> Response {
        let envelope = ResponseEnvelope::error(self.to_string());
        (self.status_code(), Json(envelope)).into_response()
    }
}

/// Entry point for every method on `/`
pub async fn handle_submission(
    State(state): State<Arc<GatewayState>>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    if method == Method::OPTIONS {
        return cors::preflight_response(state.cors_origin());
    }

    let mut response = match process(&state, &headers, body).await {
        Ok(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Err(e) => {
            tracing::warn!(status = %e.status_code(), error = ?e, "submission rejected");
            e.into_response()
        }
    };

    cors::apply_main_headers(response.headers_mut(), state.cors_origin());
    response
}

async fn process(
    state: &GatewayState,
    headers: &HeaderMap,
    body: Body,
) -> Result<ResponseEnvelope, SubmissionError> {
    let data = read_limited(body, state.config.body_limit)
        .await
        .map_err(|e| SubmissionError::UnreadableBody(e.to_string()))?;

    let submission =
        Submission::from_slice(&data).map_err(|e| SubmissionError::Malformed(e.to_string()))?;

    if state
        .config
        .recaptcha
        .requires_verification(&submission.captcha_token)
    {
        let remote_ip = headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let verdict = state
            .verifier
            .verify(remote_ip, &submission.captcha_token)
            .await?;
        if !verdict.success {
            return Err(SubmissionError::BotSuspected(verdict.error_codes));
        }
    } else {
        tracing::debug!(id = %submission.id, "token verification skipped");
    }

    let key = object_key(Utc::now(), &submission.id);
    state.writer.write(&key, &submission.answers_bytes()).await?;

    Ok(ResponseEnvelope::ok(THANK_YOU))
}

/// Read at most `limit` bytes of `body`
///
/// Anything past the limit is left unread and dropped; an oversized body is
/// not an error.
pub async fn read_limited(body: Body, limit: usize) -> Result<Vec<u8>, axum::Error> {
    let mut stream = body.into_data_stream();
    let mut data = Vec::new();

    while data.len() < limit {
        let Some(chunk) = stream.next().await else {
            break;
        };
        let chunk = chunk?;
        let take = chunk.len().min(limit - data.len());
        data.extend_from_slice(&chunk[..take]);
    }

    Ok(data)
}
