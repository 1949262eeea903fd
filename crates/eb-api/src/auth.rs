use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::ApiError;
use crate::state::AppState;

pub const API_VERSION_HEADER: &str = "x-broker-api-version";

/// Middleware that checks `Authorization: Basic <user:password>` against the
/// configured broker credentials and requires an API version header.
pub async fn auth_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match validate_request(&state, &req) {
        Ok(()) => next.run(req).await,
        Err(e) => e.into_response(),
    }
}

fn validate_request(state: &AppState, req: &Request) -> Result<(), ApiError> {
    let (user, password) = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Basic "))
        .and_then(decode_credentials)
        .ok_or(ApiError::Unauthorized)?;

    if user != state.config.broker_username || password != state.config.broker_password {
        return Err(ApiError::Unauthorized);
    }

    if !req.headers().contains_key(API_VERSION_HEADER) {
        return Err(ApiError::MissingApiVersion);
    }

    Ok(())
}

fn decode_credentials(encoded: &str) -> Option<(String, String)> {
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}
