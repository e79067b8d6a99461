use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use retrieval_core::config::Secret;

use crate::errors::ApiError;
use crate::routes::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Accepts only `Authorization: Bearer <token>` with the exact configured token.
pub fn authorize(headers: &HeaderMap, expected: &Secret) -> Result<(), ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .ok_or(ApiError::Unauthorized)?;

    if token == expected.expose() {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(request.headers(), &state.bearer_token)?;
    Ok(next.run(request).await)
}
