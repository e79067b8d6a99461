use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde_json::json;
use thiserror::Error;
use vector_store::UnexpectedResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid or missing token")]
    Unauthorized,

    #[error("Invalid request: {message}")]
    ValidationError { status: StatusCode, message: String },

    #[error("Embedding service error: {0}")]
    EmbeddingError(String),

    #[error("LLM service error: {0}")]
    LlmError(String),

    #[error("Vector store error: {0}")]
    VectorStoreError(String),

    #[error("Unexpected results from Weaviate query: {0}")]
    UnexpectedStoreResponse(String),
}

impl ApiError {
    /// Upstream-shape failures keep their own variant so the payload can be logged.
    pub fn from_store(error: anyhow::Error) -> Self {
        match error.downcast_ref::<UnexpectedResponse>() {
            Some(unexpected) => ApiError::UnexpectedStoreResponse(unexpected.payload.clone()),
            None => ApiError::VectorStoreError(format!("{:#}", error)),
        }
    }

    pub fn embedding(error: anyhow::Error) -> Self {
        ApiError::EmbeddingError(format!("{:#}", error))
    }

    pub fn llm(error: anyhow::Error) -> Self {
        ApiError::LlmError(format!("{:#}", error))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::ValidationError { status, .. } => *status,
            ApiError::EmbeddingError(_)
            | ApiError::LlmError(_)
            | ApiError::VectorStoreError(_)
            | ApiError::UnexpectedStoreResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client; upstream details stay in the logs.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Unauthorized => "Invalid or missing token".to_string(),
            ApiError::ValidationError { message, .. } => message.clone(),
            ApiError::UnexpectedStoreResponse(_) => {
                "Unexpected results from Weaviate query".to_string()
            }
            ApiError::EmbeddingError(_)
            | ApiError::LlmError(_)
            | ApiError::VectorStoreError(_) => "Internal Server Error".to_string(),
        }
    }
}

/// Body rejections keep axum's status (400, 415 or 422) but use the `detail` body.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ValidationError {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("Rejected request: {}", self);
        }

        let body = Json(json!({ "detail": self.detail() }));
        match self {
            ApiError::Unauthorized => {
                (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
