use thiserror::Error;

/// The store answered, but not with the structure we asked for.
#[derive(Error, Debug)]
#[error("Unexpected results from Weaviate {operation}: {payload}")]
pub struct UnexpectedResponse {
    pub operation: &'static str,
    pub payload: String,
}

impl UnexpectedResponse {
    pub fn new(operation: &'static str, payload: impl ToString) -> Self {
        Self {
            operation,
            payload: payload.to_string(),
        }
    }
}
