use serde::{Deserialize, Serialize};

pub use retrieval_core::{DeleteRequest, Document, Query, QueryResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: "not found".to_string(),
        }
    }
}
