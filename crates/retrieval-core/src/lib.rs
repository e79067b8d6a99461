use serde::{Deserialize, Serialize};

pub mod config;

pub use config::{Config, ConfigError};

/// Placeholder reported for stored records that carry no `document_id`.
pub const MISSING_DOCUMENT_ID: &str = "default_value";

pub const DEFAULT_QUERY_LIMIT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub document: Document,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub document_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_query_limit_to_four() {
        let query: Query = serde_json::from_str(r#"{"text":"alpha widgets"}"#).unwrap();

        assert_eq!(query.text, "alpha widgets");
        assert_eq!(query.limit, 4);
    }

    #[test]
    fn should_honour_explicit_query_limit() {
        let query: Query = serde_json::from_str(r#"{"text":"alpha","limit":2}"#).unwrap();
        assert_eq!(query.limit, 2);
    }

    #[test]
    fn should_reject_negative_query_limit() {
        let result = serde_json::from_str::<Query>(r#"{"text":"alpha","limit":-1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn should_serialize_query_result() {
        let result = QueryResult {
            document: Document {
                text: "alpha widgets".to_string(),
                document_id: "d1".to_string(),
            },
            score: 0.5,
        };

        let json = serde_json::to_string(&result).unwrap();
        let expected = r#"{"document":{"text":"alpha widgets","document_id":"d1"},"score":0.5}"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn should_require_document_id_on_delete_request() {
        let result = serde_json::from_str::<DeleteRequest>(r#"{}"#);
        assert!(result.is_err());

        let request: DeleteRequest = serde_json::from_str(r#"{"document_id":"d1"}"#).unwrap();
        assert_eq!(request.document_id, "d1");
    }
}
