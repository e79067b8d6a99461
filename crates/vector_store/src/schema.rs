use anyhow::{Context, Result};
use tracing::info;

use crate::models::{ClassSchema, PropertyDefinition, SchemaStatus};
use crate::store::DocumentStore;

pub const TEXT_PROPERTY: &str = "text";
pub const DOCUMENT_ID_PROPERTY: &str = "document_id";

/// The one class this service writes to: free `text` plus an opaque `document_id`.
///
/// `document_id` uses `field` tokenization so that equality filters match the whole
/// identifier rather than individual words.
pub fn document_schema(class_name: &str, vectorizer: &str) -> ClassSchema {
    ClassSchema {
        class_name: class_name.to_string(),
        vectorizer: Some(vectorizer.to_string()),
        properties: vec![
            PropertyDefinition::new(TEXT_PROPERTY, "text"),
            PropertyDefinition::new(DOCUMENT_ID_PROPERTY, "text").with_tokenization("field"),
        ],
    }
}

pub async fn init_schema(store: &dyn DocumentStore, schema: &ClassSchema) -> Result<SchemaStatus> {
    let status = store
        .ensure_schema(schema)
        .await
        .with_context(|| format!("Failed to initialize schema for {}", schema.class_name))?;

    match status {
        SchemaStatus::Created => info!("Created schema for {}", schema.class_name),
        SchemaStatus::AlreadyExists => {
            info!(
                "Schema for {} already exists, skipping creation",
                schema.class_name
            )
        }
    }

    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    #[test]
    fn should_build_document_schema() {
        let schema = document_schema("Document", "text2vec-openai");

        assert_eq!(schema.class_name, "Document");
        assert_eq!(schema.vectorizer.as_deref(), Some("text2vec-openai"));
        let names: Vec<&str> = schema.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["text", "document_id"]);
        assert_eq!(schema.properties[1].tokenization.as_deref(), Some("field"));
    }

    #[tokio::test]
    async fn should_be_idempotent() {
        let store = InMemoryStore::new();
        let schema = document_schema("Document", "none");

        let first = init_schema(&store, &schema).await.unwrap();
        let second = init_schema(&store, &schema).await.unwrap();

        assert_eq!(first, SchemaStatus::Created);
        assert_eq!(second, SchemaStatus::AlreadyExists);
    }
}
