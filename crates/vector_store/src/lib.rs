pub mod error;
pub mod memory;
pub mod models;
pub mod schema;
pub mod store;
pub mod weaviate;

pub use error::UnexpectedResponse;
pub use memory::InMemoryStore;
pub use models::{
    ClassSchema, EqualityFilter, NearTextQuery, Properties, PropertyDefinition, SchemaStatus,
    SearchHit,
};
pub use schema::{document_schema, init_schema, DOCUMENT_ID_PROPERTY, TEXT_PROPERTY};
pub use store::DocumentStore;
pub use weaviate::WeaviateClient;

use anyhow::{Context, Result};
use retrieval_core::config::{Secret, WeaviateConfig};
use std::sync::Arc;

/// URL scheme that selects the process-local store instead of a Weaviate instance.
pub const MEMORY_URL_SCHEME: &str = "memory://";

pub fn create_document_store(
    config: &WeaviateConfig,
    openai_api_key: Option<&Secret>,
) -> Result<Arc<dyn DocumentStore>> {
    if config.url.starts_with(MEMORY_URL_SCHEME) {
        tracing::warn!("Using in-memory document store, data will not survive a restart");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    if !(config.url.starts_with("http://") || config.url.starts_with("https://")) {
        anyhow::bail!(
            "Invalid Weaviate URL: {}, must start with 'http://', 'https://' or '{}'",
            config.url,
            MEMORY_URL_SCHEME
        );
    }

    let client = WeaviateClient::new(config, openai_api_key)
        .context("Failed to create Weaviate client")?;
    Ok(Arc::new(client))
}
