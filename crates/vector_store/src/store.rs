use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{ClassSchema, EqualityFilter, NearTextQuery, Properties, SchemaStatus, SearchHit};

/// The operations this service needs from a vector database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates the class if it is missing; an existing class is left untouched.
    async fn ensure_schema(&self, schema: &ClassSchema) -> Result<SchemaStatus>;

    async fn insert(&self, class_name: &str, vector: Vec<f32>, properties: Properties)
        -> Result<Uuid>;

    /// Hits come back in the store's ranking order, best match first.
    async fn search(&self, query: &NearTextQuery) -> Result<Vec<SearchHit>>;

    /// Deletes every object of `class_name` matching `filter` and returns how many went.
    async fn delete_where(&self, class_name: &str, filter: &EqualityFilter) -> Result<u64>;
}
