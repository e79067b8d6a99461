use anyhow::{Context, Result};
use embeddings::{create_embedding_provider, EmbeddingProvider};
use llm::{ConceptExtractor, OpenAiConceptExtractor, PassthroughConceptExtractor};
use log::{info, warn};
use retrieval_core::{Config, DeleteRequest, Document, Query, QueryResult, MISSING_DOCUMENT_ID};
use serde_json::Value;
use std::sync::Arc;
use vector_store::{
    create_document_store, document_schema, init_schema, ClassSchema, DocumentStore,
    EqualityFilter, NearTextQuery, Properties, SchemaStatus, SearchHit, DOCUMENT_ID_PROPERTY,
    TEXT_PROPERTY,
};

use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Ties the embedding provider, the concept extractor and the document store together
/// behind the three document operations.
pub struct RetrievalService {
    schema: ClassSchema,
    embeddings: Arc<dyn EmbeddingProvider>,
    concepts: Arc<dyn ConceptExtractor>,
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for RetrievalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalService")
            .field("schema", &self.schema)
            .field("embeddings", &"EmbeddingProvider<...>")
            .field("concepts", &"ConceptExtractor<...>")
            .field("store", &"DocumentStore<...>")
            .finish()
    }
}

impl RetrievalService {
    pub fn new(config: &Config) -> Result<Self> {
        let embeddings: Arc<dyn EmbeddingProvider> =
            create_embedding_provider(&config.embedding, &config.openai)
                .context("Failed to create embedding provider")?
                .into();

        let concepts: Arc<dyn ConceptExtractor> = if config.openai.api_key.is_some() {
            Arc::new(
                OpenAiConceptExtractor::from_config(&config.openai)
                    .context("Failed to create concept extractor")?,
            )
        } else {
            warn!("OPENAI_API_KEY is not set, queries will search for their own text");
            Arc::new(PassthroughConceptExtractor)
        };

        let store = create_document_store(&config.weaviate, config.openai.api_key.as_ref())
            .context("Failed to create document store")?;

        let schema = document_schema(&config.weaviate.class_name, &config.weaviate.vectorizer);

        Ok(Self::with_clients(schema, embeddings, concepts, store))
    }

    // Dependency-injection friendly constructor for testing and composition
    pub fn with_clients(
        schema: ClassSchema,
        embeddings: Arc<dyn EmbeddingProvider>,
        concepts: Arc<dyn ConceptExtractor>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            schema,
            embeddings,
            concepts,
            store,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.schema.class_name
    }

    pub async fn init_schema(&self) -> Result<SchemaStatus> {
        init_schema(self.store.as_ref(), &self.schema).await
    }

    pub async fn upsert(&self, document: Document) -> Result<(), ApiError> {
        let vector = self
            .embeddings
            .embed_one(&document.text)
            .await
            .map_err(ApiError::embedding)?;

        let mut properties = Properties::new();
        properties.insert(TEXT_PROPERTY.to_string(), Value::String(document.text));
        properties.insert(
            DOCUMENT_ID_PROPERTY.to_string(),
            Value::String(document.document_id.clone()),
        );

        self.store
            .insert(self.class_name(), vector, properties)
            .await
            .map_err(ApiError::from_store)?;

        info!("Upserted document {}", document.document_id);
        Ok(())
    }

    pub async fn query(&self, query: Query) -> Result<Vec<QueryResult>, ApiError> {
        if query.limit == 0 {
            return Ok(vec![]);
        }

        let concepts = self
            .concepts
            .extract(&query.text)
            .await
            .map_err(ApiError::llm)?;

        if concepts.is_empty() {
            warn!("No concepts extracted from query, returning no results");
            return Ok(vec![]);
        }

        let search = NearTextQuery {
            class_name: self.class_name().to_string(),
            properties: vec![TEXT_PROPERTY.to_string(), DOCUMENT_ID_PROPERTY.to_string()],
            concepts,
            limit: query.limit,
        };

        let hits = self
            .store
            .search(&search)
            .await
            .map_err(ApiError::from_store)?;

        let results: Vec<QueryResult> = hits
            .into_iter()
            .filter_map(to_query_result)
            .take(query.limit)
            .collect();

        info!(
            "Query for {:?} returned {} results",
            search.concepts,
            results.len()
        );
        Ok(results)
    }

    pub async fn delete(&self, request: DeleteRequest) -> Result<DeleteOutcome, ApiError> {
        let filter = EqualityFilter::new(DOCUMENT_ID_PROPERTY, &request.document_id);
        let deleted = self
            .store
            .delete_where(self.class_name(), &filter)
            .await
            .map_err(ApiError::from_store)?;

        info!(
            "Deleted {} objects for document {}",
            deleted, request.document_id
        );

        // Only a single deleted object counts as success
        if deleted == 1 {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}

/// Hits without a `text` property are skipped.
fn to_query_result(hit: SearchHit) -> Option<QueryResult> {
    let text = hit.text_property(TEXT_PROPERTY)?.to_string();
    let document_id = hit
        .text_property(DOCUMENT_ID_PROPERTY)
        .unwrap_or(MISSING_DOCUMENT_ID)
        .to_string();

    Some(QueryResult {
        document: Document { text, document_id },
        score: hit.certainty,
    })
}
