use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use retrieval_core::config::{Secret, WeaviateConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::UnexpectedResponse;
use crate::models::{
    ClassSchema, EqualityFilter, NearTextQuery, Properties, SchemaStatus, SearchHit,
};
use crate::schema::TEXT_PROPERTY;
use crate::store::DocumentStore;

/// REST/GraphQL client for a Weaviate instance.
pub struct WeaviateClient {
    client: Client,
    base_url: String,
}

impl WeaviateClient {
    /// `openai_api_key` is forwarded as `X-OpenAI-Api-Key` so the server-side
    /// `text2vec-openai` module can vectorize `nearText` concepts.
    pub fn new(config: &WeaviateConfig, openai_api_key: Option<&Secret>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            headers.insert(
                AUTHORIZATION,
                sensitive_header(&format!("Bearer {}", api_key.expose()))?,
            );
        }
        if let Some(openai_api_key) = openai_api_key {
            headers.insert("X-OpenAI-Api-Key", sensitive_header(openai_api_key.expose())?);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn sensitive_header(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value).context("Invalid characters in API key")?;
    header.set_sensitive(true);
    Ok(header)
}

async fn ensure_success(response: Response, operation: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    Err(anyhow::anyhow!(
        "Weaviate {} returned error {}: {}",
        operation,
        status,
        error_text
    ))
}

fn is_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Renders a `Get` query with `nearText`, a limit and the certainty of each hit.
pub fn build_near_text_query(query: &NearTextQuery) -> Result<String> {
    if !is_graphql_name(&query.class_name) {
        anyhow::bail!("Invalid class name: {}", query.class_name);
    }
    if let Some(bad) = query.properties.iter().find(|p| !is_graphql_name(p)) {
        anyhow::bail!("Invalid property name: {}", bad);
    }

    // JSON string literals are valid GraphQL string literals
    let concepts = serde_json::to_string(&query.concepts)?;

    Ok(format!(
        "{{ Get {{ {}(nearText: {{concepts: {}}}, limit: {}) {{ {} _additional {{ certainty }} }} }} }}",
        query.class_name,
        concepts,
        query.limit,
        query.properties.join(" ")
    ))
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    #[serde(rename = "Get")]
    get: Option<HashMap<String, Option<Vec<RawHit>>>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_additional")]
    additional: Option<Additional>,
    #[serde(flatten)]
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Additional {
    certainty: Option<f64>,
}

/// Decodes a `Get` response for `class_name`, keeping the store's hit order.
///
/// Hits without a `text` property are dropped. Anything other than `data.Get.<class_name>`
/// holding a list whose remaining objects each carry `_additional.certainty` is an
/// [`UnexpectedResponse`].
pub fn decode_search_response(
    class_name: &str,
    body: Value,
) -> std::result::Result<Vec<SearchHit>, UnexpectedResponse> {
    let unexpected = || UnexpectedResponse::new("query", &body);

    let response: GraphQlResponse =
        serde_json::from_value(body.clone()).map_err(|_| unexpected())?;

    if let Some(errors) = &response.errors {
        for error in errors {
            tracing::warn!("Weaviate GraphQL error: {}", error.message);
        }
    }

    let raw_hits = response
        .data
        .and_then(|data| data.get)
        .and_then(|mut get| get.remove(class_name))
        .flatten()
        .ok_or_else(unexpected)?;

    // Hits without text are never returned, so their certainty is not checked
    raw_hits
        .into_iter()
        .filter(|hit| hit.properties.contains_key(TEXT_PROPERTY))
        .map(|hit| {
            let certainty = hit
                .additional
                .and_then(|additional| additional.certainty)
                .ok_or_else(unexpected)?;
            Ok(SearchHit::new(hit.properties, certainty))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct BatchDeleteResponse {
    results: BatchDeleteResults,
}

#[derive(Debug, Deserialize)]
struct BatchDeleteResults {
    successful: u64,
    #[serde(default)]
    failed: u64,
}

#[async_trait]
impl DocumentStore for WeaviateClient {
    async fn ensure_schema(&self, schema: &ClassSchema) -> Result<SchemaStatus> {
        let response = self
            .client
            .get(self.url(&format!("/v1/schema/{}", schema.class_name)))
            .send()
            .await
            .context("Failed to send schema lookup to Weaviate")?;

        if response.status() != StatusCode::NOT_FOUND {
            ensure_success(response, "schema lookup").await?;
            return Ok(SchemaStatus::AlreadyExists);
        }

        tracing::debug!("Creating schema for {}", schema.class_name);
        let response = self
            .client
            .post(self.url("/v1/schema"))
            .json(schema)
            .send()
            .await
            .context("Failed to send schema creation to Weaviate")?;
        ensure_success(response, "schema creation").await?;

        Ok(SchemaStatus::Created)
    }

    async fn insert(
        &self,
        class_name: &str,
        vector: Vec<f32>,
        properties: Properties,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let body = json!({
            "class": class_name,
            "id": id,
            "properties": properties,
            "vector": vector,
        });

        let response = self
            .client
            .post(self.url("/v1/objects"))
            .json(&body)
            .send()
            .await
            .context("Failed to send object to Weaviate")?;
        ensure_success(response, "object insert").await?;

        tracing::info!("Inserted object {} into {}", id, class_name);
        Ok(id)
    }

    async fn search(&self, query: &NearTextQuery) -> Result<Vec<SearchHit>> {
        let graphql = build_near_text_query(query)?;

        let response = self
            .client
            .post(self.url("/v1/graphql"))
            .json(&json!({ "query": graphql }))
            .send()
            .await
            .context("Failed to send query to Weaviate")?;
        let response = ensure_success(response, "query").await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| UnexpectedResponse::new("query", e))?;

        let hits = decode_search_response(&query.class_name, body)?;
        tracing::info!("Found {} results in {}", hits.len(), query.class_name);
        Ok(hits)
    }

    async fn delete_where(&self, class_name: &str, filter: &EqualityFilter) -> Result<u64> {
        let body = json!({
            "match": {
                "class": class_name,
                "where": {
                    "operator": "Equal",
                    "path": [filter.path],
                    "valueText": filter.value,
                },
            },
            "output": "minimal",
        });

        let response = self
            .client
            .delete(self.url("/v1/batch/objects"))
            .json(&body)
            .send()
            .await
            .context("Failed to send batch delete to Weaviate")?;
        let response = ensure_success(response, "batch delete").await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| UnexpectedResponse::new("batch delete", e))?;
        let deleted: BatchDeleteResponse = serde_json::from_value(body.clone())
            .map_err(|_| UnexpectedResponse::new("batch delete", &body))?;

        if deleted.results.failed > 0 {
            tracing::warn!(
                "Weaviate failed to delete {} objects from {}",
                deleted.results.failed,
                class_name
            );
        }

        Ok(deleted.results.successful)
    }
}
