use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub dimensions: usize,
}

impl Default for OpenAiEmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            dimensions: 1536,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

pub struct OpenAiEmbeddingClient {
    config: OpenAiEmbeddingConfig,
    client: Client,
}

impl OpenAiEmbeddingClient {
    pub fn new(config: OpenAiEmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// Embeds `texts` in one request. Failures are not retried.
    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbedRequest {
            model: &self.config.model,
            input: &texts,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI embeddings API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "OpenAI embeddings API returned error {}: {}",
                status,
                error_text
            ));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI embeddings response")?;

        let mut data = embed_response.data;
        if data.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "OpenAI embeddings API returned {} embeddings for {} inputs",
                data.len(),
                texts.len()
            ));
        }
        data.sort_by_key(|d| d.index);

        tracing::debug!(
            "Embedded {} texts with model {}",
            texts.len(),
            self.config.model
        );

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_fake_api(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> OpenAiEmbeddingClient {
        OpenAiEmbeddingClient::new(OpenAiEmbeddingConfig {
            api_key: "sk-test".to_string(), // pragma: allowlist secret
            base_url,
            ..OpenAiEmbeddingConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn should_create_client_with_default_config() {
        let client = OpenAiEmbeddingClient::new(OpenAiEmbeddingConfig::default()).unwrap();

        assert_eq!(client.config.model, "text-embedding-ada-002");
        assert_eq!(client.config.base_url, "https://api.openai.com/v1");
        assert_eq!(client.dimensions(), 1536);
    }

    #[tokio::test]
    async fn should_return_empty_embeddings_for_empty_input() {
        let client = OpenAiEmbeddingClient::new(OpenAiEmbeddingConfig::default()).unwrap();

        let result = client.embed(vec![]).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn should_return_embeddings_in_input_order() {
        let app = Router::new().route(
            "/embeddings",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "text-embedding-ada-002");
                assert_eq!(body["input"], json!(["first", "second"]));

                Json(json!({
                    "object": "list",
                    "data": [
                        {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                        {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
                    ],
                    "model": "text-embedding-ada-002",
                    "usage": {"prompt_tokens": 2, "total_tokens": 2}
                }))
            }),
        );
        let client = client_for(spawn_fake_api(app).await);

        let result = client
            .embed(vec!["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(result, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn should_surface_api_errors() {
        let app = Router::new().route(
            "/embeddings",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"error": {"message": "quota exceeded"}})),
                )
            }),
        );
        let client = client_for(spawn_fake_api(app).await);

        let error = client.embed(vec!["text".to_string()]).await.unwrap_err();

        let message = error.to_string();
        assert!(message.contains("429"));
        assert!(message.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn should_reject_mismatched_embedding_count() {
        let app = Router::new().route(
            "/embeddings",
            post(|| async { Json(json!({"data": []})) }),
        );
        let client = client_for(spawn_fake_api(app).await);

        let result = client.embed(vec!["text".to_string()]).await;
        assert!(result.is_err());
    }

    #[test]
    fn should_create_embed_request_with_correct_format() {
        let input = vec!["test text".to_string()];
        let request = EmbedRequest {
            model: "text-embedding-ada-002",
            input: &input,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"model":"text-embedding-ada-002","input":["test text"]}"#
        );
    }
}
