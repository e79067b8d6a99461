pub mod fallback;
pub mod openai;

pub use fallback::FallbackEmbeddingProvider;
pub use openai::{OpenAiEmbeddingClient, OpenAiEmbeddingConfig, DEFAULT_EMBEDDING_MODEL};
pub use retrieval_core::config::{EmbeddingConfig, OpenAiConfig};

use anyhow::{Context, Result};

pub type EmbedFuture<'a> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<Vec<f32>>>> + Send + 'a>>;

pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_>;
    fn dimension(&self) -> usize;
}

impl dyn EmbeddingProvider {
    /// Embeds a single text, failing if the provider returns nothing for it.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .context("Embedding provider returned no embedding")
    }
}

impl EmbeddingProvider for OpenAiEmbeddingClient {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(self.embed(texts))
    }
    fn dimension(&self) -> usize {
        self.dimensions()
    }
}

impl EmbeddingProvider for FallbackEmbeddingProvider {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(self.embed(texts))
    }
    fn dimension(&self) -> usize {
        self.embedding_dimension()
    }
}

pub fn create_embedding_provider(
    cfg: &EmbeddingConfig,
    openai: &OpenAiConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match cfg.provider.as_str() {
        "openai" => {
            let api_key = openai
                .api_key
                .as_ref()
                .context("OPENAI_API_KEY is required for the openai embedding provider")?;
            let openai_cfg = OpenAiEmbeddingConfig {
                api_key: api_key.expose().to_string(),
                model: cfg
                    .model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
                base_url: openai.base_url.clone(),
                dimensions: cfg
                    .dimensions
                    .unwrap_or(OpenAiEmbeddingConfig::default().dimensions),
            };
            Ok(Box::new(OpenAiEmbeddingClient::new(openai_cfg)?))
        }
        "fallback" => Ok(Box::new(match cfg.dimensions {
            Some(dim) => FallbackEmbeddingProvider::new(dim),
            None => FallbackEmbeddingProvider::with_standard_dimension(),
        })),
        other => anyhow::bail!("Unknown embedding provider: {}", other),
    }
}
