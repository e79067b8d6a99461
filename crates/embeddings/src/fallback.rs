use anyhow::Result;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Offline embeddings provider for development and tests.
/// Each lowercase word is hashed into a bucket; the bucket counts are L2-normalised,
/// so texts sharing words end up with a positive cosine similarity.
pub struct FallbackEmbeddingProvider {
    embedding_dim: usize,
}

impl FallbackEmbeddingProvider {
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            embedding_dim: embedding_dim.max(1),
        }
    }

    /// Same width as `text-embedding-ada-002`
    pub fn with_standard_dimension() -> Self {
        Self::new(1536)
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.embedding_dim];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.embedding_dim as u64) as usize;
            embedding[bucket] += 1.0;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }

        embedding
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedding_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn should_create_fallback_provider_with_custom_dimension() {
        let provider = FallbackEmbeddingProvider::new(512);
        assert_eq!(provider.embedding_dimension(), 512);
    }

    #[tokio::test]
    async fn should_create_fallback_provider_with_standard_dimension() {
        let provider = FallbackEmbeddingProvider::with_standard_dimension();
        assert_eq!(provider.embedding_dimension(), 1536);
    }

    #[tokio::test]
    async fn should_return_empty_embeddings_for_empty_input() {
        let provider = FallbackEmbeddingProvider::new(768);
        let result = provider.embed(vec![]).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn should_return_unit_vectors() {
        let provider = FallbackEmbeddingProvider::new(64);
        let result = provider
            .embed(vec!["alpha widgets".to_string()])
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 64);
        assert!((dot(&result[0], &result[0]) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn should_return_zero_vector_for_blank_text() {
        let provider = FallbackEmbeddingProvider::new(8);
        let result = provider.embed(vec!["  ".to_string()]).await.unwrap();

        assert!(result[0].iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn should_score_shared_words_higher() {
        let provider = FallbackEmbeddingProvider::new(4096);
        let result = provider
            .embed(vec![
                "alpha widgets".to_string(),
                "Alpha gadgets".to_string(),
                "beta".to_string(),
            ])
            .await
            .unwrap();

        assert!(dot(&result[0], &result[1]) > 0.0);
        assert!(dot(&result[0], &result[1]) > dot(&result[0], &result[2]));
    }

    #[tokio::test]
    async fn should_be_deterministic() {
        let provider = FallbackEmbeddingProvider::new(32);
        let texts = vec!["same text".to_string()];

        let result1 = provider.embed(texts.clone()).await.unwrap();
        let result2 = provider.embed(texts).await.unwrap();

        assert_eq!(result1, result2);
    }
}
