use crate::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ModelConfig};
use anyhow::{Context, Result};
use log::info;
use reqwest::Client;

pub struct OpenAiChatClient {
    client: Client,
    config: ModelConfig,
}

impl OpenAiChatClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        info!("Initializing OpenAiChatClient for model {}", config.model);
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends one chat completion request and returns the first choice's content.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatCompletionRequest::new(messages, &self.config);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI chat API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "OpenAI chat API returned error {}: {}",
                status,
                error_text
            ));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI chat response")?;

        completion
            .into_reply()
            .context("OpenAI chat response contained no message content")
    }
}
