use crate::models::{ChatMessage, ModelConfig};
use crate::openai::OpenAiChatClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use retrieval_core::config::OpenAiConfig;

/// Separator the extraction prompt asks the model to use between concepts.
pub const CONCEPT_SEPARATOR: &str = ", ";

const SYSTEM_PROMPT: &str = "You turn user questions into queries for semantic search \
in a vector database. You are only concerned with the semantics of the user input. \
Work out what the user needs, then produce a list of short concepts to search for. \
Reply with the concepts only, separated by a comma and a single space. \
Do not include a summary, a heading, numbering or any other text.";

#[async_trait]
pub trait ConceptExtractor: Send + Sync {
    /// Returns the search concepts for `text`, in the order the model gave them.
    async fn extract(&self, text: &str) -> Result<Vec<String>>;
}

/// Splits a model reply of the form `concept one, concept two, concept three`.
///
/// The reply is split on `", "` only; a bare comma stays inside its concept. Each
/// concept is trimmed and empty pieces are dropped, so an empty reply yields no
/// concepts. Quotes are not interpreted.
pub fn parse_concepts(reply: &str) -> Vec<String> {
    reply
        .split(CONCEPT_SEPARATOR)
        .map(str::trim)
        .filter(|concept| !concept.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn build_extraction_messages(query_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT.to_string()),
        ChatMessage::user(format!(
            "Here is the user input: {}. Return only the concepts to query, separated by \
             a comma. Do not add labels such as 'concepts to query' or 'relevant queries'. \
             Do not put quotation marks around the concepts.",
            query_text
        )),
    ]
}

pub struct OpenAiConceptExtractor {
    chat: OpenAiChatClient,
}

impl OpenAiConceptExtractor {
    pub fn new(chat: OpenAiChatClient) -> Self {
        Self { chat }
    }

    pub fn from_config(cfg: &OpenAiConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .as_ref()
            .context("OPENAI_API_KEY is required for concept extraction")?;
        let chat = OpenAiChatClient::new(ModelConfig {
            api_key: api_key.expose().to_string(),
            base_url: cfg.base_url.clone(),
            model: cfg.chat_model.clone(),
        })?;
        Ok(Self::new(chat))
    }
}

/// Offline extractor for development: the query text itself, split like a model reply.
#[derive(Debug, Default)]
pub struct PassthroughConceptExtractor;

#[async_trait]
impl ConceptExtractor for PassthroughConceptExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<String>> {
        Ok(parse_concepts(text))
    }
}

#[async_trait]
impl ConceptExtractor for OpenAiConceptExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<String>> {
        let reply = self
            .chat
            .complete(build_extraction_messages(text))
            .await
            .context("Concept extraction failed")?;

        let concepts = parse_concepts(&reply);
        debug!(
            "Extracted {} concepts with {}: {:?}",
            concepts.len(),
            self.chat.model(),
            concepts
        );
        Ok(concepts)
    }
}
