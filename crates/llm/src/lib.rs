pub mod concepts;
pub mod models;
pub mod openai;

pub use concepts::{
    parse_concepts, ConceptExtractor, OpenAiConceptExtractor, PassthroughConceptExtractor,
};
pub use models::{ChatMessage, ModelConfig};
pub use openai::OpenAiChatClient;
