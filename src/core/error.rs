

use thiserror::Error;

use crate::llm::embeddings::EmbeddingError;
use crate::llm::providers::base::LlmProviderError;
use crate::schema::validator::SchemaError;


#[derive(Error, Debug)]
pub enum ConceptMapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema validation error: {0}")]
    Schema(#[from] SchemaError),

    #[error("LLM provider error: {0}")]
    LlmProvider(#[from] LlmProviderError),

    #[error("Embedding generation error: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl From<config::ConfigError> for ConceptMapError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}


pub type Result<T> = std::result::Result<T, ConceptMapError>;
