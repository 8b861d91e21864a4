

pub mod embeddings;
pub mod extractor;
pub mod factory;
pub mod prompt;
pub mod providers;

pub use embeddings::{
    Embedder, EmbedderLoader, EmbeddingError, EmbeddingGenerator, HttpEmbedderLoader, ModelSlot,
    SHARED_MODEL,
};
pub use extractor::LlmExtractor;
pub use factory::LlmProviderFactory;
pub use prompt::{build_system_prompt, build_user_prompt};
pub use providers::{ChatCompletionsProvider, LlmMetadata, LlmProvider, LlmProviderError};
