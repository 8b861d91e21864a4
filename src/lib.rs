pub mod core;
pub mod extraction;
pub mod llm;
pub mod schema;
pub mod utils;

pub use utils::{content_fingerprint, safe_truncate, safe_truncate_ellipsis};

pub use core::config::ConceptMapConfig;
pub use core::error::{ConceptMapError, Result};
pub use extraction::{create_extractor, ConceptExtractor, Strategy};
pub use schema::models::{Edge, GraphKind, GraphMetadata, Node, VisualizationGraph};
pub use schema::validator::{parse_graph, SchemaError};


pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";


pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";


pub const DEFAULT_CEREBRAS_URL: &str = "https://api.cerebras.ai/v1";


pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";


pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Upper bound on nodes emitted by the algorithmic strategies.
pub const MAX_NODES: usize = 15;
