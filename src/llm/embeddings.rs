use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use crate::core::config::ConceptMapConfig;


#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Expected {expected} embeddings, got {got}")]
    CountMismatch { expected: usize, got: usize },

    #[error("Provider not implemented: {0}")]
    NotImplemented(String),

    #[error("Embedding model configuration error: {0}")]
    Config(String),
}

/// One vector per input sentence, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn model_name(&self) -> &str;
}


#[async_trait]
pub trait EmbedderLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Embedder>, EmbeddingError>;
}

/// Lazily loaded embedding model. Concurrent first callers share one in-flight load.
pub struct ModelSlot {
    cell: OnceCell<Arc<dyn Embedder>>,
}

impl ModelSlot {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// A failed load leaves the slot empty so a later call can try again.
    pub async fn get_or_load(
        &self,
        loader: &dyn EmbedderLoader,
    ) -> Result<Arc<dyn Embedder>, EmbeddingError> {
        let model = self
            .cell
            .get_or_try_init(|| async {
                let model = loader.load().await?;
                info!("Embedding model loaded: {}", model.model_name());
                Ok::<_, EmbeddingError>(model)
            })
            .await?;
        Ok(Arc::clone(model))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

impl Default for ModelSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide embedding model, loaded on first semantic extraction and kept for the process lifetime.
pub static SHARED_MODEL: ModelSlot = ModelSlot::new();


#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

fn parse_embeddings(provider: &str, body: &str) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    match provider {
        "ollama" => Ok(serde_json::from_str::<OllamaEmbedResponse>(body)?.embeddings),
        "openai" => {
            let mut data = serde_json::from_str::<OpenAIEmbeddingResponse>(body)?.data;
            data.sort_by_key(|d| d.index);
            Ok(data.into_iter().map(|d| d.embedding).collect())
        }
        other => Err(EmbeddingError::NotImplemented(other.to_string())),
    }
}


pub struct EmbeddingGenerator {
    provider: String,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl EmbeddingGenerator {

    pub fn from_config(config: &ConceptMapConfig) -> Result<Self, EmbeddingError> {
        let endpoint = config
            .embedding_endpoint()
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        info!(
            "EmbeddingGenerator initialized: provider={}, model={}, endpoint={}",
            config.embedding_provider, config.embedding_model, endpoint
        );

        Ok(Self {
            provider: config.embedding_provider.to_lowercase(),
            endpoint,
            model: config.embedding_model.clone(),
            api_key: config.embedding_api_key.clone(),
            client,
        })
    }


    pub fn provider(&self) -> &str {
        &self.provider
    }
}

#[async_trait]
impl Embedder for EmbeddingGenerator {
    async fn embed(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if sentences.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Embedding {} sentences via {} ({})",
            sentences.len(),
            self.provider,
            self.model
        );

        let request = EmbedRequest {
            model: &self.model,
            input: sentences,
        };

        let mut builder = self.client.post(self.endpoint.clone()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let body = builder
            .send()
            .await?
            .error_for_status()
            .map_err(EmbeddingError::Http)?
            .text()
            .await?;

        let embeddings = parse_embeddings(&self.provider, &body)?;
        if embeddings.len() != sentences.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: sentences.len(),
                got: embeddings.len(),
            });
        }

        Ok(embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Builds the HTTP embedding client from configuration on first use.
pub struct HttpEmbedderLoader {
    config: ConceptMapConfig,
}

impl HttpEmbedderLoader {
    pub fn new(config: ConceptMapConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EmbedderLoader for HttpEmbedderLoader {
    async fn load(&self) -> Result<Arc<dyn Embedder>, EmbeddingError> {
        let generator = EmbeddingGenerator::from_config(&self.config)?;
        Ok(Arc::new(generator))
    }
}
