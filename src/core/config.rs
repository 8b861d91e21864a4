use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{ConceptMapError, Result};
use crate::{
    DEFAULT_CEREBRAS_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_LLM_MODEL, DEFAULT_OLLAMA_URL,
    DEFAULT_OPENAI_URL,
};


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConceptMapConfig {

    pub llm_provider: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_temperature: f64,
    pub timeout: u64,


    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_url: String,
    pub embedding_api_key: Option<String>,
}

impl ConceptMapConfig {
    /// Layers defaults, an optional TOML file and `CONCEPTMAP_*` environment variables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        let config = builder
            .add_source(Environment::with_prefix("CONCEPTMAP").try_parsing(true))
            .build()?
            .try_deserialize::<Self>()?;
        Ok(config)
    }


    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }


    pub fn llm_api_base(&self) -> Result<Url> {
        let base = match (&self.llm_base_url, self.llm_provider.to_lowercase().as_str()) {
            (Some(url), _) => url.clone(),
            (None, "openai") => DEFAULT_OPENAI_URL.to_string(),
            (None, "cerebras") => DEFAULT_CEREBRAS_URL.to_string(),
            (None, "ollama") => format!("{DEFAULT_OLLAMA_URL}/v1"),
            (None, other) => {
                return Err(ConceptMapError::Config(format!(
                    "Unknown LLM provider: {other}. Supported: openai, cerebras, ollama"
                )));
            }
        };
        parse_base(&base)
    }

    /// Full chat-completions URL for the configured provider.
    pub fn llm_endpoint(&self) -> Result<Url> {
        join_endpoint(&self.llm_api_base()?, "chat/completions")
    }


    pub fn embedding_endpoint(&self) -> Result<Url> {
        let base = parse_base(&self.embedding_url)?;
        match self.embedding_provider.to_lowercase().as_str() {
            "ollama" => join_endpoint(&base, "api/embed"),
            "openai" => join_endpoint(&base, "embeddings"),
            other => Err(ConceptMapError::Config(format!(
                "Unknown embedding provider: {other}. Supported: ollama, openai"
            ))),
        }
    }
}

impl Default for ConceptMapConfig {
    fn default() -> Self {
        Self {
            llm_provider: "openai".to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_api_key: None,
            llm_base_url: None,
            llm_temperature: 0.3,
            timeout: 30,

            embedding_provider: "ollama".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_url: DEFAULT_OLLAMA_URL.to_string(),
            embedding_api_key: None,
        }
    }
}

// Url::join drops the last path segment unless the base ends with '/'.
fn parse_base(raw: &str) -> Result<Url> {
    let normalized = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalized)
        .map_err(|e| ConceptMapError::Config(format!("Invalid base URL '{raw}': {e}")))
}

fn join_endpoint(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| ConceptMapError::Config(format!("Invalid endpoint path '{path}': {e}")))
}
