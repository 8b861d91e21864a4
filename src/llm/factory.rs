

use std::sync::Arc;

use tracing::info;

use super::providers::base::LlmProvider;
use super::providers::openai::ChatCompletionsProvider;
use crate::core::config::ConceptMapConfig;
use crate::core::error::{ConceptMapError, Result};


pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Supported: openai, cerebras, ollama. Hosted providers require an API key.
    pub fn create(config: &ConceptMapConfig) -> Result<Arc<dyn LlmProvider>> {
        let provider = config.llm_provider.to_lowercase();
        let endpoint = config.llm_endpoint()?;

        let api_key = match (provider.as_str(), &config.llm_api_key) {
            ("ollama", key) => key.clone(),
            (_, Some(key)) if !key.trim().is_empty() => Some(key.clone()),
            (other, _) => {
                return Err(ConceptMapError::Config(format!(
                    "LLM provider '{other}' requires an API key (CONCEPTMAP_LLM_API_KEY)"
                )));
            }
        };

        info!("Creating LLM provider: {} ({})", provider, config.llm_model);

        let provider = ChatCompletionsProvider::new(
            provider,
            endpoint,
            api_key,
            config.llm_model.clone(),
            config.llm_temperature,
            config.timeout,
        )?;

        Ok(Arc::new(provider))
    }
}
