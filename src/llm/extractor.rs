

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::prompt::{build_system_prompt, build_user_prompt};
use super::providers::base::{LlmProvider, LlmProviderError};
use crate::core::error::Result;
use crate::extraction::ConceptExtractor;
use crate::schema::models::{GraphKind, VisualizationGraph};
use crate::schema::validator::parse_graph;

/// Model-backed strategy: prompt, call the provider, validate whatever comes back.
pub struct LlmExtractor<P: LlmProvider> {
    provider: P,
}

impl<P: LlmProvider> LlmExtractor<P> {

    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }


    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: LlmProvider> ConceptExtractor for LlmExtractor<P> {
    async fn extract(&self, text: &str, variant: Option<GraphKind>) -> Result<VisualizationGraph> {
        if text.trim().is_empty() {
            return Ok(VisualizationGraph::empty());
        }

        let variant = variant.unwrap_or_default();
        info!(
            "Extracting {} graph via {}: {}...",
            variant,
            self.provider.provider_name(),
            crate::safe_truncate(text, 50)
        );

        let system_prompt = build_system_prompt(variant);
        let user_prompt = build_user_prompt(text, variant);

        let (response, metadata) = self
            .provider
            .generate(&system_prompt, &user_prompt, Some("json_object"))
            .await?;

        if response.trim().is_empty() {
            return Err(LlmProviderError::EmptyContent.into());
        }

        debug!(
            "Model replied with {} chars (tokens={:?})",
            response.len(),
            metadata.tokens_total
        );

        let graph = parse_graph(&response).map_err(|e| {
            warn!("Rejected model output: {}", e);
            warn!("Response was: {}", crate::safe_truncate(&response, 200));
            e
        })?;

        if graph.kind != variant {
            debug!("Requested {} but model returned {}", variant, graph.kind);
        }

        info!(
            "LLM extracted {} nodes, {} edges, kind={}",
            graph.nodes.len(),
            graph.edges.len(),
            graph.kind
        );

        Ok(graph)
    }

    fn strategy_name(&self) -> &str {
        "llm"
    }
}
