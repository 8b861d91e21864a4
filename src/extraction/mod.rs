pub mod linguistic;
pub mod rake;
pub mod semantic;
pub mod text;

use std::sync::Arc;

use async_trait::async_trait;
use strum::{EnumString, IntoStaticStr};
use tracing::info;

use crate::core::config::ConceptMapConfig;
use crate::core::error::Result;
use crate::llm::embeddings::HttpEmbedderLoader;
use crate::llm::extractor::LlmExtractor;
use crate::llm::factory::LlmProviderFactory;
use crate::schema::models::{GraphKind, VisualizationGraph};

pub use linguistic::{HeuristicTagger, LinguisticExtractor, PhraseTagger, TaggedSentence};
pub use rake::RakeExtractor;
pub use semantic::SemanticExtractor;

/// Text in, validated concept graph out.
///
/// Empty or whitespace-only input yields [`VisualizationGraph::empty`] and never fails.
/// `variant` is only honored by the model-backed strategy; the algorithmic strategies
/// infer the kind from the text.
#[async_trait]
pub trait ConceptExtractor: Send + Sync {
    async fn extract(&self, text: &str, variant: Option<GraphKind>) -> Result<VisualizationGraph>;

    fn strategy_name(&self) -> &str;
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Strategy {
    Rake,
    Linguistic,
    Semantic,
    Llm,
}


pub fn create_extractor(
    strategy: Strategy,
    config: &ConceptMapConfig,
) -> Result<Box<dyn ConceptExtractor>> {
    let name: &'static str = strategy.into();
    info!("Creating {} extractor", name);

    let extractor: Box<dyn ConceptExtractor> = match strategy {
        Strategy::Rake => Box::new(RakeExtractor::new()),
        Strategy::Linguistic => Box::new(LinguisticExtractor::new()),
        Strategy::Semantic => Box::new(SemanticExtractor::new(Arc::new(
            HttpEmbedderLoader::new(config.clone()),
        ))),
        Strategy::Llm => Box::new(LlmExtractor::new(LlmProviderFactory::create(config)?)),
    };

    Ok(extractor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::embeddings::{Embedder, EmbedderLoader, EmbeddingError, ModelSlot};
    use crate::llm::providers::base::{LlmMetadata, LlmProvider, LlmProviderError};
    use crate::schema::validator::{parse_graph, SchemaError};
    use std::str::FromStr;

    const SAMPLE: &str = "Photosynthesis converts sunlight into chemical energy. \
        Chlorophyll in the leaves absorbs sunlight. \
        Then the plant stores chemical energy as glucose. \
        Next, cellular respiration releases chemical energy from glucose. \
        Finally, the plant uses energy for growth.";

    struct HashEmbedder;

    #[async_trait]
    impl Embedder for HashEmbedder {
        async fn embed(
            &self,
            sentences: &[String],
        ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(sentences
                .iter()
                .map(|s| {
                    let mut v = vec![0.0_f32; 8];
                    for (i, b) in s.bytes().enumerate() {
                        v[(i + b as usize) % 8] += 1.0;
                    }
                    v
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "hash"
        }
    }

    struct HashLoader;

    #[async_trait]
    impl EmbedderLoader for HashLoader {
        async fn load(&self) -> std::result::Result<Arc<dyn Embedder>, EmbeddingError> {
            Ok(Arc::new(HashEmbedder))
        }
    }

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _response_format: Option<&str>,
        ) -> std::result::Result<(String, LlmMetadata), LlmProviderError> {
            let graph = RakeExtractor::new().build_graph(SAMPLE);
            Ok((serde_json::to_string(&graph)?, LlmMetadata::default()))
        }

        fn provider_name(&self) -> &str {
            "echo"
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn all_strategies() -> Vec<Box<dyn ConceptExtractor>> {
        let slot: &'static ModelSlot = Box::leak(Box::new(ModelSlot::new()));
        vec![
            Box::new(RakeExtractor::new()),
            Box::new(LinguisticExtractor::new()),
            Box::new(SemanticExtractor::with_slot(slot, Arc::new(HashLoader))),
            Box::new(LlmExtractor::new(EchoProvider)),
        ]
    }

    #[tokio::test]
    async fn test_every_strategy_returns_empty_graph_for_blank_input() {
        for extractor in all_strategies() {
            for input in ["", "   "] {
                let graph = extractor.extract(input, None).await.unwrap();
                assert!(graph.nodes.is_empty(), "{}", extractor.strategy_name());
                assert!(graph.edges.is_empty(), "{}", extractor.strategy_name());
                assert_eq!(graph.title, "Empty input");
            }
        }
    }

    #[tokio::test]
    async fn test_generated_graphs_round_trip_through_validator() {
        for extractor in all_strategies() {
            let graph = extractor.extract(SAMPLE, None).await.unwrap();
            assert!(!graph.nodes.is_empty(), "{}", extractor.strategy_name());
            assert!(graph.nodes.len() <= crate::MAX_NODES);

            let json = serde_json::to_string(&graph).unwrap();
            let reparsed = parse_graph(&json).unwrap();
            assert_eq!(reparsed, graph, "{}", extractor.strategy_name());
        }
    }

    #[tokio::test]
    async fn test_generated_edges_reference_existing_nodes() {
        for extractor in all_strategies() {
            let graph = extractor.extract(SAMPLE, None).await.unwrap();
            for edge in &graph.edges {
                assert!(graph.node(&edge.source).is_some());
                assert!(graph.node(&edge.target).is_some());
                assert_ne!(edge.source, edge.target);
            }
        }
    }

    #[tokio::test]
    async fn test_validator_rejects_tampered_graph() {
        let mut graph = RakeExtractor::new().build_graph(SAMPLE);
        assert!(!graph.edges.is_empty());
        graph.edges[0].target = "n99".to_string();

        let json = serde_json::to_string(&graph).unwrap();
        assert!(matches!(
            parse_graph(&json),
            Err(SchemaError::DanglingEdge { .. })
        ));
    }

    #[tokio::test]
    async fn test_sample_is_flowchart_for_linguistic() {
        let graph = LinguisticExtractor::new().extract(SAMPLE, None).await.unwrap();
        assert_eq!(graph.kind, GraphKind::Flowchart);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(Strategy::from_str("rake").unwrap(), Strategy::Rake);
        assert_eq!(Strategy::from_str("Semantic").unwrap(), Strategy::Semantic);
        assert!(Strategy::from_str("tfidf").is_err());
    }

    #[test]
    fn test_create_extractor() {
        let config = ConceptMapConfig::default();
        for (strategy, name) in [
            (Strategy::Rake, "rake"),
            (Strategy::Linguistic, "linguistic"),
            (Strategy::Semantic, "semantic"),
        ] {
            assert_eq!(create_extractor(strategy, &config).unwrap().strategy_name(), name);
        }

        // default provider is hosted and no key is configured
        assert!(create_extractor(Strategy::Llm, &config).is_err());

        let config = ConceptMapConfig {
            llm_provider: "ollama".to_string(),
            ..Default::default()
        };
        assert_eq!(
            create_extractor(Strategy::Llm, &config).unwrap().strategy_name(),
            "llm"
        );
    }
}
