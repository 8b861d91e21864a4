use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::text::{fallback_node, is_stopword, node_id, split_sentences, tokenize};
use super::ConceptExtractor;
use crate::core::error::Result;
use crate::llm::embeddings::{EmbedderLoader, EmbeddingError, ModelSlot, SHARED_MODEL};
use crate::schema::models::{Edge, GraphKind, Node, VisualizationGraph};
use crate::MAX_NODES;

const EDGE_SIMILARITY: f64 = 0.5;
const HIGH_SIMILARITY: f64 = 0.7;
const HIERARCHY_SHARE: f64 = 0.5;
const CHAIN_SIMILARITY: f64 = 0.5;
const CHAIN_SHARE: f64 = 0.7;
const MAX_PHRASE_WORDS: usize = 3;
const MIN_WORD_CHARS: usize = 3;


pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Pairwise cosine similarity; the diagonal is fixed at 1.
pub fn similarity_matrix(embeddings: &[Vec<f32>]) -> Vec<Vec<f64>> {
    let n = embeddings.len();
    let mut matrix = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let sim = cosine_similarity(&embeddings[i], &embeddings[j]);
            matrix[i][j] = sim;
            matrix[j][i] = sim;
        }
    }
    matrix
}

/// Mostly near-duplicate sentences read as a hierarchy, a strong adjacent-sentence chain as a flowchart.
pub fn classify_similarity(matrix: &[Vec<f64>]) -> GraphKind {
    let n = matrix.len();
    let adjacent = n.saturating_sub(1);

    let mut high_sim_count = 0usize;
    let mut pair_count = 0usize;
    for (i, row) in matrix.iter().enumerate() {
        for (j, &sim) in row.iter().enumerate() {
            if i == j {
                continue;
            }
            pair_count += 1;
            if sim > HIGH_SIMILARITY {
                high_sim_count += 1;
            }
        }
    }

    if high_sim_count as f64 > HIERARCHY_SHARE * pair_count as f64 {
        return GraphKind::Hierarchy;
    }

    let chain = (0..adjacent)
        .filter(|&i| matrix[i][i + 1] > CHAIN_SIMILARITY)
        .count();
    debug!(
        "Similarity classification: high={}/{}, chain={}/{}",
        high_sim_count,
        pair_count,
        chain,
        adjacent
    );

    if chain as f64 >= CHAIN_SHARE * adjacent as f64 {
        GraphKind::Flowchart
    } else {
        GraphKind::Graph
    }
}

/// Runs of non-stopword words, cut into pieces of at most three words.
pub fn simple_noun_phrases(sentence: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut run: Vec<String> = Vec::new();

    let mut flush = |run: &mut Vec<String>| {
        for chunk in run.chunks(MAX_PHRASE_WORDS) {
            phrases.push(chunk.join(" "));
        }
        run.clear();
    };

    for word in tokenize(sentence) {
        let salient = word.chars().count() >= MIN_WORD_CHARS
            && !word.chars().all(|c| c.is_ascii_digit())
            && !is_stopword(&word);
        if salient {
            run.push(word);
        } else {
            flush(&mut run);
        }
    }
    flush(&mut run);

    phrases
}

/// Best similarity between distinct sentences mentioning each candidate, if any such pair exists.
fn max_cross_similarity(
    matrix: &[Vec<f64>],
    a: &BTreeSet<usize>,
    b: &BTreeSet<usize>,
) -> Option<f64> {
    a.iter()
        .flat_map(|&i| b.iter().filter(move |&&j| j != i).map(move |&j| matrix[i][j]))
        .fold(None, |best, sim| match best {
            Some(current) if current >= sim => Some(current),
            _ => Some(sim),
        })
}


pub struct SemanticExtractor {
    slot: &'static ModelSlot,
    loader: Arc<dyn EmbedderLoader>,
    max_nodes: usize,
}

impl SemanticExtractor {
    /// Uses the process-wide model slot.
    pub fn new(loader: Arc<dyn EmbedderLoader>) -> Self {
        Self::with_slot(&SHARED_MODEL, loader)
    }


    pub fn with_slot(slot: &'static ModelSlot, loader: Arc<dyn EmbedderLoader>) -> Self {
        Self {
            slot,
            loader,
            max_nodes: MAX_NODES,
        }
    }

    async fn build_graph(&self, text: &str) -> Result<VisualizationGraph> {
        let sentences: Vec<String> = split_sentences(text)
            .into_iter()
            .map(str::to_string)
            .collect();

        if sentences.is_empty() {
            let node = fallback_node(text);
            return Ok(VisualizationGraph::build(
                GraphKind::Graph,
                node.label.clone(),
                "Semantic graph of 0 sentences",
                vec![node],
                Vec::new(),
            ));
        }

        let model = self.slot.get_or_load(self.loader.as_ref()).await?;
        let embeddings = model.embed(&sentences).await?;
        if embeddings.len() != sentences.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: sentences.len(),
                got: embeddings.len(),
            }
            .into());
        }

        let matrix = similarity_matrix(&embeddings);

        let mut order: Vec<String> = Vec::new();
        let mut mentions: HashMap<String, BTreeSet<usize>> = HashMap::new();
        for (idx, sentence) in sentences.iter().enumerate() {
            for phrase in simple_noun_phrases(sentence) {
                if !mentions.contains_key(&phrase) {
                    order.push(phrase.clone());
                }
                mentions.entry(phrase).or_default().insert(idx);
            }
        }

        debug!(
            "Semantic: {} sentences, {} candidate phrases",
            sentences.len(),
            order.len()
        );

        let kind = classify_similarity(&matrix);

        if order.is_empty() {
            let node = fallback_node(text);
            return Ok(VisualizationGraph::build(
                kind,
                node.label.clone(),
                format!("Semantic graph of {} sentences", sentences.len()),
                vec![node],
                Vec::new(),
            ));
        }

        let mut ranked: Vec<(&str, &BTreeSet<usize>)> = order
            .iter()
            .filter_map(|p| mentions.get(p).map(|s| (p.as_str(), s)))
            .collect();
        ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        ranked.truncate(self.max_nodes);

        let max_mentions = ranked.first().map(|(_, s)| s.len()).unwrap_or(1).max(1) as f64;
        let nodes: Vec<Node> = ranked
            .iter()
            .enumerate()
            .map(|(i, (label, sentences))| {
                Node::new(node_id(i), *label)
                    .with_details(format!("mentioned in {} sentences", sentences.len()))
                    .with_weight(sentences.len() as f64 / max_mentions)
            })
            .collect();

        let mut edges = Vec::new();
        for (i, (_, a)) in ranked.iter().enumerate() {
            for (j, (_, b)) in ranked.iter().enumerate().skip(i + 1) {
                let co_occurs = !a.is_disjoint(b);
                let similarity = max_cross_similarity(&matrix, a, b);

                if co_occurs {
                    edges.push(
                        Edge::new(node_id(i), node_id(j))
                            .with_label("co-occurs")
                            .with_strength(1.0),
                    );
                } else if let Some(sim) = similarity.filter(|&s| s >= EDGE_SIMILARITY) {
                    edges.push(
                        Edge::new(node_id(i), node_id(j))
                            .with_label(format!("similarity: {sim:.2}"))
                            .with_strength(sim),
                    );
                }
            }
        }

        let title = ranked
            .iter()
            .take(3)
            .map(|(label, _)| *label)
            .collect::<Vec<_>>()
            .join(", ");

        info!(
            "Semantic extracted {} nodes, {} edges, kind={}",
            nodes.len(),
            edges.len(),
            kind
        );

        Ok(VisualizationGraph::build(
            kind,
            title,
            format!("Semantic graph of {} sentences", sentences.len()),
            nodes,
            edges,
        ))
    }
}

#[async_trait]
impl ConceptExtractor for SemanticExtractor {
    async fn extract(&self, text: &str, _variant: Option<GraphKind>) -> Result<VisualizationGraph> {
        if text.trim().is_empty() {
            return Ok(VisualizationGraph::empty());
        }
        self.build_graph(text).await
    }

    fn strategy_name(&self) -> &str {
        "semantic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ConceptMapError;
    use crate::llm::embeddings::Embedder;

    struct FixedEmbedder {
        vectors: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _sentences: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(self.vectors.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct FixedLoader(Arc<dyn Embedder>);

    #[async_trait]
    impl EmbedderLoader for FixedLoader {
        async fn load(&self) -> std::result::Result<Arc<dyn Embedder>, EmbeddingError> {
            Ok(Arc::clone(&self.0))
        }
    }

    fn extractor_with(vectors: Vec<Vec<f32>>) -> (SemanticExtractor, &'static ModelSlot) {
        let slot: &'static ModelSlot = Box::leak(Box::new(ModelSlot::new()));
        let loader = Arc::new(FixedLoader(Arc::new(FixedEmbedder { vectors })));
        (SemanticExtractor::with_slot(slot, loader), slot)
    }

    fn angle(degrees: f32) -> Vec<f32> {
        let r = degrees.to_radians();
        vec![r.cos(), r.sin()]
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_identical_sentences_classify_as_hierarchy() {
        let matrix = similarity_matrix(&vec![vec![0.3, 0.4, 0.5]; 4]);
        assert_eq!(classify_similarity(&matrix), GraphKind::Hierarchy);
    }

    #[test]
    fn test_adjacent_chain_classifies_as_flowchart() {
        let matrix = similarity_matrix(&[angle(0.0), angle(50.0), angle(100.0), angle(150.0)]);
        assert!(matrix[0][1] > 0.5 && matrix[1][2] > 0.5 && matrix[2][3] > 0.5);
        assert!(matrix[0][2] <= 0.5 && matrix[1][3] <= 0.5 && matrix[0][3] <= 0.5);
        assert_eq!(classify_similarity(&matrix), GraphKind::Flowchart);
    }

    #[test]
    fn test_unrelated_sentences_classify_as_graph() {
        let matrix = similarity_matrix(&[
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ]);
        assert_eq!(classify_similarity(&matrix), GraphKind::Graph);
    }

    #[test]
    fn test_single_sentence_is_a_trivial_chain() {
        // no pairs to count and zero of zero adjacent links satisfies the chain share
        let matrix = similarity_matrix(&[vec![1.0, 0.0]]);
        assert_eq!(classify_similarity(&matrix), GraphKind::Flowchart);
    }

    #[test]
    fn test_simple_noun_phrases() {
        assert_eq!(
            simple_noun_phrases("The mitochondria is the powerhouse of the cell."),
            vec!["mitochondria", "powerhouse", "cell"]
        );
        assert_eq!(
            simple_noun_phrases("Quantum field theory renormalization methods in 1970."),
            vec!["quantum field theory", "renormalization methods"]
        );
    }

    #[tokio::test]
    async fn test_edges_from_co_occurrence_and_similarity() {
        let (extractor, _) = extractor_with(vec![
            vec![1.0, 0.0],
            vec![0.8, 0.6],
            vec![0.0, 1.0],
        ]);

        let graph = extractor
            .extract(
                "Plants need sunlight and water. Sunlight is in the leaves. Roots take in water.",
                None,
            )
            .await
            .unwrap();

        let labels: Vec<&str> = graph.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["sunlight", "water", "plants", "leaves", "roots"]);
        assert_eq!(graph.nodes[0].details.as_deref(), Some("mentioned in 2 sentences"));
        assert_eq!(graph.nodes[2].weight, Some(0.5));

        let edge = |s: &str, t: &str| {
            graph
                .edges
                .iter()
                .find(|e| e.source == s && e.target == t)
                .and_then(|e| e.label.clone())
        };
        assert_eq!(edge("n0", "n1").as_deref(), Some("co-occurs"));
        assert_eq!(edge("n1", "n3").as_deref(), Some("similarity: 0.80"));
        assert_eq!(edge("n0", "n4").as_deref(), Some("similarity: 0.60"));
        assert_eq!(edge("n2", "n4"), None);
        assert_eq!(graph.edges.len(), 9);
        assert_eq!(graph.kind, GraphKind::Flowchart);
    }

    #[tokio::test]
    async fn test_identical_sentences_extract_as_hierarchy() {
        let (extractor, _) = extractor_with(vec![vec![0.2, 0.9]; 3]);
        let graph = extractor
            .extract("Cats purr loudly. Cats purr loudly. Cats purr loudly.", None)
            .await
            .unwrap();
        assert_eq!(graph.kind, GraphKind::Hierarchy);
        assert_eq!(graph.nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_embedding_count_mismatch_is_an_error() {
        let (extractor, _) = extractor_with(vec![vec![1.0, 0.0]]);
        let err = extractor
            .extract("First sentence here. Second sentence here.", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConceptMapError::Embedding(EmbeddingError::CountMismatch { expected: 2, got: 1 })
        ));
    }

    #[tokio::test]
    async fn test_empty_input_never_loads_model() {
        let (extractor, slot) = extractor_with(Vec::new());
        for input in ["", "   "] {
            let graph = extractor.extract(input, None).await.unwrap();
            assert!(graph.nodes.is_empty());
            assert!(graph.edges.is_empty());
        }
        assert!(!slot.is_loaded());
    }
}
