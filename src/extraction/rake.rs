use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use tracing::{debug, info};

use super::text::{candidate_phrases, fallback_node, node_id, split_sentences, tokenize};
use super::ConceptExtractor;
use crate::core::error::Result;
use crate::schema::models::{Edge, GraphKind, Node, VisualizationGraph};
use crate::MAX_NODES;


#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPhrase {
    pub phrase: String,
    pub score: f64,
}

/// Word statistics over every candidate phrase occurrence in the corpus.
#[derive(Debug, Default)]
struct WordStats {
    frequency: HashMap<String, f64>,
    degree: HashMap<String, f64>,
}

impl WordStats {
    fn collect(phrases: &[Vec<String>]) -> Self {
        let mut stats = Self::default();
        for phrase in phrases {
            let co_words = (phrase.len() - 1) as f64;
            for word in phrase {
                *stats.frequency.entry(word.clone()).or_insert(0.0) += 1.0;
                *stats.degree.entry(word.clone()).or_insert(0.0) += co_words;
            }
        }
        stats
    }

    fn word_score(&self, word: &str) -> f64 {
        let freq = self.frequency.get(word).copied().unwrap_or(0.0);
        if freq == 0.0 {
            return 0.0;
        }
        let degree = self.degree.get(word).copied().unwrap_or(0.0);
        (degree + freq) / freq
    }
}

/// Ranks distinct phrases by summed `(degree + frequency) / frequency`; ties keep first appearance.
pub fn score_phrases(sentence_phrases: &[Vec<Vec<String>>]) -> Vec<ScoredPhrase> {
    let all: Vec<Vec<String>> = sentence_phrases.iter().flatten().cloned().collect();
    let stats = WordStats::collect(&all);

    let mut seen = BTreeSet::new();
    let mut scored = Vec::new();
    for words in &all {
        let phrase = words.join(" ");
        if !seen.insert(phrase.clone()) {
            continue;
        }
        let score = words.iter().map(|w| stats.word_score(w)).sum();
        scored.push(ScoredPhrase { phrase, score });
    }

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}


pub struct RakeExtractor {
    max_nodes: usize,
}

impl RakeExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_nodes: MAX_NODES,
        }
    }


    pub fn build_graph(&self, text: &str) -> VisualizationGraph {
        if text.trim().is_empty() {
            return VisualizationGraph::empty();
        }

        let sentences = split_sentences(text);
        let sentence_phrases: Vec<Vec<Vec<String>>> = sentences
            .iter()
            .map(|s| candidate_phrases(&tokenize(s)))
            .collect();

        let ranked = score_phrases(&sentence_phrases);
        debug!(
            "RAKE: {} sentences, {} distinct candidate phrases",
            sentences.len(),
            ranked.len()
        );

        if ranked.is_empty() {
            let node = fallback_node(text);
            return VisualizationGraph::build(
                GraphKind::Graph,
                node.label.clone(),
                format!("Keyword graph of {} sentences", sentences.len()),
                vec![node],
                Vec::new(),
            );
        }

        let retained: Vec<&ScoredPhrase> = ranked.iter().take(self.max_nodes).collect();
        let max_score = retained
            .iter()
            .map(|p| p.score)
            .fold(f64::MIN, f64::max)
            .max(f64::EPSILON);

        let index_of: HashMap<&str, usize> = retained
            .iter()
            .enumerate()
            .map(|(i, p)| (p.phrase.as_str(), i))
            .collect();

        let nodes: Vec<Node> = retained
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Node::new(node_id(i), p.phrase.clone())
                    .with_details(format!("RAKE score: {:.2}", p.score))
                    .with_weight(p.score / max_score)
            })
            .collect();

        let mut co_occurrence: BTreeMap<(usize, usize), u32> = BTreeMap::new();
        for phrases in &sentence_phrases {
            let present: BTreeSet<usize> = phrases
                .iter()
                .filter_map(|words| index_of.get(words.join(" ").as_str()).copied())
                .collect();
            let present: Vec<usize> = present.into_iter().collect();
            for (pos, &a) in present.iter().enumerate() {
                for &b in &present[pos + 1..] {
                    *co_occurrence.entry((a, b)).or_insert(0) += 1;
                }
            }
        }

        let max_count = co_occurrence.values().copied().max().unwrap_or(1) as f64;
        let edges: Vec<Edge> = co_occurrence
            .into_iter()
            .map(|((a, b), count)| {
                Edge::new(node_id(a), node_id(b))
                    .with_label(count.to_string())
                    .with_strength(count as f64 / max_count)
            })
            .collect();

        let title = retained
            .iter()
            .take(3)
            .map(|p| p.phrase.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        info!(
            "RAKE extracted {} nodes, {} edges",
            nodes.len(),
            edges.len()
        );

        VisualizationGraph::build(
            GraphKind::Graph,
            title,
            format!("Keyword graph of {} sentences", sentences.len()),
            nodes,
            edges,
        )
    }
}

impl Default for RakeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConceptExtractor for RakeExtractor {
    async fn extract(&self, text: &str, _variant: Option<GraphKind>) -> Result<VisualizationGraph> {
        Ok(self.build_graph(text))
    }

    fn strategy_name(&self) -> &str {
        "rake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases_of(text: &str) -> Vec<Vec<Vec<String>>> {
        split_sentences(text)
            .iter()
            .map(|s| candidate_phrases(&tokenize(s)))
            .collect()
    }

    #[test]
    fn test_single_sentence_scores() {
        let scored = score_phrases(&phrases_of("Criminal minds study aberrant behavior."));
        assert_eq!(scored.len(), 2);

        // each word: frequency 1, degree 1 -> (1 + 1) / 1 = 2, two words per phrase
        let criminal = scored.iter().find(|p| p.phrase == "criminal minds").unwrap();
        let aberrant = scored.iter().find(|p| p.phrase == "aberrant behavior").unwrap();
        assert_eq!(criminal.score, 4.0);
        assert_eq!(aberrant.score, 4.0);
    }

    #[test]
    fn test_shared_words_across_sentences() {
        let scored = score_phrases(&phrases_of(
            "Deep learning models. Learning rates matter.",
        ));
        // learning: frequency 2, degree 4 -> 3; every other word: frequency 1, degree 2 -> 3
        assert_eq!(scored[0].phrase, "deep learning models");
        assert_eq!(scored[0].score, 9.0);
        assert_eq!(scored[1].phrase, "learning rates matter");
        assert_eq!(scored[1].score, 9.0);
    }

    #[test]
    fn test_longer_phrases_rank_higher() {
        let scored = score_phrases(&phrases_of("Memory. Long term potentiation."));
        assert_eq!(scored[0].phrase, "long term potentiation");
        assert_eq!(scored[0].score, 9.0);
        assert_eq!(scored[1].score, 1.0);
    }

    #[test]
    fn test_graph_with_co_occurrence_edges() {
        let graph = RakeExtractor::new().build_graph(
            "Gradient descent and neural networks. Neural networks and gradient descent. Backpropagation.",
        );

        assert_eq!(graph.kind, GraphKind::Graph);
        let labels: Vec<&str> = graph.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["gradient descent", "neural networks", "backpropagation"]);
        assert_eq!(graph.title, "gradient descent, neural networks, backpropagation");
        assert_eq!(graph.description, "Keyword graph of 3 sentences");
        assert_eq!(graph.nodes[0].details.as_deref(), Some("RAKE score: 4.00"));
        assert_eq!(graph.nodes[0].weight, Some(1.0));
        assert_eq!(graph.nodes[2].weight, Some(0.25));

        assert_eq!(graph.edges.len(), 1);
        let edge = &graph.edges[0];
        assert_eq!((edge.source.as_str(), edge.target.as_str()), ("n0", "n1"));
        assert_eq!(edge.label.as_deref(), Some("2"));
        assert_eq!(edge.strength, Some(1.0));
        assert_eq!(graph.metadata.relationships, vec!["gradient descent -> neural networks: 2"]);
    }

    #[test]
    fn test_node_cap_keeps_highest_scoring() {
        let text: String = (0..15)
            .map(|i| format!("Long{i}a long{i}b long{i}c. Short{i}. "))
            .collect();

        let graph = RakeExtractor::new().build_graph(&text);
        assert_eq!(graph.nodes.len(), 15);
        assert!(graph.nodes.iter().all(|n| n.label.starts_with("long")));
        assert!(graph
            .nodes
            .iter()
            .all(|n| n.details.as_deref() == Some("RAKE score: 9.00")));
    }

    #[test]
    fn test_stopword_only_text_yields_fallback_node() {
        let graph = RakeExtractor::new().build_graph("It is what it is.");
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_extract_matches_build_graph() {
        let extractor = RakeExtractor::new();
        let text = "Criminal minds study aberrant behavior. Aberrant behavior puzzles investigators.";
        let graph = tokio_test::block_on(extractor.extract(text, Some(GraphKind::Storyboard))).unwrap();
        assert_eq!(graph, extractor.build_graph(text));
        assert_eq!(graph.kind, GraphKind::Graph);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let extractor = RakeExtractor::new();
        for input in ["", "   ", "\n\t"] {
            let graph = extractor.extract(input, None).await.unwrap();
            assert!(graph.nodes.is_empty());
            assert!(graph.edges.is_empty());
        }
    }
}
