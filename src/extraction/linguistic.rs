use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use tracing::{debug, info};

use super::text::{fallback_node, is_stopword, node_id, split_sentences, tokenize};
use super::ConceptExtractor;
use crate::core::error::Result;
use crate::schema::models::{Edge, GraphKind, Node, VisualizationGraph};
use crate::MAX_NODES;

const DEFAULT_RELATION: &str = "relates to";
const SIGNAL_THRESHOLD: usize = 2;
const CROSS_SENTENCE_RATIO: f64 = 0.3;

lazy_static! {
    static ref SEQUENTIAL_SIGNALS: Vec<&'static str> = vec![
        "then", "next", "finally", "after that", "subsequently", "followed by", "step",
    ];

    static ref CONTAINMENT_SIGNALS: Vec<&'static str> = vec![
        "includes", "consists of", "contains", "comprises", "composed of", "made up of",
        "is part of",
    ];

    static ref IS_A_SIGNALS: Vec<&'static str> = vec![
        "is a", "is an", "are a", "type of", "kind of", "example of", "category of",
    ];

    static ref VERB_LEXICON: HashSet<&'static str> = [
        "is", "are", "was", "were", "be", "been", "has", "have", "had", "add", "adds",
        "include", "includes", "contain", "contains", "consist", "consists", "comprise",
        "comprises", "cause", "causes", "lead", "leads", "produce", "produces", "create",
        "creates", "form", "forms", "require", "requires", "enable", "enables", "transmit",
        "transmits", "connect", "connects", "affect", "affects", "support", "supports",
        "depend", "depends", "become", "becomes", "make", "makes", "use", "uses", "show",
        "shows", "drive", "drives", "control", "controls", "convert", "converts", "store",
        "stores", "send", "sends", "receive", "receives", "release", "releases", "bind",
        "binds", "trigger", "triggers", "regulate", "regulates", "increase", "increases",
        "decrease", "decreases", "reduce", "reduces", "improve", "improves", "allow",
        "allows", "provide", "provides", "describe", "describes", "explain", "explains",
        "represent", "represents", "determine", "determines", "influence", "influences",
        "generate", "generates", "heat", "heats", "pour", "pours", "wait", "waits", "mix",
        "mixes", "follow", "follows", "feed", "feeds", "absorb", "absorbs",
    ]
    .into_iter()
    .collect();
}


#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaggedSentence {
    pub nouns: Vec<String>,
    pub verbs: Vec<String>,
}

/// Shallow grammatical tagging: noun and verb phrases of one sentence, in textual order.
pub trait PhraseTagger: Send + Sync {
    fn tag(&self, sentence: &str) -> TaggedSentence;
}

/// Lexicon and suffix based tagger; noun phrases are runs of words that are neither stopwords nor verbs.
#[derive(Debug, Default, Clone)]
pub struct HeuristicTagger;

impl HeuristicTagger {
    fn is_verb(word: &str) -> bool {
        VERB_LEXICON.contains(word)
            || (word.len() > 4 && word.ends_with("ed") && !word.ends_with("eed"))
    }
}

impl PhraseTagger for HeuristicTagger {
    fn tag(&self, sentence: &str) -> TaggedSentence {
        let mut tagged = TaggedSentence::default();
        let mut current: Vec<String> = Vec::new();

        let flush = |current: &mut Vec<String>, nouns: &mut Vec<String>| {
            if !current.is_empty() {
                nouns.push(current.join(" "));
                current.clear();
            }
        };

        for word in tokenize(sentence) {
            if Self::is_verb(&word) {
                flush(&mut current, &mut tagged.nouns);
                tagged.verbs.push(word);
            } else if is_stopword(&word) {
                flush(&mut current, &mut tagged.nouns);
            } else {
                current.push(word);
            }
        }
        flush(&mut current, &mut tagged.nouns);

        tagged
    }
}


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalCounts {
    pub sequential: usize,
    pub containment: usize,
    pub is_a: usize,
}

impl SignalCounts {
    pub fn scan(text: &str) -> Self {
        let lower = text.to_lowercase();
        let hits = |signals: &[&str]| signals.iter().filter(|s| lower.contains(**s)).count();
        Self {
            sequential: hits(SEQUENTIAL_SIGNALS.as_slice()),
            containment: hits(CONTAINMENT_SIGNALS.as_slice()),
            is_a: hits(IS_A_SIGNALS.as_slice()),
        }
    }
}

/// Picks the graph kind from signal words, then from how connected the retained nouns are.
#[allow(clippy::if_same_then_else)]
pub fn classify_kind(text: &str, multi_sentence_nodes: usize, edge_count: usize) -> GraphKind {
    let signals = SignalCounts::scan(text);
    debug!("Linguistic signals: {:?}", signals);

    if signals.sequential >= SIGNAL_THRESHOLD {
        return GraphKind::Flowchart;
    }
    if signals.containment >= SIGNAL_THRESHOLD {
        return GraphKind::Hierarchy;
    }
    if signals.is_a >= SIGNAL_THRESHOLD {
        return GraphKind::Tree;
    }

    // Both branches resolve to a plain graph; the ratio is kept for diagnostics.
    let ratio = if edge_count == 0 {
        0.0
    } else {
        multi_sentence_nodes as f64 / edge_count as f64
    };
    if ratio > CROSS_SENTENCE_RATIO {
        debug!("Cross-sentence ratio {:.2} above {}", ratio, CROSS_SENTENCE_RATIO);
        GraphKind::Graph
    } else {
        GraphKind::Graph
    }
}

struct Mention {
    label: String,
    count: usize,
    sentences: BTreeSet<usize>,
}


pub struct LinguisticExtractor {
    tagger: Arc<dyn PhraseTagger>,
    max_nodes: usize,
}

impl LinguisticExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_tagger(Arc::new(HeuristicTagger))
    }


    pub fn with_tagger(tagger: Arc<dyn PhraseTagger>) -> Self {
        Self {
            tagger,
            max_nodes: MAX_NODES,
        }
    }


    pub fn build_graph(&self, text: &str) -> VisualizationGraph {
        if text.trim().is_empty() {
            return VisualizationGraph::empty();
        }

        let sentences = split_sentences(text);
        let tagged: Vec<TaggedSentence> = sentences
            .iter()
            .map(|s| {
                let mut t = self.tagger.tag(s);
                t.nouns = t.nouns.iter().map(|n| n.trim().to_lowercase()).collect();
                t.nouns.retain(|n| !n.is_empty());
                t
            })
            .collect();

        let mut order: Vec<String> = Vec::new();
        let mut mentions: HashMap<String, Mention> = HashMap::new();
        for (idx, sentence) in tagged.iter().enumerate() {
            for noun in &sentence.nouns {
                let entry = mentions.entry(noun.clone()).or_insert_with(|| {
                    order.push(noun.clone());
                    Mention {
                        label: noun.clone(),
                        count: 0,
                        sentences: BTreeSet::new(),
                    }
                });
                entry.count += 1;
                entry.sentences.insert(idx);
            }
        }

        debug!(
            "Linguistic: {} sentences, {} distinct noun phrases",
            sentences.len(),
            order.len()
        );

        if order.is_empty() {
            let node = fallback_node(text);
            return VisualizationGraph::build(
                GraphKind::Graph,
                node.label.clone(),
                format!("Concept graph of {} sentences", sentences.len()),
                vec![node],
                Vec::new(),
            );
        }

        // stable sort keeps first-mention order among equal counts
        let mut ranked: Vec<&Mention> = order.iter().filter_map(|n| mentions.get(n)).collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(self.max_nodes);

        let max_count = ranked.first().map(|m| m.count).unwrap_or(1).max(1) as f64;
        let index_of: HashMap<&str, usize> = ranked
            .iter()
            .enumerate()
            .map(|(i, m)| (m.label.as_str(), i))
            .collect();

        let nodes: Vec<Node> = ranked
            .iter()
            .enumerate()
            .map(|(i, m)| {
                Node::new(node_id(i), m.label.clone())
                    .with_details(format!("{} mentions", m.count))
                    .with_weight(m.count as f64 / max_count)
            })
            .collect();

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut edges = Vec::new();
        for sentence in &tagged {
            let relation = sentence
                .verbs
                .first()
                .map(String::as_str)
                .unwrap_or(DEFAULT_RELATION);
            let retained: Vec<usize> = sentence
                .nouns
                .iter()
                .filter_map(|n| index_of.get(n.as_str()).copied())
                .collect();

            for pair in retained.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if a == b || !seen.insert((a.min(b), a.max(b))) {
                    continue;
                }
                edges.push(Edge::new(node_id(a), node_id(b)).with_label(relation));
            }
        }

        let multi_sentence = ranked.iter().filter(|m| m.sentences.len() > 1).count();
        let kind = classify_kind(text, multi_sentence, edges.len());

        let title = ranked
            .iter()
            .take(3)
            .map(|m| m.label.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        info!(
            "Linguistic extracted {} nodes, {} edges, kind={}",
            nodes.len(),
            edges.len(),
            kind
        );

        VisualizationGraph::build(
            kind,
            title,
            format!("Concept graph of {} sentences", sentences.len()),
            nodes,
            edges,
        )
    }
}

impl Default for LinguisticExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConceptExtractor for LinguisticExtractor {
    async fn extract(&self, text: &str, _variant: Option<GraphKind>) -> Result<VisualizationGraph> {
        Ok(self.build_graph(text))
    }

    fn strategy_name(&self) -> &str {
        "linguistic"
    }
}
