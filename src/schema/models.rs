use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GraphKind {
    Graph,
    Tree,
    Flowchart,
    Hierarchy,
    LogicalFlow,
    Storyboard,
}

impl GraphKind {
    pub const ALL: [GraphKind; 6] = [
        GraphKind::Graph,
        GraphKind::Tree,
        GraphKind::Flowchart,
        GraphKind::Hierarchy,
        GraphKind::LogicalFlow,
        GraphKind::Storyboard,
    ];

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl Default for GraphKind {
    fn default() -> Self {
        Self::Graph
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NarrativeRole {
    Central,
    Supporting,
    Contextual,
    Outcome,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogicalRole {
    Premise,
    Inference,
    Conclusion,
    Evidence,
    Objection,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoryRole {
    Scene,
    Event,
    Conflict,
    Resolution,
}

/// A concept in the graph. Role tags are independent; only the one matching the graph kind is meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    pub label: String,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    #[serde(default, deserialize_with = "lenient_role", skip_serializing_if = "Option::is_none")]
    pub narrative_role: Option<NarrativeRole>,

    #[serde(default, deserialize_with = "lenient_role", skip_serializing_if = "Option::is_none")]
    pub logical_role: Option<LogicalRole>,

    #[serde(default, deserialize_with = "lenient_role", skip_serializing_if = "Option::is_none")]
    pub story_role: Option<StoryRole>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            details: None,
            weight: None,
            theme: None,
            narrative_role: None,
            logical_role: None,
            story_role: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Clamped to the 0.0..=1.0 range the schema allows.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight.clamp(0.0, 1.0));
        self
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,

    pub target: String,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub edge_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: None,
            edge_type: None,
            strength: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength.clamp(0.0, 1.0));
        self
    }
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub concepts: Vec<String>,

    #[serde(default, deserialize_with = "lenient_strings")]
    pub relationships: Vec<String>,
}

impl GraphMetadata {
    /// Human-readable summaries: node labels, and `source -> target: label` per edge.
    pub fn derive(nodes: &[Node], edges: &[Edge]) -> Self {
        let label_of = |id: &str| {
            nodes
                .iter()
                .find(|n| n.id == id)
                .map(|n| n.label.clone())
                .unwrap_or_else(|| id.to_string())
        };

        let relationships = edges
            .iter()
            .map(|e| {
                let base = format!("{} -> {}", label_of(&e.source), label_of(&e.target));
                match &e.label {
                    Some(label) => format!("{base}: {label}"),
                    None => base,
                }
            })
            .collect();

        Self {
            concepts: nodes.iter().map(|n| n.label.clone()).collect(),
            relationships,
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationGraph {
    pub kind: GraphKind,

    pub title: String,

    pub description: String,

    pub nodes: Vec<Node>,

    pub edges: Vec<Edge>,

    pub metadata: GraphMetadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_options: Option<serde_json::Value>,
}

impl VisualizationGraph {
    /// Assembles a graph and derives its metadata from the nodes and edges.
    pub fn build(
        kind: GraphKind,
        title: impl Into<String>,
        description: impl Into<String>,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Self {
        let metadata = GraphMetadata::derive(&nodes, &edges);
        Self {
            kind,
            title: title.into(),
            description: description.into(),
            nodes,
            edges,
            metadata,
            render_options: None,
        }
    }


    pub fn empty() -> Self {
        Self::build(
            GraphKind::Graph,
            "Empty input",
            "No text was provided for extraction.",
            Vec::new(),
            Vec::new(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

// Model output decorates nodes and edges loosely. An optional field whose value
// is not of its declared type reads as absent; nothing is converted.

fn lenient_role<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => T::from_str(&s).ok(),
        _ => None,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}
