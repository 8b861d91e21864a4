use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::models::{GraphKind, VisualizationGraph};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEndpoint {
    Source,
    Target,
}

impl fmt::Display for EdgeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}


#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("edge {index} has dangling {endpoint} reference `{id}`")]
    DanglingEdge {
        index: usize,
        endpoint: EdgeEndpoint,
        id: String,
    },

    #[error("graph does not match the schema: {0}")]
    Shape(String),
}

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"```[A-Za-z0-9_-]*[ \t]*\r?\n?([\s\S]*?)```").expect("code fence pattern is valid");
}

/// Strips surrounding whitespace and, when present, the markdown code fence around a payload.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match CODE_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Parses untrusted model output into a validated graph, failing on the first violation.
pub fn parse_graph(raw: &str) -> Result<VisualizationGraph, SchemaError> {
    let payload = strip_code_fence(raw);

    let value: Value =
        serde_json::from_str(payload).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;

    let object = value.as_object().ok_or_else(|| {
        SchemaError::InvalidJson("top-level value is not an object".to_string())
    })?;

    validate_fields(object)?;

    let graph: VisualizationGraph =
        serde_json::from_value(value).map_err(|e| SchemaError::Shape(e.to_string()))?;

    validate_references(&graph)?;

    debug!(
        "Validated graph: kind={}, nodes={}, edges={}",
        graph.kind,
        graph.nodes.len(),
        graph.edges.len()
    );

    Ok(graph)
}

fn validate_fields(object: &Map<String, Value>) -> Result<(), SchemaError> {
    let kind = object.get("kind").ok_or(SchemaError::MissingField("kind"))?;
    let kind = kind.as_str().ok_or_else(|| SchemaError::InvalidField {
        field: "kind",
        reason: "expected a string".to_string(),
    })?;
    if GraphKind::from_str(kind).is_err() {
        let allowed: Vec<&str> = GraphKind::ALL.iter().map(GraphKind::as_str).collect();
        return Err(SchemaError::InvalidField {
            field: "kind",
            reason: format!("`{kind}` is not one of {}", allowed.join(", ")),
        });
    }

    require_non_empty_string(object, "title")?;
    require_non_empty_string(object, "description")?;

    let nodes = object.get("nodes").ok_or(SchemaError::MissingField("nodes"))?;
    let nodes = nodes.as_array().ok_or_else(|| SchemaError::InvalidField {
        field: "nodes",
        reason: "expected an array".to_string(),
    })?;
    if nodes.is_empty() {
        return Err(SchemaError::InvalidField {
            field: "nodes",
            reason: "must contain at least one node".to_string(),
        });
    }

    let edges = object.get("edges").ok_or(SchemaError::MissingField("edges"))?;
    if !edges.is_array() {
        return Err(SchemaError::InvalidField {
            field: "edges",
            reason: "expected an array".to_string(),
        });
    }

    let metadata = object
        .get("metadata")
        .ok_or(SchemaError::MissingField("metadata"))?;
    if !metadata.is_object() {
        return Err(SchemaError::InvalidField {
            field: "metadata",
            reason: "expected an object".to_string(),
        });
    }

    Ok(())
}

fn require_non_empty_string(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<(), SchemaError> {
    let value = object.get(field).ok_or(SchemaError::MissingField(field))?;
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(()),
        Some(_) => Err(SchemaError::InvalidField {
            field,
            reason: "must not be empty".to_string(),
        }),
        None => Err(SchemaError::InvalidField {
            field,
            reason: "expected a string".to_string(),
        }),
    }
}

fn validate_references(graph: &VisualizationGraph) -> Result<(), SchemaError> {
    let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();

    for (index, edge) in graph.edges.iter().enumerate() {
        for (endpoint, id) in [
            (EdgeEndpoint::Source, &edge.source),
            (EdgeEndpoint::Target, &edge.target),
        ] {
            if !ids.contains(id.as_str()) {
                warn!("Edge {} references unknown {} node '{}'", index, endpoint, id);
                return Err(SchemaError::DanglingEdge {
                    index,
                    endpoint,
                    id: id.clone(),
                });
            }
        }
    }

    Ok(())
}
