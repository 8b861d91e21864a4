

use crate::schema::models::GraphKind;


const SCHEMA_SHAPE: &str = r#"{
  "kind": "<KIND>",
  "title": "short title",
  "description": "one or two sentence summary",
  "nodes": [
    {
      "id": "unique_id",
      "label": "Concept name",
      "details": "optional longer explanation",
      "weight": 0.8,
      "theme": "optional cluster name"
    }
  ],
  "edges": [
    {
      "source": "node_id",
      "target": "node_id",
      "label": "short relation phrase",
      "type": "relation category",
      "strength": 0.7
    }
  ],
  "metadata": {
    "concepts": ["key concept"],
    "relationships": ["concept A -> concept B"]
  }
}"#;

const SHARED_RULES: &str = r#"Rules:
- Respond with a single JSON object and nothing else.
- Every node id must be unique.
- Every edge source and target must be the id of a node in "nodes".
- "nodes" must not be empty. "edges" may be empty.
- "weight" and "strength" are numbers between 0.0 and 1.0."#;

const CONCEPT_REQUIREMENTS: &str = r#"Node requirements:
- Optionally set "narrativeRole" to one of: central, supporting, contextual, outcome.
- Exactly one or two nodes should be "central".

Allowed edge "type" values: relates-to, causes, part-of, precedes, is-a, example-of.

Structure guidance for the requested kind:
- graph: a web of related concepts.
- tree: a single root with is-a / example-of children.
- flowchart: ordered steps connected by precedes edges.
- hierarchy: containers connected to their parts by part-of edges."#;

const LOGICAL_FLOW_REQUIREMENTS: &str = r#"Node requirements:
- Every node MUST have "logicalRole" set to one of: premise, inference, conclusion, evidence, objection.
- Include at least one premise and at least one conclusion.

Allowed edge "type" values: supports, contradicts, derives, qualifies.
- supports: evidence or premise backing another claim.
- contradicts: an objection against a claim.
- derives: an inference drawn from its premises.
- qualifies: a condition that limits a claim."#;

const STORYBOARD_REQUIREMENTS: &str = r#"Node requirements:
- Every node MUST have "storyRole" set to one of: scene, event, conflict, resolution.
- Use "theme" as the lane name: nodes in the same lane (a character, place or thread) share the same theme.
- Order nodes chronologically.

Allowed edge "type" values: leads-to, causes, foreshadows, resolves."#;

/// System instructions for the requested graph kind.
pub fn build_system_prompt(variant: GraphKind) -> String {
    let (intro, requirements) = match variant {
        GraphKind::LogicalFlow => (
            "You are an argument analyst. Break the text into its logical structure: premises, evidence, inferences, objections and conclusions.",
            LOGICAL_FLOW_REQUIREMENTS,
        ),
        GraphKind::Storyboard => (
            "You are a storyboard editor. Turn the text into scenes and events arranged in parallel lanes.",
            STORYBOARD_REQUIREMENTS,
        ),
        GraphKind::Graph | GraphKind::Tree | GraphKind::Flowchart | GraphKind::Hierarchy => (
            "You are a concept mapping system. Extract the key concepts of the text and the relationships between them.",
            CONCEPT_REQUIREMENTS,
        ),
    };

    let shape = SCHEMA_SHAPE.replace("<KIND>", variant.as_str());

    format!(
        "{intro}\n\nOutput JSON with this structure:\n{shape}\n\nSet \"kind\" to \"{kind}\".\n\n{requirements}\n\n{SHARED_RULES}",
        kind = variant.as_str(),
    )
}


pub fn build_user_prompt(text: &str, variant: GraphKind) -> String {
    format!(
        "Create a {} visualization of the following text:\n\n{}",
        variant.as_str(),
        text
    )
}
