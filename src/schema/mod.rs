pub mod models;
pub mod validator;

pub use models::{
    Edge, GraphKind, GraphMetadata, LogicalRole, NarrativeRole, Node, StoryRole,
    VisualizationGraph,
};
pub use validator::{parse_graph, strip_code_fence, EdgeEndpoint, SchemaError};
