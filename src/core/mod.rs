pub mod config;
pub mod error;

pub use config::ConceptMapConfig;
pub use error::{ConceptMapError, Result};
