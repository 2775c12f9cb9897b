//! tog-graph - Graph projection and selection validation
//!
//! Pure, recomputable views over a [`tog_trace::Trace`]:
//! - [`projector::project`] derives the deduplicated knowledge graph with
//!   highlight state (candidates vs. confirmed selections)
//! - [`validator::hallucinated_selections`] cross-checks an agent selection
//!   against the candidates it was offered

pub mod projector;
pub mod validator;

pub use projector::{project, Edge, KnowledgeGraph, Node};
pub use validator::hallucinated_selections;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
