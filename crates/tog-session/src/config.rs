//! Session configuration
//!
//! Inert settings read once when a prompt is submitted. The backend (graph
//! database, agent provider) interprets them; the session only carries them
//! for diagnostics.

use serde::{Deserialize, Serialize};

/// Knowledge-graph backend choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphDb {
    /// Local Neo4j instance
    Neo4j,
    /// Public Wikidata endpoint
    Wikidata,
}

/// Reasoning-agent provider choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentProvider {
    /// Local Ollama model
    Ollama,
    /// Hosted Google model
    Google,
}

/// Settings for one reasoning session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Agent provider
    pub agent_provider: AgentProvider,
    /// Model name passed to the provider
    pub model: String,
    /// Graph database backend
    pub graph_db: GraphDb,
    /// Maximum parallel exploration paths
    pub max_paths: u32,
    /// Maximum exploration depth
    pub max_depth: u32,
    /// Whether the agent keeps conversational context between calls
    pub use_context: bool,
    /// Fallback seed entity identifiers when lookup finds none
    pub seed_entity_ids: Vec<String>,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With model name
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// With exploration bounds
    #[inline]
    #[must_use]
    pub fn with_bounds(mut self, max_paths: u32, max_depth: u32) -> Self {
        self.max_paths = max_paths;
        self.max_depth = max_depth;
        self
    }

    /// With graph backend
    #[inline]
    #[must_use]
    pub fn with_graph_db(mut self, graph_db: GraphDb) -> Self {
        self.graph_db = graph_db;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            agent_provider: AgentProvider::Ollama,
            model: "llama3.2:3b-instruct-fp16".to_string(),
            graph_db: GraphDb::Neo4j,
            max_paths: 3,
            max_depth: 3,
            use_context: true,
            seed_entity_ids: vec!["fc381815-5b9e-465f-bd9c-8240724dcb0a".to_string()],
        }
    }
}
