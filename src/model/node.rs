//! Category node of a diversity graph.

use serde::{Deserialize, Serialize};

/// Position of a node inside its graph (insertion order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A counted category (word type, species, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: NodeId,
    /// Vocabulary key used to resolve an embedding. Not required for
    /// count-only measures.
    pub key: Option<String>,
    /// Absolute abundance, always >= 1.
    pub count: u64,
    /// `count / total`, meaningful only once the graph is finalized.
    pub proportion: f64,
}

impl CategoryNode {
    pub fn new(id: NodeId, count: u64) -> Self {
        Self {
            id,
            key: None,
            count,
            proportion: 0.0,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}
