//! Storage trait definitions

use crate::graph::{Edge, Node, Upsert};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An edge referenced a label with no node behind it
    #[error("Referential integrity violation: node not found: {0}")]
    MissingNode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Every node and edge, captured in one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub taken_at: DateTime<Utc>,
    /// Sorted by label
    pub nodes: Vec<Node>,
    /// Sorted by source label, then creation order
    pub edges: Vec<Edge>,
}

impl StoreSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            taken_at: Utc::now(),
            nodes,
            edges,
        }
    }
}

/// Trait for topic graph storage backends
///
/// Every method runs in its own transaction: it either applies completely
/// or not at all. Edge lookups (`edge_exists`, `find_edge`, `upsert_edge`)
/// match the label pair in either order; `delete_edge` matches the stored
/// `(source, target)` order exactly.
///
/// Implementations must be thread-safe (Send + Sync); they serialize
/// transactions internally.
pub trait GraphStore: Send + Sync {
    // === Node Operations ===

    /// Create the node with `initial_weight`, or add 1 to an existing node's
    /// weight. The increment is always 1, whatever `initial_weight` is.
    fn upsert_node(&self, label: &str, initial_weight: u32) -> StorageResult<Upsert<Node>>;

    /// Load a node by label
    fn find_node(&self, label: &str) -> StorageResult<Option<Node>>;

    /// Delete a node and every edge touching it. Missing labels are not an error.
    fn delete_node(&self, label: &str) -> StorageResult<bool>;

    /// All nodes, ascending by label
    fn list_nodes(&self) -> StorageResult<Vec<Node>>;

    /// Delete every node (and so every edge). Returns the number of nodes removed.
    fn delete_all_nodes(&self) -> StorageResult<usize>;

    // === Edge Operations ===

    /// True if an edge joins `a` and `b` in either order
    fn edge_exists(&self, a: &str, b: &str) -> StorageResult<bool>;

    /// Load the edge joining `a` and `b` in either order
    fn find_edge(&self, a: &str, b: &str) -> StorageResult<Option<Edge>>;

    /// Create the edge `(a, b)` with `weight_delta`, or add `weight_delta` to
    /// the existing edge between them.
    ///
    /// Creation fails with [`StorageError::MissingNode`] unless both labels
    /// exist as nodes. An increment that cannot be applied is logged and
    /// reported as [`Upsert::Skipped`].
    fn upsert_edge(&self, a: &str, b: &str, weight_delta: u32) -> StorageResult<Upsert<Edge>>;

    /// All edges, ascending by stored source label, ties in creation order
    fn list_edges(&self) -> StorageResult<Vec<Edge>>;

    /// Delete the edge stored exactly as `(source, target)`.
    /// Returns the number of edges removed; reversed order removes nothing.
    fn delete_edge(&self, source: &str, target: &str) -> StorageResult<usize>;

    /// Edges with `label` as source or target, in `list_edges` order
    fn edges_touching(&self, label: &str) -> StorageResult<Vec<Edge>>;

    // === Snapshot ===

    /// Nodes and edges read in a single transaction
    fn snapshot(&self) -> StorageResult<StoreSnapshot>;

    /// Labels of all nodes, ascending
    fn labels(&self) -> StorageResult<Vec<String>> {
        Ok(self
            .list_nodes()?
            .into_iter()
            .map(|n| n.label.into_string())
            .collect())
    }
}

/// Extension trait for opening stores from paths
pub trait OpenStore: GraphStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

/// Weight stored on a newly created record; stored weights are never below 1
pub(crate) fn creation_weight(requested: u32) -> u32 {
    requested.max(1)
}
