//! Common test utilities for tagweave integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use tagweave::{GraphStore, MemoryStore, OpenStore, SqliteStore, TopicGraph};
use tempfile::TempDir;

/// A file-backed SQLite store that lives as long as its temp dir
pub struct TempStore {
    pub dir: TempDir,
    pub path: PathBuf,
    pub store: Arc<SqliteStore>,
}

impl TempStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("topics.db");
        let store = Arc::new(SqliteStore::open(&path).expect("open sqlite store"));
        Self { dir, path, store }
    }

    pub fn graph(&self) -> TopicGraph {
        TopicGraph::new(self.store.clone())
    }

    /// Open a second connection to the same file
    pub fn reopen(&self) -> SqliteStore {
        SqliteStore::open(&self.path).expect("reopen sqlite store")
    }
}

pub fn memory_graph() -> TopicGraph {
    TopicGraph::new(Arc::new(MemoryStore::new()))
}

pub fn sqlite_graph() -> TopicGraph {
    TopicGraph::new(Arc::new(SqliteStore::open_in_memory().expect("open in-memory store")))
}

/// Create each label as a node with weight 1
pub fn seed_nodes(store: &dyn GraphStore, labels: &[&str]) {
    for label in labels {
        store.upsert_node(label, 1).expect("seed node");
    }
}

/// `(source, target, weight)` for every listed edge
pub fn edge_triples(store: &dyn GraphStore) -> Vec<(String, String, u32)> {
    store
        .list_edges()
        .expect("list edges")
        .into_iter()
        .map(|e| (e.source.into_string(), e.target.into_string(), e.weight))
        .collect()
}
