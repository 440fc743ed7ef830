//! Tagweave: a weighted hashtag co-occurrence graph
//!
//! Users submit pairs of hashtags. Each tag is normalized (canonical form,
//! grammar check, fuzzy merge into an existing label) and the pair is
//! recorded as two weighted nodes joined by a weighted, undirected edge.
//!
//! # Core Concepts
//!
//! - **Labels**: canonical `#lowercase` hashtags, the identity of a node
//! - **Nodes**: topics whose weight counts how often they were submitted
//! - **Edges**: unordered label pairs whose weight counts co-occurrences
//! - **Normalization**: near-duplicates (`#startup` vs `#startups`) collapse
//!   into the label already in the graph
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tagweave::{CommitOutcome, GraphStore, MemoryStore, TopicGraph};
//!
//! let graph = TopicGraph::new(Arc::new(MemoryStore::new()));
//! graph.commit_pair("Berlin", "startups").unwrap();
//!
//! // "startup" merges into the existing "#startups"
//! let outcome = graph.commit_pair("berlin", "startup").unwrap();
//! assert!(matches!(outcome, CommitOutcome::Committed { .. }));
//!
//! let edge = graph.store().find_edge("#startups", "#berlin").unwrap().unwrap();
//! assert_eq!(edge.weight, 2);
//! ```

pub mod api;
pub mod config;
mod graph;
pub mod normalize;
pub mod storage;

pub use api::{
    ApiError, ApiResult, Command, CommandOutcome, CommitOutcome, SkipReason, TopicGraph, DEMO_PAIRS,
};
pub use config::{Config, ConfigError};
pub use graph::{
    node_size, pair_key, Edge, EdgeView, GraphView, Label, Node, NodeView, Upsert,
    NODE_SIZE_EXPONENT, NODE_SIZE_SCALE,
};
pub use normalize::{LabelError, LabelNormalizer, DEFAULT_SIMILARITY_THRESHOLD};
pub use storage::{
    GraphStore, MemoryStore, OpenStore, SqliteStore, StorageError, StorageResult, StoreSnapshot,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
