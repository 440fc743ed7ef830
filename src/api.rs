//! Transport-independent command layer.
//!
//! `TopicGraph` is the single entry point for front-ends (CLI, web, TUI).
//! Front-ends submit a [`Command`] or call the matching method; they never
//! normalize labels or sequence store calls themselves.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::graph::{Edge, GraphView, Label, Node, Upsert};
use crate::normalize::{canonicalize, LabelError, LabelNormalizer};
use crate::storage::{GraphStore, StorageError, StoreSnapshot};

/// Tag pairs committed by [`Command::LoadDemo`]
pub const DEMO_PAIRS: &[(&str, &str)] = &[
    ("dataengineer", "startups"),
    ("berlin", "dataengineer"),
    ("berlin", "startups"),
    ("digitalproducts", "digitaltransformation"),
    ("digitalproducts", "#crypto"),
    ("#diGitAltransformation", "#crypto"),
    ("marketing", "advertising"),
    ("marketing", "berlin"),
    ("berlin", "beer"),
    ("dbu", "beer"),
    ("startup", "berlin"),
    ("crypto", "startup"),
    ("datascience", "dateengineering"),
    ("dataanalytics", "marketing"),
    ("learning", "DBU"),
    ("datascience", "pentest"),
    ("pentest", "cybersecurity"),
    ("cybersecurity", "dbu"),
    ("beer", "marekting"),
    ("career", "datascience"),
    ("career", "money"),
    ("crypto", "bitcoin"),
    ("startup", "bitcoin"),
    ("erfolg", "dbu"),
    ("dbu", "studium"),
    ("studium", "freunde"),
    ("freunde", "dbu"),
    ("dataegnineer", "databases"),
    ("python", "databases"),
    ("pentest", "databases"),
    ("socialmedia", "marketing"),
    ("advertising", "socialmedia"),
    ("abtesting", "advertising"),
    ("digitalproducts", "crypto"),
    ("crypto", "money"),
];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Operations any front-end can invoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Normalize two raw tags and link them
    CreatePair { a: String, b: String },
    /// Add one to a node's weight (creating it if needed)
    LikeNode { label: String },
    /// Add one to an edge's weight
    LikeEdge { source: String, target: String },
    DeleteNode { label: String },
    /// Delete the edge stored exactly as `(source, target)`
    DeleteEdge { source: String, target: String },
    ResetAll,
    /// Reset, then commit [`DEMO_PAIRS`]
    LoadDemo,
}

/// Why a pair commit changed nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// One or both inputs failed the hashtag grammar
    Rejected(Vec<LabelError>),
    /// Both inputs normalized to the same label
    SameLabel(Label),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed {
        source: Label,
        target: Label,
        edge: Upsert<Edge>,
    },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Commit(CommitOutcome),
    NodeLiked(Upsert<Node>),
    EdgeLiked(Upsert<Edge>),
    NodeDeleted {
        label: Label,
        removed: bool,
    },
    EdgeDeleted {
        source: Label,
        target: Label,
        removed: usize,
    },
    Reset {
        nodes: usize,
    },
    DemoLoaded {
        committed: usize,
    },
}

/// Single entry point for all front-end operations
#[derive(Clone)]
pub struct TopicGraph {
    store: Arc<dyn GraphStore>,
    normalizer: LabelNormalizer,
}

impl TopicGraph {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self::with_normalizer(store, LabelNormalizer::new())
    }

    pub fn with_normalizer(store: Arc<dyn GraphStore>, normalizer: LabelNormalizer) -> Self {
        Self { store, normalizer }
    }

    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }

    pub fn normalizer(&self) -> &LabelNormalizer {
        &self.normalizer
    }

    pub fn execute(&self, command: Command) -> ApiResult<CommandOutcome> {
        debug!(?command, "executing command");
        Ok(match command {
            Command::CreatePair { a, b } => CommandOutcome::Commit(self.commit_pair(&a, &b)?),
            Command::LikeNode { label } => CommandOutcome::NodeLiked(self.like_node(&label)?),
            Command::LikeEdge { source, target } => {
                CommandOutcome::EdgeLiked(self.like_edge(&source, &target)?)
            }
            Command::DeleteNode { label } => {
                let label = Label::from(canonicalize(&label));
                let removed = self.store.delete_node(label.as_str())?;
                CommandOutcome::NodeDeleted { label, removed }
            }
            Command::DeleteEdge { source, target } => {
                let source = Label::from(canonicalize(&source));
                let target = Label::from(canonicalize(&target));
                let removed = self.store.delete_edge(source.as_str(), target.as_str())?;
                CommandOutcome::EdgeDeleted {
                    source,
                    target,
                    removed,
                }
            }
            Command::ResetAll => CommandOutcome::Reset {
                nodes: self.reset_all()?,
            },
            Command::LoadDemo => CommandOutcome::DemoLoaded {
                committed: self.load_demo()?,
            },
        })
    }

    // --- Write ---

    /// Normalize both inputs and link them.
    ///
    /// Labels are snapshotted once, before either input is normalized. Nodes
    /// are upserted and committed before the edge step runs in its own
    /// transaction; a failure in between leaves two nodes and no edge.
    pub fn commit_pair(&self, raw_a: &str, raw_b: &str) -> ApiResult<CommitOutcome> {
        let labels = self.store.labels()?;
        let a = self.normalizer.normalize(raw_a, &labels);
        let b = self.normalizer.normalize(raw_b, &labels);

        let (a, b) = match (a, b) {
            (Ok(a), Ok(b)) => (a, b),
            (a, b) => {
                let errors: Vec<LabelError> = [a.err(), b.err()].into_iter().flatten().collect();
                info!(raw_a, raw_b, ?errors, "pair rejected");
                return Ok(CommitOutcome::Skipped(SkipReason::Rejected(errors)));
            }
        };

        if a == b {
            debug!(raw_a, raw_b, label = %a, "pair collapses to one label");
            return Ok(CommitOutcome::Skipped(SkipReason::SameLabel(a)));
        }

        self.store.upsert_node(a.as_str(), 1)?;
        self.store.upsert_node(b.as_str(), 1)?;
        let edge = self.store.upsert_edge(a.as_str(), b.as_str(), 1)?;

        Ok(CommitOutcome::Committed {
            source: a,
            target: b,
            edge,
        })
    }

    /// Normalize `raw` and bump (or create) its node
    pub fn like_node(&self, raw: &str) -> ApiResult<Upsert<Node>> {
        let labels = self.store.labels()?;
        let label = self.normalizer.normalize(raw, &labels)?;
        Ok(self.store.upsert_node(label.as_str(), 1)?)
    }

    /// Bump the edge between two existing labels.
    ///
    /// Labels are canonicalized but not fuzzy-matched; both nodes must exist.
    pub fn like_edge(&self, source: &str, target: &str) -> ApiResult<Upsert<Edge>> {
        let source = self.normalizer.canonical_label(source)?;
        let target = self.normalizer.canonical_label(target)?;
        Ok(self.store.upsert_edge(source.as_str(), target.as_str(), 1)?)
    }

    pub fn delete_node(&self, label: &str) -> ApiResult<bool> {
        Ok(self.store.delete_node(&canonicalize(label))?)
    }

    /// Only the exact stored `(source, target)` order matches
    pub fn delete_edge(&self, source: &str, target: &str) -> ApiResult<usize> {
        let source = canonicalize(source);
        let target = canonicalize(target);
        Ok(self.store.delete_edge(&source, &target)?)
    }

    pub fn reset_all(&self) -> ApiResult<usize> {
        Ok(self.store.delete_all_nodes()?)
    }

    /// Reset the store and commit [`DEMO_PAIRS`]. Returns how many pairs committed.
    pub fn load_demo(&self) -> ApiResult<usize> {
        self.reset_all()?;
        let mut committed = 0;
        for (a, b) in DEMO_PAIRS {
            if let CommitOutcome::Committed { .. } = self.commit_pair(a, b)? {
                committed += 1;
            }
        }
        info!(committed, total = DEMO_PAIRS.len(), "loaded demo data");
        Ok(committed)
    }

    // --- Read ---

    /// Display read model
    pub fn view(&self) -> ApiResult<GraphView> {
        let snapshot = self.store.snapshot()?;
        Ok(GraphView::new(&snapshot.nodes, &snapshot.edges))
    }

    pub fn snapshot(&self) -> ApiResult<StoreSnapshot> {
        Ok(self.store.snapshot()?)
    }

    /// Raw store export as pretty JSON
    pub fn export_json(&self) -> ApiResult<String> {
        Ok(serde_json::to_string_pretty(&self.store.snapshot()?)?)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Rejected(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "{}", messages.join("\n"))
            }
            SkipReason::SameLabel(label) => write!(f, "both tags normalize to {label}"),
        }
    }
}

/// "Created node #x (weight 1)" and friends
fn describe_upsert<T>(
    f: &mut fmt::Formatter<'_>,
    what: &str,
    upsert: &Upsert<T>,
    describe: impl Fn(&T) -> (String, u32),
) -> fmt::Result {
    let (verb, record) = match upsert {
        Upsert::Created(t) => ("Created", t),
        Upsert::Reinforced(t) => ("Reinforced", t),
        Upsert::Skipped => return write!(f, "{} unchanged", what),
    };
    let (name, weight) = describe(record);
    write!(f, "{} {} {} (weight {})", verb, what, name, weight)
}

fn describe_node(node: &Node) -> (String, u32) {
    (node.label.to_string(), node.weight)
}

fn describe_edge(edge: &Edge) -> (String, u32) {
    (format!("{} -- {}", edge.source, edge.target), edge.weight)
}

impl fmt::Display for CommitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitOutcome::Committed {
                source,
                target,
                edge: Upsert::Skipped,
            } => write!(f, "Linked {source} and {target} (edge unchanged)"),
            CommitOutcome::Committed { edge, .. } => {
                describe_upsert(f, "edge", edge, describe_edge)
            }
            CommitOutcome::Skipped(reason) => write!(f, "Nothing committed: {reason}"),
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Commit(outcome) => write!(f, "{outcome}"),
            CommandOutcome::NodeLiked(node) => describe_upsert(f, "node", node, describe_node),
            CommandOutcome::EdgeLiked(edge) => describe_upsert(f, "edge", edge, describe_edge),
            CommandOutcome::NodeDeleted { label, removed } => {
                if *removed {
                    write!(f, "Deleted node {label}")
                } else {
                    write!(f, "No node {label}")
                }
            }
            CommandOutcome::EdgeDeleted {
                source,
                target,
                removed,
            } => write!(f, "Deleted {removed} edge(s) stored as {source} -> {target}"),
            CommandOutcome::Reset { nodes } => write!(f, "Removed {nodes} node(s) and all edges"),
            CommandOutcome::DemoLoaded { committed } => {
                write!(f, "Loaded demo data ({committed} pairs committed)")
            }
        }
    }
}
