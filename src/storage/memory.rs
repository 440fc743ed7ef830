//! In-process storage backend
//!
//! Keeps the same tables the SQLite backend does, as ordinary collections:
//! a node table keyed by label, an edge table keyed by a creation sequence
//! number, a unique index on the unordered pair, and a secondary index from
//! label to incident edge ids.

use super::traits::{creation_weight, GraphStore, StorageError, StorageResult, StoreSnapshot};
use crate::graph::{pair_key, Edge, Label, Node, Upsert};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct Tables {
    /// label -> weight
    nodes: BTreeMap<Label, u32>,
    /// sequence id -> edge; ids increase with creation
    edges: BTreeMap<u64, Edge>,
    /// unordered pair -> edge id
    pairs: HashMap<(Label, Label), u64>,
    /// label -> ids of edges touching it
    incident: HashMap<Label, BTreeSet<u64>>,
    next_edge_id: u64,
}

impl Tables {
    fn edge_id(&self, a: &str, b: &str) -> Option<u64> {
        self.pairs.get(&pair_key(a, b)).copied()
    }

    fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        let id = self.edge_id(a, b)?;
        self.edges.get(&id).filter(|e| e.connects(a, b))
    }

    fn insert_edge(&mut self, edge: Edge) -> u64 {
        let id = self.next_edge_id;
        self.next_edge_id += 1;

        self.pairs.insert(edge.pair_key(), id);
        for label in [&edge.source, &edge.target] {
            self.incident.entry(label.clone()).or_default().insert(id);
        }
        self.edges.insert(id, edge);
        id
    }

    fn remove_edge(&mut self, id: u64) -> Option<Edge> {
        let edge = self.edges.remove(&id)?;
        self.pairs.remove(&edge.pair_key());
        for label in [&edge.source, &edge.target] {
            if let Some(ids) = self.incident.get_mut(label) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.incident.remove(label);
                }
            }
        }
        Some(edge)
    }

    fn nodes(&self) -> Vec<Node> {
        self.nodes
            .iter()
            .map(|(label, weight)| Node::new(label.clone()).with_weight(*weight))
            .collect()
    }

    /// Edges ordered by source label, then creation order
    fn sorted_edges<'a>(&self, ids: impl Iterator<Item = &'a u64>) -> Vec<Edge> {
        let mut edges: Vec<(u64, &Edge)> = ids
            .filter_map(|id| self.edges.get(id).map(|e| (*id, e)))
            .collect();
        edges.sort_by(|(ia, a), (ib, b)| a.source.cmp(&b.source).then(ia.cmp(ib)));
        edges.into_iter().map(|(_, e)| e.clone()).collect()
    }
}

/// In-memory topic graph store
///
/// Write operations check everything that can fail before they touch the
/// tables, then apply the change in place under the lock. A failed
/// operation leaves no trace.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StorageError::Poisoned)
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> StorageResult<T> {
        let tables = self.lock()?;
        Ok(f(&tables))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> StorageResult<T>) -> StorageResult<T> {
        let mut tables = self.lock()?;
        f(&mut tables)
    }
}

impl GraphStore for MemoryStore {
    fn upsert_node(&self, label: &str, initial_weight: u32) -> StorageResult<Upsert<Node>> {
        self.write(|t| match t.nodes.get_mut(label) {
            Some(weight) => {
                *weight = weight.saturating_add(1);
                debug!(label, weight = *weight, "reinforced node");
                Ok(Upsert::Reinforced(Node::new(label).with_weight(*weight)))
            }
            None => {
                let weight = creation_weight(initial_weight);
                t.nodes.insert(Label::from(label), weight);
                debug!(label, weight, "created node");
                Ok(Upsert::Created(Node::new(label).with_weight(weight)))
            }
        })
    }

    fn find_node(&self, label: &str) -> StorageResult<Option<Node>> {
        self.read(|t| {
            t.nodes
                .get(label)
                .map(|weight| Node::new(label).with_weight(*weight))
        })
    }

    fn delete_node(&self, label: &str) -> StorageResult<bool> {
        self.write(|t| {
            let ids: Vec<u64> = t
                .incident
                .get(label)
                .map(|ids| ids.iter().copied().collect())
                .unwrap_or_default();
            for id in &ids {
                t.remove_edge(*id);
            }

            let removed = t.nodes.remove(label).is_some();
            debug!(label, edges = ids.len(), removed, "deleted node");
            Ok(removed)
        })
    }

    fn list_nodes(&self) -> StorageResult<Vec<Node>> {
        self.read(Tables::nodes)
    }

    fn delete_all_nodes(&self) -> StorageResult<usize> {
        self.write(|t| {
            let nodes = t.nodes.len();
            let edges = t.edges.len();
            let next_edge_id = t.next_edge_id;
            *t = Tables {
                next_edge_id,
                ..Tables::default()
            };
            info!(nodes, edges, "cleared topic store");
            Ok(nodes)
        })
    }

    fn edge_exists(&self, a: &str, b: &str) -> StorageResult<bool> {
        self.read(|t| t.edge(a, b).is_some())
    }

    fn find_edge(&self, a: &str, b: &str) -> StorageResult<Option<Edge>> {
        self.read(|t| t.edge(a, b).cloned())
    }

    fn upsert_edge(&self, a: &str, b: &str, weight_delta: u32) -> StorageResult<Upsert<Edge>> {
        self.write(|t| {
            let Some(id) = t.edge_id(a, b) else {
                for label in [a, b] {
                    if !t.nodes.contains_key(label) {
                        return Err(StorageError::MissingNode(label.to_string()));
                    }
                }

                let weight = creation_weight(weight_delta);
                let edge = Edge::new(a, b).with_weight(weight);
                t.insert_edge(edge.clone());
                debug!(source = a, target = b, weight, "created edge");
                return Ok(Upsert::Created(edge));
            };

            let Some(edge) = t.edges.get_mut(&id) else {
                warn!(
                    source = a,
                    target = b,
                    edge_id = id,
                    "pair index points at a missing edge; nothing incremented"
                );
                return Ok(Upsert::Skipped);
            };

            match edge.weight.checked_add(weight_delta) {
                Some(weight) => {
                    edge.weight = weight;
                    debug!(source = a, target = b, weight, "reinforced edge");
                    Ok(Upsert::Reinforced(edge.clone()))
                }
                None => {
                    warn!(
                        source = a,
                        target = b,
                        edge = ?edge,
                        weight_delta,
                        "edge weight increment overflows; edge left unchanged"
                    );
                    Ok(Upsert::Skipped)
                }
            }
        })
    }

    fn list_edges(&self) -> StorageResult<Vec<Edge>> {
        self.read(|t| t.sorted_edges(t.edges.keys()))
    }

    fn delete_edge(&self, source: &str, target: &str) -> StorageResult<usize> {
        self.write(|t| {
            let rows = match t.edge_id(source, target) {
                Some(id) if t.edges.get(&id).is_some_and(|e| e.is_exactly(source, target)) => {
                    t.remove_edge(id);
                    1
                }
                _ => 0,
            };
            debug!(source, target, rows, "deleted edge");
            Ok(rows)
        })
    }

    fn edges_touching(&self, label: &str) -> StorageResult<Vec<Edge>> {
        self.read(|t| match t.incident.get(label) {
            Some(ids) => t.sorted_edges(ids.iter()),
            None => Vec::new(),
        })
    }

    fn snapshot(&self) -> StorageResult<StoreSnapshot> {
        self.read(|t| StoreSnapshot::new(t.nodes(), t.sorted_edges(t.edges.keys())))
    }
}
