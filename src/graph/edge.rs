//! Edge representation: an undirected, weighted co-occurrence link

use super::node::Label;
use serde::{Deserialize, Serialize};

/// An undirected edge between two topics
///
/// Identity is the unordered pair `{source, target}`. The stored
/// `source`/`target` order is whatever was passed when the edge was
/// created; it drives listing order and exact-pair deletion only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Label passed first at creation
    pub source: Label,
    /// Label passed second at creation
    pub target: Label,
    /// Co-occurrence counter
    pub weight: u32,
}

impl Edge {
    /// Create an edge with weight 1
    pub fn new(source: impl Into<Label>, target: impl Into<Label>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight: 1,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// True if this edge joins `a` and `b`, in either order
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    /// True if `label` is either endpoint
    pub fn touches(&self, label: &str) -> bool {
        self.source == label || self.target == label
    }

    /// True if stored exactly as `(source, target)`
    pub fn is_exactly(&self, source: &str, target: &str) -> bool {
        self.source == source && self.target == target
    }

    /// Order-independent key for the pair
    pub fn pair_key(&self) -> (Label, Label) {
        pair_key(self.source.as_str(), self.target.as_str())
    }
}

/// Order-independent key for the pair `{a, b}`: the smaller label comes first
pub fn pair_key(a: &str, b: &str) -> (Label, Label) {
    if a <= b {
        (Label::from(a), Label::from(b))
    } else {
        (Label::from(b), Label::from(a))
    }
}

/// Outcome of an upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert<T> {
    /// No record existed; one was created
    Created(T),
    /// An existing record had its weight increased
    Reinforced(T),
    /// The record exists but the increment could not be applied.
    /// The anomaly has already been logged; the record is unchanged.
    Skipped,
}

impl<T> Upsert<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Upsert::Created(_))
    }

    /// The resulting record, if the upsert was applied
    pub fn into_inner(self) -> Option<T> {
        match self {
            Upsert::Created(t) | Upsert::Reinforced(t) => Some(t),
            Upsert::Skipped => None,
        }
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Upsert::Created(t) | Upsert::Reinforced(t) => Some(t),
            Upsert::Skipped => None,
        }
    }
}
