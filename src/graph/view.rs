//! Display projection handed to graph renderers
//!
//! Renderers expect node size `weight^1.5 * 100` and edge stroke width equal
//! to the edge weight. These transforms live here, not in the store.

use super::edge::Edge;
use super::node::Node;
use serde::Serialize;

/// Exponent applied to node weight when computing display size
pub const NODE_SIZE_EXPONENT: f64 = 1.5;

/// Scale factor applied after the exponent
pub const NODE_SIZE_SCALE: f64 = 100.0;

/// Display size for a node of the given weight
pub fn node_size(weight: u32) -> f64 {
    f64::from(weight).powf(NODE_SIZE_EXPONENT) * NODE_SIZE_SCALE
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub label: String,
    pub size: f64,
}

impl From<&Node> for NodeView {
    fn from(node: &Node) -> Self {
        Self {
            id: node.label.to_string(),
            label: node.label.to_string(),
            size: node_size(node.weight),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeView {
    pub source: String,
    pub target: String,
    pub stroke_width: u32,
}

impl From<&Edge> for EdgeView {
    fn from(edge: &Edge) -> Self {
        Self {
            source: edge.source.to_string(),
            target: edge.target.to_string(),
            stroke_width: edge.weight,
        }
    }
}

/// Read model for display: nodes by label, edges by source label
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GraphView {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

impl GraphView {
    /// Project listed nodes and edges, keeping their order
    pub fn new(nodes: &[Node], edges: &[Edge]) -> Self {
        Self {
            nodes: nodes.iter().map(NodeView::from).collect(),
            edges: edges.iter().map(EdgeView::from).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_size_follows_power_law() {
        assert_eq!(node_size(1), 100.0);
        assert_eq!(node_size(4), 800.0);
        assert!((node_size(2) - 282.842_712).abs() < 1e-3);
    }

    #[test]
    fn edge_view_uses_weight_as_stroke_width() {
        let edge = Edge::new("#a", "#b").with_weight(3);
        let view = EdgeView::from(&edge);
        assert_eq!(view.stroke_width, 3);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["strokeWidth"], 3);
        assert_eq!(json["source"], "#a");
    }

    #[test]
    fn graph_view_keeps_listing_order() {
        let nodes = vec![Node::new("#a"), Node::new("#b").with_weight(2)];
        let edges = vec![Edge::new("#b", "#a")];
        let view = GraphView::new(&nodes, &edges);

        assert_eq!(view.nodes[0].id, "#a");
        assert_eq!(view.nodes[1].label, "#b");
        assert_eq!(view.edges[0].source, "#b");
        assert!(!view.is_empty());
    }
}
