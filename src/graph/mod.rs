//! Core graph data structures

mod edge;
mod node;
mod view;


pub use edge::{pair_key, Edge, Upsert};
pub use node::{Label, Node};
pub use view::{node_size, EdgeView, GraphView, NodeView, NODE_SIZE_EXPONENT, NODE_SIZE_SCALE};
