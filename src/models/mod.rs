pub mod node_graph;
pub mod share;
