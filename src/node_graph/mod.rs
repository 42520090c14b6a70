mod compiler;
mod groups;

pub mod nodes;

pub use crate::models::node_graph::*;
pub use compiler::{compile_group, generate_output, tempo_statement, DEFAULT_CPM, STATEMENT_PREFIX};
pub use groups::{find_all_groups, find_connected_node_ids, group_id_for};

#[cfg(test)]
mod tests;
