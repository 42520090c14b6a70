//! Partitions the editor graph into independently playable groups.
//!
//! Grouping rides on raw connectivity: a component is traversed in full before
//! non-contributing members are dropped, so a passive node sitting between two
//! instruments still joins them into one group.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::{DiGraphMap, UnGraphMap};
use petgraph::visit::Bfs;

use crate::config_store::ConfigStore;
use crate::models::node_graph::{Edge, NodeInstance, PatternGroup};
use crate::node_graph::nodes;

pub const GROUP_ID_SEPARATOR: &str = "-";

fn undirected(edges: &[Edge]) -> UnGraphMap<&str, ()> {
    let mut graph = UnGraphMap::new();
    for edge in edges {
        graph.add_edge(edge.source.as_str(), edge.target.as_str(), ());
    }
    graph
}

fn bfs_order<'a>(graph: &UnGraphMap<&'a str, ()>, start: &'a str) -> Vec<&'a str> {
    if !graph.contains_node(start) {
        return vec![start];
    }
    let mut order = Vec::new();
    let mut bfs = Bfs::new(graph, start);
    while let Some(node) = bfs.next(graph) {
        order.push(node);
    }
    order
}

/// Every node reachable from `start_id`, treating edges as bidirectional.
///
/// Ids are unique and in breadth-first discovery order (neighbours in edge
/// insertion order). Always contains `start_id` itself.
pub fn find_connected_node_ids(start_id: &str, edges: &[Edge]) -> Vec<String> {
    let graph = undirected(edges);
    bfs_order(&graph, start_id)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Signal-flow order for one component: sources before the nodes they feed.
/// Directed cycles fall back to discovery order.
fn fold_order<'a>(component: &[&'a str], edges: &'a [Edge]) -> Vec<&'a str> {
    let members: HashSet<&str> = component.iter().copied().collect();
    let mut directed: DiGraphMap<&str, ()> = DiGraphMap::new();
    for &id in component {
        directed.add_node(id);
    }
    for edge in edges {
        let (source, target) = (edge.source.as_str(), edge.target.as_str());
        if members.contains(source) && members.contains(target) {
            directed.add_edge(source, target, ());
        }
    }
    match toposort(&directed, None) {
        Ok(order) => order,
        Err(cycle) => {
            log::debug!(
                "[groups] cycle through '{}', folding in discovery order",
                cycle.node_id()
            );
            component.to_vec()
        }
    }
}

pub fn group_id_for(node_ids: &[String]) -> String {
    let mut sorted: Vec<&str> = node_ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(GROUP_ID_SEPARATOR)
}

/// Connected components of contributing nodes, in node-list discovery order.
///
/// A node contributes if its live Config Record is non-empty, its record is
/// parked by a mute or a paused group, or its type has a registered transform.
/// Components without a contributing member form no group.
pub fn find_all_groups(
    nodes: &[NodeInstance],
    edges: &[Edge],
    config: &ConfigStore,
) -> Vec<PatternGroup> {
    let nodes_by_id: HashMap<&str, &NodeInstance> =
        nodes.iter().map(|node| (node.id.as_str(), node)).collect();
    let graph = undirected(edges);

    let mut visited: HashSet<&str> = HashSet::new();
    let mut groups = Vec::new();

    for node in nodes {
        if visited.contains(node.id.as_str()) {
            continue;
        }

        let component = bfs_order(&graph, node.id.as_str());
        visited.extend(component.iter().copied());

        let node_ids: Vec<String> = fold_order(&component, edges)
            .into_iter()
            .filter(|id| {
                nodes_by_id.get(id).is_some_and(|member| {
                    config.has_contribution(id)
                        || config.has_saved_contribution(id)
                        || nodes::has_transform(&member.type_id)
                })
            })
            .map(str::to_string)
            .collect();

        if node_ids.is_empty() {
            continue;
        }

        groups.push(PatternGroup {
            group_id: group_id_for(&node_ids),
            node_ids,
        });
    }

    groups
}
