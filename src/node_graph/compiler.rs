use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::config_store::ConfigStore;
use crate::models::node_graph::{ConfigRecord, Edge, NodeInstance, PatternGroup};
use crate::node_graph::groups::find_all_groups;
use crate::node_graph::nodes;

/// Marker the audio engine expects in front of every independent pattern.
pub const STATEMENT_PREFIX: &str = "$: ";
pub const DEFAULT_CPM: &str = "30";

static RUN_COUNTER: AtomicU64 = AtomicU64::new(1);

pub fn tempo_statement(cpm: &str) -> String {
    let cpm = cpm.trim();
    let cpm = if cpm.is_empty() { DEFAULT_CPM } else { cpm };
    format!("setcpm({})", cpm)
}

/// Folds one group's members left to right through their transforms.
///
/// Returns `None` when the group currently contributes nothing (e.g. paused).
pub fn compile_group(
    group: &PatternGroup,
    nodes_by_id: &HashMap<&str, &NodeInstance>,
    config: &ConfigStore,
) -> Option<String> {
    let empty = ConfigRecord::new();
    let pattern = group.node_ids.iter().fold(String::new(), |acc, id| {
        let Some(node) = nodes_by_id.get(id.as_str()) else {
            return acc;
        };
        nodes::apply(node, config.get(id).unwrap_or(&empty), acc)
    });

    if pattern.trim().is_empty() {
        None
    } else {
        Some(format!("{}{}", STATEMENT_PREFIX, pattern))
    }
}

/// Compiles every contributing group into one program for the audio engine.
///
/// Byte-identical for identical inputs. An empty string means "nothing to
/// play"; no tempo line is emitted in that case.
pub fn generate_output(
    nodes: &[NodeInstance],
    edges: &[Edge],
    config: &ConfigStore,
    cpm: &str,
) -> String {
    let run_id = RUN_COUNTER.fetch_add(1, Ordering::Relaxed);
    let run_start = Instant::now();

    let groups = find_all_groups(nodes, edges, config);
    let nodes_by_id: HashMap<&str, &NodeInstance> =
        nodes.iter().map(|node| (node.id.as_str(), node)).collect();

    let statements: Vec<String> = groups
        .iter()
        .filter_map(|group| compile_group(group, &nodes_by_id, config))
        .collect();

    log::debug!(
        "[generate_output #{run_id}] groups={} statements={} ms={:.2}",
        groups.len(),
        statements.len(),
        run_start.elapsed().as_secs_f64() * 1000.0
    );

    if statements.is_empty() {
        return String::new();
    }

    format!("{}\n{}", tempo_statement(cpm), statements.join("\n"))
}
