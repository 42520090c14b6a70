use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::StdoutEngine;
use crate::models::node_graph::NodeTypeDef;
use crate::models::share::SerializableState;
use crate::playback::PatternRunner;
use crate::session::FlowSession;
use crate::settings::AppSettings;

pub fn get_node_types() -> Vec<NodeTypeDef> {
    crate::node_graph::nodes::get_node_types()
}

/// Reads an uncompressed project file (the JSON a share payload decodes to).
pub fn load_project(path: &Path) -> Result<SerializableState, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read project {}: {}", path.display(), e))?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse project {}: {}", path.display(), e))
}

pub fn open_session(path: &Path, settings: &AppSettings) -> Result<FlowSession, String> {
    let state = load_project(path)?;
    let runner = PatternRunner::new(Arc::new(StdoutEngine), settings.runner_settings());
    Ok(FlowSession::from_state(state, runner, settings))
}

pub fn compile_project(path: &Path, settings: &AppSettings) -> Result<String, String> {
    Ok(open_session(path, settings)?.compile())
}

pub fn list_groups(path: &Path, settings: &AppSettings) -> Result<Vec<String>, String> {
    let session = open_session(path, settings)?;
    let store = session.store();

    let groups = session.groups();

    let mut lines: Vec<String> = groups
        .iter()
        .map(|group| {
            let marker = if store.is_group_paused(&group.group_id) {
                " (paused)"
            } else {
                ""
            };
            format!("{}{}: {}", group.group_id, marker, group.node_ids.join(", "))
        })
        .collect();

    lines.extend(
        store
            .paused_group_ids()
            .filter(|id| !groups.iter().any(|group| group.group_id == *id))
            .map(|id| format!("{} (paused, silent)", id)),
    );
    Ok(lines)
}

/// Submits the project twice through a stdout-backed runner, the second
/// time after the debounce window, and reports both outcomes.
pub async fn play_project(path: &Path, settings: &AppSettings) -> Result<Vec<String>, String> {
    let session = open_session(path, settings)?;
    let settle = settings.runner_settings().debounce + Duration::from_millis(10);

    let first = session.refresh();
    tokio::time::sleep(settle).await;
    let second = session.refresh();
    tokio::time::sleep(settle).await;

    Ok(vec![
        format!("first submit: {:?}", first),
        format!("second submit: {:?}", second),
        format!("runner status: {:?}", session.runner().status()),
    ])
}
