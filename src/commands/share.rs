use std::path::Path;

use crate::commands::node_graph::open_session;
use crate::settings::AppSettings;
use crate::share::{deserialize_state, state_param_from_url};

pub fn share_project(
    path: &Path,
    base_url: Option<&str>,
    settings: &AppSettings,
) -> Result<String, String> {
    let session = open_session(path, settings)?;
    match base_url {
        Some(base) => session.share_url(base),
        None => session.share(),
    }
}

/// Accepts either a full share link or a bare payload.
pub fn open_shared(input: &str, settings: &AppSettings) -> Result<String, String> {
    let payload = state_param_from_url(input, &settings.share_param)
        .unwrap_or_else(|| input.trim().to_string());
    let state = deserialize_state(&payload).ok_or("Could not decode shared state")?;
    serde_json::to_string_pretty(&state).map_err(|e| format!("Failed to format state: {}", e))
}
