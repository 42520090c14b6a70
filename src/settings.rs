use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::share::ColorMode;
use crate::playback::RunnerSettings;

const SETTINGS_DIR: &str = "patternflow";
const SETTINGS_FILE: &str = "settings.json";

pub const KNOWN_KEYS: &[&str] = &[
    "debounce_ms",
    "default_cpm",
    "share_param",
    "theme",
    "color_mode",
    "benign_errors",
];

#[derive(TS, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[ts(export, export_to = "settings.ts")]
pub struct AppSettings {
    #[ts(type = "number")]
    pub debounce_ms: u64,
    pub default_cpm: String,
    pub share_param: String,
    pub theme: String,
    pub color_mode: ColorMode,
    /// Engine error substrings reported as warnings instead of errors.
    pub benign_errors: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        let runner = RunnerSettings::default();
        Self {
            debounce_ms: runner.debounce.as_millis() as u64,
            default_cpm: crate::node_graph::DEFAULT_CPM.to_string(),
            share_param: crate::share::DEFAULT_SHARE_PARAM.to_string(),
            theme: "strudel".to_string(),
            color_mode: ColorMode::Dark,
            benign_errors: runner.benign_errors,
        }
    }
}

impl AppSettings {
    pub fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            benign_errors: self.benign_errors.clone(),
        }
    }

    /// Builds settings from the stored key/value map, falling back per key.
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        Self {
            debounce_ms: map
                .get("debounce_ms")
                .and_then(|v| v.trim().parse().ok())
                .map(|v: u64| v.min(5_000))
                .unwrap_or(defaults.debounce_ms),
            default_cpm: map
                .get("default_cpm")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.default_cpm),
            share_param: map
                .get("share_param")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.share_param),
            theme: map.get("theme").cloned().unwrap_or(defaults.theme),
            color_mode: map
                .get("color_mode")
                .and_then(|v| ColorMode::parse(v))
                .unwrap_or(defaults.color_mode),
            benign_errors: map
                .get("benign_errors")
                .and_then(|v| serde_json::from_str(v).ok())
                .unwrap_or(defaults.benign_errors),
        }
    }
}

pub fn settings_path() -> Result<PathBuf, String> {
    let base = dirs::config_dir().ok_or("Could not resolve config directory")?;
    Ok(base.join(SETTINGS_DIR).join(SETTINGS_FILE))
}

fn read_map(path: &Path) -> Result<BTreeMap<String, String>, String> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read settings {}: {}", path.display(), e))?;
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse settings {}: {}", path.display(), e))
}

pub fn load_settings(path: &Path) -> Result<AppSettings, String> {
    Ok(AppSettings::from_map(&read_map(path)?))
}

pub fn update_setting(path: &Path, key: &str, value: &str) -> Result<(), String> {
    if !KNOWN_KEYS.contains(&key) {
        return Err(format!("Unknown setting '{}'", key));
    }

    let mut map = read_map(path)?;
    map.insert(key.to_string(), value.to_string());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create settings dir {}: {}", parent.display(), e))?;
    }
    let json = serde_json::to_string_pretty(&map)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    fs::write(path, json)
        .map_err(|e| format!("Failed to write settings {}: {}", path.display(), e))?;

    log::info!("[settings] {} updated", key);
    Ok(())
}
