use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use super::node_graph::{ConfigRecord, Edge, NodeInstance};

pub const STATE_VERSION: u32 = 1;

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "share.ts")]
pub enum ColorMode {
    Light,
    #[default]
    Dark,
    System,
}

impl ColorMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

/// Complete Config Store contents: live, muted and paused tables.
#[derive(TS, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "share.ts")]
#[ts(rename_all = "camelCase")]
pub struct FullConfig {
    #[serde(default)]
    #[ts(type = "Record<string, Record<string, unknown>>")]
    pub config: BTreeMap<String, ConfigRecord>,
    #[serde(default)]
    #[ts(type = "Record<string, Record<string, unknown>>")]
    pub muted_nodes: BTreeMap<String, ConfigRecord>,
    #[serde(default)]
    #[ts(type = "Record<string, Record<string, Record<string, unknown>>>")]
    pub paused_groups: BTreeMap<String, BTreeMap<String, ConfigRecord>>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

/// Everything a share link carries.
#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "share.ts")]
#[ts(rename_all = "camelCase")]
pub struct SerializableState {
    #[serde(default = "default_version")]
    pub version: u32,
    pub nodes: Vec<NodeInstance>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub config: FullConfig,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub color_mode: ColorMode,
    #[serde(default)]
    pub cpm: Option<String>,
}
