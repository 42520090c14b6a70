use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use ts_rs::TS;

/// Musical parameters a single node currently contributes, keyed by parameter name.
///
/// Ordered so that compilation and serialization are byte-stable.
pub type ConfigRecord = BTreeMap<String, Value>;

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "node_graph.ts")]
pub enum RunState {
    Running,
    Paused,
}

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[ts(export, export_to = "node_graph.ts")]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// UI-side state of a node. Persisted for restoration, never read by the compiler.
#[derive(TS, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "node_graph.ts")]
#[ts(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default)]
    pub state: Option<RunState>,
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub values: BTreeMap<String, Value>,
}

#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "node_graph.ts")]
#[ts(rename_all = "camelCase")]
pub struct NodeInstance {
    pub id: String,
    pub type_id: String,
    #[serde(default)]
    pub data: NodeData,
    #[serde(default)]
    pub position: Position,
}

impl NodeInstance {
    pub fn new(id: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            data: NodeData::default(),
            position: Position::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.data.state == Some(RunState::Running)
    }
}

/// Stored with a direction, treated as undirected for grouping.
#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "node_graph.ts")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// True when this edge joins `a` and `b` in either direction.
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

/// A connected component restricted to nodes that contribute pattern output.
#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "node_graph.ts")]
#[ts(rename_all = "camelCase")]
pub struct PatternGroup {
    pub group_id: String,
    pub node_ids: Vec<String>,
}

impl PatternGroup {
    pub fn contains(&self, node_id: &str) -> bool {
        self.node_ids.iter().any(|id| id == node_id)
    }
}

#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "node_graph.ts")]
pub enum ParamType {
    Number,
    Text,
    Toggle,
    Grid,
    Notes,
}

#[derive(TS, Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "node_graph.ts")]
#[ts(rename_all = "camelCase")]
pub struct ParamDef {
    pub id: String,
    pub name: String,
    pub param_type: ParamType,
    #[ts(type = "unknown")]
    pub default_value: Value,
}

#[derive(TS, Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "node_graph.ts")]
#[ts(rename_all = "camelCase")]
pub struct NodeTypeDef {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub params: Vec<ParamDef>,
}
