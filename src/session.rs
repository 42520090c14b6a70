//! Editing session
//!
//! Owns one graph, its Config Store and the pattern runner, and keeps them in
//! step: every edit that can change the compiled program is followed by a
//! refresh, so the runner sees each recompilation.

use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Value};
use uuid::Uuid;

use crate::config_store::{record_from_json, ConfigStore};
use crate::models::node_graph::{
    ConfigRecord, Edge, NodeInstance, PatternGroup, Position, RunState,
};
use crate::models::share::{ColorMode, FullConfig, SerializableState};
use crate::node_graph::{find_all_groups, generate_output};
use crate::playback::{PatternRunner, SubmitOutcome};
use crate::settings::AppSettings;
use crate::share;

pub struct FlowSession {
    nodes: Vec<NodeInstance>,
    edges: Vec<Edge>,
    store: ConfigStore,
    cpm: String,
    theme: String,
    color_mode: ColorMode,
    share_param: String,
    /// Nodes that were running when everything was paused.
    paused_running: Option<Vec<String>>,
    runner: PatternRunner,
}

impl FlowSession {
    pub fn new(runner: PatternRunner) -> Self {
        Self::with_settings(runner, &AppSettings::default())
    }

    pub fn with_settings(runner: PatternRunner, settings: &AppSettings) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            store: ConfigStore::new(),
            cpm: settings.default_cpm.clone(),
            theme: settings.theme.clone(),
            color_mode: settings.color_mode,
            share_param: settings.share_param.clone(),
            paused_running: None,
            runner,
        }
    }

    /// Starter graph: a drum line through a gain stage.
    pub fn default_graph(runner: PatternRunner, settings: &AppSettings) -> Self {
        let mut session = Self::with_settings(runner, settings);

        let mut drums = NodeInstance::new("drums", "drum_sounds");
        drums.data.state = Some(RunState::Running);
        drums.data.values.insert("sound".into(), json!("bd sd [~ bd] sd"));
        let mut gain = NodeInstance::new("gain", "gain");
        gain.data.state = Some(RunState::Running);
        gain.data.values.insert("gain".into(), json!(0.8));
        gain.position = Position { x: 240.0, y: 0.0 };

        session.nodes = vec![drums, gain];
        session.edges = vec![Edge::new("drums->gain", "drums", "gain")];
        session
            .store
            .update_node("drums", record_from_json(json!({ "sound": "bd sd [~ bd] sd" })));
        session
            .store
            .update_node("gain", record_from_json(json!({ "gain": 0.8 })));
        session
    }

    pub fn nodes(&self) -> &[NodeInstance] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&NodeInstance> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn runner(&self) -> &PatternRunner {
        &self.runner
    }

    pub fn cpm(&self) -> &str {
        &self.cpm
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn set_theme(&mut self, theme: &str) {
        self.theme = theme.to_string();
    }

    pub fn set_color_mode(&mut self, color_mode: ColorMode) {
        self.color_mode = color_mode;
    }

    pub fn is_paused_all(&self) -> bool {
        self.paused_running.is_some()
    }

    // -- graph edits ------------------------------------------------------

    pub fn add_node(&mut self, type_id: &str, position: Position) -> String {
        let id = format!("{}_{}", type_id, Uuid::new_v4().simple());
        let mut node = NodeInstance::new(id.clone(), type_id);
        node.position = position;
        node.data.state = Some(RunState::Running);
        self.nodes.push(node);
        self.refresh();
        id
    }

    pub fn insert_node(&mut self, node: NodeInstance) -> Result<(), String> {
        if self.node(&node.id).is_some() {
            return Err(format!("Node '{}' already exists", node.id));
        }
        self.nodes.push(node);
        self.refresh();
        Ok(())
    }

    /// Shallow-merges UI state into the node's data. `null` clears a key.
    pub fn update_node_data(&mut self, id: &str, partial: BTreeMap<String, Value>) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|node| node.id == id) else {
            return false;
        };
        for (key, value) in partial {
            if value.is_null() {
                node.data.values.remove(&key);
            } else {
                node.data.values.insert(key, value);
            }
        }
        true
    }

    pub fn update_node_config(
        &mut self,
        id: &str,
        partial: ConfigRecord,
    ) -> Result<SubmitOutcome, String> {
        if self.node(id).is_none() {
            return Err(format!("Node '{}' not found", id));
        }
        self.store.update_node(id, partial);
        Ok(self.refresh())
    }

    /// Deletes the node, its edges and every config entry it owns.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|edge| !edge.touches(id));
        self.store.remove_node_config(id);
        if let Some(running) = self.paused_running.as_mut() {
            running.retain(|running_id| running_id != id);
        }
        self.refresh();
        true
    }

    /// Returns the new edge id, or `None` for self-loops, unknown endpoints
    /// and connections that already exist in either direction.
    pub fn connect(&mut self, source: &str, target: &str) -> Option<String> {
        if source == target || self.node(source).is_none() || self.node(target).is_none() {
            return None;
        }
        if self.edges.iter().any(|edge| edge.joins(source, target)) {
            return None;
        }

        let id = format!("e_{}", Uuid::new_v4().simple());
        self.edges.push(Edge::new(id.clone(), source, target));
        self.refresh();
        Some(id)
    }

    pub fn disconnect(&mut self, edge_id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|edge| edge.id != edge_id);
        if self.edges.len() == before {
            return false;
        }
        self.refresh();
        true
    }

    // -- compilation and playback -----------------------------------------

    pub fn groups(&self) -> Vec<PatternGroup> {
        find_all_groups(&self.nodes, &self.edges, &self.store)
    }

    pub fn group_of(&self, node_id: &str) -> Option<PatternGroup> {
        self.groups().into_iter().find(|group| group.contains(node_id))
    }

    pub fn compile(&self) -> String {
        generate_output(&self.nodes, &self.edges, &self.store, &self.cpm)
    }

    pub fn refresh(&self) -> SubmitOutcome {
        self.runner.submit(&self.compile())
    }

    pub fn set_cpm(&mut self, cpm: &str) -> SubmitOutcome {
        self.cpm = cpm.trim().to_string();
        self.refresh()
    }

    fn set_state(&mut self, ids: &[String], state: RunState) {
        for node in self.nodes.iter_mut().filter(|node| ids.contains(&node.id)) {
            node.data.state = Some(state);
        }
    }

    /// Silences one group. Returns false when the group is unknown or has
    /// nothing to pause.
    pub fn pause_group(&mut self, group_id: &str) -> bool {
        let Some(group) = self.groups().into_iter().find(|g| g.group_id == group_id) else {
            return false;
        };
        if !self.store.pause_group(group_id, &group.node_ids) {
            return false;
        }
        self.set_state(&group.node_ids, RunState::Paused);
        log::info!("[session] paused group '{}'", group_id);
        self.refresh();
        true
    }

    pub fn play_group(&mut self, group_id: &str) -> bool {
        let Some(saved) = self.store.paused_group(group_id) else {
            return false;
        };
        let mut members: Vec<String> = saved.keys().cloned().collect();
        self.store.unpause_group(group_id);

        if let Some(group) = members.first().and_then(|id| self.group_of(id)) {
            members = group.node_ids;
        }
        self.set_state(&members, RunState::Running);
        log::info!("[session] resumed group '{}'", group_id);
        self.refresh();
        true
    }

    pub fn mute_node(&mut self, id: &str) -> bool {
        if self.node(id).is_none() || !self.store.mute_node(id) {
            return false;
        }
        self.refresh();
        true
    }

    pub fn unmute_node(&mut self, id: &str) -> bool {
        if !self.store.unmute_node(id) {
            return false;
        }
        self.refresh();
        true
    }

    /// Pauses everything that is running and remembers exactly which nodes
    /// were, so [`resume_all`](Self::resume_all) brings back only those.
    pub fn pause_all(&mut self) -> bool {
        if self.paused_running.is_some() {
            return false;
        }
        let running: Vec<String> = self
            .nodes
            .iter()
            .filter(|node| node.is_running())
            .map(|node| node.id.clone())
            .collect();
        self.set_state(&running, RunState::Paused);
        log::info!("[session] paused all ({} running nodes)", running.len());
        self.paused_running = Some(running);
        self.runner.stop();
        true
    }

    pub fn resume_all(&mut self) -> SubmitOutcome {
        let Some(running) = self.paused_running.take() else {
            return SubmitOutcome::Unchanged;
        };
        self.set_state(&running, RunState::Running);
        log::info!("[session] resumed all ({} nodes)", running.len());
        self.runner.resume(Some(&self.compile()))
    }

    // -- sharing ----------------------------------------------------------

    pub fn snapshot(&self) -> SerializableState {
        SerializableState {
            version: crate::models::share::STATE_VERSION,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            config: self.store.snapshot(),
            theme: self.theme.clone(),
            color_mode: self.color_mode,
            cpm: Some(self.cpm.clone()),
        }
    }

    pub fn share(&self) -> Result<String, String> {
        share::serialize_state(
            &self.nodes,
            &self.edges,
            &self.store.snapshot(),
            &self.theme,
            self.color_mode,
            Some(&self.cpm),
        )
    }

    pub fn share_url(&self, base: &str) -> Result<String, String> {
        share::share_url(base, &self.share_param, &self.share()?)
    }

    /// Decodes a share payload. `None` when it is malformed.
    pub fn restore(payload: &str, runner: PatternRunner, settings: &AppSettings) -> Option<Self> {
        let state = share::deserialize_state(payload)?;
        Some(Self::from_state(state, runner, settings))
    }

    /// Session for a shared URL, or the starter graph when the URL carries
    /// no usable state.
    pub fn from_url(url: &str, runner: PatternRunner, settings: &AppSettings) -> Self {
        let restored = share::state_param_from_url(url, &settings.share_param)
            .and_then(|payload| Self::restore(&payload, runner.clone(), settings));
        match restored {
            Some(session) => session,
            None => {
                log::info!("[session] no shared state in url, starting from default graph");
                Self::default_graph(runner, settings)
            }
        }
    }

    /// Installs the graph first, then the live and muted records, then
    /// replays each paused group's saved records live and pauses the group
    /// recomputed from the installed graph. Records of muted members stay
    /// parked in the snapshot instead of going live.
    pub fn from_state(
        state: SerializableState,
        runner: PatternRunner,
        settings: &AppSettings,
    ) -> Self {
        let mut session = Self::with_settings(runner, settings);
        session.nodes = state.nodes;
        session.edges = state.edges;
        session.theme = state.theme;
        session.color_mode = state.color_mode;
        if let Some(cpm) = state.cpm.filter(|cpm| !cpm.trim().is_empty()) {
            session.cpm = cpm;
        }

        let FullConfig {
            config,
            muted_nodes,
            paused_groups,
        } = state.config;
        session.store = ConfigStore::from_snapshot(FullConfig {
            config,
            muted_nodes,
            paused_groups: BTreeMap::new(),
        });

        let known: HashSet<String> = session.nodes.iter().map(|node| node.id.clone()).collect();
        for (saved_group_id, saved) in paused_groups {
            let mut members = Vec::new();
            for (id, record) in saved {
                if !known.contains(&id) {
                    log::debug!("[session] dropping paused record for missing node '{}'", id);
                    continue;
                }
                if session.store.is_muted(&id) {
                    session
                        .store
                        .hold_in_paused_group(&saved_group_id, &id, record);
                } else {
                    session.store.update_node(&id, record);
                }
                members.push(id);
            }

            let Some(group) = members.first().and_then(|id| session.group_of(id)) else {
                log::warn!("[session] paused group '{}' has no members left", saved_group_id);
                continue;
            };
            session
                .store
                .rekey_paused_group(&saved_group_id, &group.group_id);
            session.store.pause_group(&group.group_id, &group.node_ids);
            if !session.store.is_group_paused(&group.group_id) {
                log::warn!(
                    "[session] paused group '{}' restored with nothing to pause",
                    saved_group_id
                );
            }
        }

        session
    }
}
