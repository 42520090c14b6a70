//! Per-node Config Store
//!
//! Single owner of the musical parameters each node contributes. The compiler
//! only ever reads the live table; muting and pausing work by moving records
//! out of it into side tables, so a node's effective contribution is always
//! exactly its live entry.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::node_graph::ConfigRecord;
use crate::models::share::FullConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    config: BTreeMap<String, ConfigRecord>,
    muted_nodes: BTreeMap<String, ConfigRecord>,
    paused_groups: BTreeMap<String, BTreeMap<String, ConfigRecord>>,
}

/// Shallow merge. A `null` value clears the key.
fn merge_into(record: &mut ConfigRecord, partial: ConfigRecord) {
    for (key, value) in partial {
        if value.is_null() {
            record.remove(&key);
        } else {
            record.insert(key, value);
        }
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: FullConfig) -> Self {
        Self {
            config: snapshot.config,
            muted_nodes: snapshot.muted_nodes,
            paused_groups: snapshot.paused_groups,
        }
    }

    pub fn snapshot(&self) -> FullConfig {
        FullConfig {
            config: self.config.clone(),
            muted_nodes: self.muted_nodes.clone(),
            paused_groups: self.paused_groups.clone(),
        }
    }

    /// Live record for `id`, the only thing the compiler consults.
    pub fn get(&self, id: &str) -> Option<&ConfigRecord> {
        self.config.get(id)
    }

    pub fn has_contribution(&self, id: &str) -> bool {
        self.config.get(id).is_some_and(|record| !record.is_empty())
    }

    /// True while the node's real record is parked in a mute or a paused
    /// group, so grouping still sees it as a member.
    pub fn has_saved_contribution(&self, id: &str) -> bool {
        self.muted_nodes.get(id).is_some_and(|record| !record.is_empty())
            || self.paused_groups.values().any(|group| group.contains_key(id))
    }

    pub fn is_muted(&self, id: &str) -> bool {
        self.muted_nodes.contains_key(id)
    }

    pub fn is_group_paused(&self, group_id: &str) -> bool {
        self.paused_groups.contains_key(group_id)
    }

    pub fn paused_group_ids(&self) -> impl Iterator<Item = &str> {
        self.paused_groups.keys().map(String::as_str)
    }

    pub fn paused_group(&self, group_id: &str) -> Option<&BTreeMap<String, ConfigRecord>> {
        self.paused_groups.get(group_id)
    }

    /// Shallow-merges `partial` into the node's record, creating it if absent.
    ///
    /// Writes to a node whose record is held by a paused group, or to a muted
    /// node, land in the saved record so they are heard once it comes back.
    pub fn update_node(&mut self, id: &str, partial: ConfigRecord) {
        if let Some(saved) = self
            .paused_groups
            .values_mut()
            .find_map(|group| group.get_mut(id))
        {
            merge_into(saved, partial);
            return;
        }
        if let Some(saved) = self.muted_nodes.get_mut(id) {
            merge_into(saved, partial);
            return;
        }
        merge_into(self.config.entry(id.to_string()).or_default(), partial);
    }

    /// Drops every trace of `id`: live, muted and any paused group snapshot.
    /// Paused groups left with nothing to restore are removed entirely.
    pub fn remove_node_config(&mut self, id: &str) {
        self.config.remove(id);
        self.muted_nodes.remove(id);
        self.paused_groups.retain(|group_id, saved| {
            if saved.remove(id).is_some() && saved.is_empty() {
                log::debug!("[config] paused group '{}' emptied by removal of '{}'", group_id, id);
                return false;
            }
            true
        });
    }

    /// Returns false if the node was already muted.
    pub fn mute_node(&mut self, id: &str) -> bool {
        if self.muted_nodes.contains_key(id) {
            return false;
        }
        let record = self
            .config
            .insert(id.to_string(), ConfigRecord::new())
            .unwrap_or_default();
        self.muted_nodes.insert(id.to_string(), record);
        true
    }

    /// Returns false if the node was not muted.
    pub fn unmute_node(&mut self, id: &str) -> bool {
        let Some(record) = self.muted_nodes.remove(id) else {
            return false;
        };
        self.config.insert(id.to_string(), record);
        true
    }

    /// Moves every listed node's non-empty live record into the paused table
    /// and leaves an empty record behind. Returns false if there was nothing
    /// to pause.
    pub fn pause_group(&mut self, group_id: &str, node_ids: &[String]) -> bool {
        let saved: BTreeMap<String, ConfigRecord> = node_ids
            .iter()
            .filter_map(|id| {
                self.config
                    .get(id)
                    .filter(|record| !record.is_empty())
                    .map(|record| (id.clone(), record.clone()))
            })
            .collect();

        if saved.is_empty() {
            return false;
        }

        for id in saved.keys() {
            self.config.insert(id.clone(), ConfigRecord::new());
        }
        log::debug!("[config] paused group '{}' ({} records)", group_id, saved.len());
        self.paused_groups
            .entry(group_id.to_string())
            .or_default()
            .extend(saved);
        true
    }

    /// Returns false if the group was not paused.
    pub fn unpause_group(&mut self, group_id: &str) -> bool {
        let Some(saved) = self.paused_groups.remove(group_id) else {
            return false;
        };
        log::debug!("[config] resumed group '{}' ({} records)", group_id, saved.len());
        for (id, record) in saved {
            // Muted while paused: the record moves on into the mute.
            let table = if self.muted_nodes.contains_key(&id) {
                &mut self.muted_nodes
            } else {
                &mut self.config
            };
            table.insert(id, record);
        }
        true
    }

    /// Parks `record` for `id` in a paused group's snapshot, creating the
    /// group entry if needed. Used when rebuilding a store from a share link.
    pub(crate) fn hold_in_paused_group(
        &mut self,
        group_id: &str,
        id: &str,
        record: ConfigRecord,
    ) {
        if record.is_empty() {
            return;
        }
        self.paused_groups
            .entry(group_id.to_string())
            .or_default()
            .insert(id.to_string(), record);
    }

    /// Moves a paused group's snapshot under a new id, merging with any
    /// snapshot already stored there.
    pub(crate) fn rekey_paused_group(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        if let Some(saved) = self.paused_groups.remove(from) {
            self.paused_groups
                .entry(to.to_string())
                .or_default()
                .extend(saved);
        }
    }
}

/// Convenience for building records from `serde_json::json!` objects.
pub fn record_from_json(value: Value) -> ConfigRecord {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => ConfigRecord::new(),
    }
}
