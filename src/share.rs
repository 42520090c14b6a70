//! Share-link codec: JSON, raw deflate, then URL-safe base64 without padding.

use std::io::{Read, Write};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use url::Url;

use crate::models::node_graph::{Edge, NodeInstance};
use crate::models::share::{ColorMode, FullConfig, SerializableState, STATE_VERSION};

pub const DEFAULT_SHARE_PARAM: &str = "flow";

/// Largest decompressed state accepted from a share link.
pub const MAX_STATE_BYTES: usize = 4 * 1024 * 1024;

pub fn serialize_state(
    nodes: &[NodeInstance],
    edges: &[Edge],
    config: &FullConfig,
    theme: &str,
    color_mode: ColorMode,
    cpm: Option<&str>,
) -> Result<String, String> {
    let state = SerializableState {
        version: STATE_VERSION,
        nodes: nodes.to_vec(),
        edges: edges.to_vec(),
        config: config.clone(),
        theme: theme.to_string(),
        color_mode,
        cpm: cpm.map(str::to_string),
    };
    encode_state(&state)
}

pub fn encode_state(state: &SerializableState) -> Result<String, String> {
    let json =
        serde_json::to_vec(state).map_err(|e| format!("Failed to serialize state: {}", e))?;

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(&json)
        .map_err(|e| format!("Failed to compress state: {}", e))?;
    let compressed = encoder
        .finish()
        .map_err(|e| format!("Failed to compress state: {}", e))?;

    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Inverse of [`serialize_state`]. Malformed or foreign payloads yield `None`.
pub fn deserialize_state(payload: &str) -> Option<SerializableState> {
    match decode_state(payload) {
        Ok(state) => Some(state),
        Err(err) => {
            log::warn!("[share] ignoring shared state: {}", err);
            None
        }
    }
}

fn decode_state(payload: &str) -> Result<SerializableState, String> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err("empty payload".to_string());
    }

    let compressed = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| format!("Failed to decode payload: {}", e))?;

    let mut json = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .take(MAX_STATE_BYTES as u64 + 1)
        .read_to_end(&mut json)
        .map_err(|e| format!("Failed to decompress payload: {}", e))?;
    if json.len() > MAX_STATE_BYTES {
        return Err(format!("payload expands beyond {} bytes", MAX_STATE_BYTES));
    }

    serde_json::from_slice(&json).map_err(|e| format!("Failed to parse state: {}", e))
}

/// `base` with `param` set to `payload`, replacing any previous value.
pub fn share_url(base: &str, param: &str, payload: &str) -> Result<String, String> {
    let mut url = Url::parse(base).map_err(|e| format!("Failed to parse base url: {}", e))?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (key, value) in &kept {
            query.append_pair(key, value);
        }
        query.append_pair(param, payload);
    }
    Ok(url.into())
}

/// The shared payload carried by `url`, if any.
pub fn state_param_from_url(url: &str, param: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, value)| key == param && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_store::{record_from_json, ConfigStore};
    use crate::models::node_graph::RunState;
    use serde_json::json;

    fn sample() -> (Vec<NodeInstance>, Vec<Edge>, FullConfig) {
        let mut drums = NodeInstance::new("drums", "drum_sounds");
        drums.data.state = Some(RunState::Paused);
        drums.data.values.insert("sound".into(), json!("bd sd"));
        let gain = NodeInstance::new("gain", "gain");
        let edges = vec![Edge::new("e1", "drums", "gain")];

        let mut store = ConfigStore::new();
        store.update_node("drums", record_from_json(json!({ "sound": "bd sd" })));
        store.update_node("gain", record_from_json(json!({ "gain": 0.8 })));
        store.pause_group("drums-gain", &["drums".to_string(), "gain".to_string()]);
        store.mute_node("ghost");

        (vec![drums, gain], edges, store.snapshot())
    }

    #[test]
    fn state_survives_a_round_trip() {
        let (nodes, edges, config) = sample();
        let payload =
            serialize_state(&nodes, &edges, &config, "dracula", ColorMode::Light, Some("90"))
                .expect("serialize");
        assert!(payload
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let state = deserialize_state(&payload).expect("decodes");
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.nodes, nodes);
        assert_eq!(state.edges, edges);
        assert_eq!(state.config, config);
        assert_eq!(state.theme, "dracula");
        assert_eq!(state.color_mode, ColorMode::Light);
        assert_eq!(state.cpm.as_deref(), Some("90"));
    }

    #[test]
    fn malformed_payloads_yield_none() {
        assert!(deserialize_state("").is_none());
        assert!(deserialize_state("not base64 at all!").is_none());
        assert!(deserialize_state(&URL_SAFE_NO_PAD.encode(b"plain text")).is_none());

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"nodes": 3}"#).expect("write");
        let wrong_shape = URL_SAFE_NO_PAD.encode(encoder.finish().expect("finish"));
        assert!(deserialize_state(&wrong_shape).is_none());
    }

    #[test]
    fn oversized_payloads_are_rejected() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder
            .write_all(&vec![b' '; MAX_STATE_BYTES + 1])
            .expect("write");
        let payload = URL_SAFE_NO_PAD.encode(encoder.finish().expect("finish"));
        assert!(payload.len() < 64 * 1024);
        assert!(deserialize_state(&payload).is_none());
    }

    #[test]
    fn older_payloads_without_tempo_still_decode() {
        let old = json!({
            "nodes": [{ "id": "a", "typeId": "drum_sounds" }],
            "edges": [],
            "config": { "config": { "a": { "sound": "hh*4" } } },
            "theme": "strudel",
            "colorMode": "dark"
        });
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(old.to_string().as_bytes())
            .expect("write");
        let payload = URL_SAFE_NO_PAD.encode(encoder.finish().expect("finish"));

        let state = deserialize_state(&payload).expect("decodes");
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.cpm, None);
        assert!(state.config.muted_nodes.is_empty());
        assert_eq!(
            state.config.config.get("a").and_then(|r| r.get("sound")),
            Some(&json!("hh*4"))
        );
    }

    #[test]
    fn share_url_replaces_existing_param() {
        let url = share_url("https://example.com/app?flow=old&lang=en", "flow", "abc_-1")
            .expect("url");
        assert_eq!(url, "https://example.com/app?lang=en&flow=abc_-1");
        assert_eq!(state_param_from_url(&url, "flow").as_deref(), Some("abc_-1"));
        assert_eq!(state_param_from_url(&url, "other"), None);
        assert_eq!(state_param_from_url("https://example.com/?flow=", "flow"), None);
        assert!(share_url("not a url", "flow", "x").is_err());
    }
}
