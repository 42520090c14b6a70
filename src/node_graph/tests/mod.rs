use super::{
    find_all_groups, find_connected_node_ids, generate_output, group_id_for, nodes, Edge,
    NodeInstance, PatternGroup,
};
use crate::config_store::{record_from_json, ConfigStore};
use serde_json::{json, Value};

fn node(id: &str, type_id: &str) -> NodeInstance {
    NodeInstance::new(id, type_id)
}

fn edge(source: &str, target: &str) -> Edge {
    Edge::new(format!("{}->{}", source, target), source, target)
}

fn store(entries: &[(&str, Value)]) -> ConfigStore {
    let mut store = ConfigStore::new();
    for (id, value) in entries {
        store.update_node(id, record_from_json(value.clone()));
    }
    store
}

fn transform(type_id: &str, config: Value, acc: &str) -> String {
    nodes::apply(&node("n", type_id), &record_from_json(config), acc.to_string())
}

fn ids(group: &PatternGroup) -> Vec<&str> {
    group.node_ids.iter().map(String::as_str).collect()
}

#[test]
fn connected_ids_follow_edges_both_ways_and_survive_cycles() {
    let edges = vec![edge("a", "b"), edge("c", "b"), edge("c", "a"), edge("x", "y")];
    assert_eq!(find_connected_node_ids("b", &edges), vec!["b", "a", "c"]);
    assert_eq!(find_connected_node_ids("y", &edges), vec!["y", "x"]);
    assert_eq!(find_connected_node_ids("lonely", &edges), vec!["lonely"]);
}

#[test]
fn passive_node_is_excluded_but_keeps_its_component_together() {
    let nodes = vec![node("a", "drum_sounds"), node("b", "label")];
    let edges = vec![edge("a", "b")];
    let config = store(&[("a", json!({ "sound": "bd" }))]);

    let groups = find_all_groups(&nodes, &edges, &config);
    assert_eq!(groups.len(), 1);
    assert_eq!(ids(&groups[0]), vec!["a"]);
    assert_eq!(groups[0].group_id, "a");
    assert_eq!(
        generate_output(&nodes, &edges, &config, "30"),
        "setcpm(30)\n$: sound(\"bd\")"
    );
}

#[test]
fn filtering_happens_after_traversal() {
    // kick - note - hats: the label in the middle must not split the group
    let nodes = vec![
        node("kick", "drum_sounds"),
        node("note", "label"),
        node("hats", "drum_sounds"),
    ];
    let edges = vec![edge("kick", "note"), edge("note", "hats")];
    let config = store(&[
        ("kick", json!({ "sound": "bd*2" })),
        ("hats", json!({ "sound": "hh*8" })),
    ]);

    let groups = find_all_groups(&nodes, &edges, &config);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group_id, "hats-kick");
    assert_eq!(ids(&groups[0]), vec!["kick", "hats"]);
    assert_eq!(
        generate_output(&nodes, &edges, &config, "30"),
        "setcpm(30)\n$: stack(sound(\"bd*2\"), sound(\"hh*8\"))"
    );
}

#[test]
fn passive_node_with_config_joins_its_group() {
    let nodes = vec![node("a", "drum_sounds"), node("tag", "label")];
    let edges = vec![edge("tag", "a")];
    let config = store(&[("a", json!({ "sound": "bd" })), ("tag", json!({ "text": "intro" }))]);

    let groups = find_all_groups(&nodes, &edges, &config);
    assert_eq!(groups[0].group_id, "a-tag");
    assert_eq!(
        generate_output(&nodes, &edges, &config, "30"),
        "setcpm(30)\n$: sound(\"bd\")"
    );
}

#[test]
fn isolated_silent_nodes_form_no_group() {
    let nodes = vec![node("note", "label"), node("other", "label")];
    let config = store(&[]);
    assert!(find_all_groups(&nodes, &[], &config).is_empty());
    assert_eq!(generate_output(&nodes, &[], &config, "90"), "");
}

#[test]
fn group_ids_do_not_depend_on_node_order() {
    let mut nodes = vec![
        node("drums", "drum_sounds"),
        node("gain", "gain"),
        node("lpf", "lpf"),
        node("bass", "synth"),
    ];
    let edges = vec![edge("drums", "gain"), edge("gain", "lpf")];
    let config = store(&[
        ("drums", json!({ "sound": "bd" })),
        ("bass", json!({ "sound": "sawtooth" })),
    ]);

    let mut forward: Vec<String> = find_all_groups(&nodes, &edges, &config)
        .into_iter()
        .map(|g| g.group_id)
        .collect();
    nodes.reverse();
    let mut reversed: Vec<String> = find_all_groups(&nodes, &edges, &config)
        .into_iter()
        .map(|g| g.group_id)
        .collect();

    forward.sort();
    reversed.sort();
    assert_eq!(forward, reversed);
    assert_eq!(forward, vec!["bass", "drums-gain-lpf"]);
}

#[test]
fn output_is_deterministic() {
    let nodes = vec![node("a", "drum_sounds"), node("b", "gain"), node("c", "piano_roll")];
    let edges = vec![edge("a", "b")];
    let config = store(&[
        ("a", json!({ "sound": "bd sd" })),
        ("b", json!({ "gain": "0.7" })),
        ("c", json!({ "notes": [{ "step": 0, "pitch": "c3" }], "steps": 4 })),
    ]);

    let first = generate_output(&nodes, &edges, &config, "30");
    let second = generate_output(&nodes, &edges, &config, "30");
    assert_eq!(first, second);
    assert_eq!(
        first,
        "setcpm(30)\n$: sound(\"bd sd\").gain(0.7)\n$: note(\"c3 ~ ~ ~\")"
    );
}

#[test]
fn disconnected_groups_emit_one_line_each_in_discovery_order() {
    let nodes = vec![
        node("x", "drum_sounds"),
        node("y", "drum_sounds"),
        node("z", "drum_sounds"),
    ];
    let config = store(&[
        ("x", json!({ "sound": "bd" })),
        ("y", json!({ "sound": "sd" })),
        ("z", json!({ "sound": "hh" })),
    ]);
    assert_eq!(
        generate_output(&nodes, &[], &config, "30"),
        "setcpm(30)\n$: sound(\"bd\")\n$: sound(\"sd\")\n$: sound(\"hh\")"
    );
}

#[test]
fn tempo_prefix_uses_given_cpm_or_default() {
    let nodes = vec![node("a", "drum_sounds")];
    let config = store(&[("a", json!({ "sound": "bd" }))]);

    assert!(generate_output(&nodes, &[], &config, "90").starts_with("setcpm(90)\n$: "));
    assert!(generate_output(&nodes, &[], &config, "  ").starts_with("setcpm(30)\n"));
}

#[test]
fn fold_follows_signal_flow_not_node_order() {
    let nodes = vec![node("gain", "gain"), node("drums", "drum_sounds")];
    let edges = vec![edge("drums", "gain")];
    let config = store(&[
        ("drums", json!({ "sound": "bd" })),
        ("gain", json!({ "gain": 0.5 })),
    ]);

    let groups = find_all_groups(&nodes, &edges, &config);
    assert_eq!(ids(&groups[0]), vec!["drums", "gain"]);
    assert_eq!(groups[0].group_id, group_id_for(&groups[0].node_ids));
    assert_eq!(
        generate_output(&nodes, &edges, &config, "30"),
        "setcpm(30)\n$: sound(\"bd\").gain(0.5)"
    );
}

#[test]
fn directed_cycle_falls_back_to_discovery_order() {
    let nodes = vec![node("a", "drum_sounds"), node("b", "gain"), node("c", "lpf")];
    let edges = vec![edge("a", "b"), edge("b", "c"), edge("c", "a")];
    let config = store(&[
        ("a", json!({ "sound": "bd" })),
        ("b", json!({ "gain": 0.5 })),
        ("c", json!({ "lpf": 800 })),
    ]);

    let groups = find_all_groups(&nodes, &edges, &config);
    assert_eq!(ids(&groups[0]), vec!["a", "b", "c"]);
    assert_eq!(
        generate_output(&nodes, &edges, &config, "30"),
        "setcpm(30)\n$: sound(\"bd\").gain(0.5).lpf(800)"
    );
}

#[test]
fn paused_group_compiles_to_nothing() {
    let nodes = vec![node("a", "drum_sounds"), node("b", "gain")];
    let edges = vec![edge("a", "b")];
    let mut config = store(&[
        ("a", json!({ "sound": "bd" })),
        ("b", json!({ "gain": 0.5 })),
    ]);
    config.pause_group("a-b", &["a".to_string(), "b".to_string()]);

    assert_eq!(generate_output(&nodes, &edges, &config, "30"), "");
    config.unpause_group("a-b");
    assert_eq!(
        generate_output(&nodes, &edges, &config, "30"),
        "setcpm(30)\n$: sound(\"bd\").gain(0.5)"
    );
}

#[test]
fn effects_need_something_to_apply_to() {
    assert_eq!(transform("gain", json!({ "gain": 0.8 }), ""), "");
    assert_eq!(transform("gain", json!({ "gain": "" }), "s(\"bd\")"), "s(\"bd\")");
    assert_eq!(transform("gain", json!({ "gain": "loud" }), "s(\"bd\")"), "s(\"bd\")");
    assert_eq!(
        transform("lpf", json!({ "lpf": 1200, "lpq": "4" }), "s(\"bd\")"),
        "s(\"bd\").lpf(1200).lpq(4)"
    );
    assert_eq!(
        transform("delay", json!({ "delaytime": 0.25 }), "s(\"bd\")"),
        "s(\"bd\").delaytime(0.25)"
    );
    assert_eq!(transform("unknown_type", json!({ "x": 1 }), "acc"), "acc");
}

#[test]
fn pattern_effects() {
    assert_eq!(
        transform("scale", json!({ "scale": "C:minor" }), "n(\"0 2\")"),
        "n(\"0 2\").scale(\"C:minor\")"
    );
    assert_eq!(transform("jux", json!({ "jux": "rev" }), "s(\"bd\")"), "s(\"bd\").jux(rev)");
    assert_eq!(
        transform("palindrome", json!({ "enabled": true }), "s(\"bd\")"),
        "s(\"bd\").palindrome()"
    );
    assert_eq!(transform("palindrome", json!({ "enabled": false }), "s(\"bd\")"), "s(\"bd\")");
    assert_eq!(
        transform("bank", json!({ "bank": "RolandTR909" }), "s(\"bd\")"),
        "s(\"bd\").bank(\"RolandTR909\")"
    );
}

#[test]
fn sources_stack_onto_existing_patterns() {
    assert_eq!(
        transform("drum_sounds", json!({ "sound": "hh" }), "sound(\"bd\")"),
        "stack(sound(\"bd\"), sound(\"hh\"))"
    );
    assert_eq!(transform("drum_sounds", json!({ "sound": "  " }), ""), "");
    assert_eq!(transform("custom", json!({ "code": ".fast(2)" }), ""), "");
    assert_eq!(
        transform("custom", json!({ "code": ".fast(2)" }), "s(\"bd\")"),
        "s(\"bd\").fast(2)"
    );
    assert_eq!(transform("custom", json!({ "code": "s(\"cp\")" }), ""), "s(\"cp\")");
}

#[test]
fn synth_voices_upstream_notes_or_drones() {
    assert_eq!(
        transform("synth", json!({ "sound": "sawtooth", "release": 0.3 }), ""),
        "sound(\"sawtooth\").release(0.3)"
    );
    assert_eq!(
        transform("synth", json!({ "sound": "sine", "attack": "0.1" }), "note(\"c3\")"),
        "note(\"c3\").sound(\"sine\").attack(0.1)"
    );
}

#[test]
fn pad_rows_become_sound_sequences() {
    let config = json!({
        "sounds": ["bd", "hh", "sd"],
        "grid": [
            [true, false, true, false],
            [false, false, false, false],
            [0, 1, 0, 1]
        ]
    });
    assert_eq!(
        transform("pad", config, ""),
        "stack(sound(\"bd ~ bd ~\"), sound(\"~ sd ~ sd\"))"
    );
    assert_eq!(
        transform("pad", json!({ "sounds": ["bd"], "grid": [[true, false]] }), ""),
        "sound(\"bd ~\")"
    );
    assert_eq!(transform("pad", json!({ "sounds": ["bd"], "grid": [[false]] }), ""), "");
}

#[test]
fn piano_roll_groups_chords_per_step() {
    let config = json!({
        "steps": 4,
        "notes": [
            { "step": 0, "pitch": "c3" },
            { "step": 0, "pitch": "e3" },
            { "step": 2, "pitch": "g3" },
            { "step": 9, "pitch": "a3" }
        ]
    });
    assert_eq!(transform("piano_roll", config, ""), "note(\"[c3,e3] ~ g3 ~\")");
    assert_eq!(transform("piano_roll", json!({ "notes": [] }), "acc"), "acc");
}

#[test]
fn piano_roll_caps_the_step_count() {
    let config = json!({ "steps": u64::MAX, "notes": [{ "step": 0, "pitch": "c3" }] });
    let out = transform("piano_roll", config, "");
    assert!(out.starts_with("note(\"c3 ~"));
    assert_eq!(out.matches('~').count(), 255);

    let beyond = json!({ "steps": 1000, "notes": [{ "step": 300, "pitch": "c3" }] });
    assert_eq!(transform("piano_roll", beyond, "acc"), "acc");
}

#[test]
fn arpeggiator_modes_and_octaves() {
    assert_eq!(transform("arpeggiator", json!({ "notes": "0 2 4" }), ""), "n(\"0 2 4\")");
    assert_eq!(
        transform("arpeggiator", json!({ "notes": "0 2 4", "mode": "down" }), ""),
        "n(\"4 2 0\")"
    );
    assert_eq!(
        transform("arpeggiator", json!({ "notes": "0 2 4", "mode": "updown" }), ""),
        "n(\"0 2 4 2\")"
    );
    assert_eq!(
        transform("arpeggiator", json!({ "notes": "0 4", "octaves": 2 }), ""),
        "n(\"0 4 7 11\")"
    );
    assert_eq!(
        transform("arpeggiator", json!({ "notes": "0", "octaves": 99 }), ""),
        "n(\"0 7 14 21\")"
    );
}

#[test]
fn arpeggiator_keeps_degrees_that_cannot_be_stacked() {
    let config = json!({ "notes": "9223372036854775807", "octaves": 2 });
    assert_eq!(
        transform("arpeggiator", config, ""),
        "n(\"9223372036854775807\")"
    );
}

#[test]
fn catalog_lists_every_registered_type() {
    let types = nodes::get_node_types();
    for def in &types {
        if def.id != "label" {
            assert!(nodes::has_transform(&def.id), "{} has no transform", def.id);
        }
    }
    for id in ["drum_sounds", "pad", "synth", "gain", "scale", "palindrome"] {
        assert!(types.iter().any(|def| def.id == id), "{} missing", id);
    }
    assert!(!nodes::has_transform("label"));
}
