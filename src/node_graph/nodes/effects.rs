use super::*;

/// Numeric effects: node type -> (config key / method name, display name), chained in order.
const NUMERIC_EFFECTS: &[(&str, &str, &[(&str, &str)])] = &[
    ("gain", "Gain", &[("gain", "Gain")]),
    ("lpf", "Low-pass Filter", &[("lpf", "Cutoff"), ("lpq", "Resonance")]),
    ("hpf", "High-pass Filter", &[("hpf", "Cutoff")]),
    ("room", "Reverb", &[("room", "Amount"), ("roomsize", "Size")]),
    (
        "delay",
        "Delay",
        &[
            ("delay", "Amount"),
            ("delaytime", "Time"),
            ("delayfeedback", "Feedback"),
        ],
    ),
    ("distort", "Distortion", &[("distort", "Drive")]),
    ("crush", "Bit Crush", &[("crush", "Bits")]),
    ("pan", "Pan", &[("pan", "Position")]),
    ("speed", "Playback Speed", &[("speed", "Speed")]),
    ("postgain", "Post Gain", &[("postgain", "Gain")]),
    ("fast", "Fast", &[("fast", "Factor")]),
    ("slow", "Slow", &[("slow", "Factor")]),
];

fn numeric_params(type_id: &str) -> Option<&'static [(&'static str, &'static str)]> {
    NUMERIC_EFFECTS
        .iter()
        .find(|(id, _, _)| *id == type_id)
        .map(|(_, _, params)| *params)
}

pub fn lookup(type_id: &str) -> Option<TransformFn> {
    let transform: TransformFn = match type_id {
        "scale" => scale,
        "jux" => jux,
        "palindrome" => palindrome,
        other if numeric_params(other).is_some() => numeric_effect,
        _ => return None,
    };
    Some(transform)
}

fn numeric_effect(node: &NodeInstance, config: &ConfigRecord, acc: String) -> String {
    let Some(params) = numeric_params(&node.type_id) else {
        return acc;
    };
    params
        .iter()
        .fold(acc, |acc, (key, _)| match param_number(config, key) {
            Some(value) => push_call(acc, key, &value),
            None => acc,
        })
}

fn scale(_node: &NodeInstance, config: &ConfigRecord, acc: String) -> String {
    match param_text(config, "scale") {
        Some(scale) => push_call(acc, "scale", &quoted(&scale)),
        None => acc,
    }
}

/// `jux` takes a function, so the value goes in unquoted (e.g. `rev`, `hurry(2)`).
fn jux(_node: &NodeInstance, config: &ConfigRecord, acc: String) -> String {
    match param_text(config, "jux") {
        Some(function) => push_call(acc, "jux", &function),
        None => acc,
    }
}

fn palindrome(_node: &NodeInstance, config: &ConfigRecord, acc: String) -> String {
    if param_bool(config, "enabled") {
        push_call(acc, "palindrome", "")
    } else {
        acc
    }
}

pub fn get_node_types() -> Vec<NodeTypeDef> {
    let mut types: Vec<NodeTypeDef> = NUMERIC_EFFECTS
        .iter()
        .map(|(id, name, params)| {
            node_type(
                id,
                name,
                &format!("Applies .{}() to the incoming pattern.", params[0].0),
                "Effects",
                params
                    .iter()
                    .map(|(key, label)| param(key, label, ParamType::Number, json!("")))
                    .collect(),
            )
        })
        .collect();

    types.push(node_type(
        "scale",
        "Scale",
        "Maps note degrees onto a scale, e.g. C:minor.",
        "Effects",
        vec![param("scale", "Scale", ParamType::Text, json!("C:major"))],
    ));
    types.push(node_type(
        "jux",
        "Jux",
        "Applies a function to the right channel only.",
        "Effects",
        vec![param("jux", "Function", ParamType::Text, json!("rev"))],
    ));
    types.push(node_type(
        "palindrome",
        "Palindrome",
        "Plays the pattern forwards then backwards.",
        "Effects",
        vec![param("enabled", "Enabled", ParamType::Toggle, json!(false))],
    ));
    types
}
