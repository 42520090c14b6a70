use super::*;

pub fn lookup(type_id: &str) -> Option<TransformFn> {
    let transform: TransformFn = match type_id {
        "synth" => synth,
        "bank" => bank,
        _ => return None,
    };
    Some(transform)
}

/// Oscillator voice. Sounds upstream notes, or drones on its own.
fn synth(_node: &NodeInstance, config: &ConfigRecord, acc: String) -> String {
    let Some(sound) = param_text(config, "sound") else {
        return acc;
    };
    let mut out = if acc.is_empty() {
        format!("sound({})", quoted(&sound))
    } else {
        format!("{}.sound({})", acc, quoted(&sound))
    };
    for envelope in ["attack", "release"] {
        if let Some(value) = param_number(config, envelope) {
            out = push_call(out, envelope, &value);
        }
    }
    out
}

fn bank(_node: &NodeInstance, config: &ConfigRecord, acc: String) -> String {
    match param_text(config, "bank") {
        Some(bank) => push_call(acc, "bank", &quoted(&bank)),
        None => acc,
    }
}

pub fn get_node_types() -> Vec<NodeTypeDef> {
    vec![
        node_type(
            "synth",
            "Synth",
            "Basic oscillator with attack/release.",
            "Synths",
            vec![
                param("sound", "Waveform", ParamType::Text, json!("sawtooth")),
                param("attack", "Attack", ParamType::Number, json!("")),
                param("release", "Release", ParamType::Number, json!("")),
            ],
        ),
        node_type(
            "bank",
            "Sample Bank",
            "Selects the drum machine bank used by upstream sounds.",
            "Synths",
            vec![param("bank", "Bank", ParamType::Text, json!("RolandTR909"))],
        ),
    ]
}
