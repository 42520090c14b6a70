use super::*;

const DEFAULT_ROLL_STEPS: usize = 8;
const MAX_ROLL_STEPS: usize = 256;
const MAX_ARP_OCTAVES: i64 = 4;

pub fn lookup(type_id: &str) -> Option<TransformFn> {
    let transform: TransformFn = match type_id {
        "drum_sounds" => drum_sounds,
        "pad" => pad,
        "piano_roll" => piano_roll,
        "arpeggiator" => arpeggiator,
        "custom" => custom,
        _ => return None,
    };
    Some(transform)
}

fn drum_sounds(_node: &NodeInstance, config: &ConfigRecord, acc: String) -> String {
    match param_text(config, "sound") {
        Some(sound) => push_source(acc, &format!("sound({})", quoted(&sound))),
        None => acc,
    }
}

fn step_active(step: &Value) -> bool {
    match step {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        _ => false,
    }
}

/// Beat grid: one row of steps per sound.
fn pad(_node: &NodeInstance, config: &ConfigRecord, acc: String) -> String {
    let (Some(sounds), Some(grid)) = (
        config.get("sounds").and_then(Value::as_array),
        config.get("grid").and_then(Value::as_array),
    ) else {
        return acc;
    };

    let rows: Vec<String> = grid
        .iter()
        .zip(sounds)
        .filter_map(|(row, sound)| {
            let sound = sound.as_str()?.trim();
            let steps = row.as_array()?;
            if sound.is_empty() || !steps.iter().any(step_active) {
                return None;
            }
            let sequence = steps
                .iter()
                .map(|step| if step_active(step) { sound } else { "~" })
                .collect::<Vec<_>>()
                .join(" ");
            Some(format!("sound({})", quoted(&sequence)))
        })
        .collect();

    match rows.len() {
        0 => acc,
        1 => push_source(acc, &rows[0]),
        _ => push_source(acc, &format!("stack({})", rows.join(", "))),
    }
}

fn piano_roll(_node: &NodeInstance, config: &ConfigRecord, acc: String) -> String {
    let Some(notes) = config.get("notes").and_then(Value::as_array) else {
        return acc;
    };
    let steps = match config.get("steps") {
        Some(Value::Number(n)) => n.as_u64().map(|v| v as usize),
        Some(Value::String(s)) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
    .filter(|s| *s > 0)
    .map(|s| s.min(MAX_ROLL_STEPS))
    .unwrap_or(DEFAULT_ROLL_STEPS);

    let mut columns: Vec<Vec<&str>> = vec![Vec::new(); steps];
    for note in notes {
        let step = note.get("step").and_then(Value::as_u64).map(|s| s as usize);
        let pitch = note
            .get("pitch")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|p| !p.is_empty());
        if let (Some(step), Some(pitch)) = (step, pitch) {
            if step < steps {
                columns[step].push(pitch);
            }
        }
    }

    if columns.iter().all(Vec::is_empty) {
        return acc;
    }

    let sequence = columns
        .iter()
        .map(|column| match column.len() {
            0 => "~".to_string(),
            1 => column[0].to_string(),
            _ => format!("[{}]", column.join(",")),
        })
        .collect::<Vec<_>>()
        .join(" ");
    push_source(acc, &format!("note({})", quoted(&sequence)))
}

fn arpeggiator(_node: &NodeInstance, config: &ConfigRecord, acc: String) -> String {
    let Some(notes) = param_text(config, "notes") else {
        return acc;
    };
    let tokens: Vec<&str> = notes.split_whitespace().collect();
    let octaves = param_number(config, "octaves")
        .and_then(|o| o.parse::<f64>().ok())
        .map(|o| (o as i64).clamp(1, MAX_ARP_OCTAVES))
        .unwrap_or(1);

    // Octave stacking only makes sense for scale degrees.
    let degrees: Option<Vec<i64>> = tokens.iter().map(|t| t.parse::<i64>().ok()).collect();
    let stacked: Option<Vec<String>> = degrees.and_then(|degrees| {
        (0..octaves)
            .flat_map(|octave| degrees.iter().map(move |d| d.checked_add(octave * 7)))
            .map(|d| d.map(|d| d.to_string()))
            .collect()
    });
    let mut sequence: Vec<String> =
        stacked.unwrap_or_else(|| tokens.iter().map(|t| t.to_string()).collect());

    match param_text(config, "mode").as_deref() {
        Some("down") => sequence.reverse(),
        Some("updown") if sequence.len() > 2 => {
            let descent: Vec<String> = sequence[1..sequence.len() - 1]
                .iter()
                .rev()
                .cloned()
                .collect();
            sequence.extend(descent);
        }
        _ => {}
    }

    push_source(acc, &format!("n({})", quoted(&sequence.join(" "))))
}

/// Raw pattern code. A leading `.` chains onto the accumulator.
fn custom(_node: &NodeInstance, config: &ConfigRecord, acc: String) -> String {
    let Some(code) = param_text(config, "code") else {
        return acc;
    };
    if code.starts_with('.') {
        if acc.is_empty() {
            acc
        } else {
            format!("{}{}", acc, code)
        }
    } else {
        push_source(acc, &code)
    }
}

pub fn get_node_types() -> Vec<NodeTypeDef> {
    vec![
        node_type(
            "drum_sounds",
            "Drum Sounds",
            "Plays a mini-notation sequence of drum samples.",
            "Instruments",
            vec![param("sound", "Sound", ParamType::Text, json!("bd sd"))],
        ),
        node_type(
            "pad",
            "Beat Pad",
            "Step grid with one row per sample.",
            "Instruments",
            vec![
                param("sounds", "Sounds", ParamType::Text, json!(["bd", "sd", "hh"])),
                param("grid", "Grid", ParamType::Grid, json!([])),
            ],
        ),
        node_type(
            "piano_roll",
            "Piano Roll",
            "Note grid; stacked notes on the same step play as a chord.",
            "Instruments",
            vec![
                param("notes", "Notes", ParamType::Notes, json!([])),
                param("steps", "Steps", ParamType::Number, json!(DEFAULT_ROLL_STEPS)),
            ],
        ),
        node_type(
            "arpeggiator",
            "Arpeggiator",
            "Walks scale degrees up, down or both, across octaves.",
            "Instruments",
            vec![
                param("notes", "Degrees", ParamType::Text, json!("0 2 4")),
                param("mode", "Mode", ParamType::Text, json!("up")),
                param("octaves", "Octaves", ParamType::Number, json!(1)),
            ],
        ),
        node_type(
            "custom",
            "Custom Code",
            "Raw pattern code. Start with '.' to chain onto upstream nodes.",
            "Instruments",
            vec![param("code", "Code", ParamType::Text, json!(""))],
        ),
    ]
}
