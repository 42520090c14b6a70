use serde_json::{json, Value};

use crate::models::node_graph::*;

mod effects;
mod instruments;
mod synths;

/// Appends a node's musical contribution to the accumulated pattern expression.
///
/// Must be pure: same node, config and accumulator always give the same string,
/// and a node that contributes nothing hands `acc` back untouched.
pub type TransformFn = fn(&NodeInstance, &ConfigRecord, String) -> String;

/// Dispatch table from node type id to its transform.
pub fn lookup(type_id: &str) -> Option<TransformFn> {
    instruments::lookup(type_id)
        .or_else(|| synths::lookup(type_id))
        .or_else(|| effects::lookup(type_id))
}

pub fn has_transform(type_id: &str) -> bool {
    lookup(type_id).is_some()
}

/// Runs the node's transform, or passes `acc` through for unregistered types.
pub fn apply(node: &NodeInstance, config: &ConfigRecord, acc: String) -> String {
    match lookup(&node.type_id) {
        Some(transform) => transform(node, config, acc),
        None => acc,
    }
}

pub fn get_node_types() -> Vec<NodeTypeDef> {
    let mut types = Vec::new();
    types.extend(instruments::get_node_types());
    types.extend(synths::get_node_types());
    types.extend(effects::get_node_types());
    types.push(node_type(
        "label",
        "Label",
        "Free-text note for annotating the canvas. Produces no sound.",
        "Utility",
        vec![param("text", "Text", ParamType::Text, json!(""))],
    ));
    types
}

fn node_type(
    id: &str,
    name: &str,
    description: &str,
    category: &str,
    params: Vec<ParamDef>,
) -> NodeTypeDef {
    NodeTypeDef {
        id: id.into(),
        name: name.into(),
        description: Some(description.into()),
        category: Some(category.into()),
        params,
    }
}

fn param(id: &str, name: &str, param_type: ParamType, default_value: Value) -> ParamDef {
    ParamDef {
        id: id.into(),
        name: name.into(),
        param_type,
        default_value,
    }
}

/// Non-empty text for `key`. Numbers are rendered the way JSON prints them.
pub(crate) fn param_text(config: &ConfigRecord, key: &str) -> Option<String> {
    match config.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Like [`param_text`] but only accepts values that read as a finite number.
pub(crate) fn param_number(config: &ConfigRecord, key: &str) -> Option<String> {
    let text = param_text(config, key)?;
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(text),
        _ => None,
    }
}

pub(crate) fn param_bool(config: &ConfigRecord, key: &str) -> bool {
    match config.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        _ => false,
    }
}

pub(crate) fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\\\""))
}

/// Starts a chain, or layers the new source over what is already there.
pub(crate) fn push_source(acc: String, source: &str) -> String {
    if acc.is_empty() {
        source.to_string()
    } else {
        format!("stack({}, {})", acc, source)
    }
}

/// Chains `.method(arg)`. Nothing to chain onto means nothing to emit.
pub(crate) fn push_call(acc: String, method: &str, arg: &str) -> String {
    if acc.is_empty() {
        acc
    } else {
        format!("{}.{}({})", acc, method, arg)
    }
}
