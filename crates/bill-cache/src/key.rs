//! Deterministic cache-key generation

use serde_json::Value;

/// Build a cache key from a prefix and an optional parameter object.
///
/// Parameter names are sorted and concatenated as `name=value` pairs joined
/// with `&`, appended to the prefix with `_`. Parameter order never affects
/// the result. A missing, non-object or empty parameter set yields the bare
/// prefix. String values render without quotes; other values use their JSON
/// rendering.
pub fn generate_key(prefix: &str, params: Option<&Value>) -> String {
    let Some(Value::Object(map)) = params else {
        return prefix.to_string();
    };
    if map.is_empty() {
        return prefix.to_string();
    }

    let mut names: Vec<&String> = map.keys().collect();
    names.sort();

    let pairs: Vec<String> = names
        .into_iter()
        .map(|name| format!("{name}={}", render(&map[name])))
        .collect();

    format!("{prefix}_{}", pairs.join("&"))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
