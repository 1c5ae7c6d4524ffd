//! Deterministic cache keys for listing requests

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Prefix of every listing cache key
pub const CACHE_KEY_PREFIX: &str = "product_filter:";

/// Cache key for a raw argument map.
///
/// Keys are sorted. Strings holding a JSON object or array are decoded
/// first; other strings are used verbatim. Everything else is rendered as
/// canonical JSON with recursively sorted object keys, so the key does not
/// depend on insertion order at any depth.
pub fn cache_key(args: &Map<String, Value>) -> String {
    let mut keys: Vec<&String> = args.keys().collect();
    keys.sort();

    let joined = keys
        .into_iter()
        .map(|key| {
            let value = match &args[key.as_str()] {
                Value::String(s) => encoded_json(s).unwrap_or_else(|| s.clone()),
                other => canonical_json(other),
            };
            format!("{}:{}", key, value)
        })
        .collect::<Vec<_>>()
        .join("|");

    let digest = Sha256::digest(joined.as_bytes());
    format!("{}{}", CACHE_KEY_PREFIX, hex::encode(digest))
}

fn encoded_json(s: &str) -> Option<String> {
    match serde_json::from_str::<Value>(s) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(canonical_json(&value)),
        _ => None,
    }
}

fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), canonical_json(v)))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{}}}", body)
        }
        Value::Array(items) => {
            let body = items
                .iter()
                .map(canonical_json)
                .collect::<Vec<_>>()
                .join(",");
            format!("[{}]", body)
        }
        scalar => scalar.to_string(),
    }
}
