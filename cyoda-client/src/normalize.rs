//! Response normalization at the transport boundary.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Resolves the platform id of an entity.
///
/// Priority: `technical_id`, then `meta.id`, then `id`.
pub fn resolve_technical_id(entity: &Value) -> Option<String> {
    [
        entity.get("technical_id"),
        entity.get("meta").and_then(|m| m.get("id")),
        entity.get("id"),
    ]
    .into_iter()
    .flatten()
    .find_map(id_to_string)
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Flattens a `{data, meta}` read envelope into the document itself plus
/// `technical_id`, `current_state` and the original `meta`.
///
/// Documents without an envelope only gain a resolved `technical_id`.
pub fn normalize_envelope(raw: Value) -> Value {
    let Value::Object(mut outer) = raw else {
        return raw;
    };

    let is_envelope = matches!(outer.get("data"), Some(Value::Object(_)))
        && matches!(outer.get("meta"), Some(Value::Object(_)));

    if !is_envelope {
        let entity = Value::Object(outer);
        return with_technical_id(entity, None);
    }

    let meta = outer.remove("meta").unwrap_or(Value::Null);
    let mut data = match outer.remove("data") {
        Some(Value::Object(data)) => data,
        _ => Map::new(),
    };

    if let Some(id) = meta.get("id").and_then(id_to_string) {
        data.insert("technical_id".to_string(), Value::String(id));
    }
    if let Some(state) = meta.get("state") {
        data.insert("current_state".to_string(), state.clone());
    }
    data.insert("meta".to_string(), meta);

    Value::Object(data)
}

/// Normalizes one snapshot result node (`{id, tree}`, or a read envelope).
pub fn normalize_snapshot_node(node: Value) -> Value {
    match node {
        Value::Object(mut obj) if obj.contains_key("tree") => {
            let id = obj.get("id").and_then(id_to_string);
            let tree = obj.remove("tree").unwrap_or(Value::Null);
            with_technical_id(tree, id)
        }
        other => normalize_envelope(other),
    }
}

/// Inserts `technical_id` (the explicit fallback, else the resolved id)
/// unless the entity already carries one.
pub fn with_technical_id(entity: Value, fallback: Option<String>) -> Value {
    let Value::Object(mut obj) = entity else {
        return entity;
    };
    if !obj.contains_key("technical_id") {
        let id = fallback.or_else(|| resolve_technical_id(&Value::Object(obj.clone())));
        if let Some(id) = id {
            obj.insert("technical_id".to_string(), Value::String(id));
        }
    }
    Value::Object(obj)
}

/// Extracts `entityIds[0]` from a save/update response.
///
/// Accepts the list form (first item is authoritative) and the single-object
/// form. Missing, empty or null ids yield `None`.
pub fn extract_entity_id(body: &Value) -> Option<String> {
    let item = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };
    item.as_object()?
        .get("entityIds")?
        .as_array()?
        .first()
        .and_then(id_to_string)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountEntry {
    pub count: u64,
}

/// Entity statistics in either of the shapes the platform returns.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CountPayload {
    Single(CountEntry),
    Many(Vec<CountEntry>),
}

impl CountPayload {
    /// Decodes a stats body; unrecognized shapes yield `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    pub fn total(&self) -> u64 {
        match self {
            CountPayload::Single(entry) => entry.count,
            CountPayload::Many(entries) => entries.iter().map(|e| e.count).sum(),
        }
    }
}

/// Available workflow transitions in any of the shapes the platform returns.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionsPayload {
    List(Vec<String>),
    Map(Vec<String>),
    Other(Value),
}

impl TransitionsPayload {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => TransitionsPayload::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Value::Object(map) => TransitionsPayload::Map(map.into_iter().map(|(k, _)| k).collect()),
            other => TransitionsPayload::Other(other),
        }
    }

    /// Transition names: a list as-is, a mapping's keys, otherwise `None`.
    pub fn into_names(self) -> Option<Vec<String>> {
        match self {
            TransitionsPayload::List(names) | TransitionsPayload::Map(names) => Some(names),
            TransitionsPayload::Other(_) => None,
        }
    }
}
