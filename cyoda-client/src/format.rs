//! Translation of neutral criteria into the platform's condition DSL.
//!
//! Accepted inputs:
//! - a `{"type": "group", ...}` condition, returned unchanged
//! - a single `{"type": "simple" | "lifecycle", ...}` condition, wrapped in an AND group
//! - a flat mapping of `field -> value` or `field -> {op: value}`
//! - the combined forms `{"and": [..]}` / `{"or": [..]}` produced by the service layer
//!
//! Output is always `{"type": "group", "operator": "AND" | "OR", "conditions": [..]}`.

use serde_json::{json, Map, Value};

/// Workflow fields owned by the platform rather than the document.
const LIFECYCLE_FIELDS: [&str; 2] = ["state", "current_state"];

/// Maps a short operator code to the platform's `operatorType`.
///
/// Keys are case-sensitive.
pub fn map_operator(code: &str) -> Option<&'static str> {
    let mapped = match code {
        "eq" => "EQUALS",
        "ieq" => "IEQUALS",
        "ne" => "NOT_EQUALS",
        "contains" => "CONTAINS",
        "icontains" => "ICONTAINS",
        "gt" => "GREATER_THAN",
        "lt" => "LESS_THAN",
        "gte" => "GREATER_THAN_OR_EQUAL",
        "lte" => "LESS_THAN_OR_EQUAL",
        "startswith" => "STARTS_WITH",
        "endswith" => "ENDS_WITH",
        "in" => "IN",
        "not_in" => "NOT_IN",
        _ => return None,
    };
    Some(mapped)
}

/// Returns `criteria` as a platform condition group.
pub fn ensure_cyoda_format(criteria: &Value) -> Value {
    match criteria {
        Value::Object(map) => match map.get("type").and_then(Value::as_str) {
            Some("group") => criteria.clone(),
            Some("simple") | Some("lifecycle") => group("AND", vec![criteria.clone()]),
            _ => translate_mapping(map),
        },
        Value::Array(items) => combine("AND", items),
        _ => group("AND", Vec::new()),
    }
}

fn group(operator: &str, conditions: Vec<Value>) -> Value {
    json!({
        "type": "group",
        "operator": operator,
        "conditions": conditions,
    })
}

fn logical_operator(key: &str) -> Option<&'static str> {
    match key {
        "and" => Some("AND"),
        "or" => Some("OR"),
        _ => None,
    }
}

fn translate_mapping(map: &Map<String, Value>) -> Value {
    if map.len() == 1 {
        if let Some((key, Value::Array(items))) = map.iter().next() {
            if let Some(op) = logical_operator(key) {
                return combine(op, items);
            }
        }
    }

    let mut conditions = Vec::with_capacity(map.len());
    for (key, value) in map {
        match (logical_operator(key), value) {
            (Some(op), Value::Array(items)) => conditions.push(combine(op, items)),
            _ => conditions.extend(field_conditions(key, value)),
        }
    }
    group("AND", conditions)
}

/// Merges translated items under `operator`, splicing child groups that
/// carry the same operator or a single condition.
fn combine(operator: &str, items: &[Value]) -> Value {
    let mut conditions = Vec::new();
    for item in items {
        let child = ensure_cyoda_format(item);
        let child_operator = child["operator"].as_str().unwrap_or("AND");
        let child_conditions = match child.get("conditions") {
            Some(Value::Array(c)) => c.clone(),
            _ => Vec::new(),
        };

        if child_operator == operator || child_conditions.len() == 1 {
            conditions.extend(child_conditions);
        } else if !child_conditions.is_empty() {
            conditions.push(child);
        }
    }
    group(operator, conditions)
}

fn field_conditions(field: &str, value: &Value) -> Vec<Value> {
    if let Value::Object(ops) = value {
        let all_known = !ops.is_empty() && ops.keys().all(|k| map_operator(k).is_some());
        if all_known {
            return ops
                .iter()
                .filter_map(|(op, v)| map_operator(op).map(|mapped| condition(field, mapped, v)))
                .collect();
        }
    }
    vec![condition(field, "EQUALS", value)]
}

fn condition(field: &str, operator_type: &str, value: &Value) -> Value {
    if LIFECYCLE_FIELDS.contains(&field) {
        json!({
            "type": "lifecycle",
            "field": field,
            "operatorType": operator_type,
            "value": value,
        })
    } else {
        json!({
            "type": "simple",
            "jsonPath": format!("$.{field}"),
            "operatorType": operator_type,
            "value": value,
        })
    }
}
