//! Tests for translating neutral criteria into platform condition groups.

use cyoda_client::{ensure_cyoda_format, map_operator};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// ── Pass-through and wrapping ───────────────────────────────────

#[test]
fn group_is_returned_unchanged() {
    let group = json!({
        "type": "group",
        "operator": "OR",
        "conditions": [{"type": "simple", "jsonPath": "$.a", "operatorType": "EQUALS", "value": 1}]
    });
    assert_eq!(ensure_cyoda_format(&group), group);
}

#[test]
fn single_simple_condition_is_wrapped_in_and_group() {
    let simple = json!({"type": "simple", "jsonPath": "$.a", "operatorType": "EQUALS", "value": 1});
    assert_eq!(
        ensure_cyoda_format(&simple),
        json!({"type": "group", "operator": "AND", "conditions": [simple]})
    );
}

#[test]
fn single_lifecycle_condition_is_wrapped() {
    let lifecycle = json!({"type": "lifecycle", "field": "state", "operatorType": "EQUALS", "value": "DONE"});
    let result = ensure_cyoda_format(&lifecycle);
    assert_eq!(result["operator"], "AND");
    assert_eq!(result["conditions"], json!([lifecycle]));
}

// ── Flat mappings ───────────────────────────────────────────────

#[test]
fn bare_value_defaults_to_equals() {
    assert_eq!(
        ensure_cyoda_format(&json!({"name": "Test"})),
        json!({
            "type": "group",
            "operator": "AND",
            "conditions": [
                {"type": "simple", "jsonPath": "$.name", "operatorType": "EQUALS", "value": "Test"}
            ]
        })
    );
}

#[test]
fn operator_object_is_mapped() {
    let result = ensure_cyoda_format(&json!({"value": {"gt": 10}}));
    assert_eq!(result["conditions"][0]["operatorType"], "GREATER_THAN");
    assert_eq!(result["conditions"][0]["value"], 10);
    assert_eq!(result["conditions"][0]["jsonPath"], "$.value");
}

#[test]
fn range_operators_produce_one_condition_each() {
    let result = ensure_cyoda_format(&json!({"age": {"gte": 18, "lte": 65}}));
    let ops: Vec<&str> = result["conditions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["operatorType"].as_str().unwrap())
        .collect();
    assert_eq!(ops, vec!["GREATER_THAN_OR_EQUAL", "LESS_THAN_OR_EQUAL"]);
}

#[test]
fn state_fields_become_lifecycle_conditions() {
    let result = ensure_cyoda_format(&json!({"state": "APPROVED", "current_state": {"ne": "DRAFT"}}));
    assert_eq!(
        result["conditions"],
        json!([
            {"type": "lifecycle", "field": "current_state", "operatorType": "NOT_EQUALS", "value": "DRAFT"},
            {"type": "lifecycle", "field": "state", "operatorType": "EQUALS", "value": "APPROVED"}
        ])
    );
}

#[test]
fn in_operator_keeps_list_value() {
    let result = ensure_cyoda_format(&json!({"status": {"in": ["a", "b"]}}));
    assert_eq!(result["conditions"][0]["operatorType"], "IN");
    assert_eq!(result["conditions"][0]["value"], json!(["a", "b"]));
}

#[test]
fn empty_mapping_is_an_empty_and_group() {
    assert_eq!(
        ensure_cyoda_format(&json!({})),
        json!({"type": "group", "operator": "AND", "conditions": []})
    );
}

#[test]
fn null_criteria_is_an_empty_and_group() {
    assert_eq!(ensure_cyoda_format(&Value::Null)["conditions"], json!([]));
}

// ── Combined forms ──────────────────────────────────────────────

#[test]
fn and_list_is_flattened() {
    let result = ensure_cyoda_format(&json!({"and": [{"name": "Test"}, {"price": {"lt": 5}}]}));
    assert_eq!(result["operator"], "AND");
    assert_eq!(
        result["conditions"],
        json!([
            {"type": "simple", "jsonPath": "$.name", "operatorType": "EQUALS", "value": "Test"},
            {"type": "simple", "jsonPath": "$.price", "operatorType": "LESS_THAN", "value": 5}
        ])
    );
}

#[test]
fn or_list_produces_or_group() {
    let result = ensure_cyoda_format(&json!({"or": [{"a": 1}, {"b": 2}]}));
    assert_eq!(result["operator"], "OR");
    assert_eq!(result["conditions"].as_array().unwrap().len(), 2);
}

#[test]
fn multi_key_member_of_or_stays_nested() {
    let result = ensure_cyoda_format(&json!({"or": [{"a": 1, "b": 2}, {"c": 3}]}));
    assert_eq!(result["operator"], "OR");
    assert_eq!(result["conditions"][0]["type"], "group");
    assert_eq!(result["conditions"][0]["operator"], "AND");
    assert_eq!(result["conditions"][1]["jsonPath"], "$.c");
}

#[test]
fn operator_table_is_complete() {
    let table = [
        ("eq", "EQUALS"),
        ("ieq", "IEQUALS"),
        ("ne", "NOT_EQUALS"),
        ("contains", "CONTAINS"),
        ("icontains", "ICONTAINS"),
        ("gt", "GREATER_THAN"),
        ("lt", "LESS_THAN"),
        ("gte", "GREATER_THAN_OR_EQUAL"),
        ("lte", "LESS_THAN_OR_EQUAL"),
        ("startswith", "STARTS_WITH"),
        ("endswith", "ENDS_WITH"),
        ("in", "IN"),
        ("not_in", "NOT_IN"),
    ];
    for (code, expected) in table {
        assert_eq!(map_operator(code), Some(expected), "code {code}");
    }
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

fn field_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z_]{0,10}")
        .unwrap()
        .prop_filter("logical keys are combinators", |f| f != "and" && f != "or")
}

fn operator_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "eq", "ieq", "ne", "contains", "icontains", "gt", "lt", "gte", "lte", "startswith",
        "endswith", "in", "not_in",
    ])
}

fn criterion_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
        (operator_strategy(), any::<i32>()).prop_map(|(op, v)| json!({ op: v })),
    ]
}

proptest! {
    /// Any flat mapping becomes an AND group with one condition per key.
    #[test]
    fn flat_mapping_yields_one_condition_per_key(
        entries in prop::collection::btree_map(field_strategy(), criterion_strategy(), 0..8)
    ) {
        let criteria: Map<String, Value> = entries.clone().into_iter().collect();
        let result = ensure_cyoda_format(&Value::Object(criteria));

        prop_assert_eq!(&result["type"], "group");
        prop_assert_eq!(&result["operator"], "AND");
        let conditions = result["conditions"].as_array().unwrap();
        prop_assert_eq!(conditions.len(), entries.len());

        for ((field, criterion), condition) in entries.iter().zip(conditions) {
            let expected_op = match criterion {
                Value::Object(ops) => {
                    let (code, _) = ops.iter().next().unwrap();
                    map_operator(code).unwrap()
                }
                _ => "EQUALS",
            };
            prop_assert_eq!(condition["operatorType"].as_str().unwrap(), expected_op);

            if field == "state" || field == "current_state" {
                prop_assert_eq!(&condition["type"], "lifecycle");
            } else {
                prop_assert_eq!(&condition["type"], "simple");
                prop_assert_eq!(condition["jsonPath"].as_str().unwrap(), format!("$.{field}"));
            }
        }
    }

    /// Translation is idempotent: a translated group passes through unchanged.
    #[test]
    fn translation_is_idempotent(
        entries in prop::collection::btree_map(field_strategy(), criterion_strategy(), 0..6)
    ) {
        let criteria = Value::Object(entries.into_iter().collect());
        let once = ensure_cyoda_format(&criteria);
        prop_assert_eq!(ensure_cyoda_format(&once), once);
    }
}
