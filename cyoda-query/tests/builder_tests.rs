use cyoda_query::{LogicalOperator, SearchCondition, SearchConditionRequest, SearchOperator};
use pretty_assertions::assert_eq;
use serde_json::json;

// ── Builder ─────────────────────────────────────────────────────

#[test]
fn empty_builder_defaults_to_and() {
    let request = SearchConditionRequest::builder().build();
    assert!(request.is_empty());
    assert_eq!(request.operator(), LogicalOperator::And);
    assert_eq!(request.limit(), None);
    assert_eq!(request.offset(), None);
}

#[test]
fn conditions_keep_insertion_order() {
    let request = SearchConditionRequest::builder()
        .equals("name", "Test")
        .contains("description", "widget")
        .add_condition("price", SearchOperator::GreaterThan, 10)
        .build();

    let fields: Vec<&str> = request.conditions().iter().map(|c| c.field.as_str()).collect();
    assert_eq!(fields, vec!["name", "description", "price"]);
    assert_eq!(request.conditions()[0].operator, SearchOperator::Equals);
    assert_eq!(request.conditions()[1].operator, SearchOperator::Contains);
    assert_eq!(request.conditions()[2].value, json!(10));
}

#[test]
fn in_values_collects_an_array() {
    let request = SearchConditionRequest::builder()
        .in_values("status", ["open", "pending"])
        .build();

    assert_eq!(
        request.conditions()[0],
        SearchCondition::new("status", SearchOperator::In, json!(["open", "pending"]))
    );
}

#[test]
fn operator_limit_offset_are_recorded() {
    let request = SearchConditionRequest::builder()
        .equals("a", 1)
        .operator(LogicalOperator::Or)
        .limit(5)
        .offset(2)
        .build();

    assert_eq!(request.operator(), LogicalOperator::Or);
    assert_eq!(request.limit(), Some(5));
    assert_eq!(request.offset(), Some(2));
}

#[test]
fn build_returns_an_independent_snapshot() {
    let builder = SearchConditionRequest::builder().equals("a", 1);
    let first = builder.build();
    let second = builder.equals("b", 2).build();

    assert_eq!(first.conditions().len(), 1);
    assert_eq!(second.conditions().len(), 2);
}

// ── Result window ───────────────────────────────────────────────

#[test]
fn apply_window_limits_results() {
    let request = SearchConditionRequest::builder()
        .equals("name", "Test")
        .limit(2)
        .build();
    assert_eq!(request.apply_window(vec![1, 2, 3]), vec![1, 2]);
}

#[test]
fn apply_window_skips_offset_before_limit() {
    let request = SearchConditionRequest::builder().offset(1).limit(1).build();
    assert_eq!(request.apply_window(vec!["a", "b", "c"]), vec!["b"]);
}

#[test]
fn apply_window_offset_past_end_is_empty() {
    let request = SearchConditionRequest::builder().offset(10).build();
    assert!(request.apply_window(vec![1, 2, 3]).is_empty());
}

// ── Operators ───────────────────────────────────────────────────

#[test]
fn operator_codes_round_trip_through_from_str() {
    for op in SearchOperator::ALL {
        assert_eq!(op.code().parse::<SearchOperator>().unwrap(), op);
    }
}

#[test]
fn operator_codes_are_case_sensitive() {
    assert!("EQ".parse::<SearchOperator>().is_err());
    assert!("between".parse::<SearchOperator>().is_err());
}

#[test]
fn operator_serializes_as_code() {
    assert_eq!(serde_json::to_value(SearchOperator::NotIn).unwrap(), json!("not_in"));
    assert_eq!(serde_json::to_value(LogicalOperator::Or).unwrap(), json!("OR"));
}

#[test]
fn logical_operator_keys() {
    assert_eq!(LogicalOperator::And.key(), "and");
    assert_eq!(LogicalOperator::Or.key(), "or");
}
