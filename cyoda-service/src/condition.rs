//! Conversion of built search requests into the neutral condition mapping.

use cyoda_query::{SearchCondition, SearchConditionRequest};
use serde_json::{json, Map, Value};

/// Converts a request into the mapping the repository translates.
///
/// - no conditions: `{}`
/// - one equality: `{field: value}`
/// - one other condition: `{field: {op: value}}`
/// - several: `{"and" | "or": [<one mapping per condition>]}`
pub fn convert_search_condition(request: &SearchConditionRequest) -> Value {
    match request.conditions() {
        [] => Value::Object(Map::new()),
        [single] => single_condition(single),
        many => {
            let items: Vec<Value> = many.iter().map(single_condition).collect();
            json!({ request.operator().key(): items })
        }
    }
}

fn single_condition(condition: &SearchCondition) -> Value {
    let value = if condition.operator.is_equals() {
        condition.value.clone()
    } else {
        json!({ condition.operator.code(): condition.value })
    };

    let mut map = Map::new();
    map.insert(condition.field.clone(), value);
    Value::Object(map)
}
