//! Edge-message payloads and their read cache.

use crate::error::RepositoryResult;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Key holding the caller's payload inside a stored edge message.
pub const EDGE_MESSAGE_CONTENT_KEY: &str = "edge_message_content";

/// Read cache for edge messages, keyed by message id.
///
/// Entries are written once and never evicted.
#[derive(Debug, Default)]
pub struct EdgeMessageCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl EdgeMessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<Value> {
        self.entries.read().await.get(id).cloned()
    }

    /// Stores `value` unless `id` is already cached.
    pub async fn insert(&self, id: &str, value: Value) {
        self.entries
            .write()
            .await
            .entry(id.to_string())
            .or_insert(value);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Decodes a stored edge message.
///
/// The body is JSON text (possibly itself a JSON-encoded string) whose
/// `content` field is a JSON string holding `{edge_message_content: ..}`.
/// Returns `None` when the expected keys are absent.
pub fn parse_edge_message(body: &str) -> RepositoryResult<Option<Value>> {
    let mut outer: Value = serde_json::from_str(body)?;
    if let Value::String(encoded) = &outer {
        outer = serde_json::from_str(encoded)?;
    }

    let inner = match outer.get("content") {
        Some(Value::String(content)) => serde_json::from_str::<Value>(content)?,
        Some(content @ Value::Object(_)) => content.clone(),
        _ => return Ok(None),
    };

    Ok(inner.get(EDGE_MESSAGE_CONTENT_KEY).cloned())
}

/// Request body for storing an edge message.
pub fn edge_message_body(source: &str, entity: &Value) -> Value {
    json!({
        "meta-data": { "source": source },
        "payload": { EDGE_MESSAGE_CONTENT_KEY: entity },
    })
}
