//! Per-call request context.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which persistence namespace a call targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersistenceKind {
    /// Ordinary entity documents.
    #[default]
    Entity,
    /// Opaque edge-message payloads.
    EdgeMessage,
}

/// Context threaded through every repository call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Bearer token for the first attempt of each request.
    pub token: String,
    pub entity_model: String,
    pub entity_version: String,
    /// Workflow transition applied by `update`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
    /// Criteria used by `find_by_key` instead of the key-equality default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    #[serde(default)]
    pub kind: PersistenceKind,
}

impl RequestMeta {
    pub fn new(
        token: impl Into<String>,
        entity_model: impl Into<String>,
        entity_version: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            entity_model: entity_model.into(),
            entity_version: entity_version.into(),
            transition: None,
            condition: None,
            kind: PersistenceKind::Entity,
        }
    }

    #[must_use]
    pub fn with_transition(mut self, transition: impl Into<String>) -> Self {
        self.transition = Some(transition.into());
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Value) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Switches the call to the edge-message namespace.
    #[must_use]
    pub fn edge_message(mut self) -> Self {
        self.kind = PersistenceKind::EdgeMessage;
        self
    }

    pub fn is_edge_message(&self) -> bool {
        self.kind == PersistenceKind::EdgeMessage
    }
}
