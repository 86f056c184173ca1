//! Entity responses returned by the service.

use chrono::{DateTime, Utc};
use cyoda_client::resolve_technical_id;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Platform bookkeeping for a stored entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub id: String,
    pub version: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Lifecycle state reported by the platform.
    pub state: Option<String>,
}

impl EntityMetadata {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// Reads id, state and timestamps from a normalized entity.
    pub fn from_entity(entity: &Value, version: &str, fallback_id: Option<&str>) -> Self {
        let meta = entity.get("meta");
        let id = resolve_technical_id(entity)
            .or_else(|| fallback_id.map(str::to_string))
            .unwrap_or_default();
        let state = [
            entity.get("current_state"),
            meta.and_then(|m| m.get("state")),
            entity.get("state"),
        ]
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .map(str::to_string);

        Self {
            id,
            version: version.to_string(),
            created_at: meta.and_then(|m| timestamp(m.get("creationDate"))),
            updated_at: meta.and_then(|m| timestamp(m.get("lastUpdateTime"))),
            state,
        }
    }
}

fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = value?.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A payload deserialized through the [`ModelRegistry`](crate::ModelRegistry).
#[derive(Clone)]
pub struct TypedModel {
    pub(crate) type_name: &'static str,
    pub(crate) value: Arc<dyn Any + Send + Sync>,
    pub(crate) raw: Value,
}

impl TypedModel {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for TypedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedModel")
            .field("type_name", &self.type_name)
            .field("raw", &self.raw)
            .finish()
    }
}

/// Entity payload: the raw mapping, or a registered model type.
#[derive(Debug, Clone)]
pub enum EntityData {
    Raw(Value),
    Model(TypedModel),
}

impl EntityData {
    pub fn raw(&self) -> &Value {
        match self {
            EntityData::Raw(value) => value,
            EntityData::Model(model) => &model.raw,
        }
    }

    pub fn is_model(&self) -> bool {
        matches!(self, EntityData::Model(_))
    }
}

impl Serialize for EntityData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw().serialize(serializer)
    }
}

/// An entity plus its platform metadata.
#[derive(Debug, Clone, Serialize)]
pub struct EntityResponse {
    pub data: EntityData,
    pub metadata: EntityMetadata,
}

impl EntityResponse {
    pub fn raw(data: Value, metadata: EntityMetadata) -> Self {
        Self {
            data: EntityData::Raw(data),
            metadata,
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn state(&self) -> Option<&str> {
        self.metadata.state.as_deref()
    }

    /// The registered model, if the payload was deserialized as `T`.
    pub fn model<T: 'static>(&self) -> Option<&T> {
        match &self.data {
            EntityData::Model(model) => model.downcast_ref::<T>(),
            EntityData::Raw(_) => None,
        }
    }

    /// Deserializes the raw payload as `T`, registered or not.
    pub fn into_typed<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        let raw = match self.data {
            EntityData::Raw(value) => value,
            EntityData::Model(model) => model.raw,
        };
        serde_json::from_value(raw)
    }
}
