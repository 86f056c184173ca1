//! Entity-class to Rust-type registry.

use crate::model::TypedModel;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

type Parser = Arc<dyn Fn(&Value) -> serde_json::Result<Arc<dyn Any + Send + Sync>> + Send + Sync>;

#[derive(Clone)]
struct Registration {
    type_name: &'static str,
    parser: Parser,
}

/// Maps entity-class names to the types their payloads deserialize into.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    entries: HashMap<String, Registration>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` as the model of `entity_class`.
    pub fn register<T>(&mut self, entity_class: impl Into<String>)
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let parser: Parser = Arc::new(|raw: &Value| {
            let model: T = serde_json::from_value(raw.clone())?;
            Ok(Arc::new(model) as Arc<dyn Any + Send + Sync>)
        });
        self.entries.insert(
            entity_class.into(),
            Registration {
                type_name: std::any::type_name::<T>(),
                parser,
            },
        );
    }

    #[must_use]
    pub fn with<T>(mut self, entity_class: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.register::<T>(entity_class);
        self
    }

    pub fn contains(&self, entity_class: &str) -> bool {
        self.entries.contains_key(entity_class)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deserializes `raw` as the type registered for `entity_class`.
    ///
    /// Unregistered classes and payloads that do not fit the type yield
    /// `None`; the latter is logged rather than raised.
    pub fn parse(&self, entity_class: &str, raw: &Value) -> Option<TypedModel> {
        let registration = self.entries.get(entity_class)?;
        match (registration.parser)(raw) {
            Ok(value) => Some(TypedModel {
                type_name: registration.type_name,
                value,
                raw: raw.clone(),
            }),
            Err(e) => {
                warn!(
                    "Payload for {} does not fit {}: {}",
                    entity_class, registration.type_name, e
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v.type_name)))
            .finish()
    }
}
