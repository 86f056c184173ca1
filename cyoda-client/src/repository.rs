//! Repository abstraction consumed by the service layer.

use crate::error::{RepositoryError, RepositoryResult};
use crate::format::ensure_cyoda_format;
use crate::meta::RequestMeta;
use crate::normalize::TransitionsPayload;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Field used by `find_by_key` when the meta carries no condition.
pub const DEFAULT_KEY_FIELD: &str = "key";

/// Persistence operations against the entity platform.
///
/// Reads are lenient (empty defaults on unexpected responses); writes and
/// searches surface hard failures. `save_all` and `get_transitions` are
/// optional capabilities: the defaults report
/// [`RepositoryError::Unsupported`].
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Fetches one entity, normalized with `technical_id` and `current_state`.
    async fn find_by_id(
        &self,
        meta: &RequestMeta,
        id: &str,
        point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Option<Value>>;

    /// Lists every entity of the model.
    async fn find_all(&self, meta: &RequestMeta) -> RepositoryResult<Vec<Value>>;

    /// Runs a search; `criteria` is any shape accepted by [`ensure_cyoda_format`].
    async fn find_all_by_criteria(
        &self,
        meta: &RequestMeta,
        criteria: &Value,
        point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Vec<Value>>;

    /// Stores a new entity and returns its id.
    async fn save(&self, meta: &RequestMeta, entity: &Value) -> RepositoryResult<Option<String>>;

    /// Stores a batch and returns the first id.
    async fn save_all(
        &self,
        meta: &RequestMeta,
        entities: &[Value],
    ) -> RepositoryResult<Option<String>> {
        let _ = (meta, entities);
        Err(RepositoryError::Unsupported("save_all"))
    }

    /// Updates an entity, or only fires `meta.transition` when `entity` is `None`.
    async fn update(
        &self,
        meta: &RequestMeta,
        id: &str,
        entity: Option<&Value>,
    ) -> RepositoryResult<Option<String>>;

    async fn delete_by_id(&self, meta: &RequestMeta, id: &str) -> RepositoryResult<()>;

    async fn delete_all(&self, meta: &RequestMeta) -> RepositoryResult<()>;

    async fn count(&self, meta: &RequestMeta) -> RepositoryResult<u64> {
        Ok(self.find_all(meta).await?.len() as u64)
    }

    async fn get_entity_count(
        &self,
        meta: &RequestMeta,
        point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<u64>;

    async fn get_entity_changes_metadata(
        &self,
        meta: &RequestMeta,
        id: &str,
        point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Vec<Value>>;

    async fn get_transitions(
        &self,
        meta: &RequestMeta,
        id: &str,
    ) -> RepositoryResult<TransitionsPayload> {
        let _ = (meta, id);
        Err(RepositoryError::Unsupported("get_transitions"))
    }

    /// Finds the first entity matching `meta.condition`, or `key == <key>`.
    async fn find_by_key(&self, meta: &RequestMeta, key: &Value) -> RepositoryResult<Option<Value>> {
        let criteria = match &meta.condition {
            Some(condition) => condition.clone(),
            None => json!({ DEFAULT_KEY_FIELD: key }),
        };
        let results = self
            .find_all_by_criteria(meta, &ensure_cyoda_format(&criteria), None)
            .await?;
        Ok(results.into_iter().next())
    }

    async fn exists_by_key(&self, meta: &RequestMeta, key: &Value) -> RepositoryResult<bool> {
        Ok(self.find_by_key(meta, key).await?.is_some())
    }
}
