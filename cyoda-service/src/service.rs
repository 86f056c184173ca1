//! The typed entity service.

use crate::condition::convert_search_condition;
use crate::error::{EntityServiceError, ServiceResult};
use crate::model::{EntityData, EntityMetadata, EntityResponse};
use crate::registry::ModelRegistry;
use chrono::{DateTime, Utc};
use cyoda_client::{AuthProvider, EntityRepository, RepositoryError, RequestMeta};
use cyoda_query::SearchConditionRequest;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Transitions reported when the platform gives nothing usable.
pub const DEFAULT_TRANSITIONS: [&str; 3] = ["update", "complete", "cancel"];

/// Typed API over an [`EntityRepository`].
///
/// Every failure surfaces as an [`EntityServiceError`] carrying the
/// operation, entity class and (when known) entity id. The `exists_*`
/// operations are the exception: any failure reads as `false`.
pub struct EntityServiceImpl {
    repository: Arc<dyn EntityRepository>,
    auth: Arc<dyn AuthProvider>,
    registry: ModelRegistry,
    default_version: String,
}

impl EntityServiceImpl {
    pub fn new(
        repository: Arc<dyn EntityRepository>,
        auth: Arc<dyn AuthProvider>,
        default_version: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            auth,
            registry: ModelRegistry::default(),
            default_version: default_version.into(),
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    fn version<'a>(&'a self, entity_version: Option<&'a str>) -> &'a str {
        entity_version.unwrap_or(&self.default_version)
    }

    async fn meta(
        &self,
        operation: &str,
        entity_class: &str,
        entity_id: Option<&str>,
        entity_version: &str,
    ) -> ServiceResult<RequestMeta> {
        let token = self
            .auth
            .get_access_token()
            .await
            .map_err(|e| EntityServiceError::from_repository(operation, entity_class, entity_id, e))?;
        Ok(RequestMeta::new(token, entity_class, entity_version))
    }

    fn to_value<T: Serialize + ?Sized>(
        operation: &str,
        entity_class: &str,
        entity_id: Option<&str>,
        entity: &T,
    ) -> ServiceResult<Value> {
        serde_json::to_value(entity).map_err(|e| {
            EntityServiceError::internal(
                operation,
                entity_class,
                entity_id,
                format!("entity is not serializable: {e}"),
            )
        })
    }

    fn parse_data(&self, entity_class: &str, raw: Value) -> EntityData {
        match self.registry.parse(entity_class, &raw) {
            Some(model) => EntityData::Model(model),
            None => EntityData::Raw(raw),
        }
    }

    fn to_response(&self, entity_class: &str, entity_version: &str, raw: Value) -> EntityResponse {
        let metadata = EntityMetadata::from_entity(&raw, entity_version, None);
        EntityResponse {
            data: self.parse_data(entity_class, raw),
            metadata,
        }
    }

    fn written_response(
        &self,
        entity_class: &str,
        entity_version: &str,
        id: String,
        data: Value,
    ) -> EntityResponse {
        EntityResponse {
            data: self.parse_data(entity_class, data),
            metadata: EntityMetadata::new(id, entity_version),
        }
    }

    // ── Reads ─────────────────────────────────────────────────────

    pub async fn get_by_id(
        &self,
        id: &str,
        entity_class: &str,
        entity_version: Option<&str>,
    ) -> ServiceResult<Option<EntityResponse>> {
        self.fetch("get_by_id", id, entity_class, None, entity_version)
            .await
    }

    pub async fn get_by_id_at_time(
        &self,
        id: &str,
        entity_class: &str,
        point_in_time: DateTime<Utc>,
        entity_version: Option<&str>,
    ) -> ServiceResult<Option<EntityResponse>> {
        self.fetch(
            "get_by_id_at_time",
            id,
            entity_class,
            Some(point_in_time),
            entity_version,
        )
        .await
    }

    async fn fetch(
        &self,
        operation: &str,
        id: &str,
        entity_class: &str,
        point_in_time: Option<DateTime<Utc>>,
        entity_version: Option<&str>,
    ) -> ServiceResult<Option<EntityResponse>> {
        let version = self.version(entity_version);
        let meta = self.meta(operation, entity_class, Some(id), version).await?;
        let found = self
            .repository
            .find_by_id(&meta, id, point_in_time)
            .await
            .map_err(|e| EntityServiceError::from_repository(operation, entity_class, Some(id), e))?;
        Ok(found.map(|raw| self.to_response(entity_class, version, raw)))
    }

    pub async fn find_all(
        &self,
        entity_class: &str,
        entity_version: Option<&str>,
    ) -> ServiceResult<Vec<EntityResponse>> {
        let version = self.version(entity_version);
        let meta = self.meta("find_all", entity_class, None, version).await?;
        let entities = self
            .repository
            .find_all(&meta)
            .await
            .map_err(|e| EntityServiceError::from_repository("find_all", entity_class, None, e))?;
        Ok(entities
            .into_iter()
            .map(|raw| self.to_response(entity_class, version, raw))
            .collect())
    }

    /// Runs a search; `limit`/`offset` of the request window the results.
    pub async fn search(
        &self,
        entity_class: &str,
        condition: &SearchConditionRequest,
        entity_version: Option<&str>,
    ) -> ServiceResult<Vec<EntityResponse>> {
        self.run_search("search", entity_class, condition, None, entity_version)
            .await
    }

    pub async fn search_at_time(
        &self,
        entity_class: &str,
        condition: &SearchConditionRequest,
        point_in_time: DateTime<Utc>,
        entity_version: Option<&str>,
    ) -> ServiceResult<Vec<EntityResponse>> {
        self.run_search(
            "search_at_time",
            entity_class,
            condition,
            Some(point_in_time),
            entity_version,
        )
        .await
    }

    async fn run_search(
        &self,
        operation: &str,
        entity_class: &str,
        condition: &SearchConditionRequest,
        point_in_time: Option<DateTime<Utc>>,
        entity_version: Option<&str>,
    ) -> ServiceResult<Vec<EntityResponse>> {
        let version = self.version(entity_version);
        let meta = self.meta(operation, entity_class, None, version).await?;
        let criteria = convert_search_condition(condition);
        debug!("{} {} with {}", operation, entity_class, criteria);

        let entities = self
            .repository
            .find_all_by_criteria(&meta, &criteria, point_in_time)
            .await
            .map_err(|e| EntityServiceError::from_repository(operation, entity_class, None, e))?;

        Ok(condition
            .apply_window(entities)
            .into_iter()
            .map(|raw| self.to_response(entity_class, version, raw))
            .collect())
    }

    // ── Writes ────────────────────────────────────────────────────

    pub async fn save<T: Serialize + ?Sized>(
        &self,
        entity: &T,
        entity_class: &str,
        entity_version: Option<&str>,
    ) -> ServiceResult<EntityResponse> {
        let version = self.version(entity_version);
        let data = Self::to_value("save", entity_class, None, entity)?;
        let meta = self.meta("save", entity_class, None, version).await?;

        let id = self
            .repository
            .save(&meta, &data)
            .await
            .map_err(|e| EntityServiceError::from_repository("save", entity_class, None, e))?
            .ok_or_else(|| EntityServiceError::missing_id("save", entity_class, None))?;

        info!(entity_id = %id, "Saved {}", entity_class);
        Ok(self.written_response(entity_class, version, id, data))
    }

    /// Saves a batch through the repository's batch path when it has one,
    /// otherwise one `save` per entity.
    ///
    /// The batch path yields a single response holding the whole batch and
    /// the first id the platform reported.
    pub async fn save_all<T: Serialize>(
        &self,
        entities: &[T],
        entity_class: &str,
        entity_version: Option<&str>,
    ) -> ServiceResult<Vec<EntityResponse>> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }

        let version = self.version(entity_version);
        let values = entities
            .iter()
            .map(|entity| Self::to_value("save_all", entity_class, None, entity))
            .collect::<ServiceResult<Vec<_>>>()?;
        let meta = self.meta("save_all", entity_class, None, version).await?;

        match self.repository.save_all(&meta, &values).await {
            Ok(Some(first_id)) => {
                info!(count = values.len(), "Saved batch of {}", entity_class);
                Ok(vec![self.written_response(
                    entity_class,
                    version,
                    first_id,
                    Value::Array(values),
                )])
            }
            Ok(None) => Err(EntityServiceError::missing_id("save_all", entity_class, None)),
            Err(RepositoryError::Unsupported(_)) => {
                debug!("No batch save available, saving {} one by one", entity_class);
                let mut saved = Vec::with_capacity(entities.len());
                for entity in entities {
                    saved.push(self.save(entity, entity_class, Some(version)).await?);
                }
                Ok(saved)
            }
            Err(e) => Err(EntityServiceError::from_repository("save_all", entity_class, None, e)),
        }
    }

    pub async fn update<T: Serialize + ?Sized>(
        &self,
        id: &str,
        entity: &T,
        entity_class: &str,
        transition: Option<&str>,
        entity_version: Option<&str>,
    ) -> ServiceResult<EntityResponse> {
        let version = self.version(entity_version);
        let data = Self::to_value("update", entity_class, Some(id), entity)?;
        let mut meta = self.meta("update", entity_class, Some(id), version).await?;
        if let Some(transition) = transition {
            meta = meta.with_transition(transition);
        }

        let updated_id = self
            .repository
            .update(&meta, id, Some(&data))
            .await
            .map_err(|e| EntityServiceError::from_repository("update", entity_class, Some(id), e))?
            .ok_or_else(|| EntityServiceError::missing_id("update", entity_class, Some(id)))?;

        info!(entity_id = %updated_id, transition = ?transition, "Updated {}", entity_class);
        Ok(self.written_response(entity_class, version, updated_id, data))
    }

    /// Fires `transition` on an entity and returns it as it stands afterwards.
    ///
    /// Legality is left to the platform; only the states before and after
    /// are reported.
    pub async fn execute_transition(
        &self,
        id: &str,
        transition: &str,
        entity_class: &str,
        entity_version: Option<&str>,
    ) -> ServiceResult<EntityResponse> {
        const OP: &str = "execute_transition";
        let version = self.version(entity_version);

        let before = self
            .fetch(OP, id, entity_class, None, Some(version))
            .await?
            .ok_or_else(|| {
                EntityServiceError::not_found(OP, entity_class, Some(id), format!("entity {id} not found"))
            })?;

        let meta = self
            .meta(OP, entity_class, Some(id), version)
            .await?
            .with_transition(transition);
        self.repository
            .update(&meta, id, None)
            .await
            .map_err(|e| EntityServiceError::from_repository(OP, entity_class, Some(id), e))?;

        let after = self
            .fetch(OP, id, entity_class, None, Some(version))
            .await?
            .ok_or_else(|| {
                EntityServiceError::not_found(
                    OP,
                    entity_class,
                    Some(id),
                    format!("entity {id} disappeared after {transition}"),
                )
            })?;

        info!(
            entity_id = %id,
            "Transition {} on {}: {} -> {}",
            transition,
            entity_class,
            before.state().unwrap_or("unknown"),
            after.state().unwrap_or("unknown")
        );
        Ok(after)
    }

    /// Fires `transition` together with a data update.
    pub async fn execute_transition_with<T: Serialize + ?Sized>(
        &self,
        id: &str,
        transition: &str,
        payload: &T,
        entity_class: &str,
        entity_version: Option<&str>,
    ) -> ServiceResult<EntityResponse> {
        self.update(id, payload, entity_class, Some(transition), entity_version)
            .await
    }

    pub async fn delete_by_id(
        &self,
        id: &str,
        entity_class: &str,
        entity_version: Option<&str>,
    ) -> ServiceResult<String> {
        let version = self.version(entity_version);
        let meta = self.meta("delete_by_id", entity_class, Some(id), version).await?;
        self.repository
            .delete_by_id(&meta, id)
            .await
            .map_err(|e| EntityServiceError::from_repository("delete_by_id", entity_class, Some(id), e))?;
        info!(entity_id = %id, "Deleted {}", entity_class);
        Ok(id.to_string())
    }

    pub async fn delete_all(&self, entity_class: &str, entity_version: Option<&str>) -> ServiceResult<()> {
        let version = self.version(entity_version);
        let meta = self.meta("delete_all", entity_class, None, version).await?;
        self.repository
            .delete_all(&meta)
            .await
            .map_err(|e| EntityServiceError::from_repository("delete_all", entity_class, None, e))?;
        info!("Deleted all {} entities", entity_class);
        Ok(())
    }

    // ── Workflow and statistics ───────────────────────────────────

    /// Transitions currently available to an entity.
    ///
    /// A list is returned as-is and a mapping yields its keys. Any other
    /// shape, or a repository without the capability, yields
    /// [`DEFAULT_TRANSITIONS`].
    pub async fn get_transitions(
        &self,
        id: &str,
        entity_class: &str,
        entity_version: Option<&str>,
    ) -> ServiceResult<Vec<String>> {
        let version = self.version(entity_version);
        let meta = self.meta("get_transitions", entity_class, Some(id), version).await?;
        let names = match self.repository.get_transitions(&meta, id).await {
            Ok(payload) => payload.into_names(),
            Err(RepositoryError::Unsupported(_)) => None,
            Err(e) => {
                return Err(EntityServiceError::from_repository(
                    "get_transitions",
                    entity_class,
                    Some(id),
                    e,
                ));
            }
        };
        Ok(names.unwrap_or_else(default_transitions))
    }

    pub async fn count(&self, entity_class: &str, entity_version: Option<&str>) -> ServiceResult<u64> {
        let version = self.version(entity_version);
        let meta = self.meta("count", entity_class, None, version).await?;
        self.repository
            .count(&meta)
            .await
            .map_err(|e| EntityServiceError::from_repository("count", entity_class, None, e))
    }

    pub async fn get_entity_count(
        &self,
        entity_class: &str,
        entity_version: Option<&str>,
        point_in_time: Option<DateTime<Utc>>,
    ) -> ServiceResult<u64> {
        let version = self.version(entity_version);
        let meta = self.meta("get_entity_count", entity_class, None, version).await?;
        self.repository
            .get_entity_count(&meta, point_in_time)
            .await
            .map_err(|e| EntityServiceError::from_repository("get_entity_count", entity_class, None, e))
    }

    pub async fn get_entity_changes_metadata(
        &self,
        id: &str,
        entity_class: &str,
        entity_version: Option<&str>,
        point_in_time: Option<DateTime<Utc>>,
    ) -> ServiceResult<Vec<Value>> {
        const OP: &str = "get_entity_changes_metadata";
        let version = self.version(entity_version);
        let meta = self.meta(OP, entity_class, Some(id), version).await?;
        self.repository
            .get_entity_changes_metadata(&meta, id, point_in_time)
            .await
            .map_err(|e| EntityServiceError::from_repository(OP, entity_class, Some(id), e))
    }

    pub async fn exists_by_id(&self, id: &str, entity_class: &str, entity_version: Option<&str>) -> bool {
        match self.get_by_id(id, entity_class, entity_version).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                debug!("exists_by_id treated as absent: {}", e);
                false
            }
        }
    }

    // ── Business-id operations ────────────────────────────────────

    /// First entity whose `field` equals `value`.
    pub async fn find_by_business_id(
        &self,
        entity_class: &str,
        field: &str,
        value: &Value,
        entity_version: Option<&str>,
    ) -> ServiceResult<Option<EntityResponse>> {
        let condition = SearchConditionRequest::builder()
            .equals(field, value.clone())
            .build();
        let matches = self
            .run_search("find_by_business_id", entity_class, &condition, None, entity_version)
            .await?;
        Ok(matches.into_iter().next())
    }

    pub async fn exists_by_business_id(
        &self,
        entity_class: &str,
        field: &str,
        value: &Value,
        entity_version: Option<&str>,
    ) -> bool {
        match self
            .find_by_business_id(entity_class, field, value, entity_version)
            .await
        {
            Ok(found) => found.is_some(),
            Err(e) => {
                debug!("exists_by_business_id treated as absent: {}", e);
                false
            }
        }
    }

    /// Updates the entity whose `field` matches the payload's own `field`.
    pub async fn update_by_business_id<T: Serialize + ?Sized>(
        &self,
        entity: &T,
        field: &str,
        entity_class: &str,
        transition: Option<&str>,
        entity_version: Option<&str>,
    ) -> ServiceResult<EntityResponse> {
        const OP: &str = "update_by_business_id";
        let data = Self::to_value(OP, entity_class, None, entity)?;
        let key = match data.get(field) {
            Some(key) if !key.is_null() => key.clone(),
            _ => {
                return Err(EntityServiceError::invalid_input(
                    OP,
                    entity_class,
                    format!("entity has no business id field '{field}'"),
                ));
            }
        };

        let existing = self
            .find_by_business_id(entity_class, field, &key, entity_version)
            .await?
            .ok_or_else(|| {
                EntityServiceError::not_found(
                    OP,
                    entity_class,
                    None,
                    format!("no {entity_class} with {field} = {key}"),
                )
            })?;

        self.update(existing.id(), &data, entity_class, transition, entity_version)
            .await
    }

    /// Deletes the entity whose `field` equals `value`; `false` when none matches.
    pub async fn delete_by_business_id(
        &self,
        entity_class: &str,
        field: &str,
        value: &Value,
        entity_version: Option<&str>,
    ) -> ServiceResult<bool> {
        let Some(existing) = self
            .find_by_business_id(entity_class, field, value, entity_version)
            .await?
        else {
            warn!("No {} with {} = {} to delete", entity_class, field, value);
            return Ok(false);
        };
        self.delete_by_id(existing.id(), entity_class, entity_version)
            .await?;
        Ok(true)
    }
}

fn default_transitions() -> Vec<String> {
    DEFAULT_TRANSITIONS.iter().map(|t| t.to_string()).collect()
}
