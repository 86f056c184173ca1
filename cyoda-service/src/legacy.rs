//! Backward-compatible item API.
//!
//! Each method delegates to [`EntityServiceImpl`] and converts every
//! failure into an empty default (`None` or `[]`), logging it at `warn`.
//! New code should call the service directly.

use crate::service::EntityServiceImpl;
use cyoda_query::SearchConditionRequest;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Item-style adapter over the entity service.
#[derive(Clone)]
pub struct LegacyEntityService {
    service: Arc<EntityServiceImpl>,
}

fn deprecated(method: &str, replacement: &str) {
    warn!("{} is deprecated, use {} instead", method, replacement);
}

fn swallow<T: Default, E: std::fmt::Display>(method: &str, result: Result<T, E>) -> T {
    result.unwrap_or_else(|e| {
        warn!("{} failed: {}", method, e);
        T::default()
    })
}

#[allow(deprecated)]
impl LegacyEntityService {
    pub fn new(service: Arc<EntityServiceImpl>) -> Self {
        Self { service }
    }

    #[deprecated(note = "use EntityServiceImpl::get_by_id")]
    pub async fn get_item(&self, entity_model: &str, entity_version: &str, technical_id: &str) -> Option<Value> {
        deprecated("get_item", "get_by_id");
        let found = self
            .service
            .get_by_id(technical_id, entity_model, Some(entity_version))
            .await;
        swallow("get_item", found).map(|response| response.data.raw().clone())
    }

    #[deprecated(note = "use EntityServiceImpl::find_all")]
    pub async fn get_items(&self, entity_model: &str, entity_version: &str) -> Vec<Value> {
        deprecated("get_items", "find_all");
        let found = self.service.find_all(entity_model, Some(entity_version)).await;
        swallow("get_items", found)
            .into_iter()
            .map(|response| response.data.raw().clone())
            .collect()
    }

    #[deprecated(note = "use EntityServiceImpl::save")]
    pub async fn add_item<T: Serialize + ?Sized>(
        &self,
        entity_model: &str,
        entity_version: &str,
        entity: &T,
    ) -> Option<String> {
        deprecated("add_item", "save");
        let saved = self.service.save(entity, entity_model, Some(entity_version)).await;
        swallow("add_item", saved.map(Some)).map(|response| response.metadata.id)
    }

    #[deprecated(note = "use EntityServiceImpl::update")]
    pub async fn update_item<T: Serialize + ?Sized>(
        &self,
        entity_model: &str,
        entity_version: &str,
        technical_id: &str,
        entity: &T,
        transition: Option<&str>,
    ) -> Option<String> {
        deprecated("update_item", "update");
        let updated = self
            .service
            .update(technical_id, entity, entity_model, transition, Some(entity_version))
            .await;
        swallow("update_item", updated.map(Some)).map(|response| response.metadata.id)
    }

    #[deprecated(note = "use EntityServiceImpl::delete_by_id")]
    pub async fn delete_item(&self, entity_model: &str, entity_version: &str, technical_id: &str) -> Option<String> {
        deprecated("delete_item", "delete_by_id");
        let deleted = self
            .service
            .delete_by_id(technical_id, entity_model, Some(entity_version))
            .await;
        swallow("delete_item", deleted.map(Some))
    }

    #[deprecated(note = "use EntityServiceImpl::search")]
    pub async fn get_items_by_condition(
        &self,
        entity_model: &str,
        entity_version: &str,
        condition: &SearchConditionRequest,
    ) -> Vec<Value> {
        deprecated("get_items_by_condition", "search");
        let found = self
            .service
            .search(entity_model, condition, Some(entity_version))
            .await;
        swallow("get_items_by_condition", found)
            .into_iter()
            .map(|response| response.data.raw().clone())
            .collect()
    }

    #[deprecated(note = "use EntityServiceImpl::search")]
    pub async fn get_single_item_by_condition(
        &self,
        entity_model: &str,
        entity_version: &str,
        condition: &SearchConditionRequest,
    ) -> Option<Value> {
        deprecated("get_single_item_by_condition", "search");
        self.get_items_by_condition(entity_model, entity_version, condition)
            .await
            .into_iter()
            .next()
    }
}
