//! Shared helpers for service tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cyoda_client::{
    ClientConfig, CyodaRepository, EntityRepository, RepositoryError, RepositoryResult, RequestMeta,
    StaticTokenAuth,
};
use cyoda_service::EntityServiceImpl;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";
pub const MODEL: &str = "customer";
pub const VERSION: &str = "1000";

/// In-memory repository without the optional batch-save and transitions
/// capabilities.
#[derive(Default)]
pub struct MockRepository {
    entities: Mutex<BTreeMap<String, Value>>,
    next_id: AtomicUsize,
    omit_ids: AtomicBool,
    failure: Mutex<Option<fn() -> RepositoryError>>,
    criteria: Mutex<Vec<Value>>,
    saves: AtomicUsize,
}

impl MockRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Stores an entity under `id` in state `state`.
    pub fn insert(&self, id: &str, state: &str, data: Value) {
        let mut entity = data;
        entity["technical_id"] = json!(id);
        entity["current_state"] = json!(state);
        self.entities.lock().unwrap().insert(id.to_string(), entity);
    }

    /// Makes `save` and `update` report no id.
    pub fn omit_ids(&self) {
        self.omit_ids.store(true, Ordering::SeqCst);
    }

    /// Makes every call fail with `make()`.
    pub fn fail_with(&self, make: fn() -> RepositoryError) {
        *self.failure.lock().unwrap() = Some(make);
    }

    pub fn criteria(&self) -> Vec<Value> {
        self.criteria.lock().unwrap().clone()
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.entities.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entities.lock().unwrap().len()
    }

    fn check(&self) -> RepositoryResult<()> {
        match *self.failure.lock().unwrap() {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }

    fn matches(entity: &Value, criteria: &Value) -> bool {
        let Some(fields) = criteria.as_object() else {
            return true;
        };
        fields
            .iter()
            .filter(|(key, _)| key.as_str() != "and" && key.as_str() != "or")
            .all(|(key, expected)| expected.is_object() || entity.get(key) == Some(expected))
    }
}

#[async_trait]
impl EntityRepository for MockRepository {
    async fn find_by_id(
        &self,
        _meta: &RequestMeta,
        id: &str,
        _point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Option<Value>> {
        self.check()?;
        Ok(self.get(id))
    }

    async fn find_all(&self, _meta: &RequestMeta) -> RepositoryResult<Vec<Value>> {
        self.check()?;
        Ok(self.entities.lock().unwrap().values().cloned().collect())
    }

    async fn find_all_by_criteria(
        &self,
        _meta: &RequestMeta,
        criteria: &Value,
        _point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Vec<Value>> {
        self.check()?;
        self.criteria.lock().unwrap().push(criteria.clone());
        Ok(self
            .entities
            .lock()
            .unwrap()
            .values()
            .filter(|entity| Self::matches(entity, criteria))
            .cloned()
            .collect())
    }

    async fn save(&self, _meta: &RequestMeta, entity: &Value) -> RepositoryResult<Option<String>> {
        self.check()?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.omit_ids.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let id = format!("id-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.insert(&id, "NEW", entity.clone());
        Ok(Some(id))
    }

    async fn update(
        &self,
        meta: &RequestMeta,
        id: &str,
        entity: Option<&Value>,
    ) -> RepositoryResult<Option<String>> {
        self.check()?;
        let mut entities = self.entities.lock().unwrap();
        let Some(existing) = entities.get_mut(id) else {
            return Ok(None);
        };

        match (entity, &meta.transition) {
            (None, Some(transition)) => {
                existing["current_state"] = json!(transition.to_uppercase());
                Ok(None)
            }
            (Some(data), _) => {
                let state = existing["current_state"].clone();
                let mut updated = data.clone();
                updated["technical_id"] = json!(id);
                updated["current_state"] = state;
                *existing = updated;
                if self.omit_ids.load(Ordering::SeqCst) {
                    Ok(None)
                } else {
                    Ok(Some(id.to_string()))
                }
            }
            (None, None) => Ok(None),
        }
    }

    async fn delete_by_id(&self, _meta: &RequestMeta, id: &str) -> RepositoryResult<()> {
        self.check()?;
        self.entities.lock().unwrap().remove(id);
        Ok(())
    }

    async fn delete_all(&self, _meta: &RequestMeta) -> RepositoryResult<()> {
        self.check()?;
        self.entities.lock().unwrap().clear();
        Ok(())
    }

    async fn get_entity_count(
        &self,
        _meta: &RequestMeta,
        _point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<u64> {
        self.check()?;
        Ok(self.len() as u64)
    }

    async fn get_entity_changes_metadata(
        &self,
        _meta: &RequestMeta,
        id: &str,
        _point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Vec<Value>> {
        self.check()?;
        Ok(vec![json!({"entityId": id, "changeType": "CREATED"})])
    }
}

pub fn service(repository: Arc<MockRepository>) -> EntityServiceImpl {
    EntityServiceImpl::new(repository, Arc::new(StaticTokenAuth::new(TOKEN)), VERSION)
}

/// Config pointing at the mock server with fast snapshot polling.
pub fn mock_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        api_url: server.uri(),
        token_url: format!("{}/oauth/token", server.uri()),
        search_timeout_ms: 200,
        poll_interval_ms: 10,
        ..Default::default()
    }
}

/// Service backed by the HTTP repository against `server`.
pub fn http_service(server: &MockServer) -> EntityServiceImpl {
    let auth = Arc::new(StaticTokenAuth::new(TOKEN));
    let repository = CyodaRepository::new(mock_config(server), auth.clone()).unwrap();
    EntityServiceImpl::new(Arc::new(repository), auth, VERSION)
}

pub fn envelope(id: &str, state: &str, data: Value) -> Value {
    json!({
        "data": data,
        "meta": {
            "id": id,
            "state": state,
            "creationDate": "2024-05-01T10:00:00.000Z",
            "lastUpdateTime": "2024-05-02T11:30:00.000Z"
        }
    })
}
