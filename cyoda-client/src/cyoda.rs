//! HTTP implementation of [`EntityRepository`] for the Cyoda platform.

use crate::auth::AuthProvider;
use crate::config::ClientConfig;
use crate::edge::{edge_message_body, parse_edge_message, EdgeMessageCache};
use crate::error::{RepositoryError, RepositoryResult};
use crate::format::ensure_cyoda_format;
use crate::meta::RequestMeta;
use crate::normalize::{
    extract_entity_id, normalize_envelope, normalize_snapshot_node, with_technical_id,
    CountPayload, TransitionsPayload,
};
use crate::repository::EntityRepository;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

const SNAPSHOT_RUNNING: &str = "RUNNING";
const SNAPSHOT_FAILED: &str = "FAILED";
const DEFAULT_TRANSITION: &str = "update";

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parses the body as JSON; malformed or empty bodies yield `None`.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotStatus {
    #[serde(rename = "snapshotStatus")]
    snapshot_status: String,
}

/// Transport client for the Cyoda entity platform.
///
/// Owns the HTTP client, the 401 refresh-and-retry protocol, snapshot
/// search polling and the edge-message cache.
pub struct CyodaRepository {
    config: ClientConfig,
    client: Client,
    auth: Arc<dyn AuthProvider>,
    edge_cache: EdgeMessageCache,
}

impl CyodaRepository {
    pub fn new(config: ClientConfig, auth: Arc<dyn AuthProvider>) -> RepositoryResult<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            config,
            client,
            auth,
            edge_cache: EdgeMessageCache::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    pub fn edge_cache(&self) -> &EdgeMessageCache {
        &self.edge_cache
    }

    /// Builds the per-call context. No I/O.
    pub fn get_meta(&self, token: &str, entity_model: &str, entity_version: &str) -> RequestMeta {
        RequestMeta::new(token, entity_model, entity_version)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn model_path(meta: &RequestMeta) -> String {
        format!(
            "{}/{}",
            urlencoding::encode(&meta.entity_model),
            urlencoding::encode(&meta.entity_version)
        )
    }

    async fn execute(request: RequestBuilder) -> RepositoryResult<RawResponse> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }

    /// Sends a request with `meta.token`; on 401, invalidates the token,
    /// fetches a fresh one and retries exactly once.
    ///
    /// A second 401 is returned as-is.
    async fn send_with_auth_retry<F>(&self, meta: &RequestMeta, build: F) -> RepositoryResult<RawResponse>
    where
        F: Fn(&str) -> RequestBuilder + Send + Sync,
    {
        let response = Self::execute(build(&meta.token)).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("Platform returned 401, refreshing token and retrying once");
        self.auth.invalidate_tokens().await;
        let token = self.auth.get_access_token().await?;

        Self::execute(build(&token)).await
    }

    async fn get(
        &self,
        meta: &RequestMeta,
        path: &str,
        query: &[(&str, String)],
    ) -> RepositoryResult<RawResponse> {
        let url = self.url(path);
        debug!("GET {}", url);
        self.send_with_auth_retry(meta, |token| {
            self.client.get(&url).bearer_auth(token).query(query)
        })
        .await
    }

    fn point_in_time_query(point_in_time: Option<DateTime<Utc>>) -> Vec<(&'static str, String)> {
        point_in_time
            .map(|pit| vec![("pointInTime", pit.to_rfc3339_opts(SecondsFormat::Millis, true))])
            .unwrap_or_default()
    }

    /// Submits a condition group to the snapshot search endpoint.
    ///
    /// The raw response is returned whatever its status, including the
    /// second 401 of a failed token refresh.
    pub async fn send_search_request(
        &self,
        meta: &RequestMeta,
        condition: &Value,
        point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<RawResponse> {
        let url = self.url(&format!("search/snapshot/{}", Self::model_path(meta)));
        let query = Self::point_in_time_query(point_in_time);
        debug!("POST {} condition={}", url, condition);

        self.send_with_auth_retry(meta, |token| {
            self.client
                .post(&url)
                .bearer_auth(token)
                .query(&query)
                .json(condition)
        })
        .await
    }

    /// Polls the snapshot status until it leaves `RUNNING`.
    async fn wait_for_snapshot(&self, meta: &RequestMeta, snapshot_id: &str) -> RepositoryResult<()> {
        let path = format!("search/snapshot/{}/status", urlencoding::encode(snapshot_id));
        let timeout = self.config.search_timeout();
        let started = Instant::now();

        loop {
            let response = self.get(meta, &path, &[]).await?;
            if !response.is_success() {
                return Err(RepositoryError::Api {
                    status: response.status.as_u16(),
                    body: response.body,
                });
            }

            let status: SnapshotStatus = serde_json::from_str(&response.body)?;
            match status.snapshot_status.as_str() {
                SNAPSHOT_RUNNING => {}
                SNAPSHOT_FAILED => {
                    return Err(RepositoryError::SnapshotFailed {
                        snapshot_id: snapshot_id.to_string(),
                        status: SNAPSHOT_FAILED.to_string(),
                    });
                }
                other => {
                    debug!("Snapshot {} finished with status {}", snapshot_id, other);
                    return Ok(());
                }
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(RepositoryError::Timeout {
                    snapshot_id: snapshot_id.to_string(),
                    waited,
                });
            }
            sleep(self.config.poll_interval()).await;
        }
    }

    /// Fetches every page of a completed snapshot.
    async fn fetch_snapshot_results(
        &self,
        meta: &RequestMeta,
        snapshot_id: &str,
    ) -> RepositoryResult<Vec<Value>> {
        let path = format!("search/snapshot/{}", urlencoding::encode(snapshot_id));
        let mut results = Vec::new();
        let mut page_number: u64 = 0;

        loop {
            let query = [
                ("pageSize", self.config.page_size.to_string()),
                ("pageNumber", page_number.to_string()),
            ];
            let response = self.get(meta, &path, &query).await?;
            if !response.is_success() {
                return Err(RepositoryError::Api {
                    status: response.status.as_u16(),
                    body: response.body,
                });
            }

            let body: Value = serde_json::from_str(&response.body)?;
            if let Value::Array(items) = body {
                results.extend(items.into_iter().map(normalize_snapshot_node));
                break;
            }

            if let Some(Value::Array(nodes)) = body.pointer("/_embedded/objectNodes") {
                results.extend(nodes.iter().cloned().map(normalize_snapshot_node));
            }

            let total_pages = body
                .pointer("/page/totalPages")
                .and_then(Value::as_u64)
                .unwrap_or(1);
            page_number += 1;
            if page_number >= total_pages {
                break;
            }
        }

        Ok(results)
    }

    fn snapshot_id(body: &Value) -> Option<String> {
        match body {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Object(obj) => ["snapshotId", "id"]
                .into_iter()
                .find_map(|key| obj.get(key).and_then(Value::as_str))
                .map(str::to_string),
            _ => None,
        }
    }

    async fn find_edge_message(&self, meta: &RequestMeta, id: &str) -> RepositoryResult<Option<Value>> {
        if let Some(cached) = self.edge_cache.get(id).await {
            debug!("Edge message {} served from cache", id);
            return Ok(Some(cached));
        }

        let path = format!("message/get/{}", urlencoding::encode(id));
        let response = self.get(meta, &path, &[]).await?;
        if !response.is_success() {
            warn!(status = %response.status, "Edge message {} not available", id);
            return Ok(None);
        }

        let content = parse_edge_message(&response.body)?;
        if let Some(content) = &content {
            self.edge_cache.insert(id, content.clone()).await;
        }
        Ok(content)
    }

    async fn save_edge_message(&self, meta: &RequestMeta, entity: &Value) -> RepositoryResult<Option<String>> {
        let url = self.url(&format!(
            "message/new/{}_{}",
            urlencoding::encode(&meta.entity_model),
            urlencoding::encode(&meta.entity_version)
        ));
        let body = edge_message_body(&self.config.edge_message_source, entity);

        let response = self
            .send_with_auth_retry(meta, |token| self.client.post(&url).bearer_auth(token).json(&body))
            .await?;
        if !response.is_success() {
            warn!(status = %response.status, "Edge message save rejected: {}", response.body);
            return Ok(None);
        }

        let id = response.json().as_ref().and_then(extract_entity_id);
        if let Some(id) = &id {
            info!("Saved edge message {}", id);
        }
        Ok(id)
    }

    async fn post_entities(&self, meta: &RequestMeta, body: &Value) -> RepositoryResult<Option<String>> {
        let url = self.url(&format!("entity/JSON/{}", Self::model_path(meta)));
        let response = self
            .send_with_auth_retry(meta, |token| self.client.post(&url).bearer_auth(token).json(body))
            .await?;

        if !response.is_success() {
            warn!(status = %response.status, "Save rejected for {}: {}", meta.entity_model, response.body);
            return Ok(None);
        }

        let id = response.json().as_ref().and_then(extract_entity_id);
        if id.is_none() {
            warn!("Save response for {} carried no entity id", meta.entity_model);
        }
        Ok(id)
    }

    async fn launch_transition(&self, meta: &RequestMeta, id: &str, transition: &str) -> RepositoryResult<()> {
        let url = self.url(&format!("entity/{}/transitions", urlencoding::encode(id)));
        let query = [("transitionName", transition.to_string())];

        let response = self
            .send_with_auth_retry(meta, |token| {
                self.client.put(&url).bearer_auth(token).query(&query)
            })
            .await?;

        if response.is_success() {
            info!(entity_id = %id, "Launched transition {}", transition);
        } else {
            warn!(
                entity_id = %id,
                status = %response.status,
                "Transition {} rejected: {}",
                transition,
                response.body
            );
        }
        Ok(())
    }
}

#[async_trait]
impl EntityRepository for CyodaRepository {
    async fn find_by_id(
        &self,
        meta: &RequestMeta,
        id: &str,
        point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Option<Value>> {
        if meta.is_edge_message() {
            return self.find_edge_message(meta, id).await;
        }

        let path = format!("entity/{}", urlencoding::encode(id));
        let response = self
            .get(meta, &path, &Self::point_in_time_query(point_in_time))
            .await?;

        if !response.is_success() {
            debug!(entity_id = %id, status = %response.status, "Entity not found");
            return Ok(None);
        }

        Ok(response
            .json()
            .map(|raw| with_technical_id(normalize_envelope(raw), Some(id.to_string()))))
    }

    async fn find_all(&self, meta: &RequestMeta) -> RepositoryResult<Vec<Value>> {
        let path = format!("entity/{}", Self::model_path(meta));
        let response = self.get(meta, &path, &[]).await?;

        if !response.is_success() {
            warn!(status = %response.status, "Listing {} failed", meta.entity_model);
            return Ok(Vec::new());
        }

        match response.json() {
            Some(Value::Array(items)) => Ok(items.into_iter().map(normalize_envelope).collect()),
            _ => {
                warn!("Listing {} returned a non-list body", meta.entity_model);
                Ok(Vec::new())
            }
        }
    }

    async fn find_all_by_criteria(
        &self,
        meta: &RequestMeta,
        criteria: &Value,
        point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Vec<Value>> {
        let condition = ensure_cyoda_format(criteria);
        let response = self.send_search_request(meta, &condition, point_in_time).await?;

        if response.status != StatusCode::OK {
            warn!(status = %response.status, "Search on {} rejected: {}", meta.entity_model, response.body);
            return Ok(Vec::new());
        }

        let body: Value = serde_json::from_str(&response.body)?;
        if let Value::Array(items) = body {
            return Ok(items.into_iter().map(normalize_snapshot_node).collect());
        }

        let Some(snapshot_id) = Self::snapshot_id(&body) else {
            warn!("Search on {} returned no snapshot id", meta.entity_model);
            return Ok(Vec::new());
        };

        debug!("Waiting for snapshot {}", snapshot_id);
        self.wait_for_snapshot(meta, &snapshot_id).await?;
        self.fetch_snapshot_results(meta, &snapshot_id).await
    }

    async fn save(&self, meta: &RequestMeta, entity: &Value) -> RepositoryResult<Option<String>> {
        if meta.is_edge_message() {
            return self.save_edge_message(meta, entity).await;
        }

        let id = self.post_entities(meta, entity).await?;
        if let Some(id) = &id {
            info!(entity_id = %id, "Saved {}", meta.entity_model);
        }
        Ok(id)
    }

    async fn save_all(&self, meta: &RequestMeta, entities: &[Value]) -> RepositoryResult<Option<String>> {
        if entities.is_empty() {
            return Ok(None);
        }

        let body = Value::Array(entities.to_vec());
        let id = self.post_entities(meta, &body).await?;
        if let Some(id) = &id {
            info!(first_id = %id, count = entities.len(), "Saved batch of {}", meta.entity_model);
        }
        Ok(id)
    }

    async fn update(
        &self,
        meta: &RequestMeta,
        id: &str,
        entity: Option<&Value>,
    ) -> RepositoryResult<Option<String>> {
        let entity = match (entity, meta.transition.as_deref()) {
            (Some(entity), _) => entity,
            (None, Some(transition)) => {
                self.launch_transition(meta, id, transition).await?;
                return Ok(None);
            }
            (None, None) => {
                warn!(entity_id = %id, "Update called without payload or transition");
                return Ok(None);
            }
        };

        let transition = meta.transition.as_deref().unwrap_or(DEFAULT_TRANSITION);
        let url = self.url(&format!(
            "entity/JSON/{}/{}",
            urlencoding::encode(id),
            urlencoding::encode(transition)
        ));

        let response = self
            .send_with_auth_retry(meta, |token| self.client.put(&url).bearer_auth(token).json(entity))
            .await?;

        if !response.is_success() {
            warn!(entity_id = %id, status = %response.status, "Update rejected: {}", response.body);
            return Ok(None);
        }

        match response.json() {
            Some(body @ Value::Object(_)) => {
                let updated = extract_entity_id(&body);
                if updated.is_some() {
                    info!(entity_id = %id, "Updated {} via {}", meta.entity_model, transition);
                }
                Ok(updated)
            }
            _ => {
                warn!(entity_id = %id, "Update response was not an object");
                Ok(None)
            }
        }
    }

    async fn delete_by_id(&self, meta: &RequestMeta, id: &str) -> RepositoryResult<()> {
        let url = self.url(&format!("entity/{}", urlencoding::encode(id)));
        match self
            .send_with_auth_retry(meta, |token| self.client.delete(&url).bearer_auth(token))
            .await
        {
            Ok(response) if response.is_success() => info!(entity_id = %id, "Deleted entity"),
            Ok(response) => {
                warn!(entity_id = %id, status = %response.status, "Delete rejected: {}", response.body)
            }
            Err(e) => warn!(entity_id = %id, "Delete failed: {}", e),
        }
        Ok(())
    }

    async fn delete_all(&self, meta: &RequestMeta) -> RepositoryResult<()> {
        let url = self.url(&format!("entity/{}", Self::model_path(meta)));
        match self
            .send_with_auth_retry(meta, |token| self.client.delete(&url).bearer_auth(token))
            .await
        {
            Ok(response) if response.is_success() => info!("Deleted all {}", meta.entity_model),
            Ok(response) => warn!(
                status = %response.status,
                "Delete of all {} rejected: {}",
                meta.entity_model,
                response.body
            ),
            Err(e) => warn!("Delete of all {} failed: {}", meta.entity_model, e),
        }
        Ok(())
    }

    async fn get_entity_count(
        &self,
        meta: &RequestMeta,
        point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<u64> {
        let path = format!("entity/stats/{}", Self::model_path(meta));
        let response = self
            .get(meta, &path, &Self::point_in_time_query(point_in_time))
            .await?;

        if !response.is_success() {
            warn!(status = %response.status, "Count of {} unavailable", meta.entity_model);
            return Ok(0);
        }

        Ok(response
            .json()
            .and_then(CountPayload::from_value)
            .map_or(0, |payload| payload.total()))
    }

    async fn get_entity_changes_metadata(
        &self,
        meta: &RequestMeta,
        id: &str,
        point_in_time: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Vec<Value>> {
        let path = format!("entity/{}/changes", urlencoding::encode(id));
        let response = self
            .get(meta, &path, &Self::point_in_time_query(point_in_time))
            .await?;

        if !response.is_success() {
            warn!(entity_id = %id, status = %response.status, "Change history unavailable");
            return Ok(Vec::new());
        }

        match response.json() {
            Some(Value::Array(changes)) => Ok(changes),
            _ => Ok(Vec::new()),
        }
    }

    async fn get_transitions(&self, meta: &RequestMeta, id: &str) -> RepositoryResult<TransitionsPayload> {
        let path = format!("entity/{}/transitions", urlencoding::encode(id));
        let response = self.get(meta, &path, &[]).await?;

        if !response.is_success() {
            warn!(entity_id = %id, status = %response.status, "Transitions unavailable");
            return Ok(TransitionsPayload::Other(Value::Null));
        }

        Ok(TransitionsPayload::from_value(
            response.json().unwrap_or(Value::Null),
        ))
    }
}
