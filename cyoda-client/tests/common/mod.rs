//! Shared helpers for transport client tests.

#![allow(dead_code)]

use cyoda_client::{ClientConfig, CyodaRepository, RequestMeta, StaticTokenAuth};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";
pub const MODEL: &str = "customer";
pub const VERSION: &str = "1000";

/// Config pointing at the mock server with fast snapshot polling.
pub fn mock_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        api_url: server.uri(),
        token_url: format!("{}/oauth/token", server.uri()),
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string(),
        search_timeout_ms: 300,
        poll_interval_ms: 10,
        page_size: 2,
        ..Default::default()
    }
}

/// Repository whose auth provider hands out `fresh_token` after a 401.
pub fn repository_with_auth(server: &MockServer, fresh_token: &str) -> (CyodaRepository, Arc<StaticTokenAuth>) {
    let auth = Arc::new(StaticTokenAuth::new(fresh_token));
    let repository = CyodaRepository::new(mock_config(server), auth.clone()).unwrap();
    (repository, auth)
}

pub fn repository(server: &MockServer) -> CyodaRepository {
    repository_with_auth(server, TOKEN).0
}

pub fn meta() -> RequestMeta {
    RequestMeta::new(TOKEN, MODEL, VERSION)
}

/// A read envelope as the platform returns it.
pub fn envelope(id: &str, state: &str, data: Value) -> Value {
    json!({
        "type": "ENTITY",
        "data": data,
        "meta": {
            "id": id,
            "state": state,
            "creationDate": "2024-05-01T10:00:00.000Z",
            "lastUpdateTime": "2024-05-02T11:30:00.000Z",
            "modelKey": { "name": MODEL, "version": 1000 }
        }
    })
}
