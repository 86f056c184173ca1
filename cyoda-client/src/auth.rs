//! Bearer-token providers.
//!
//! The repository asks an [`AuthProvider`] for a fresh token whenever the
//! platform answers 401, after invalidating the cached one.

use crate::config::ClientConfig;
use crate::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Supplies bearer tokens and can drop a cached one.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Returns a usable access token, fetching one if nothing is cached.
    async fn get_access_token(&self) -> RepositoryResult<String>;

    /// Drops any cached token so the next call fetches a new one.
    async fn invalidate_tokens(&self);
}

/// A fixed token. Invalidation only counts calls.
#[derive(Debug)]
pub struct StaticTokenAuth {
    token: String,
    invalidations: AtomicUsize,
}

impl StaticTokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            invalidations: AtomicUsize::new(0),
        }
    }

    /// Number of times `invalidate_tokens` has been called.
    pub fn invalidation_count(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    async fn get_access_token(&self) -> RepositoryResult<String> {
        Ok(self.token.clone())
    }

    async fn invalidate_tokens(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<SystemTime>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// OAuth2 client-credentials grant against `ClientConfig::token_url`.
pub struct ClientCredentialsAuth {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: RwLock<Option<CachedToken>>,
}

impl ClientCredentialsAuth {
    pub fn new(config: &ClientConfig) -> RepositoryResult<Self> {
        if config.client_id.is_empty() {
            return Err(RepositoryError::Config(
                "client_id is required for client-credentials auth".to_string(),
            ));
        }

        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            cached: RwLock::new(None),
        })
    }

    /// Returns true if a non-expired token is cached.
    pub async fn has_token(&self) -> bool {
        self.cached
            .read()
            .await
            .as_ref()
            .is_some_and(|t| !is_expired(t))
    }

    async fn fetch_token(&self) -> RepositoryResult<String> {
        debug!("Requesting access token from {}", self.token_url);

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| RepositoryError::Auth(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(RepositoryError::Auth(format!(
                "token request failed ({status}): {error}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| RepositoryError::Auth(format!("failed to parse token response: {e}")))?;

        // 60s buffer before the platform's own expiry
        let expires_at = token_response
            .expires_in
            .map(|secs| SystemTime::now() + Duration::from_secs(secs.saturating_sub(60)));

        *self.cached.write().await = Some(CachedToken {
            access_token: token_response.access_token.clone(),
            expires_at,
        });
        info!("Obtained new access token");

        Ok(token_response.access_token)
    }
}

fn is_expired(token: &CachedToken) -> bool {
    token
        .expires_at
        .is_some_and(|exp| SystemTime::now() >= exp)
}

#[async_trait]
impl AuthProvider for ClientCredentialsAuth {
    async fn get_access_token(&self) -> RepositoryResult<String> {
        {
            let guard = self.cached.read().await;
            if let Some(token) = guard.as_ref().filter(|t| !is_expired(t)) {
                return Ok(token.access_token.clone());
            }
        } // read lock dropped here

        self.fetch_token().await
    }

    async fn invalidate_tokens(&self) {
        debug!("Invalidating cached access token");
        *self.cached.write().await = None;
    }
}
