//! Transport client for the Cyoda entity and workflow platform.
//!
//! The platform stores entities and runs their workflows; this crate is the
//! lowest layer talking to it over HTTP:
//! - [`CyodaRepository`]: the [`EntityRepository`] implementation (CRUD,
//!   snapshot search polling, transitions, edge messages)
//! - [`AuthProvider`]: bearer tokens, refreshed once on a 401
//! - [`ensure_cyoda_format`]: neutral criteria to the platform condition DSL
//! - [`normalize`]: technical-id resolution and response shape decoding
//!
//! # Example
//!
//! ```no_run
//! use cyoda_client::{ClientConfig, CyodaRepository, EntityRepository, StaticTokenAuth};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() -> cyoda_client::RepositoryResult<()> {
//! let repository = CyodaRepository::new(
//!     ClientConfig::default(),
//!     Arc::new(StaticTokenAuth::new("token")),
//! )?;
//! let meta = repository.get_meta("token", "customer", "1000");
//! let vip = repository
//!     .find_all_by_criteria(&meta, &json!({"tier": "gold"}), None)
//!     .await?;
//! # let _ = vip;
//! # Ok(())
//! # }
//! ```

mod auth;
mod config;
mod cyoda;
mod edge;
mod error;
mod format;
mod meta;
pub mod normalize;
mod repository;

pub use auth::{AuthProvider, ClientCredentialsAuth, StaticTokenAuth};
pub use config::ClientConfig;
pub use cyoda::{CyodaRepository, RawResponse};
pub use edge::{parse_edge_message, EdgeMessageCache, EDGE_MESSAGE_CONTENT_KEY};
pub use error::{RepositoryError, RepositoryResult};
pub use format::{ensure_cyoda_format, map_operator};
pub use meta::{PersistenceKind, RequestMeta};
pub use normalize::{resolve_technical_id, CountPayload, TransitionsPayload};
pub use repository::{EntityRepository, DEFAULT_KEY_FIELD};

pub use chrono::{DateTime, Utc};
