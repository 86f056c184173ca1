//! Typed entity service for the Cyoda platform.
//!
//! [`EntityServiceImpl`] is what application code talks to. It turns a
//! [`SearchConditionRequest`](cyoda_query::SearchConditionRequest) into the
//! neutral condition mapping, calls an
//! [`EntityRepository`](cyoda_client::EntityRepository), and wraps the
//! results as [`EntityResponse`] values. Failures surface as a single
//! [`EntityServiceError`] type.
//!
//! [`CyodaServices`] wires the HTTP repository and the service from one
//! [`ClientConfig`](cyoda_client::ClientConfig).
//!
//! # Example
//!
//! ```no_run
//! use cyoda_client::{ClientConfig, StaticTokenAuth};
//! use cyoda_query::SearchConditionRequest;
//! use cyoda_service::CyodaServices;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let services = CyodaServices::build(
//!     ClientConfig::default(),
//!     Arc::new(StaticTokenAuth::new("token")),
//! )?;
//! let condition = SearchConditionRequest::builder()
//!     .equals("name", "Test")
//!     .limit(2)
//!     .build();
//! let found = services.service().search("customer", &condition, None).await?;
//! for entity in found {
//!     println!("{} {:?}", entity.id(), entity.state());
//! }
//! # Ok(())
//! # }
//! ```

mod bootstrap;
mod condition;
mod error;
mod legacy;
mod model;
mod registry;
mod service;

pub use bootstrap::CyodaServices;
pub use condition::convert_search_condition;
pub use error::{BootstrapError, EntityServiceError, ServiceErrorKind, ServiceResult};
pub use legacy::LegacyEntityService;
pub use model::{EntityData, EntityMetadata, EntityResponse, TypedModel};
pub use registry::ModelRegistry;
pub use service::{EntityServiceImpl, DEFAULT_TRANSITIONS};
