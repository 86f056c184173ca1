//! Composition root: one repository and one service per configuration.

use crate::error::BootstrapError;
use crate::legacy::LegacyEntityService;
use crate::registry::ModelRegistry;
use crate::service::EntityServiceImpl;
use cyoda_client::{AuthProvider, ClientConfig, CyodaRepository};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{info, warn};

static SHARED: OnceLock<CyodaServices> = OnceLock::new();
static INIT: Mutex<()> = Mutex::new(());

/// The wired client stack.
pub struct CyodaServices {
    config: ClientConfig,
    repository: Arc<CyodaRepository>,
    service: Arc<EntityServiceImpl>,
}

impl CyodaServices {
    pub fn build(config: ClientConfig, auth: Arc<dyn AuthProvider>) -> Result<Self, BootstrapError> {
        Self::build_with_registry(config, auth, ModelRegistry::default())
    }

    pub fn build_with_registry(
        config: ClientConfig,
        auth: Arc<dyn AuthProvider>,
        registry: ModelRegistry,
    ) -> Result<Self, BootstrapError> {
        config.validate()?;
        let repository = Arc::new(CyodaRepository::new(config.clone(), auth.clone())?);
        let service = EntityServiceImpl::new(
            repository.clone(),
            auth,
            config.default_entity_version.clone(),
        )
        .with_registry(registry);

        Ok(Self {
            config,
            repository,
            service: Arc::new(service),
        })
    }

    /// Builds the process-wide services once.
    ///
    /// A later call with an equal configuration returns the same instance;
    /// a different configuration is rejected.
    pub fn init_shared(
        config: ClientConfig,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<&'static CyodaServices, BootstrapError> {
        if let Some(existing) = SHARED.get() {
            return Self::check_same(existing, &config);
        }

        let _guard = INIT.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = SHARED.get() {
            return Self::check_same(existing, &config);
        }

        let services = Self::build(config, auth)?;
        info!("Initialized shared services for {}", services.config.api_url);
        Ok(SHARED.get_or_init(|| services))
    }

    /// The process-wide services, if initialized.
    pub fn shared() -> Option<&'static CyodaServices> {
        SHARED.get()
    }

    fn check_same(
        existing: &'static CyodaServices,
        config: &ClientConfig,
    ) -> Result<&'static CyodaServices, BootstrapError> {
        if existing.config == *config {
            Ok(existing)
        } else {
            warn!("Shared services already initialized for {}", existing.config.api_url);
            Err(BootstrapError::AlreadyInitialized)
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<CyodaRepository> {
        &self.repository
    }

    pub fn service(&self) -> &Arc<EntityServiceImpl> {
        &self.service
    }

    /// Item-style adapter sharing this stack's service.
    pub fn legacy(&self) -> LegacyEntityService {
        LegacyEntityService::new(self.service.clone())
    }
}
