//! Application context - dependency injection container

use std::sync::Arc;

use installsync_core::{
    InstallmentApi, Reconciler, ReconcilerSettings, SaleRepository, Supervisor, SupervisorConfig,
    TokenProvider,
};
use installsync_domain::{Config, Result};
use installsync_infra::{HttpClient, InstallmentClient, PasswordGrantClient, PgSaleRepository};

/// Adapters and settings shared by every reconciliation round.
///
/// Adapters hold no per-run state, so one context can build any number of
/// fresh [`Reconciler`]s.
pub struct AppContext {
    pub repository: Arc<dyn SaleRepository>,
    pub api: Arc<dyn InstallmentApi>,
    pub tokens: Arc<dyn TokenProvider>,
    pub settings: ReconcilerSettings,
    pub supervisor_config: SupervisorConfig,
}

impl AppContext {
    /// Wire the production adapters from `config`.
    ///
    /// No connection is opened here; the store and the API are contacted on
    /// first use.
    ///
    /// # Errors
    /// Returns `SyncError::Config` for an invalid base URL or table name, or
    /// when an HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let user_agent = concat!("installsync/", env!("CARGO_PKG_VERSION"));

        let http =
            HttpClient::builder().timeout(config.api.timeout()).user_agent(user_agent).build()?;

        let api = InstallmentClient::new(http.clone(), &config.api)?;
        let tokens = PasswordGrantClient::new(http, &config.api);
        let repository = PgSaleRepository::new(&config.database)?;

        Ok(Self::from_parts(Arc::new(repository), Arc::new(api), Arc::new(tokens), config))
    }

    /// Assemble a context from explicit adapters.
    pub fn from_parts(
        repository: Arc<dyn SaleRepository>,
        api: Arc<dyn InstallmentApi>,
        tokens: Arc<dyn TokenProvider>,
        config: &Config,
    ) -> Self {
        Self {
            repository,
            api,
            tokens,
            settings: ReconcilerSettings::from(&config.reconcile),
            supervisor_config: SupervisorConfig::from(&config.reconcile),
        }
    }

    /// A reconciler with no state carried over from earlier rounds.
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.api),
            Arc::clone(&self.tokens),
            self.settings.clone(),
        )
    }

    /// Supervisor that builds a fresh reconciler from this context per round.
    pub fn supervisor(
        self: Arc<Self>,
    ) -> Supervisor<impl Fn() -> Result<Reconciler> + Send + Sync> {
        let config = self.supervisor_config.clone();
        Supervisor::new(move || Ok(self.reconciler()), config)
    }
}
