//! Wiring of the whole enforcement graph from configuration and the
//! host-provided external services.

use crate::broker::{self, BrokerHandle, BrokerTransport};
use crate::config::EngineConfig;
use crate::controllers::{
    AppController, Controller, ControllerPreferences, IfwController, OverrideStore, PmController,
    ProxyController, RootChecker,
};
use crate::db;
use crate::error::EngineError;
use crate::repository::ComponentRepository;
use crate::source::{ComponentOracle, LiveComponentSource};
use crate::state::SummaryCache;
use std::{sync::Arc, time::Duration};
use tracing::info;

/// External collaborators the host must supply.
pub struct ExternalServices {
    pub oracle: Arc<dyn ComponentOracle>,
    pub overrides: Arc<dyn OverrideStore>,
    pub preferences: Arc<dyn ControllerPreferences>,
    pub root_checker: Arc<dyn RootChecker>,
    pub root_transport: Arc<dyn BrokerTransport>,
    pub proxy_transport: Arc<dyn BrokerTransport>,
}

/// Fully wired engine.
///
/// Keep this as a simple struct (vs. a dynamic registry) to preserve
/// compile-time ergonomics and avoid over-abstracting too early.
pub struct Engine {
    pub repository: ComponentRepository,
    pub apps: AppController,
    pub root_broker: BrokerHandle,
    pub proxy_broker: BrokerHandle,
}

impl Engine {
    /// Spawns the cache actor and both broker bridges, builds the three
    /// adapters, and assembles the repository. Startup failures are
    /// surfaced, not swallowed.
    pub async fn bootstrap(
        config: &EngineConfig,
        services: ExternalServices,
    ) -> Result<Self, EngineError> {
        info!(
            database_url = %config.cache.database_url,
            summary_ttl_secs = config.cache.summary_ttl_secs,
            summary_capacity = config.cache.summary_capacity,
            root_descriptor = %config.broker.root_descriptor,
            proxy_descriptor = %config.broker.proxy_descriptor,
            bind_timeout_secs = config.broker.bind_timeout_secs,
            "engine config (effective)"
        );

        let cache = db::spawn(&config.cache.database_url).await?;
        let bind_timeout = Duration::from_secs(config.broker.bind_timeout_secs.max(1));
        let root_broker = broker::spawn(
            &config.broker.root_descriptor,
            services.root_transport,
            bind_timeout,
        )
        .await?;
        let proxy_broker = broker::spawn(
            &config.broker.proxy_descriptor,
            services.proxy_transport,
            bind_timeout,
        )
        .await?;

        let pm: Arc<dyn Controller> = Arc::new(PmController::new(
            root_broker.clone(),
            services.oracle.clone(),
            services.root_checker,
        ));
        let ifw: Arc<dyn Controller> =
            Arc::new(IfwController::new(services.overrides, pm.clone()));
        let proxy: Arc<dyn Controller> = Arc::new(ProxyController::new(
            proxy_broker.clone(),
            services.oracle.clone(),
        ));

        let source = LiveComponentSource::new(services.oracle, pm.clone(), ifw.clone());
        let summaries = SummaryCache::new(
            config.cache.summary_ttl_secs,
            config.cache.summary_capacity,
        );
        let repository = ComponentRepository::new(
            cache,
            source,
            pm,
            ifw,
            proxy,
            services.preferences,
            summaries,
        );
        let apps = AppController::new(root_broker.clone());

        info!("engine bootstrapped");
        Ok(Self {
            repository,
            apps,
            root_broker,
            proxy_broker,
        })
    }
}
