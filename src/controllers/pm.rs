use super::Controller;
use crate::broker::BrokerHandle;
use crate::error::EngineError;
use crate::model::Component;
use crate::source::{ComponentOracle, oracle_enabled};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Privilege probe for the PM path.
#[async_trait]
pub trait RootChecker: Send + Sync {
    async fn is_root_available(&self) -> bool;
}

/// Privileged enforcement path: flips the OS's own enabled/disabled
/// setting through the root-elevated broker.
///
/// Root availability is probed before every call; an unavailable probe
/// raises [`EngineError::RootUnavailable`] instead of attempting an
/// indefinite bind.
pub struct PmController {
    broker: BrokerHandle,
    oracle: Arc<dyn ComponentOracle>,
    root: Arc<dyn RootChecker>,
}

impl PmController {
    pub fn new(
        broker: BrokerHandle,
        oracle: Arc<dyn ComponentOracle>,
        root: Arc<dyn RootChecker>,
    ) -> Self {
        Self {
            broker,
            oracle,
            root,
        }
    }

    async fn switch_component(
        &self,
        package: &str,
        component: &str,
        enabled: bool,
    ) -> Result<bool, EngineError> {
        if !self.root.is_root_available().await {
            return Err(EngineError::RootUnavailable);
        }
        debug!(package, component, enabled, "pm switch component");
        self.broker
            .set_component_enabled(package, component, enabled)
            .await
    }
}

#[async_trait]
impl Controller for PmController {
    async fn enable(&self, component: &Component) -> Result<bool, EngineError> {
        self.switch_component(&component.package_name, &component.component_name, true)
            .await
    }

    async fn disable(&self, component: &Component) -> Result<bool, EngineError> {
        self.switch_component(&component.package_name, &component.component_name, false)
            .await
    }

    async fn check_enabled_state(
        &self,
        package: &str,
        component: &str,
    ) -> Result<bool, EngineError> {
        // The enabled flag is world-readable; no elevation needed here.
        oracle_enabled(&self.oracle, package, component).await
    }
}
