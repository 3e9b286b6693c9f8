use super::Controller;
use crate::broker::BrokerHandle;
use crate::error::EngineError;
use crate::model::Component;
use crate::source::{ComponentOracle, oracle_enabled};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Delegated-elevation enforcement path: the same remote surface as the
/// PM path, reached through a lower-privilege channel. No root probe and
/// no cross-adapter priming.
pub struct ProxyController {
    broker: BrokerHandle,
    oracle: Arc<dyn ComponentOracle>,
}

impl ProxyController {
    pub fn new(broker: BrokerHandle, oracle: Arc<dyn ComponentOracle>) -> Self {
        Self { broker, oracle }
    }

    async fn switch_component(
        &self,
        package: &str,
        component: &str,
        enabled: bool,
    ) -> Result<bool, EngineError> {
        debug!(package, component, enabled, "proxy switch component");
        self.broker
            .set_component_enabled(package, component, enabled)
            .await
    }
}

#[async_trait]
impl Controller for ProxyController {
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
        oracle_enabled(&self.oracle, package, component).await
    }
}
