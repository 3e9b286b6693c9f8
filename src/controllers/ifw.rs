use super::Controller;
use crate::error::EngineError;
use crate::model::{Component, ComponentType};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Declarative per-package override store. Blocking a component here
/// removes it from intent resolution without touching its OS enabled
/// flag; no elevation is required.
#[async_trait]
pub trait OverrideStore: Send + Sync {
    async fn is_blocked(&self, package: &str, component: &str) -> Result<bool, EngineError>;

    /// Returns whether the store changed as a result of the write.
    async fn set_blocked(
        &self,
        package: &str,
        component: &str,
        blocked: bool,
    ) -> Result<bool, EngineError>;
}

/// Intent-filter override enforcement path.
///
/// Providers are not addressable by this mechanism and delegate fully to
/// the PM path, including inside batches.
pub struct IfwController {
    store: Arc<dyn OverrideStore>,
    pm: Arc<dyn Controller>,
}

impl IfwController {
    pub fn new(store: Arc<dyn OverrideStore>, pm: Arc<dyn Controller>) -> Self {
        Self { store, pm }
    }
}

#[async_trait]
impl Controller for IfwController {
    async fn enable(&self, component: &Component) -> Result<bool, EngineError> {
        if component.component_type == ComponentType::Provider {
            debug!(
                component = %component.component_name,
                "provider enable delegated to pm path"
            );
            return self.pm.enable(component).await;
        }
        self.store
            .set_blocked(&component.package_name, &component.component_name, false)
            .await
    }

    async fn disable(&self, component: &Component) -> Result<bool, EngineError> {
        if component.component_type == ComponentType::Provider {
            debug!(
                component = %component.component_name,
                "provider disable delegated to pm path"
            );
            return self.pm.disable(component).await;
        }
        self.store
            .set_blocked(&component.package_name, &component.component_name, true)
            .await
    }

    async fn check_enabled_state(
        &self,
        package: &str,
        component: &str,
    ) -> Result<bool, EngineError> {
        Ok(!self.store.is_blocked(package, component).await?)
    }
}
