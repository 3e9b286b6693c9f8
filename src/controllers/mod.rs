//! Enforcement adapters: one uniform contract over three structurally
//! different backends (PM toggle, intent-filter override, delegated
//! broker).

pub mod app;
pub mod ifw;
pub mod pm;
pub mod proxy;

pub use app::AppController;
pub use ifw::{IfwController, OverrideStore};
pub use pm::{PmController, RootChecker};
pub use proxy::ProxyController;

use crate::error::EngineError;
use crate::model::{Component, ControllerType};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

/// Uniform adapter contract.
///
/// Single operations report failures as errors; callers that need the
/// engine's swallow-to-`false` contract apply it at their boundary. Batch
/// operations are sequential, send a progress event after every item
/// regardless of outcome, and return the number of successes — never
/// all-or-nothing, no rollback, per-item failure reasons not preserved.
#[async_trait]
pub trait Controller: Send + Sync {
    async fn enable(&self, component: &Component) -> Result<bool, EngineError>;

    async fn disable(&self, component: &Component) -> Result<bool, EngineError>;

    /// Whether the component is currently enabled as seen by this backend.
    async fn check_enabled_state(
        &self,
        package: &str,
        component: &str,
    ) -> Result<bool, EngineError>;

    async fn batch_enable(
        &self,
        components: Vec<Component>,
        progress: mpsc::Sender<Component>,
    ) -> usize {
        let mut succeeded = 0;
        for component in components {
            match self.enable(&component).await {
                Ok(true) => succeeded += 1,
                Ok(false) => {}
                Err(err) => warn!(
                    package = %component.package_name,
                    component = %component.component_name,
                    "batch enable failed: {err}"
                ),
            }
            // A dropped receiver means the caller canceled the batch.
            if progress.send(component).await.is_err() {
                break;
            }
        }
        succeeded
    }

    async fn batch_disable(
        &self,
        components: Vec<Component>,
        progress: mpsc::Sender<Component>,
    ) -> usize {
        let mut succeeded = 0;
        for component in components {
            match self.disable(&component).await {
                Ok(true) => succeeded += 1,
                Ok(false) => {}
                Err(err) => warn!(
                    package = %component.package_name,
                    component = %component.component_name,
                    "batch disable failed: {err}"
                ),
            }
            if progress.send(component).await.is_err() {
                break;
            }
        }
        succeeded
    }
}

/// Source of the user's currently preferred enforcement path. Read fresh
/// for every operation; a change never rewrites past decisions.
#[async_trait]
pub trait ControllerPreferences: Send + Sync {
    async fn controller_type(&self) -> ControllerType;
}
