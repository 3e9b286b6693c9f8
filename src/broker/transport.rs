use crate::error::EngineError;
use async_trait::async_trait;

pub use super::client::BrokerEvents;

/// Remote surface of the out-of-process elevated actor.
///
/// A handle is produced by the transport once a bind completes and stays
/// valid until the disconnect callback fires.
#[async_trait]
pub trait RemoteBroker: Send + Sync + 'static {
    async fn set_component_enabled_setting(
        &self,
        package: &str,
        component: &str,
        enabled: bool,
    ) -> Result<bool, EngineError>;

    async fn force_stop(&self, package: &str) -> Result<bool, EngineError>;

    async fn clear_cache(&self, package: &str) -> Result<bool, EngineError>;

    async fn clear_data(&self, package: &str) -> Result<bool, EngineError>;

    async fn uninstall_app(&self, package: &str, version_code: i64)
    -> Result<bool, EngineError>;

    async fn refresh_running_app_list(&self) -> Result<bool, EngineError>;

    async fn refresh_running_service_list(&self) -> Result<bool, EngineError>;

    async fn is_app_running(&self, package: &str) -> Result<bool, EngineError>;

    async fn is_service_running(&self, package: &str, service: &str)
    -> Result<bool, EngineError>;

    async fn start_service(&self, package: &str, service: &str) -> Result<bool, EngineError>;

    async fn stop_service(&self, package: &str, service: &str) -> Result<bool, EngineError>;
}

/// Asynchronous bind protocol to the elevated process.
///
/// `bind` must return promptly; the outcome is delivered through `events`:
/// `connected` once with the live remote handle, `disconnected` when the
/// remote process dies or the bind cannot complete. A dead connection may
/// be followed by another `bind` call with fresh events.
pub trait BrokerTransport: Send + Sync + 'static {
    fn bind(&self, descriptor: &str, events: BrokerEvents);
}
