use crate::broker::BrokerHandle;
use crate::error::EngineError;
use tracing::warn;

/// Application-level control riding the broker channel: force-stop, cache
/// and data clearing, uninstall, and service control.
///
/// Every operation follows the adapters' uniform contract: failures are
/// logged and swallowed into `false`.
pub struct AppController {
    broker: BrokerHandle,
}

impl AppController {
    pub fn new(broker: BrokerHandle) -> Self {
        Self { broker }
    }

    pub async fn force_stop(&self, package: &str) -> bool {
        swallow("force stop", package, self.broker.force_stop(package).await)
    }

    pub async fn clear_cache(&self, package: &str) -> bool {
        swallow("clear cache", package, self.broker.clear_cache(package).await)
    }

    pub async fn clear_data(&self, package: &str) -> bool {
        swallow("clear data", package, self.broker.clear_data(package).await)
    }

    pub async fn uninstall(&self, package: &str, version_code: i64) -> bool {
        swallow(
            "uninstall",
            package,
            self.broker.uninstall_app(package, version_code).await,
        )
    }

    /// Snapshot the remote's running-process and running-service lists;
    /// the `is_*_running` queries read from that snapshot.
    pub async fn refresh_running_state(&self) -> bool {
        let apps = swallow(
            "refresh running apps",
            "-",
            self.broker.refresh_running_app_list().await,
        );
        let services = swallow(
            "refresh running services",
            "-",
            self.broker.refresh_running_service_list().await,
        );
        apps && services
    }

    pub async fn is_app_running(&self, package: &str) -> bool {
        swallow(
            "is app running",
            package,
            self.broker.is_app_running(package).await,
        )
    }

    pub async fn is_service_running(&self, package: &str, service: &str) -> bool {
        swallow(
            "is service running",
            package,
            self.broker.is_service_running(package, service).await,
        )
    }

    pub async fn start_service(&self, package: &str, service: &str) -> bool {
        swallow(
            "start service",
            package,
            self.broker.start_service(package, service).await,
        )
    }

    pub async fn stop_service(&self, package: &str, service: &str) -> bool {
        swallow(
            "stop service",
            package,
            self.broker.stop_service(package, service).await,
        )
    }
}

fn swallow(op: &str, package: &str, result: Result<bool, EngineError>) -> bool {
    match result {
        Ok(ok) => ok,
        Err(err) => {
            warn!(package, "{op} failed: {err}");
            false
        }
    }
}
