//! Live component source: enumerates a package's declared entry points
//! through the OS oracle and decorates each with the block state currently
//! reported by the PM and IFW backends.

use crate::controllers::Controller;
use crate::error::EngineError;
use crate::model::{Component, ComponentType, DeclaredComponent, PackageComponents};
use std::sync::Arc;
use tracing::debug;

/// Read-only OS component-enumeration oracle.
///
/// Implementations are blocking; the engine runs every call on the
/// blocking thread pool.
pub trait ComponentOracle: Send + Sync + 'static {
    fn list_components(&self, package: &str) -> Result<PackageComponents, EngineError>;

    fn is_component_enabled(&self, package: &str, component: &str) -> Result<bool, EngineError>;
}

pub(crate) async fn oracle_list(
    oracle: &Arc<dyn ComponentOracle>,
    package: &str,
) -> Result<PackageComponents, EngineError> {
    let oracle = oracle.clone();
    let package = package.to_string();
    tokio::task::spawn_blocking(move || oracle.list_components(&package))
        .await
        .map_err(|e| EngineError::Task(format!("oracle list join failed: {e}")))?
}

pub(crate) async fn oracle_enabled(
    oracle: &Arc<dyn ComponentOracle>,
    package: &str,
    component: &str,
) -> Result<bool, EngineError> {
    let oracle = oracle.clone();
    let package = package.to_string();
    let component = component.to_string();
    tokio::task::spawn_blocking(move || oracle.is_component_enabled(&package, &component))
        .await
        .map_err(|e| EngineError::Task(format!("oracle check join failed: {e}")))?
}

/// Queries the oracle for a package's component graph and decorates each
/// entry with live adapter state.
#[derive(Clone)]
pub struct LiveComponentSource {
    oracle: Arc<dyn ComponentOracle>,
    pm: Arc<dyn Controller>,
    ifw: Arc<dyn Controller>,
}

impl LiveComponentSource {
    pub fn new(
        oracle: Arc<dyn ComponentOracle>,
        pm: Arc<dyn Controller>,
        ifw: Arc<dyn Controller>,
    ) -> Self {
        Self { oracle, pm, ifw }
    }

    /// All declared components of a package, optionally restricted to one
    /// kind, each decorated with current `pm_blocked`/`ifw_blocked` state.
    pub async fn get_component_list(
        &self,
        package: &str,
        kind: Option<ComponentType>,
    ) -> Result<Vec<Component>, EngineError> {
        let declared = oracle_list(&self.oracle, package).await?;
        let groups: [(Vec<DeclaredComponent>, ComponentType); 4] = [
            (declared.activities, ComponentType::Activity),
            (declared.services, ComponentType::Service),
            (declared.receivers, ComponentType::Receiver),
            (declared.providers, ComponentType::Provider),
        ];

        let mut components = Vec::new();
        for (group, group_kind) in groups {
            if kind.is_some_and(|k| k != group_kind) {
                continue;
            }
            for entry in group {
                components.push(self.decorate(package, entry, group_kind).await?);
            }
        }
        debug!(
            package,
            count = components.len(),
            "live component list assembled"
        );
        Ok(components)
    }

    /// A single declared component, or `None` when the package does not
    /// declare it.
    pub async fn get_component(
        &self,
        package: &str,
        component_name: &str,
    ) -> Result<Option<Component>, EngineError> {
        let declared = oracle_list(&self.oracle, package).await?;
        let Some(kind) = declared.kind_of(component_name) else {
            return Ok(None);
        };
        let groups = [
            declared.activities,
            declared.services,
            declared.receivers,
            declared.providers,
        ];
        let entry = groups
            .into_iter()
            .flatten()
            .find(|c| c.name == component_name);
        match entry {
            Some(entry) => Ok(Some(self.decorate(package, entry, kind).await?)),
            None => Ok(None),
        }
    }

    async fn decorate(
        &self,
        package: &str,
        entry: DeclaredComponent,
        kind: ComponentType,
    ) -> Result<Component, EngineError> {
        let pm_blocked = !self.pm.check_enabled_state(package, &entry.name).await?;
        // The IFW mechanism cannot address providers; the flag stays inert.
        let ifw_blocked = if kind == ComponentType::Provider {
            false
        } else {
            !self.ifw.check_enabled_state(package, &entry.name).await?
        };
        let simple_name = Component::simple_name_of(&entry.name).to_string();
        Ok(Component {
            package_name: package.to_string(),
            component_name: entry.name,
            simple_name,
            component_type: kind,
            exported: entry.exported,
            pm_blocked,
            ifw_blocked,
            description: None,
        })
    }
}
