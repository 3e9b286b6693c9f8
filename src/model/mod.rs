//! Core data model shared by the cache, the adapters, and the repository.

use serde::{Deserialize, Serialize};

/// Kind of a declared application entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Activity,
    Service,
    Receiver,
    Provider,
}

impl ComponentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Activity => "activity",
            ComponentType::Service => "service",
            ComponentType::Receiver => "receiver",
            ComponentType::Provider => "provider",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "activity" => Some(ComponentType::Activity),
            "service" => Some(ComponentType::Service),
            "receiver" => Some(ComponentType::Receiver),
            "provider" => Some(ComponentType::Provider),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The enforcement path currently preferred by the user. Read fresh per
/// operation; changing it never rewrites past decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerType {
    Pm,
    Ifw,
    Broker,
}

/// A declared entry point decorated with its current block state.
///
/// `component_name` is the globally unique key. `pm_blocked` and
/// `ifw_blocked` are independent flags; for providers `ifw_blocked` is
/// inert and always `false` since the intent-filter override mechanism
/// cannot address providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub package_name: String,
    pub component_name: String,
    pub simple_name: String,
    pub component_type: ComponentType,
    pub exported: bool,
    pub pm_blocked: bool,
    pub ifw_blocked: bool,
    pub description: Option<String>,
}

impl Component {
    /// Last segment of a fully qualified component name.
    pub fn simple_name_of(component_name: &str) -> &str {
        component_name
            .rsplit('.')
            .next()
            .unwrap_or(component_name)
    }
}

/// A component as declared in the package manifest, before any state
/// decoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredComponent {
    pub name: String,
    pub exported: bool,
}

/// Raw enumeration of a package's entry points as reported by the OS
/// oracle.
#[derive(Debug, Clone, Default)]
pub struct PackageComponents {
    pub activities: Vec<DeclaredComponent>,
    pub services: Vec<DeclaredComponent>,
    pub receivers: Vec<DeclaredComponent>,
    pub providers: Vec<DeclaredComponent>,
}

impl PackageComponents {
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
            && self.services.is_empty()
            && self.receivers.is_empty()
            && self.providers.is_empty()
    }

    /// Resolves the declared kind of a component, or `None` if the package
    /// does not declare it.
    pub fn kind_of(&self, component_name: &str) -> Option<ComponentType> {
        let groups = [
            (&self.providers, ComponentType::Provider),
            (&self.receivers, ComponentType::Receiver),
            (&self.services, ComponentType::Service),
            (&self.activities, ComponentType::Activity),
        ];
        for (declared, kind) in groups {
            if declared.iter().any(|c| c.name == component_name) {
                return Some(kind);
            }
        }
        None
    }
}
