//! Shared test doubles: an in-memory system state backing both the fake
//! oracle and the fake remote broker, a scripted override store, and a
//! transport whose binds complete asynchronously.

#![allow(dead_code)]

use async_trait::async_trait;
use gatehouse::broker::{BrokerEvents, BrokerTransport, RemoteBroker};
use gatehouse::config::{BrokerConfig, CacheConfig, EngineConfig};
use gatehouse::controllers::{ControllerPreferences, OverrideStore, RootChecker};
use gatehouse::engine::{Engine, ExternalServices};
use gatehouse::error::EngineError;
use gatehouse::model::{
    Component, ComponentType, ControllerType, DeclaredComponent, PackageComponents,
};
use gatehouse::source::ComponentOracle;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Shared "OS truth": declared components plus the PM-level disabled set.
/// The oracle reads it; the fake remote mutates it.
#[derive(Default)]
pub struct SystemState {
    packages: Mutex<HashMap<String, PackageComponents>>,
    disabled: Mutex<HashSet<(String, String)>>,
}

impl SystemState {
    pub fn declare(&self, package: &str, kind: ComponentType, name: &str, exported: bool) {
        let mut packages = self.packages.lock().unwrap();
        let entry = packages.entry(package.to_string()).or_default();
        let declared = DeclaredComponent {
            name: name.to_string(),
            exported,
        };
        match kind {
            ComponentType::Activity => entry.activities.push(declared),
            ComponentType::Service => entry.services.push(declared),
            ComponentType::Receiver => entry.receivers.push(declared),
            ComponentType::Provider => entry.providers.push(declared),
        }
    }

    pub fn undeclare(&self, package: &str, name: &str) {
        let mut packages = self.packages.lock().unwrap();
        if let Some(entry) = packages.get_mut(package) {
            for group in [
                &mut entry.activities,
                &mut entry.services,
                &mut entry.receivers,
                &mut entry.providers,
            ] {
                group.retain(|c| c.name != name);
            }
        }
    }

    pub fn set_pm_disabled(&self, package: &str, name: &str, disabled: bool) {
        let key = (package.to_string(), name.to_string());
        let mut set = self.disabled.lock().unwrap();
        if disabled {
            set.insert(key);
        } else {
            set.remove(&key);
        }
    }

    pub fn is_pm_disabled(&self, package: &str, name: &str) -> bool {
        self.disabled
            .lock()
            .unwrap()
            .contains(&(package.to_string(), name.to_string()))
    }
}

pub struct FakeOracle {
    pub system: Arc<SystemState>,
}

impl ComponentOracle for FakeOracle {
    fn list_components(&self, package: &str) -> Result<PackageComponents, EngineError> {
        Ok(self
            .system
            .packages
            .lock()
            .unwrap()
            .get(package)
            .cloned()
            .unwrap_or_default())
    }

    fn is_component_enabled(&self, package: &str, component: &str) -> Result<bool, EngineError> {
        Ok(!self.system.is_pm_disabled(package, component))
    }
}

/// Remote broker double writing back into the shared system state.
/// Components listed in `fail_components` report `false` without any
/// state change.
pub struct FakeRemote {
    pub system: Arc<SystemState>,
    pub set_calls: Mutex<Vec<(String, String, bool)>>,
    pub fail_components: Mutex<HashSet<String>>,
    pub ops: Mutex<Vec<String>>,
    pub running: Mutex<HashSet<String>>,
    snapshot: Mutex<HashSet<String>>,
}

impl FakeRemote {
    pub fn new(system: Arc<SystemState>) -> Self {
        Self {
            system,
            set_calls: Mutex::new(Vec::new()),
            fail_components: Mutex::new(HashSet::new()),
            ops: Mutex::new(Vec::new()),
            running: Mutex::new(HashSet::new()),
            snapshot: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_for(&self, component: &str) {
        self.fail_components
            .lock()
            .unwrap()
            .insert(component.to_string());
    }

    pub fn set_call_count(&self) -> usize {
        self.set_calls.lock().unwrap().len()
    }

    fn record(&self, op: String) {
        self.ops.lock().unwrap().push(op);
    }
}

#[async_trait]
impl RemoteBroker for FakeRemote {
    async fn set_component_enabled_setting(
        &self,
        package: &str,
        component: &str,
        enabled: bool,
    ) -> Result<bool, EngineError> {
        self.set_calls.lock().unwrap().push((
            package.to_string(),
            component.to_string(),
            enabled,
        ));
        if self.fail_components.lock().unwrap().contains(component) {
            return Ok(false);
        }
        self.system.set_pm_disabled(package, component, !enabled);
        Ok(true)
    }

    async fn force_stop(&self, package: &str) -> Result<bool, EngineError> {
        self.record(format!("force_stop:{package}"));
        Ok(true)
    }

    async fn clear_cache(&self, package: &str) -> Result<bool, EngineError> {
        self.record(format!("clear_cache:{package}"));
        Ok(true)
    }

    async fn clear_data(&self, package: &str) -> Result<bool, EngineError> {
        self.record(format!("clear_data:{package}"));
        Ok(true)
    }

    async fn uninstall_app(
        &self,
        package: &str,
        version_code: i64,
    ) -> Result<bool, EngineError> {
        self.record(format!("uninstall:{package}:{version_code}"));
        Ok(true)
    }

    async fn refresh_running_app_list(&self) -> Result<bool, EngineError> {
        *self.snapshot.lock().unwrap() = self.running.lock().unwrap().clone();
        Ok(true)
    }

    async fn refresh_running_service_list(&self) -> Result<bool, EngineError> {
        Ok(true)
    }

    async fn is_app_running(&self, package: &str) -> Result<bool, EngineError> {
        Ok(self.snapshot.lock().unwrap().contains(package))
    }

    async fn is_service_running(
        &self,
        package: &str,
        service: &str,
    ) -> Result<bool, EngineError> {
        self.record(format!("is_service_running:{package}/{service}"));
        Ok(false)
    }

    async fn start_service(&self, package: &str, service: &str) -> Result<bool, EngineError> {
        self.record(format!("start_service:{package}/{service}"));
        Ok(true)
    }

    async fn stop_service(&self, package: &str, service: &str) -> Result<bool, EngineError> {
        self.record(format!("stop_service:{package}/{service}"));
        Ok(true)
    }
}

/// Transport completing binds asynchronously after `connect_delay`.
/// `respond` false leaves binds hanging; `reject` answers with a
/// disconnect instead of a handle.
pub struct FakeTransport {
    pub remote: Arc<FakeRemote>,
    pub bind_count: AtomicUsize,
    pub connect_delay: Duration,
    pub respond: AtomicBool,
    pub reject: AtomicBool,
    last_events: Mutex<Option<BrokerEvents>>,
}

impl FakeTransport {
    pub fn new(remote: Arc<FakeRemote>) -> Self {
        Self {
            remote,
            bind_count: AtomicUsize::new(0),
            connect_delay: Duration::from_millis(50),
            respond: AtomicBool::new(true),
            reject: AtomicBool::new(false),
            last_events: Mutex::new(None),
        }
    }

    pub fn binds(&self) -> usize {
        self.bind_count.load(Ordering::SeqCst)
    }

    /// Simulates remote process death on the live connection.
    pub fn kill_connection(&self) {
        if let Some(events) = self.last_events.lock().unwrap().clone() {
            events.disconnected();
        }
    }
}

impl BrokerTransport for FakeTransport {
    fn bind(&self, _descriptor: &str, events: BrokerEvents) {
        self.bind_count.fetch_add(1, Ordering::SeqCst);
        *self.last_events.lock().unwrap() = Some(events.clone());
        if !self.respond.load(Ordering::SeqCst) {
            return;
        }
        let reject = self.reject.load(Ordering::SeqCst);
        let remote = self.remote.clone();
        let delay = self.connect_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if reject {
                events.disconnected();
            } else {
                events.connected(remote);
            }
        });
    }
}

pub struct FakeOverrideStore {
    blocked: Mutex<HashSet<(String, String)>>,
    pub set_calls: Mutex<Vec<(String, String, bool)>>,
    fail_components: Mutex<HashSet<String>>,
}

impl FakeOverrideStore {
    pub fn new() -> Self {
        Self {
            blocked: Mutex::new(HashSet::new()),
            set_calls: Mutex::new(Vec::new()),
            fail_components: Mutex::new(HashSet::new()),
        }
    }

    pub fn block(&self, package: &str, component: &str) {
        self.blocked
            .lock()
            .unwrap()
            .insert((package.to_string(), component.to_string()));
    }

    pub fn fail_for(&self, component: &str) {
        self.fail_components
            .lock()
            .unwrap()
            .insert(component.to_string());
    }

    pub fn contains(&self, package: &str, component: &str) -> bool {
        self.blocked
            .lock()
            .unwrap()
            .contains(&(package.to_string(), component.to_string()))
    }

    pub fn set_call_count(&self) -> usize {
        self.set_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl OverrideStore for FakeOverrideStore {
    async fn is_blocked(&self, package: &str, component: &str) -> Result<bool, EngineError> {
        Ok(self.contains(package, component))
    }

    async fn set_blocked(
        &self,
        package: &str,
        component: &str,
        blocked: bool,
    ) -> Result<bool, EngineError> {
        if self.fail_components.lock().unwrap().contains(component) {
            return Err(EngineError::OverrideStore("scripted write failure".into()));
        }
        self.set_calls.lock().unwrap().push((
            package.to_string(),
            component.to_string(),
            blocked,
        ));
        let key = (package.to_string(), component.to_string());
        let mut set = self.blocked.lock().unwrap();
        if blocked {
            set.insert(key);
        } else {
            set.remove(&key);
        }
        Ok(true)
    }
}

pub struct FakePreferences {
    controller: Mutex<ControllerType>,
}

impl FakePreferences {
    pub fn new(controller: ControllerType) -> Self {
        Self {
            controller: Mutex::new(controller),
        }
    }

    pub fn set(&self, controller: ControllerType) {
        *self.controller.lock().unwrap() = controller;
    }
}

#[async_trait]
impl ControllerPreferences for FakePreferences {
    async fn controller_type(&self) -> ControllerType {
        *self.controller.lock().unwrap()
    }
}

pub struct FakeRootChecker {
    pub available: AtomicBool,
}

impl FakeRootChecker {
    pub fn new(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
        }
    }
}

#[async_trait]
impl RootChecker for FakeRootChecker {
    async fn is_root_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

pub fn temp_database(tag: &str) -> (String, PathBuf) {
    let mut hasher = DefaultHasher::new();
    SystemTime::now().hash(&mut hasher);
    tag.hash(&mut hasher);
    let db_path = std::env::temp_dir().join(format!("gatehouse_test_{tag}_{}.sqlite", hasher.finish()));
    let url = format!("sqlite:{}", db_path.to_str().unwrap());
    (url, db_path)
}

pub async fn cleanup_database(db_path: &PathBuf) {
    let wal = PathBuf::from(format!("{}-wal", db_path.to_string_lossy()));
    let shm = PathBuf::from(format!("{}-shm", db_path.to_string_lossy()));
    let _ = tokio::fs::remove_file(&wal).await;
    let _ = tokio::fs::remove_file(&shm).await;
    let _ = tokio::fs::remove_file(db_path).await;
}

/// Fully wired engine over the fakes.
pub struct TestEnv {
    pub engine: Engine,
    pub system: Arc<SystemState>,
    pub remote: Arc<FakeRemote>,
    pub transport: Arc<FakeTransport>,
    pub overrides: Arc<FakeOverrideStore>,
    pub prefs: Arc<FakePreferences>,
    pub root: Arc<FakeRootChecker>,
    pub db_path: PathBuf,
}

impl TestEnv {
    pub async fn cleanup(&self) {
        cleanup_database(&self.db_path).await;
    }
}

pub async fn bootstrap_env(tag: &str, controller: ControllerType) -> TestEnv {
    let system = Arc::new(SystemState::default());
    let remote = Arc::new(FakeRemote::new(system.clone()));
    let transport = Arc::new(FakeTransport::new(remote.clone()));
    let proxy_transport = Arc::new(FakeTransport::new(remote.clone()));
    let overrides = Arc::new(FakeOverrideStore::new());
    let prefs = Arc::new(FakePreferences::new(controller));
    let root = Arc::new(FakeRootChecker::new(true));

    let (database_url, db_path) = temp_database(tag);
    let config = EngineConfig {
        cache: CacheConfig {
            database_url,
            summary_ttl_secs: 300,
            summary_capacity: 64,
        },
        broker: BrokerConfig {
            root_descriptor: format!("test.broker.root.{tag}"),
            proxy_descriptor: format!("test.broker.proxy.{tag}"),
            bind_timeout_secs: 5,
        },
    };

    let services = ExternalServices {
        oracle: Arc::new(FakeOracle {
            system: system.clone(),
        }),
        overrides: overrides.clone(),
        preferences: prefs.clone(),
        root_checker: root.clone(),
        root_transport: transport.clone(),
        proxy_transport,
    };

    let engine = Engine::bootstrap(&config, services)
        .await
        .expect("engine bootstrap failed");

    TestEnv {
        engine,
        system,
        remote,
        transport,
        overrides,
        prefs,
        root,
        db_path,
    }
}

pub fn component(
    package: &str,
    simple_name: &str,
    kind: ComponentType,
    pm_blocked: bool,
    ifw_blocked: bool,
) -> Component {
    Component {
        package_name: package.to_string(),
        component_name: format!("{package}.{simple_name}"),
        simple_name: simple_name.to_string(),
        component_type: kind,
        exported: false,
        pm_blocked,
        ifw_blocked,
        description: None,
    }
}
