//! Repository orchestrating the cache, the live source, and the three
//! enforcement adapters: cache-first reads with live fallback, diff-based
//! reconciliation, and controller-aware single/batch writes.

mod routing;

use crate::controllers::{Controller, ControllerPreferences};
use crate::db::CacheHandle;
use crate::error::EngineError;
use crate::model::{Component, ComponentType, ControllerType};
use crate::source::LiveComponentSource;
use crate::state::{PackageSummary, SummaryCache};
use crate::utils::logging::with_pretty_json_debug;
use ahash::{AHashMap, AHashSet};
use routing::{AdapterKind, ObservedState, control_plan};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct ComponentRepository {
    cache: CacheHandle,
    source: LiveComponentSource,
    pm: Arc<dyn Controller>,
    ifw: Arc<dyn Controller>,
    proxy: Arc<dyn Controller>,
    preferences: Arc<dyn ControllerPreferences>,
    summaries: SummaryCache,
}

impl ComponentRepository {
    pub fn new(
        cache: CacheHandle,
        source: LiveComponentSource,
        pm: Arc<dyn Controller>,
        ifw: Arc<dyn Controller>,
        proxy: Arc<dyn Controller>,
        preferences: Arc<dyn ControllerPreferences>,
        summaries: SummaryCache,
    ) -> Self {
        Self {
            cache,
            source,
            pm,
            ifw,
            proxy,
            preferences,
            summaries,
        }
    }

    /// Direct cache lookup by the globally unique component name.
    pub async fn get_component(&self, name: &str) -> Result<Option<Component>, EngineError> {
        self.cache.get_by_name(name).await
    }

    /// Cached rows if any exist for the scope, otherwise a direct live
    /// query. The fallback is not persisted as a side effect.
    pub async fn get_component_list(
        &self,
        package: &str,
        kind: Option<ComponentType>,
    ) -> Result<Vec<Component>, EngineError> {
        let cached = self.cached_scope(package, kind).await?;
        if !cached.is_empty() {
            return Ok(cached);
        }
        self.source.get_component_list(package, kind).await
    }

    /// Reconciles the cached scope against the live component graph.
    ///
    /// Rows present on only one side are deleted, then every live row is
    /// upserted unconditionally so field-level drift is corrected too.
    /// One-shot; not transactional — a cancellation leaves the cache at
    /// the last completed write.
    pub async fn update_component_list(
        &self,
        package: &str,
        kind: Option<ComponentType>,
    ) -> Result<(), EngineError> {
        let cached = self.cached_scope(package, kind).await?;
        let live = self.source.get_component_list(package, kind).await?;

        let stale: Vec<String> = {
            let mut occurrences: AHashMap<&str, usize> = AHashMap::new();
            for c in live.iter().chain(cached.iter()) {
                *occurrences.entry(c.component_name.as_str()).or_insert(0) += 1;
            }
            occurrences
                .into_iter()
                .filter(|(_, count)| *count == 1)
                .map(|(name, _)| name.to_string())
                .collect()
        };

        if !stale.is_empty() {
            debug!(
                package,
                count = stale.len(),
                "deleting components found on only one side of the diff"
            );
            self.cache.delete_by_names(stale).await?;
        }

        with_pretty_json_debug(&live, |pretty| {
            debug!(package, body = %pretty, "upserting live component list");
        });
        debug!(package, size = live.len(), "update component list");
        self.cache.upsert(live).await?;
        self.summaries.invalidate(package);
        Ok(())
    }

    /// Routes a single toggle by the active controller type and applies
    /// the cross-adapter priming rules. Never throws for a failed toggle;
    /// the boolean is the conjunction of the executed adapter calls.
    pub async fn control_component(&self, component: &Component, new_state: bool) -> bool {
        match self.try_control(component, new_state).await {
            Ok(ok) => ok,
            Err(err) => {
                warn!(
                    package = %component.package_name,
                    component = %component.component_name,
                    "control failed: {err}"
                );
                false
            }
        }
    }

    async fn try_control(
        &self,
        component: &Component,
        new_state: bool,
    ) -> Result<bool, EngineError> {
        debug!(
            package = %component.package_name,
            component = %component.component_name,
            new_state,
            "control component"
        );
        let controller = self.preferences.controller_type().await;
        let observed = self.observe(component, controller).await?;
        let plan = control_plan(controller, component.component_type, observed, new_state);
        if plan.is_empty() {
            debug!(
                component = %component.component_name,
                "already in requested state"
            );
            return Ok(true);
        }

        let mut row = component.clone();
        let mut all_ok = true;
        for call in plan {
            let result = if call.enable {
                self.adapter(call.adapter).enable(component).await
            } else {
                self.adapter(call.adapter).disable(component).await
            };
            match result {
                Ok(true) => match call.adapter {
                    AdapterKind::Pm | AdapterKind::Proxy => row.pm_blocked = !call.enable,
                    AdapterKind::Ifw => row.ifw_blocked = !call.enable,
                },
                Ok(false) => all_ok = false,
                Err(err) => {
                    warn!(
                        component = %component.component_name,
                        adapter = ?call.adapter,
                        "adapter call failed: {err}"
                    );
                    all_ok = false;
                }
            }
        }

        if row != *component {
            self.cache.upsert(vec![row]).await?;
            self.summaries.invalidate(&component.package_name);
        }
        Ok(all_ok)
    }

    /// Sequential batch toggle with one progress event per input item, in
    /// order, regardless of per-item outcome. Partial failure shows up as
    /// unchanged flags on the emitted rows, not as an error.
    pub fn batch_control_component(
        &self,
        components: Vec<Component>,
        new_state: bool,
    ) -> ReceiverStream<Component> {
        let (out_tx, out_rx) = mpsc::channel(16);
        let repo = self.clone();
        tokio::spawn(async move {
            repo.run_batch_control(components, new_state, out_tx).await;
        });
        ReceiverStream::new(out_rx)
    }

    async fn run_batch_control(
        &self,
        components: Vec<Component>,
        new_state: bool,
        out: mpsc::Sender<Component>,
    ) {
        info!(
            count = components.len(),
            new_state, "batch control components"
        );
        let controller = self.preferences.controller_type().await;
        let adapter = match controller {
            ControllerType::Pm => self.pm.clone(),
            ControllerType::Ifw => self.ifw.clone(),
            ControllerType::Broker => self.proxy.clone(),
        };

        // IFW cannot lift a PM-level block; clear those first so enabling
        // means reachable. Live-checked, no progress events of their own.
        if controller == ControllerType::Ifw && new_state {
            for c in components
                .iter()
                .filter(|c| c.component_type != ComponentType::Provider)
            {
                match self
                    .pm
                    .check_enabled_state(&c.package_name, &c.component_name)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => {
                        if let Err(err) = self.pm.enable(c).await {
                            warn!(
                                component = %c.component_name,
                                "pm prime failed in batch: {err}"
                            );
                        }
                    }
                    Err(err) => warn!(
                        component = %c.component_name,
                        "pm state check failed in batch: {err}"
                    ),
                }
            }
        }

        let (progress_tx, mut progress_rx) = mpsc::channel::<Component>(16);
        let batch = {
            let adapter = adapter.clone();
            tokio::spawn(async move {
                if new_state {
                    adapter.batch_enable(components, progress_tx).await
                } else {
                    adapter.batch_disable(components, progress_tx).await
                }
            })
        };

        while let Some(component) = progress_rx.recv().await {
            let refreshed = self.refresh_component_state(component).await;
            if out.send(refreshed).await.is_err() {
                // Caller dropped the stream; progress_rx drops with us and
                // the adapter loop stops at its next send.
                return;
            }
        }

        match batch.await {
            Ok(succeeded) => info!(succeeded, "batch control finished"),
            Err(err) => warn!("batch control task failed: {err}"),
        }
    }

    /// Re-reads both layers live, persists the corrected row, and returns
    /// it. On a check failure the input row is returned untouched.
    async fn refresh_component_state(&self, component: Component) -> Component {
        let pm_enabled = self
            .pm
            .check_enabled_state(&component.package_name, &component.component_name)
            .await;
        let pm_blocked = match pm_enabled {
            Ok(enabled) => !enabled,
            Err(err) => {
                warn!(
                    component = %component.component_name,
                    "pm state refresh failed: {err}"
                );
                return component;
            }
        };
        let ifw_blocked = if component.component_type == ComponentType::Provider {
            false
        } else {
            match self
                .ifw
                .check_enabled_state(&component.package_name, &component.component_name)
                .await
            {
                Ok(enabled) => !enabled,
                Err(err) => {
                    warn!(
                        component = %component.component_name,
                        "ifw state refresh failed: {err}"
                    );
                    return component;
                }
            }
        };

        let refreshed = Component {
            pm_blocked,
            ifw_blocked,
            ..component
        };
        if let Err(err) = self.cache.upsert(vec![refreshed.clone()]).await {
            warn!(
                component = %refreshed.component_name,
                "cache refresh write failed: {err}"
            );
        } else {
            self.summaries.invalidate(&refreshed.package_name);
        }
        refreshed
    }

    /// Cache-only substring match.
    pub async fn search_component(&self, keyword: &str) -> Result<Vec<Component>, EngineError> {
        self.cache.search(keyword).await
    }

    pub async fn save_components(&self, components: Vec<Component>) -> Result<(), EngineError> {
        let packages: AHashSet<String> = components
            .iter()
            .map(|c| c.package_name.clone())
            .collect();
        self.cache.upsert(components).await?;
        for package in packages {
            self.summaries.invalidate(&package);
        }
        Ok(())
    }

    pub async fn delete_components(&self, package: &str) -> Result<(), EngineError> {
        self.cache.delete_by_package(package).await?;
        self.summaries.invalidate(package);
        Ok(())
    }

    /// Memoized per-package derived counts; recomputed from cache rows on
    /// a miss and dropped by every write path's invalidation.
    pub async fn package_summary(&self, package: &str) -> Result<Arc<PackageSummary>, EngineError> {
        if let Some(summary) = self.summaries.get(package) {
            return Ok(summary);
        }
        let components = self.cache.get_by_package(package).await?;
        let summary = Arc::new(PackageSummary::tally(&components));
        self.summaries.insert(package, summary.clone());
        Ok(summary)
    }

    async fn cached_scope(
        &self,
        package: &str,
        kind: Option<ComponentType>,
    ) -> Result<Vec<Component>, EngineError> {
        match kind {
            Some(kind) => self.cache.get_by_package_and_type(package, kind).await,
            None => self.cache.get_by_package(package).await,
        }
    }

    fn adapter(&self, kind: AdapterKind) -> &dyn Controller {
        match kind {
            AdapterKind::Pm => self.pm.as_ref(),
            AdapterKind::Ifw => self.ifw.as_ref(),
            AdapterKind::Proxy => self.proxy.as_ref(),
        }
    }

    /// Live layer states for the priming decision. The cache is never
    /// trusted here. The broker path plans without observation.
    async fn observe(
        &self,
        component: &Component,
        controller: ControllerType,
    ) -> Result<ObservedState, EngineError> {
        if controller == ControllerType::Broker {
            return Ok(ObservedState::default());
        }
        let pm_blocked = !self
            .pm
            .check_enabled_state(&component.package_name, &component.component_name)
            .await?;
        let ifw_blocked = if component.component_type == ComponentType::Provider {
            false
        } else {
            !self
                .ifw
                .check_enabled_state(&component.package_name, &component.component_name)
                .await?
        };
        Ok(ObservedState {
            pm_blocked,
            ifw_blocked,
        })
    }
}
