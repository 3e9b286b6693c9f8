//! Ephemeral get-or-compute memo of derived per-package summaries.
//!
//! Injectable and lifetime-bounded (TTL + capacity); every repository
//! write path invalidates the affected package explicitly.

use crate::model::Component;
use moka::sync::Cache;
use std::{sync::Arc, time::Duration};

/// Derived per-package counts over cached component rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageSummary {
    pub total: usize,
    pub blocked: usize,
    pub pm_blocked: usize,
    pub ifw_blocked: usize,
}

impl PackageSummary {
    pub fn tally(components: &[Component]) -> Self {
        let mut summary = PackageSummary {
            total: components.len(),
            ..Default::default()
        };
        for c in components {
            if c.pm_blocked {
                summary.pm_blocked += 1;
            }
            if c.ifw_blocked {
                summary.ifw_blocked += 1;
            }
            if c.pm_blocked || c.ifw_blocked {
                summary.blocked += 1;
            }
        }
        summary
    }
}

#[derive(Clone)]
pub struct SummaryCache {
    cache: Cache<String, Arc<PackageSummary>>,
}

impl SummaryCache {
    pub fn new(ttl_secs: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_secs.max(1)))
            .max_capacity(max_capacity.max(1))
            .build();
        Self { cache }
    }

    pub fn get(&self, package: &str) -> Option<Arc<PackageSummary>> {
        self.cache.get(package)
    }

    pub fn insert(&self, package: &str, summary: Arc<PackageSummary>) {
        self.cache.insert(package.to_string(), summary);
    }

    pub fn invalidate(&self, package: &str) {
        self.cache.invalidate(package);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
