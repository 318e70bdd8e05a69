//! Resolution counters for health reporting

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters updated on the resolve path.
#[derive(Debug, Default)]
pub(crate) struct InnerStats {
    total_resolutions: AtomicU64,
    singleton_cache_hits: AtomicU64,
    singleton_cache_misses: AtomicU64,
    transient_creations: AtomicU64,
    instance_hits: AtomicU64,
    factory_hits: AtomicU64,
    failed_resolutions: AtomicU64,
}

impl InnerStats {
    pub(crate) fn record_resolution(&self) {
        self.total_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.singleton_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_miss(&self) {
        self.singleton_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transient(&self) {
        self.transient_creations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_instance_hit(&self) {
        self.instance_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_factory_hit(&self) {
        self.factory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.total_resolutions,
            &self.singleton_cache_hits,
            &self.singleton_cache_misses,
            &self.transient_creations,
            &self.instance_hits,
            &self.factory_hits,
            &self.failed_resolutions,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self, registered_services: usize, active_singletons: usize) -> ContainerStats {
        ContainerStats {
            total_resolutions: self.total_resolutions.load(Ordering::Relaxed),
            singleton_cache_hits: self.singleton_cache_hits.load(Ordering::Relaxed),
            singleton_cache_misses: self.singleton_cache_misses.load(Ordering::Relaxed),
            transient_creations: self.transient_creations.load(Ordering::Relaxed),
            instance_hits: self.instance_hits.load(Ordering::Relaxed),
            factory_hits: self.factory_hits.load(Ordering::Relaxed),
            failed_resolutions: self.failed_resolutions.load(Ordering::Relaxed),
            registered_services,
            active_singletons,
        }
    }
}

/// Point-in-time view of the registry counters.
///
/// Every `resolve` call counts once in `total_resolutions`, including the
/// nested resolves of a service's dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerStats {
    pub total_resolutions: u64,
    pub singleton_cache_hits: u64,
    pub singleton_cache_misses: u64,
    pub transient_creations: u64,
    pub instance_hits: u64,
    pub factory_hits: u64,
    pub failed_resolutions: u64,
    /// Distinct keys across all tables.
    pub registered_services: usize,
    /// Singletons currently held in the instance cache.
    pub active_singletons: usize,
}

impl ContainerStats {
    /// Singleton cache hit rate as a percentage.
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.singleton_cache_hits + self.singleton_cache_misses;
        if total == 0 {
            0.0
        } else {
            (self.singleton_cache_hits as f64 / total as f64) * 100.0
        }
    }

    pub fn performance_summary(&self) -> String {
        format!(
            "Container Performance: {} total resolutions, {:.1}% cache hit rate, {} registered services, {} active singletons",
            self.total_resolutions,
            self.cache_hit_rate(),
            self.registered_services,
            self.active_singletons
        )
    }
}
