//! Repository metrics and observability.
//!
//! Every [`TranslationRepository`] owns one [`RepositoryMetrics`] tracking how
//! lookups resolve, how many parts were merged and how often fetchers failed.
//!
//! [`TranslationRepository`]: crate::repository::TranslationRepository

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one repository.
#[derive(Debug, Default)]
pub struct RepositoryMetrics {
    /// Lookups answered from a language table
    resolved_lookups: AtomicUsize,

    /// Lookups that fell back to the key
    fallback_lookups: AtomicUsize,

    /// Parts merged into any language table
    parts_registered: AtomicUsize,

    /// Change notifications emitted
    notifications: AtomicUsize,

    /// Fetcher errors reported by the lazyload coordinator
    fetch_failures: AtomicUsize,
}

impl RepositoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_resolved(&self) {
        self.resolved_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallback_lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` merged parts.
    pub fn record_parts(&self, count: usize) {
        self.parts_registered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_notification(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn resolved_lookups(&self) -> usize {
        self.resolved_lookups.load(Ordering::Relaxed)
    }

    pub fn fallback_lookups(&self) -> usize {
        self.fallback_lookups.load(Ordering::Relaxed)
    }

    pub fn parts_registered(&self) -> usize {
        self.parts_registered.load(Ordering::Relaxed)
    }

    pub fn notifications(&self) -> usize {
        self.notifications.load(Ordering::Relaxed)
    }

    pub fn fetch_failures(&self) -> usize {
        self.fetch_failures.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let resolved = self.resolved_lookups();
        let fallbacks = self.fallback_lookups();
        let total_lookups = resolved + fallbacks;
        let hit_rate = if total_lookups > 0 {
            (resolved as f64 / total_lookups as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            resolved_lookups: resolved,
            fallback_lookups: fallbacks,
            hit_rate,
            parts_registered: self.parts_registered(),
            notifications: self.notifications(),
            fetch_failures: self.fetch_failures(),
        }
    }
}

/// Snapshot of a repository's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub resolved_lookups: usize,
    pub fallback_lookups: usize,

    /// Resolved share of all lookups as a percentage (0-100)
    pub hit_rate: f64,

    pub parts_registered: usize,
    pub notifications: usize,
    pub fetch_failures: usize,
}
