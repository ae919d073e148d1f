//! Backend registry and selection by criteria: the selector holds opaque
//! `Arc<dyn Backend>` references with attached criteria and picks among
//! them at dispatch time, with no downcasting or runtime type reflection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::backend::Backend;
use crate::url_info::URLInfo;

/// Selection criteria attached to a registered backend.
pub struct Criteria {
    pub priority: i32,
    pub content_types: Vec<String>,
    pub url_patterns: Vec<regex::Regex>,
    pub schemes: Vec<String>,
    pub max_load: usize,
    pub min_success_rate: f64,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            priority: 0,
            content_types: Vec::new(),
            url_patterns: Vec::new(),
            schemes: vec!["http".to_string(), "https".to_string()],
            max_load: usize::MAX,
            min_success_rate: 0.0,
        }
    }
}

impl Criteria {
    fn matches(&self, url: &URLInfo, current_load: usize, success_rate: f64) -> bool {
        if !self.schemes.iter().any(|s| s == url.scheme()) {
            return false;
        }
        if !self.url_patterns.is_empty() && !self.url_patterns.iter().any(|p| p.is_match(url.normalized())) {
            return false;
        }
        if current_load >= self.max_load {
            return false;
        }
        if success_rate < self.min_success_rate {
            return false;
        }
        true
    }
}

#[derive(Default)]
struct Metrics {
    successes: AtomicU64,
    failures: AtomicU64,
    in_flight: AtomicU64,
}

impl Metrics {
    fn success_rate(&self) -> f64 {
        let s = self.successes.load(Ordering::Relaxed);
        let f = self.failures.load(Ordering::Relaxed);
        let total = s + f;
        if total == 0 {
            1.0
        } else {
            s as f64 / total as f64
        }
    }
}

struct Registration {
    backend: Arc<dyn Backend>,
    criteria: Criteria,
    metrics: Metrics,
}

/// A registry from backend name to `(Backend, Criteria, live metrics)`,
/// read-mostly after initialization.
#[derive(Default)]
pub struct BackendSelector {
    entries: Vec<(String, Registration)>,
}

impl BackendSelector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, backend: Arc<dyn Backend>, criteria: Criteria) {
        self.entries.push((
            name.into(),
            Registration {
                backend,
                criteria,
                metrics: Metrics::default(),
            },
        ));
    }

    /// Among registered backends whose criteria match, return the
    /// highest-priority one; ties broken by insertion order (the first
    /// registered backend at a given priority wins — `Iterator::max_by_key`
    /// would instead keep the last, so the winner is tracked by hand here).
    #[must_use]
    pub fn select(&self, url: &URLInfo) -> Option<Arc<dyn Backend>> {
        let mut best: Option<&Registration> = None;
        for (_, reg) in &self.entries {
            let load = reg.metrics.in_flight.load(Ordering::Relaxed) as usize;
            if !reg.criteria.matches(url, load, reg.metrics.success_rate()) {
                continue;
            }
            if best.is_none_or(|b| reg.criteria.priority > b.criteria.priority) {
                best = Some(reg);
            }
        }
        best.map(|reg| Arc::clone(&reg.backend))
    }

    fn find(&self, backend: &dyn Backend) -> Option<&Registration> {
        self.entries
            .iter()
            .find(|(_, reg)| reg.backend.name() == backend.name())
            .map(|(_, reg)| reg)
    }

    pub fn record_start(&self, backend: &dyn Backend) {
        if let Some(reg) = self.find(backend) {
            reg.metrics.in_flight.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_completion(&self, backend: &dyn Backend, success: bool) {
        if let Some(reg) = self.find(backend) {
            reg.metrics.in_flight.fetch_sub(1, Ordering::Relaxed);
            if success {
                reg.metrics.successes.fetch_add(1, Ordering::Relaxed);
            } else {
                reg.metrics.failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DirectBackend;

    #[test]
    fn selects_highest_priority_matching_backend() {
        let mut selector = BackendSelector::new();
        let low = Arc::new(DirectBackend::new());
        let high = Arc::new(DirectBackend::new());
        selector.register(
            "low",
            low as Arc<dyn Backend>,
            Criteria {
                priority: 1,
                ..Default::default()
            },
        );
        selector.register(
            "high",
            high as Arc<dyn Backend>,
            Criteria {
                priority: 5,
                ..Default::default()
            },
        );

        let url = URLInfo::parse_standalone("https://example.com/");
        let selected = selector.select(&url);
        assert!(selected.is_some());
    }

    #[test]
    fn ties_are_broken_by_insertion_order() {
        let mut selector = BackendSelector::new();
        let first = Arc::new(DirectBackend::new());
        let second = Arc::new(DirectBackend::new());
        selector.register("first", first.clone() as Arc<dyn Backend>, Criteria::default());
        selector.register("second", second as Arc<dyn Backend>, Criteria::default());

        let url = URLInfo::parse_standalone("https://example.com/");
        let selected = selector.select(&url).expect("a backend should match");
        assert!(Arc::ptr_eq(&selected, &(first as Arc<dyn Backend>)));
    }

    #[test]
    fn returns_none_when_scheme_does_not_match() {
        let mut selector = BackendSelector::new();
        let backend = Arc::new(DirectBackend::new());
        selector.register(
            "http-only",
            backend as Arc<dyn Backend>,
            Criteria::default(),
        );
        let url = URLInfo::parse_standalone("file:///tmp/x.html");
        assert!(selector.select(&url).is_none());
    }
}
