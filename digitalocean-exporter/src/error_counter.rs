//! Process-lifetime failure counter shared by all collectors.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, RwLock};
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

/// Family name; exposed as `digitalocean_errors_total`.
pub const ERRORS_METRIC: &str = "digitalocean_errors";

const ERRORS_HELP: &str = "The total number of errors per collector";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct CollectorLabels {
    collector: String,
}

impl CollectorLabels {
    fn new(collector: &str) -> Self {
        Self {
            collector: collector.to_string(),
        }
    }
}

/// Monotonic error count keyed by collector name.
///
/// Clones share the same underlying atomics.
#[derive(Clone, Debug, Default)]
pub struct ErrorCounter {
    family: Family<CollectorLabels, Counter>,
    // Series created so far; reads of other names must not create one.
    known: Arc<RwLock<HashSet<String>>>,
}

impl ErrorCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose the counter through `registry`.
    pub fn register(&self, registry: &mut Registry) {
        registry.register(ERRORS_METRIC, ERRORS_HELP, self.family.clone());
    }

    /// Create the series for `collector` at zero.
    pub fn init(&self, collector: &str) {
        drop(self.series(collector));
    }

    /// Count one failure; returns the new total.
    pub fn inc(&self, collector: &str) -> u64 {
        self.series(collector).inc() + 1
    }

    /// Current total for `collector`; zero if it has no series yet.
    pub fn get(&self, collector: &str) -> u64 {
        if !self.known.read().contains(collector) {
            return 0;
        }
        self.series(collector).get()
    }

    fn series(&self, collector: &str) -> MappedRwLockReadGuard<'_, Counter> {
        if !self.known.read().contains(collector) {
            self.known.write().insert(collector.to_string());
        }
        self.family.get_or_create(&CollectorLabels::new(collector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus_client::encoding::text::encode;

    #[test]
    fn test_inc_and_get() {
        let errors = ErrorCounter::new();
        assert_eq!(errors.get("droplet"), 0);
        assert_eq!(errors.inc("droplet"), 1);
        assert_eq!(errors.inc("droplet"), 2);
        assert_eq!(errors.get("droplet"), 2);
        assert_eq!(errors.get("volume"), 0);
    }

    #[test]
    fn test_get_does_not_create_series() {
        let errors = ErrorCounter::new();
        let mut registry = Registry::default();
        errors.register(&mut registry);

        assert_eq!(errors.get("volume"), 0);

        let mut out = String::new();
        encode(&mut out, &registry).unwrap();
        assert!(!out.contains("collector=\"volume\""));
    }

    #[test]
    fn test_clones_share_state() {
        let errors = ErrorCounter::new();
        let clone = errors.clone();
        clone.inc("database");
        assert_eq!(errors.get("database"), 1);
    }

    #[test]
    fn test_encoding() {
        let errors = ErrorCounter::new();
        let mut registry = Registry::default();
        errors.register(&mut registry);
        errors.init("account");
        errors.inc("database");

        let mut out = String::new();
        encode(&mut out, &registry).unwrap();

        assert!(out.contains("# TYPE digitalocean_errors counter"));
        assert!(out.contains("digitalocean_errors_total{collector=\"account\"} 0"));
        assert!(out.contains("digitalocean_errors_total{collector=\"database\"} 1"));
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let errors = ErrorCounter::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let errors = errors.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        errors.inc("kubernetes");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(errors.get("kubernetes"), 8000);
    }
}
