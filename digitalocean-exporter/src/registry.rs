//! Ordered set of collectors and the scrape that runs them.

use std::collections::HashSet;
use std::fmt::{self, Display};
use std::sync::Arc;

use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use thiserror::Error;
use tracing::{debug, error};

use crate::collector::Collector;
use crate::error_counter::{ERRORS_METRIC, ErrorCounter};
use crate::metric::{Sample, write_header, write_sample};

/// Registration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("collector '{collector}' redefines metric '{metric}'")]
    DuplicateMetric {
        collector: &'static str,
        metric: &'static str,
    },

    #[error("collector '{0}' is already registered")]
    DuplicateCollector(&'static str),

    #[error("failed to construct collector '{collector}': {message}")]
    Construction {
        collector: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Collects collectors in registration order, rejecting collisions.
pub struct RegistryBuilder {
    collectors: Vec<Arc<dyn Collector>>,
    metric_names: HashSet<&'static str>,
    errors: ErrorCounter,
}

impl RegistryBuilder {
    fn new(errors: ErrorCounter) -> Self {
        let mut metric_names = HashSet::new();
        metric_names.insert(ERRORS_METRIC);

        Self {
            collectors: Vec::new(),
            metric_names,
            errors,
        }
    }

    /// Append a collector.
    ///
    /// Its error series is created at zero so it is visible before the
    /// first failure.
    pub fn register<C: Collector + 'static>(mut self, collector: C) -> Result<Self> {
        let name = collector.name();

        if self.collectors.iter().any(|c| c.name() == name) {
            return Err(RegistryError::DuplicateCollector(name));
        }

        let descriptors = collector.describe();
        let mut added = HashSet::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if self.metric_names.contains(descriptor.name) || !added.insert(descriptor.name) {
                return Err(RegistryError::DuplicateMetric {
                    collector: name,
                    metric: descriptor.name,
                });
            }
        }
        self.metric_names.extend(added);

        self.errors.init(name);
        self.collectors.push(Arc::new(collector));
        debug!(collector = name, "Registered collector");
        Ok(self)
    }

    /// Append a collector only when `enabled`.
    ///
    /// The factory is not called otherwise; a factory error is a
    /// registration error.
    pub fn register_if<C, E, F>(self, enabled: bool, name: &'static str, factory: F) -> Result<Self>
    where
        C: Collector + 'static,
        E: Display,
        F: FnOnce() -> std::result::Result<C, E>,
    {
        if !enabled {
            debug!(collector = name, "Collector disabled, not registering");
            return Ok(self);
        }

        let collector = factory().map_err(|e| RegistryError::Construction {
            collector: name,
            message: e.to_string(),
        })?;
        self.register(collector)
    }

    pub fn build(self) -> CollectorRegistry {
        let mut metrics = Registry::default();
        self.errors.register(&mut metrics);

        CollectorRegistry {
            collectors: self.collectors,
            errors: self.errors,
            metrics,
        }
    }
}

/// The set of collectors served on the metrics endpoint.
pub struct CollectorRegistry {
    collectors: Vec<Arc<dyn Collector>>,
    errors: ErrorCounter,
    metrics: Registry,
}

impl fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("collectors", &self.collector_names())
            .finish_non_exhaustive()
    }
}

impl CollectorRegistry {
    pub fn builder(errors: ErrorCounter) -> RegistryBuilder {
        RegistryBuilder::new(errors)
    }

    /// Registered collector names, in registration order.
    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collectors.iter().any(|c| c.name() == name)
    }

    /// Run every collector concurrently.
    ///
    /// Results come back in registration order. A collector that panics
    /// contributes nothing and is counted as a failure.
    pub async fn gather(&self) -> Vec<Vec<Sample>> {
        let handles: Vec<_> = self
            .collectors
            .iter()
            .map(|collector| {
                let collector = Arc::clone(collector);
                tokio::spawn(async move { collector.collect().await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (collector, handle) in self.collectors.iter().zip(handles) {
            match handle.await {
                Ok(samples) => results.push(samples),
                Err(e) => {
                    error!(collector = collector.name(), error = %e, "Collector task failed");
                    self.errors.inc(collector.name());
                    results.push(Vec::new());
                }
            }
        }

        results
    }

    /// Scrape every collector and render the exposition text.
    pub async fn render(&self) -> String {
        let gathered = self.gather().await;
        let mut out = String::new();

        if let Err(e) = self.write_samples(&mut out, &gathered) {
            error!(error = %e, "Failed to write samples");
        }

        // Errors are read after the scrape so this scrape's failures show.
        if let Err(e) = encode(&mut out, &self.metrics) {
            error!(error = %e, "Failed to encode error counter");
        }

        out
    }

    fn write_samples(&self, out: &mut String, gathered: &[Vec<Sample>]) -> fmt::Result {
        for (collector, samples) in self.collectors.iter().zip(gathered) {
            for descriptor in collector.describe() {
                let mut family = samples
                    .iter()
                    .filter(|s| s.descriptor.name == descriptor.name)
                    .peekable();

                if family.peek().is_none() {
                    continue;
                }

                write_header(out, descriptor)?;
                for sample in family {
                    write_sample(out, sample)?;
                }
            }
        }
        Ok(())
    }
}

pub type SharedRegistry = Arc<CollectorRegistry>;
