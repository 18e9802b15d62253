//! The collector contract and one collector per resource type.
//!
//! Every collector follows the same discipline on each scrape:
//!
//! - [`Collector::describe`] lists the fixed descriptors it can emit, without
//!   touching the network.
//! - [`Collector::collect`] reads from its data source, bounding every call
//!   with a timeout. A failed call is logged with a truncated message and
//!   counted in the shared [`ErrorCounter`]; the record type it was fetching
//!   contributes no samples to that scrape, and the scrape carries on.

pub mod account;
pub mod app;
pub mod balance;
pub mod database;
pub mod domain;
pub mod droplet;
pub mod exporter;
pub mod floating_ip;
pub mod image;
pub mod incident;
pub mod key;
pub mod kubernetes;
pub mod load_balancer;
pub mod process;
pub mod snapshot;
pub mod spaces;
pub mod volume;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::ApiError;
use thiserror::Error;
use tracing::warn;

use crate::error_counter::ErrorCounter;
use crate::error_summary::summarize;
use crate::metric::{Descriptor, Sample};

pub use account::AccountCollector;
pub use app::AppCollector;
pub use balance::BalanceCollector;
pub use database::DatabaseCollector;
pub use domain::DomainCollector;
pub use droplet::DropletCollector;
pub use exporter::{BuildInfo, ExporterCollector};
pub use floating_ip::FloatingIpCollector;
pub use image::ImageCollector;
pub use incident::IncidentCollector;
pub use key::KeyCollector;
pub use kubernetes::KubernetesCollector;
pub use load_balancer::LoadBalancerCollector;
pub use process::ProcessCollector;
pub use snapshot::SnapshotCollector;
pub use spaces::SpacesCollector;
pub use volume::VolumeCollector;

/// Why one collection call produced nothing.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The data source answered with an error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The call did not finish within the collector's timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A local (non-API) source failed.
    #[error("{0}")]
    Local(String),
}

/// A source of samples for one resource type.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Label value under which this collector's failures are counted.
    fn name(&self) -> &'static str;

    /// Every descriptor [`collect`](Self::collect) may produce samples for.
    fn describe(&self) -> Vec<&'static Descriptor>;

    /// Produce this scrape's samples. Never fails; failures are counted.
    async fn collect(&self) -> Vec<Sample>;
}

/// Timeout and failure accounting for one collector's calls.
#[derive(Debug, Clone)]
pub struct CallGuard {
    collector: &'static str,
    errors: ErrorCounter,
    timeout: Duration,
}

impl CallGuard {
    pub fn new(collector: &'static str, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            collector,
            errors,
            timeout,
        }
    }

    /// Await `call` within the timeout.
    ///
    /// Returns `None` after recording the failure if the call errors or
    /// runs out of time. The future is dropped on timeout.
    pub async fn call<T, E, F>(&self, operation: &str, call: F) -> Option<T>
    where
        E: Into<CollectError>,
        F: Future<Output = Result<T, E>> + Send,
    {
        let error = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(e)) => e.into(),
            Err(_) => CollectError::Timeout(self.timeout),
        };

        self.record_failure(operation, &error);
        None
    }

    /// Log and count a failure.
    fn record_failure(&self, operation: &str, error: &CollectError) {
        warn!(
            collector = self.collector,
            operation,
            error = %summarize(Some(error)),
            "Collection failed"
        );
        self.errors.inc(self.collector);
    }
}
