//! Unresolved platform incidents from the public status page.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::StatusPageClient;
use digitalocean_api::models::Incident;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample};

pub const NAME: &str = "incident";

/// Impact levels reported by the status page, always all emitted.
pub const IMPACTS: [&str; 4] = ["none", "minor", "major", "critical"];

static INCIDENTS: Descriptor = Descriptor::gauge(
    "digitalocean_incidents",
    "The number of unresolved DigitalOcean platform incidents by impact",
    &["impact"],
);

pub struct IncidentCollector {
    client: StatusPageClient,
    guard: CallGuard,
}

impl IncidentCollector {
    pub fn new(client: StatusPageClient, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn incident_samples(incidents: &[Incident]) -> Vec<Sample> {
    IMPACTS
        .iter()
        .map(|impact| {
            let count = incidents.iter().filter(|i| i.impact == *impact).count();
            Sample::new(&INCIDENTS, count as f64, vec![impact.to_string()])
        })
        .collect()
}

#[async_trait]
impl Collector for IncidentCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&INCIDENTS]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("list unresolved incidents", self.client.unresolved_incidents())
            .await
            .map(|incidents| incident_samples(&incidents))
            .unwrap_or_default()
    }
}
