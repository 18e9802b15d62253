//! DNS domains and their records.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::{Domain, DomainRecord};

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample};

pub const NAME: &str = "domain";

const RECORD_LABELS: &[&str] = &["id", "domain", "name", "type", "data"];

static DOMAIN_TTL: Descriptor = Descriptor::gauge(
    "digitalocean_domain_ttl_seconds",
    "Seconds that clients can cache queried information before a refresh should be requested",
    &["name"],
);
static RECORD_PORT: Descriptor = Descriptor::gauge(
    "digitalocean_domain_record_port",
    "The port for SRV records",
    RECORD_LABELS,
);
static RECORD_PRIORITY: Descriptor = Descriptor::gauge(
    "digitalocean_domain_record_priority",
    "The priority for SRV and MX records",
    RECORD_LABELS,
);
static RECORD_WEIGHT: Descriptor = Descriptor::gauge(
    "digitalocean_domain_record_weight",
    "The weight for SRV records",
    RECORD_LABELS,
);
static RECORD_TTL: Descriptor = Descriptor::gauge(
    "digitalocean_domain_record_ttl_seconds",
    "This value is the time to live for the record, in seconds",
    RECORD_LABELS,
);

/// Reports each domain, then each domain's records.
///
/// Record listings are fetched per domain; one domain failing does not hide
/// the records of the others.
pub struct DomainCollector {
    client: Client,
    guard: CallGuard,
}

impl DomainCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn domain_samples(domains: &[Domain]) -> Vec<Sample> {
    domains
        .iter()
        .map(|d| Sample::new(&DOMAIN_TTL, d.ttl as f64, vec![d.name.clone()]))
        .collect()
}

fn record_samples(domain: &str, records: &[DomainRecord]) -> Vec<Sample> {
    let mut samples = Vec::new();

    for record in records {
        let labels = vec![
            record.id.to_string(),
            domain.to_string(),
            record.name.clone(),
            record.record_type.clone(),
            record.data.clone(),
        ];

        let optional = [
            (&RECORD_PORT, record.port),
            (&RECORD_PRIORITY, record.priority),
            (&RECORD_WEIGHT, record.weight),
        ];
        for (descriptor, value) in optional {
            if let Some(value) = value {
                samples.push(Sample::new(descriptor, value as f64, labels.clone()));
            }
        }

        samples.push(Sample::new(&RECORD_TTL, record.ttl as f64, labels));
    }

    samples
}

#[async_trait]
impl Collector for DomainCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![
            &DOMAIN_TTL,
            &RECORD_PORT,
            &RECORD_PRIORITY,
            &RECORD_WEIGHT,
            &RECORD_TTL,
        ]
    }

    async fn collect(&self) -> Vec<Sample> {
        let Some(domains) = self.guard.call("list domains", self.client.domains()).await else {
            return Vec::new();
        };

        let mut samples = domain_samples(&domains);

        for domain in &domains {
            let operation = format!("list records of {}", domain.name);
            if let Some(records) = self
                .guard
                .call(&operation, self.client.domain_records(&domain.name))
                .await
            {
                samples.extend(record_samples(&domain.name, &records));
            }
        }

        samples
    }
}
