//! Droplet inventory, sizing and pricing.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::Droplet;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample, bool_value};

pub const NAME: &str = "droplet";

const LABELS: &[&str] = &["id", "name", "region"];

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

static UP: Descriptor = Descriptor::gauge(
    "digitalocean_droplet_up",
    "If 1 the droplet is up and running, 0 otherwise",
    LABELS,
);
static CPUS: Descriptor = Descriptor::gauge(
    "digitalocean_droplet_cpus",
    "Droplet's number of CPUs",
    LABELS,
);
static MEMORY: Descriptor = Descriptor::gauge(
    "digitalocean_droplet_memory_bytes",
    "Droplet's memory in bytes",
    LABELS,
);
static DISK: Descriptor = Descriptor::gauge(
    "digitalocean_droplet_disk_bytes",
    "Droplet's disk in bytes",
    LABELS,
);
static PRICE_HOURLY: Descriptor = Descriptor::gauge(
    "digitalocean_droplet_price_hourly",
    "Price of the Droplet billed hourly in dollars",
    LABELS,
);
static PRICE_MONTHLY: Descriptor = Descriptor::gauge(
    "digitalocean_droplet_price_monthly",
    "Price of the Droplet billed monthly in dollars",
    LABELS,
);

/// Reports every droplet in the account.
pub struct DropletCollector {
    client: Client,
    guard: CallGuard,
}

impl DropletCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn droplet_samples(droplets: &[Droplet]) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(droplets.len() * 6);

    for droplet in droplets {
        let labels = vec![
            droplet.id.to_string(),
            droplet.name.clone(),
            droplet.region.slug.clone(),
        ];

        samples.push(Sample::new(&UP, bool_value(droplet.is_active()), labels.clone()));
        samples.push(Sample::new(&CPUS, droplet.vcpus as f64, labels.clone()));
        samples.push(Sample::new(&MEMORY, droplet.memory as f64 * MIB, labels.clone()));
        samples.push(Sample::new(&DISK, droplet.disk as f64 * GIB, labels.clone()));
        samples.push(Sample::new(&PRICE_HOURLY, droplet.size.price_hourly, labels.clone()));
        samples.push(Sample::new(&PRICE_MONTHLY, droplet.size.price_monthly, labels));
    }

    samples
}

#[async_trait]
impl Collector for DropletCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&UP, &CPUS, &MEMORY, &DISK, &PRICE_HOURLY, &PRICE_MONTHLY]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("list droplets", self.client.droplets())
            .await
            .map(|droplets| droplet_samples(&droplets))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use digitalocean_api::models::{Region, Size};

    fn droplet(id: i64, status: &str) -> Droplet {
        Droplet {
            id,
            name: format!("web-{}", id),
            memory: 2048,
            vcpus: 2,
            disk: 50,
            status: status.to_string(),
            region: Region {
                slug: "fra1".to_string(),
                name: "Frankfurt 1".to_string(),
            },
            size: Size {
                slug: "s-2vcpu-2gb".to_string(),
                price_monthly: 18.0,
                price_hourly: 0.02679,
            },
        }
    }

    #[test]
    fn test_one_sample_set_per_droplet() {
        let samples = droplet_samples(&[droplet(1, "active"), droplet(2, "off")]);
        assert_eq!(samples.len(), 12);
        assert_eq!(
            samples.iter().filter(|s| s.descriptor == &UP).count(),
            2
        );
    }

    #[test]
    fn test_values_and_units() {
        let samples = droplet_samples(&[droplet(7, "active")]);
        let value = |d: &Descriptor| {
            samples
                .iter()
                .find(|s| s.descriptor == d)
                .map(|s| s.value)
                .unwrap()
        };

        assert_eq!(value(&UP), 1.0);
        assert_eq!(value(&CPUS), 2.0);
        assert_eq!(value(&MEMORY), 2048.0 * 1024.0 * 1024.0);
        assert_eq!(value(&DISK), 50.0 * 1024.0 * 1024.0 * 1024.0);
        assert_eq!(value(&PRICE_MONTHLY), 18.0);
        assert_eq!(samples[0].label("id"), Some("7"));
        assert_eq!(samples[0].label("region"), Some("fra1"));
    }

    #[test]
    fn test_inactive_droplet_is_down() {
        let samples = droplet_samples(&[droplet(3, "off")]);
        assert_eq!(samples[0].descriptor, &UP);
        assert_eq!(samples[0].value, 0.0);
    }
}
