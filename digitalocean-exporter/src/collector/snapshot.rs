//! Droplet and volume snapshots.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::Snapshot;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample};

pub const NAME: &str = "snapshot";

const LABELS: &[&str] = &["id", "name", "region", "resource_id", "resource_type"];

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

static MIN_DISK_SIZE: Descriptor = Descriptor::gauge(
    "digitalocean_snapshot_min_disk_size_bytes",
    "Minimum disk size for a droplet/volume to run this snapshot on in bytes",
    LABELS,
);
static SIZE: Descriptor = Descriptor::gauge(
    "digitalocean_snapshot_size_bytes",
    "Snapshot's size in bytes",
    LABELS,
);

pub struct SnapshotCollector {
    client: Client,
    guard: CallGuard,
}

impl SnapshotCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn snapshot_samples(snapshots: &[Snapshot]) -> Vec<Sample> {
    let mut samples = Vec::new();

    for snapshot in snapshots {
        for region in &snapshot.regions {
            let labels = vec![
                snapshot.id.clone(),
                snapshot.name.clone(),
                region.clone(),
                snapshot.resource_id.clone(),
                snapshot.resource_type.clone(),
            ];
            samples.push(Sample::new(
                &MIN_DISK_SIZE,
                snapshot.min_disk_size as f64 * GIB,
                labels.clone(),
            ));
            samples.push(Sample::new(&SIZE, snapshot.size_gigabytes * GIB, labels));
        }
    }

    samples
}

#[async_trait]
impl Collector for SnapshotCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&MIN_DISK_SIZE, &SIZE]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("list snapshots", self.client.snapshots())
            .await
            .map(|snapshots| snapshot_samples(&snapshots))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_per_region() {
        let snapshots = vec![Snapshot {
            id: "6372321".to_string(),
            name: "web-01-1595954862243".to_string(),
            regions: vec!["nyc3".to_string(), "sfo3".to_string()],
            min_disk_size: 25,
            size_gigabytes: 2.5,
            resource_id: "200776916".to_string(),
            resource_type: "droplet".to_string(),
        }];

        let samples = snapshot_samples(&snapshots);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].label("region"), Some("nyc3"));
        assert_eq!(samples[2].label("region"), Some("sfo3"));
        assert_eq!(samples[0].label("resource_type"), Some("droplet"));
        assert_eq!(samples[0].value, 25.0 * GIB);
        assert_eq!(samples[1].value, 2.5 * GIB);
    }
}
