//! Block storage volumes.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::Volume;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample, bool_value};

pub const NAME: &str = "volume";

const LABELS: &[&str] = &["id", "name", "region", "filesystem_type"];

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

static SIZE: Descriptor = Descriptor::gauge(
    "digitalocean_volume_size_bytes",
    "Volume's size in bytes",
    LABELS,
);
static ATTACHED: Descriptor = Descriptor::gauge(
    "digitalocean_volume_attached",
    "If 1 the volume is attached to a droplet, 0 otherwise",
    LABELS,
);

pub struct VolumeCollector {
    client: Client,
    guard: CallGuard,
}

impl VolumeCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn volume_samples(volumes: &[Volume]) -> Vec<Sample> {
    volumes
        .iter()
        .flat_map(|volume| {
            let labels = vec![
                volume.id.clone(),
                volume.name.clone(),
                volume.region.slug.clone(),
                volume.filesystem_type.clone(),
            ];
            [
                Sample::new(&SIZE, volume.size_gigabytes as f64 * GIB, labels.clone()),
                Sample::new(
                    &ATTACHED,
                    bool_value(!volume.droplet_ids.is_empty()),
                    labels,
                ),
            ]
        })
        .collect()
}

#[async_trait]
impl Collector for VolumeCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&SIZE, &ATTACHED]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("list volumes", self.client.volumes())
            .await
            .map(|volumes| volume_samples(&volumes))
            .unwrap_or_default()
    }
}
