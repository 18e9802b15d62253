//! Private images and backups.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::Image;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample};

pub const NAME: &str = "image";

const LABELS: &[&str] = &["id", "name", "region", "type", "distribution"];

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

static MIN_DISK_SIZE: Descriptor = Descriptor::gauge(
    "digitalocean_image_min_disk_size_bytes",
    "Minimum disk size for a droplet to run this image on in bytes",
    LABELS,
);
static SIZE: Descriptor = Descriptor::gauge(
    "digitalocean_image_size_bytes",
    "Size of the image in bytes",
    LABELS,
);

pub struct ImageCollector {
    client: Client,
    guard: CallGuard,
}

impl ImageCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

/// One sample set per region the image is available in, or a single set
/// with an empty region for images that are in none.
fn image_samples(images: &[Image]) -> Vec<Sample> {
    let mut samples = Vec::new();

    for image in images {
        let regions: Vec<&str> = if image.regions.is_empty() {
            vec![""]
        } else {
            image.regions.iter().map(String::as_str).collect()
        };

        for region in regions {
            let labels = vec![
                image.id.to_string(),
                image.name.clone(),
                region.to_string(),
                image.image_type.clone(),
                image.distribution.clone(),
            ];
            samples.push(Sample::new(
                &MIN_DISK_SIZE,
                image.min_disk_size as f64 * GIB,
                labels.clone(),
            ));
            samples.push(Sample::new(&SIZE, image.size_gigabytes * GIB, labels));
        }
    }

    samples
}

#[async_trait]
impl Collector for ImageCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&MIN_DISK_SIZE, &SIZE]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("list images", self.client.images())
            .await
            .map(|images| image_samples(&images))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(regions: &[&str]) -> Image {
        Image {
            id: 7555620,
            name: "nginx snapshot".to_string(),
            image_type: "snapshot".to_string(),
            distribution: "Ubuntu".to_string(),
            regions: regions.iter().map(|r| r.to_string()).collect(),
            min_disk_size: 20,
            size_gigabytes: 2.34,
        }
    }

    #[test]
    fn test_sample_set_per_region() {
        let samples = image_samples(&[image(&["nyc2", "nyc3"])]);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].label("region"), Some("nyc2"));
        assert_eq!(samples[2].label("region"), Some("nyc3"));
        assert_eq!(samples[0].value, 20.0 * GIB);
        assert_eq!(samples[1].value, 2.34 * GIB);
        assert_eq!(samples[1].label("type"), Some("snapshot"));
    }

    #[test]
    fn test_image_without_region() {
        let samples = image_samples(&[image(&[])]);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label("region"), Some(""));
    }
}
