//! Spaces buckets, per region.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::SpacesClient;
use digitalocean_api::models::Bucket;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample};

pub const NAME: &str = "spaces";

static BUCKETS: Descriptor = Descriptor::gauge(
    "digitalocean_spaces_buckets",
    "The number of Spaces buckets in a region",
    &["region"],
);
static BUCKET_CREATED: Descriptor = Descriptor::gauge(
    "digitalocean_spaces_bucket_created_timestamp_seconds",
    "When the bucket was created, as unix seconds",
    &["name", "region"],
);

/// Lists buckets in each configured region.
///
/// Every region is its own listing: a failing region is counted and skipped
/// while the rest are still reported.
pub struct SpacesCollector {
    client: SpacesClient,
    regions: Vec<String>,
    guard: CallGuard,
}

impl SpacesCollector {
    pub fn new(
        client: SpacesClient,
        regions: Vec<String>,
        errors: ErrorCounter,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            regions,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn bucket_samples(region: &str, buckets: &[Bucket]) -> Vec<Sample> {
    let mut samples = vec![Sample::new(
        &BUCKETS,
        buckets.len() as f64,
        vec![region.to_string()],
    )];

    for bucket in buckets {
        if let Some(created) = bucket.creation_date {
            samples.push(Sample::new(
                &BUCKET_CREATED,
                created.timestamp() as f64,
                vec![bucket.name.clone(), region.to_string()],
            ));
        }
    }

    samples
}

#[async_trait]
impl Collector for SpacesCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&BUCKETS, &BUCKET_CREATED]
    }

    async fn collect(&self) -> Vec<Sample> {
        let mut samples = Vec::new();

        for region in &self.regions {
            let operation = format!("list buckets in {}", region);
            if let Some(buckets) = self
                .guard
                .call(&operation, self.client.list_buckets(region))
                .await
            {
                samples.extend(bucket_samples(region, &buckets));
            }
        }

        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_bucket_samples() {
        let buckets = vec![
            Bucket {
                name: "static-assets".to_string(),
                creation_date: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single(),
            },
            Bucket {
                name: "backups".to_string(),
                creation_date: None,
            },
        ];

        let samples = bucket_samples("fra1", &buckets);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label("region"), Some("fra1"));
        assert_eq!(samples[0].value, 2.0);
        assert_eq!(samples[1].label("name"), Some("static-assets"));
        assert_eq!(samples[1].value, 1704164645.0);
    }

    #[test]
    fn test_empty_region_reports_zero() {
        let samples = bucket_samples("syd1", &[]);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 0.0);
    }
}
