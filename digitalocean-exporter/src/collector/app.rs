//! App Platform applications.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::App;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample, bool_value};

pub const NAME: &str = "app";

const LABELS: &[&str] = &["id", "name", "region"];

static ACTIVE: Descriptor = Descriptor::gauge(
    "digitalocean_app_active",
    "If 1 the app's active deployment is serving, 0 otherwise",
    LABELS,
);
static CREATED: Descriptor = Descriptor::gauge(
    "digitalocean_app_created_timestamp_seconds",
    "When the app was created, as unix seconds",
    LABELS,
);

pub struct AppCollector {
    client: Client,
    guard: CallGuard,
}

impl AppCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn app_samples(apps: &[App]) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(apps.len() * 2);

    for app in apps {
        let labels = vec![app.id.clone(), app.spec.name.clone(), app.region.slug.clone()];

        samples.push(Sample::new(&ACTIVE, bool_value(app.is_active()), labels.clone()));
        // Apps still being created have no timestamp yet.
        if let Some(created_at) = app.created_at {
            samples.push(Sample::new(&CREATED, created_at.timestamp() as f64, labels));
        }
    }

    samples
}

#[async_trait]
impl Collector for AppCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&ACTIVE, &CREATED]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("list apps", self.client.apps())
            .await
            .map(|apps| app_samples(&apps))
            .unwrap_or_default()
    }
}
