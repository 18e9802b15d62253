//! Load balancers.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::LoadBalancer;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample, bool_value};

pub const NAME: &str = "load_balancer";

const LABELS: &[&str] = &["id", "name", "ip"];

static STATUS: Descriptor = Descriptor::gauge(
    "digitalocean_loadbalancer_status",
    "If 1 the load balancer is active, 0 otherwise",
    LABELS,
);
static DROPLETS: Descriptor = Descriptor::gauge(
    "digitalocean_loadbalancer_droplets",
    "The number of droplets this load balancer is proxying to",
    LABELS,
);

pub struct LoadBalancerCollector {
    client: Client,
    guard: CallGuard,
}

impl LoadBalancerCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn load_balancer_samples(load_balancers: &[LoadBalancer]) -> Vec<Sample> {
    load_balancers
        .iter()
        .flat_map(|lb| {
            let labels = vec![lb.id.clone(), lb.name.clone(), lb.ip.clone()];
            [
                Sample::new(&STATUS, bool_value(lb.is_active()), labels.clone()),
                Sample::new(&DROPLETS, lb.droplet_ids.len() as f64, labels),
            ]
        })
        .collect()
}

#[async_trait]
impl Collector for LoadBalancerCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&STATUS, &DROPLETS]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("list load balancers", self.client.load_balancers())
            .await
            .map(|lbs| load_balancer_samples(&lbs))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_balancer_samples() {
        let lbs = vec![LoadBalancer {
            id: "4de7ac8b".to_string(),
            name: "example-lb-01".to_string(),
            ip: "104.131.186.241".to_string(),
            status: "active".to_string(),
            droplet_ids: vec![3164444, 3164445],
            ..Default::default()
        }];

        let samples = load_balancer_samples(&lbs);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].value, 1.0);
        assert_eq!(samples[0].label("ip"), Some("104.131.186.241"));
        assert_eq!(samples[1].value, 2.0);
    }

    #[test]
    fn test_new_load_balancer_is_down() {
        let lbs = vec![LoadBalancer {
            status: "new".to_string(),
            ..Default::default()
        }];
        let samples = load_balancer_samples(&lbs);
        assert_eq!(samples[0].value, 0.0);
        assert_eq!(samples[1].value, 0.0);
    }
}
