//! Floating (reserved) IPv4 addresses.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::FloatingIp;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample, bool_value};

pub const NAME: &str = "floating_ip";

static ACTIVE: Descriptor = Descriptor::gauge(
    "digitalocean_floating_ipv4_active",
    "If 1 the floating ip used by a droplet, 0 otherwise",
    &["ipv4", "region", "droplet_id", "droplet_name"],
);

pub struct FloatingIpCollector {
    client: Client,
    guard: CallGuard,
}

impl FloatingIpCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn floating_ip_samples(ips: &[FloatingIp]) -> Vec<Sample> {
    ips.iter()
        .map(|ip| {
            let (droplet_id, droplet_name) = match &ip.droplet {
                Some(droplet) => (droplet.id.to_string(), droplet.name.clone()),
                None => (String::new(), String::new()),
            };

            Sample::new(
                &ACTIVE,
                bool_value(ip.droplet.is_some()),
                vec![ip.ip.clone(), ip.region.slug.clone(), droplet_id, droplet_name],
            )
        })
        .collect()
}

#[async_trait]
impl Collector for FloatingIpCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&ACTIVE]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("list floating ips", self.client.floating_ips())
            .await
            .map(|ips| floating_ip_samples(&ips))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assigned_and_unassigned() {
        let ips: Vec<FloatingIp> = serde_json::from_str(
            r#"[
                {"ip": "45.55.96.47", "droplet": {"id": 3164444, "name": "web"},
                 "region": {"slug": "nyc3"}},
                {"ip": "45.55.96.48", "droplet": null, "region": {"slug": "sfo3"}}
            ]"#,
        )
        .unwrap();

        let samples = floating_ip_samples(&ips);
        assert_eq!(samples.len(), 2);

        assert_eq!(samples[0].value, 1.0);
        assert_eq!(samples[0].label("droplet_id"), Some("3164444"));
        assert_eq!(samples[0].label("droplet_name"), Some("web"));

        assert_eq!(samples[1].value, 0.0);
        assert_eq!(samples[1].label("ipv4"), Some("45.55.96.48"));
        assert_eq!(samples[1].label("droplet_id"), Some(""));
    }
}
