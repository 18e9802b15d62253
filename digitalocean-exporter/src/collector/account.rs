//! Account status and resource limits.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::Account;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample, bool_value};

pub const NAME: &str = "account";

static ACTIVE: Descriptor = Descriptor::gauge(
    "digitalocean_account_active",
    "The status of your account",
    &[],
);
static DROPLET_LIMIT: Descriptor = Descriptor::gauge(
    "digitalocean_account_droplet_limit",
    "The maximum number of droplet you can use",
    &[],
);
static FLOATING_IP_LIMIT: Descriptor = Descriptor::gauge(
    "digitalocean_account_floating_ip_limit",
    "The maximum number of floating ips you can use",
    &[],
);
static VOLUME_LIMIT: Descriptor = Descriptor::gauge(
    "digitalocean_account_volume_limit",
    "The maximum number of volumes you can use",
    &[],
);
static VERIFIED: Descriptor = Descriptor::gauge(
    "digitalocean_account_verified",
    "1 if your email address was verified",
    &[],
);

pub struct AccountCollector {
    client: Client,
    guard: CallGuard,
}

impl AccountCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn account_samples(account: &Account) -> Vec<Sample> {
    vec![
        Sample::unlabeled(&ACTIVE, bool_value(account.is_active())),
        Sample::unlabeled(&DROPLET_LIMIT, account.droplet_limit as f64),
        Sample::unlabeled(&FLOATING_IP_LIMIT, account.floating_ip_limit as f64),
        Sample::unlabeled(&VOLUME_LIMIT, account.volume_limit as f64),
        Sample::unlabeled(&VERIFIED, bool_value(account.email_verified)),
    ]
}

#[async_trait]
impl Collector for AccountCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![
            &ACTIVE,
            &DROPLET_LIMIT,
            &FLOATING_IP_LIMIT,
            &VOLUME_LIMIT,
            &VERIFIED,
        ]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("get account", self.client.account())
            .await
            .map(|account| account_samples(&account))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_samples() {
        let account = Account {
            droplet_limit: 25,
            floating_ip_limit: 3,
            volume_limit: 100,
            email_verified: true,
            status: "warning".to_string(),
            ..Default::default()
        };

        let values: Vec<(&str, f64)> = account_samples(&account)
            .iter()
            .map(|s| (s.descriptor.name, s.value))
            .collect();

        assert_eq!(
            values,
            vec![
                ("digitalocean_account_active", 0.0),
                ("digitalocean_account_droplet_limit", 25.0),
                ("digitalocean_account_floating_ip_limit", 3.0),
                ("digitalocean_account_volume_limit", 100.0),
                ("digitalocean_account_verified", 1.0),
            ]
        );
    }
}
