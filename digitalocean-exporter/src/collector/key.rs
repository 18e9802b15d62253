//! SSH keys on the account.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::SshKey;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample};

pub const NAME: &str = "key";

static KEY: Descriptor = Descriptor::gauge(
    "digitalocean_key",
    "Information about keys in your digitalocean account",
    &["id", "name", "fingerprint"],
);

pub struct KeyCollector {
    client: Client,
    guard: CallGuard,
}

impl KeyCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn key_samples(keys: &[SshKey]) -> Vec<Sample> {
    keys.iter()
        .map(|key| {
            Sample::new(
                &KEY,
                1.0,
                vec![key.id.to_string(), key.name.clone(), key.fingerprint.clone()],
            )
        })
        .collect()
}

#[async_trait]
impl Collector for KeyCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&KEY]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("list keys", self.client.keys())
            .await
            .map(|keys| key_samples(&keys))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_samples() {
        let keys = vec![SshKey {
            id: 512189,
            name: "My SSH Public Key".to_string(),
            fingerprint: "3b:16:bf:e4:8b:00:8b:b8:59:8c:a9:d3:f0:19:45:fa".to_string(),
        }];

        let samples = key_samples(&keys);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 1.0);
        assert_eq!(samples[0].label("id"), Some("512189"));
        assert_eq!(
            samples[0].label("fingerprint"),
            Some("3b:16:bf:e4:8b:00:8b:b8:59:8c:a9:d3:f0:19:45:fa")
        );
    }
}
