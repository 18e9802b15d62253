//! Billing balance.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::Balance;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample};

pub const NAME: &str = "balance";

static MONTH_TO_DATE_BALANCE: Descriptor = Descriptor::gauge(
    "digitalocean_balance_month_to_date_balance",
    "Balance as of the generated_at time",
    &[],
);
static ACCOUNT_BALANCE: Descriptor = Descriptor::gauge(
    "digitalocean_balance_account_balance",
    "Current balance of the most recent billing activity",
    &[],
);
static MONTH_TO_DATE_USAGE: Descriptor = Descriptor::gauge(
    "digitalocean_balance_month_to_date_usage",
    "Amount used in the current billing period as of the generated_at time",
    &[],
);
static GENERATED_AT: Descriptor = Descriptor::gauge(
    "digitalocean_balance_generated_at",
    "The time at which balances were most recently generated",
    &[],
);

pub struct BalanceCollector {
    client: Client,
    guard: CallGuard,
}

impl BalanceCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn balance_samples(balance: &Balance) -> Vec<Sample> {
    let mut samples = vec![
        Sample::unlabeled(&MONTH_TO_DATE_BALANCE, balance.month_to_date_balance),
        Sample::unlabeled(&ACCOUNT_BALANCE, balance.account_balance),
        Sample::unlabeled(&MONTH_TO_DATE_USAGE, balance.month_to_date_usage),
    ];

    if let Some(generated_at) = balance.generated_at {
        samples.push(Sample::unlabeled(&GENERATED_AT, generated_at.timestamp() as f64));
    }

    samples
}

#[async_trait]
impl Collector for BalanceCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![
            &MONTH_TO_DATE_BALANCE,
            &ACCOUNT_BALANCE,
            &MONTH_TO_DATE_USAGE,
            &GENERATED_AT,
        ]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("get balance", self.client.balance())
            .await
            .map(|balance| balance_samples(&balance))
            .unwrap_or_default()
    }
}
