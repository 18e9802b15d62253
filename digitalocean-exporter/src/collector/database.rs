//! Managed database clusters.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::Database;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample, bool_value};

pub const NAME: &str = "database";

const LABELS: &[&str] = &["id", "name", "region", "engine"];

static STATUS: Descriptor = Descriptor::gauge(
    "digitalocean_database_status",
    "If 1 the database is online, 0 otherwise",
    LABELS,
);
static NODES: Descriptor = Descriptor::gauge(
    "digitalocean_database_nodes",
    "The number of nodes in the database cluster",
    LABELS,
);

pub struct DatabaseCollector {
    client: Client,
    guard: CallGuard,
}

impl DatabaseCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn database_samples(databases: &[Database]) -> Vec<Sample> {
    databases
        .iter()
        .flat_map(|db| {
            let labels = vec![
                db.id.clone(),
                db.name.clone(),
                db.region.clone(),
                db.engine.clone(),
            ];
            [
                Sample::new(&STATUS, bool_value(db.is_online()), labels.clone()),
                Sample::new(&NODES, db.num_nodes as f64, labels),
            ]
        })
        .collect()
}

#[async_trait]
impl Collector for DatabaseCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&STATUS, &NODES]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("list databases", self.client.databases())
            .await
            .map(|databases| database_samples(&databases))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_samples() {
        let databases = vec![
            Database {
                id: "9cc10173".to_string(),
                name: "backend".to_string(),
                engine: "pg".to_string(),
                num_nodes: 2,
                region: "nyc3".to_string(),
                status: "online".to_string(),
                ..Default::default()
            },
            Database {
                id: "b6b0e5ad".to_string(),
                name: "cache".to_string(),
                engine: "redis".to_string(),
                num_nodes: 1,
                region: "ams3".to_string(),
                status: "creating".to_string(),
                ..Default::default()
            },
        ];

        let samples = database_samples(&databases);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].value, 1.0);
        assert_eq!(samples[0].label("engine"), Some("pg"));
        assert_eq!(samples[1].value, 2.0);
        assert_eq!(samples[2].value, 0.0);
    }
}
