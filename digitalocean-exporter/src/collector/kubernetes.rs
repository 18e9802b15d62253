//! Managed Kubernetes clusters and their node pools.

use std::time::Duration;

use async_trait::async_trait;
use digitalocean_api::Client;
use digitalocean_api::models::KubernetesCluster;

use super::{CallGuard, Collector};
use crate::error_counter::ErrorCounter;
use crate::metric::{Descriptor, Sample, bool_value};

pub const NAME: &str = "kubernetes";

static CLUSTER_UP: Descriptor = Descriptor::gauge(
    "digitalocean_kubernetes_cluster_up",
    "If 1 the kubernetes cluster is up and running, 0 otherwise",
    &["id", "name", "region", "version"],
);
static NODEPOOL_NODES: Descriptor = Descriptor::gauge(
    "digitalocean_kubernetes_nodepool_nodes",
    "The number of nodes in a node pool",
    &["cluster_id", "cluster_name", "id", "name", "size"],
);

pub struct KubernetesCollector {
    client: Client,
    guard: CallGuard,
}

impl KubernetesCollector {
    pub fn new(client: Client, errors: ErrorCounter, timeout: Duration) -> Self {
        Self {
            client,
            guard: CallGuard::new(NAME, errors, timeout),
        }
    }
}

fn cluster_samples(clusters: &[KubernetesCluster]) -> Vec<Sample> {
    let mut samples = Vec::new();

    for cluster in clusters {
        samples.push(Sample::new(
            &CLUSTER_UP,
            bool_value(cluster.is_running()),
            vec![
                cluster.id.clone(),
                cluster.name.clone(),
                cluster.region.clone(),
                cluster.version.clone(),
            ],
        ));

        for pool in &cluster.node_pools {
            samples.push(Sample::new(
                &NODEPOOL_NODES,
                pool.count as f64,
                vec![
                    cluster.id.clone(),
                    cluster.name.clone(),
                    pool.id.clone(),
                    pool.name.clone(),
                    pool.size.clone(),
                ],
            ));
        }
    }

    samples
}

#[async_trait]
impl Collector for KubernetesCollector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> Vec<&'static Descriptor> {
        vec![&CLUSTER_UP, &NODEPOOL_NODES]
    }

    async fn collect(&self) -> Vec<Sample> {
        self.guard
            .call("list kubernetes clusters", self.client.kubernetes_clusters())
            .await
            .map(|clusters| cluster_samples(&clusters))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_and_node_pools() {
        let clusters: Vec<KubernetesCluster> = serde_json::from_str(
            r#"[{
                "id": "bd5f5959",
                "name": "prod-cluster-01",
                "region": "nyc1",
                "version": "1.18.6-do.0",
                "status": {"state": "running"},
                "node_pools": [
                    {"id": "cdda885e", "name": "frontend-pool", "size": "s-1vcpu-2gb", "count": 3},
                    {"id": "f49f4379", "name": "backend-pool", "size": "g-4vcpu-16gb", "count": 2}
                ]
            }]"#,
        )
        .unwrap();

        let samples = cluster_samples(&clusters);
        assert_eq!(samples.len(), 3);

        assert_eq!(samples[0].descriptor, &CLUSTER_UP);
        assert_eq!(samples[0].value, 1.0);
        assert_eq!(samples[0].label("version"), Some("1.18.6-do.0"));

        assert_eq!(samples[1].label("cluster_name"), Some("prod-cluster-01"));
        assert_eq!(samples[1].label("name"), Some("frontend-pool"));
        assert_eq!(samples[1].value, 3.0);
        assert_eq!(samples[2].label("size"), Some("g-4vcpu-16gb"));
        assert_eq!(samples[2].value, 2.0);
    }

    #[test]
    fn test_provisioning_cluster_is_down() {
        let clusters = vec![KubernetesCluster {
            status: digitalocean_api::models::ClusterStatus {
                state: "provisioning".to_string(),
            },
            ..Default::default()
        }];
        let samples = cluster_samples(&clusters);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 0.0);
    }
}
