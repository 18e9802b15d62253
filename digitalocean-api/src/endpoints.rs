//! Read operations on the DigitalOcean v2 API.

use crate::client::Client;
use crate::error::Result;
use crate::models::{
    Account, App, Balance, Database, Domain, DomainRecord, Droplet, FloatingIp, Image,
    KubernetesCluster, LoadBalancer, Snapshot, SshKey, Volume,
};

impl Client {
    /// Account limits and status.
    pub async fn account(&self) -> Result<Account> {
        self.get_object("v2/account", Some("account")).await
    }

    /// Current billing balance.
    pub async fn balance(&self) -> Result<Balance> {
        self.get_object("v2/customers/my/balance", None).await
    }

    /// All App Platform apps.
    pub async fn apps(&self) -> Result<Vec<App>> {
        self.list_all("v2/apps", "apps", &[]).await
    }

    /// All managed database clusters.
    pub async fn databases(&self) -> Result<Vec<Database>> {
        self.list_all("v2/databases", "databases", &[]).await
    }

    /// All DNS domains.
    pub async fn domains(&self) -> Result<Vec<Domain>> {
        self.list_all("v2/domains", "domains", &[]).await
    }

    /// All records of one DNS domain.
    pub async fn domain_records(&self, domain: &str) -> Result<Vec<DomainRecord>> {
        let path = format!("v2/domains/{}/records", domain);
        self.list_all(&path, "domain_records", &[]).await
    }

    /// All droplets.
    pub async fn droplets(&self) -> Result<Vec<Droplet>> {
        self.list_all("v2/droplets", "droplets", &[]).await
    }

    /// All floating IPs.
    pub async fn floating_ips(&self) -> Result<Vec<FloatingIp>> {
        self.list_all("v2/floating_ips", "floating_ips", &[]).await
    }

    /// Private (user) images.
    pub async fn images(&self) -> Result<Vec<Image>> {
        self.list_all("v2/images", "images", &[("private", "true")])
            .await
    }

    /// SSH keys on the account.
    pub async fn keys(&self) -> Result<Vec<SshKey>> {
        self.list_all("v2/account/keys", "ssh_keys", &[]).await
    }

    /// All load balancers.
    pub async fn load_balancers(&self) -> Result<Vec<LoadBalancer>> {
        self.list_all("v2/load_balancers", "load_balancers", &[])
            .await
    }

    /// All droplet and volume snapshots.
    pub async fn snapshots(&self) -> Result<Vec<Snapshot>> {
        self.list_all("v2/snapshots", "snapshots", &[]).await
    }

    /// All block storage volumes.
    pub async fn volumes(&self) -> Result<Vec<Volume>> {
        self.list_all("v2/volumes", "volumes", &[]).await
    }

    /// All Kubernetes clusters.
    pub async fn kubernetes_clusters(&self) -> Result<Vec<KubernetesCluster>> {
        self.list_all("v2/kubernetes/clusters", "kubernetes_clusters", &[])
            .await
    }
}
