//! Records returned by the DigitalOcean, Spaces and status page APIs.
//!
//! Only the fields the exporter reads are modelled; everything else in the
//! responses is ignored. Missing or `null` fields fall back to defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Deserialize `null` as the type's default.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a number or a numeric string (the billing API sends strings).
fn flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null,
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) if text.trim().is_empty() => Ok(0.0),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
        Raw::Null => Ok(0.0),
    }
}

/// A datacenter region reference.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Region {
    pub slug: String,
    pub name: String,
}

/// `GET /v2/account`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Account {
    pub uuid: String,
    pub email: String,
    pub email_verified: bool,
    pub droplet_limit: i64,
    pub floating_ip_limit: i64,
    pub volume_limit: i64,
    #[serde(deserialize_with = "nullable")]
    pub status: String,
    #[serde(deserialize_with = "nullable")]
    pub status_message: String,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// `GET /v2/customers/my/balance`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Balance {
    #[serde(deserialize_with = "flexible_f64")]
    pub month_to_date_balance: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub account_balance: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub month_to_date_usage: f64,
    pub generated_at: Option<DateTime<Utc>>,
}

/// App Platform application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct App {
    pub id: String,
    pub spec: AppSpec,
    #[serde(deserialize_with = "nullable")]
    pub region: AppRegion,
    pub active_deployment: Option<Deployment>,
    pub created_at: Option<DateTime<Utc>>,
}

impl App {
    /// Whether the active deployment is serving.
    pub fn is_active(&self) -> bool {
        self.active_deployment
            .as_ref()
            .is_some_and(|d| d.phase == "ACTIVE")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppSpec {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppRegion {
    pub slug: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Deployment {
    pub id: String,
    pub phase: String,
}

/// Managed database cluster.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Database {
    pub id: String,
    pub name: String,
    pub engine: String,
    pub version: String,
    pub num_nodes: i64,
    pub size: String,
    pub region: String,
    pub status: String,
}

impl Database {
    pub fn is_online(&self) -> bool {
        self.status == "online"
    }
}

/// DNS domain.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Domain {
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub ttl: i64,
}

/// DNS record within a domain.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DomainRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub data: String,
    pub priority: Option<i64>,
    pub port: Option<i64>,
    pub ttl: i64,
    pub weight: Option<i64>,
}

/// Compute instance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Droplet {
    pub id: i64,
    pub name: String,
    /// Memory in MiB.
    pub memory: i64,
    pub vcpus: i64,
    /// Disk in GiB.
    pub disk: i64,
    pub status: String,
    pub region: Region,
    pub size: Size,
}

impl Droplet {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// Droplet size and pricing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Size {
    pub slug: String,
    pub price_monthly: f64,
    pub price_hourly: f64,
}

/// Reserved (floating) IPv4 address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FloatingIp {
    pub ip: String,
    pub droplet: Option<DropletRef>,
    pub region: Region,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DropletRef {
    pub id: i64,
    pub name: String,
}

/// Custom image or backup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Image {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub image_type: String,
    pub distribution: String,
    #[serde(deserialize_with = "nullable")]
    pub regions: Vec<String>,
    /// Minimum disk in GiB.
    pub min_disk_size: i64,
    pub size_gigabytes: f64,
}

/// Account SSH key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SshKey {
    pub id: i64,
    pub name: String,
    pub fingerprint: String,
}

/// Load balancer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoadBalancer {
    pub id: String,
    pub name: String,
    pub ip: String,
    pub status: String,
    pub region: Region,
    #[serde(deserialize_with = "nullable")]
    pub droplet_ids: Vec<i64>,
}

impl LoadBalancer {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// Droplet or volume snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub regions: Vec<String>,
    pub min_disk_size: i64,
    pub size_gigabytes: f64,
    pub resource_id: String,
    pub resource_type: String,
}

/// Block storage volume.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub region: Region,
    pub size_gigabytes: i64,
    #[serde(deserialize_with = "nullable")]
    pub droplet_ids: Vec<i64>,
    #[serde(deserialize_with = "nullable")]
    pub filesystem_type: String,
}

/// Managed Kubernetes cluster.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KubernetesCluster {
    pub id: String,
    pub name: String,
    pub region: String,
    pub version: String,
    pub status: ClusterStatus,
    #[serde(deserialize_with = "nullable")]
    pub node_pools: Vec<NodePool>,
}

impl KubernetesCluster {
    pub fn is_running(&self) -> bool {
        self.status.state == "running"
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterStatus {
    pub state: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodePool {
    pub id: String,
    pub name: String,
    pub size: String,
    pub count: i64,
    #[serde(deserialize_with = "nullable")]
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Node {
    pub id: String,
    pub name: String,
}

/// Spaces bucket from an S3 `ListBuckets` response.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub name: String,
    pub creation_date: Option<DateTime<Utc>>,
}

/// Unresolved incident from the status page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Incident {
    pub id: String,
    pub name: String,
    pub status: String,
    /// One of `none`, `minor`, `major`, `critical`.
    pub impact: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_parses_string_amounts() {
        let balance: Balance = serde_json::from_str(
            r#"{
                "month_to_date_balance": "23.44",
                "account_balance": "12.23",
                "month_to_date_usage": "11.21",
                "generated_at": "2019-07-09T15:01:12Z"
            }"#,
        )
        .unwrap();

        assert_eq!(balance.month_to_date_balance, 23.44);
        assert_eq!(balance.account_balance, 12.23);
        assert_eq!(balance.month_to_date_usage, 11.21);
        assert_eq!(balance.generated_at.unwrap().timestamp(), 1562684472);
    }

    #[test]
    fn test_balance_rejects_garbage_amount() {
        let result: Result<Balance, _> =
            serde_json::from_str(r#"{"account_balance": "twelve"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_droplet_fields() {
        let droplet: Droplet = serde_json::from_str(
            r#"{
                "id": 3164444,
                "name": "example.com",
                "memory": 1024,
                "vcpus": 1,
                "disk": 25,
                "status": "active",
                "region": {"slug": "nyc3", "name": "New York 3"},
                "size": {"slug": "s-1vcpu-1gb", "price_monthly": 5.0, "price_hourly": 0.00743},
                "networks": {"v4": []}
            }"#,
        )
        .unwrap();

        assert_eq!(droplet.id, 3164444);
        assert!(droplet.is_active());
        assert_eq!(droplet.region.slug, "nyc3");
        assert_eq!(droplet.size.price_monthly, 5.0);
    }

    #[test]
    fn test_nulls_become_defaults() {
        let volume: Volume = serde_json::from_str(
            r#"{"id": "v1", "name": "data", "droplet_ids": null, "filesystem_type": null}"#,
        )
        .unwrap();
        assert!(volume.droplet_ids.is_empty());
        assert_eq!(volume.filesystem_type, "");

        let record: DomainRecord = serde_json::from_str(
            r#"{"id": 1, "type": "A", "name": "@", "data": "1.2.3.4", "priority": null, "port": null, "ttl": 1800, "weight": null}"#,
        )
        .unwrap();
        assert_eq!(record.record_type, "A");
        assert_eq!(record.priority, None);
    }

    #[test]
    fn test_app_active_phase() {
        let app: App = serde_json::from_str(
            r#"{"id": "a1", "spec": {"name": "web"}, "region": {"slug": "ams"},
                "active_deployment": {"id": "d1", "phase": "ACTIVE"}}"#,
        )
        .unwrap();
        assert!(app.is_active());

        let app: App = serde_json::from_str(r#"{"id": "a2", "spec": {"name": "api"}}"#).unwrap();
        assert!(!app.is_active());
    }
}
