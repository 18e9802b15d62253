//! DigitalOcean status page (Statuspage v2 API).

use reqwest::Url;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::client::{http_client, parse_base_url, send};
use crate::error::{ApiError, Result};
use crate::models::Incident;

/// Public status page.
pub const DEFAULT_STATUS_URL: &str = "https://status.digitalocean.com/";

#[derive(Debug, Deserialize)]
struct IncidentsResponse {
    #[serde(default)]
    incidents: Vec<Incident>,
}

/// Unauthenticated client for the public status page.
#[derive(Debug, Clone)]
pub struct StatusPageClient {
    http: reqwest::Client,
    base_url: Url,
}

impl StatusPageClient {
    /// Client for the public status page.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_STATUS_URL)
    }

    /// Client for a status page served elsewhere.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Incidents that are not yet resolved.
    pub async fn unresolved_incidents(&self) -> Result<Vec<Incident>> {
        let url = self
            .base_url
            .join("api/v2/incidents/unresolved.json")
            .map_err(|e| ApiError::config(e.to_string()))?;

        let request = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json");
        let body = send(request, "GET", &url).await?;

        let response: IncidentsResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::decode(url.as_str(), e))?;
        Ok(response.incidents)
    }
}
