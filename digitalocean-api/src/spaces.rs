//! Spaces (S3-compatible object storage) bucket listing.
//!
//! Requests are signed with AWS Signature Version 4 using the account's
//! Spaces access key pair.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::client::{http_client, parse_base_url, send};
use crate::error::{ApiError, Result};
use crate::models::Bucket;

type HmacSha256 = Hmac<Sha256>;

/// Regions with Spaces endpoints.
pub const DEFAULT_SPACES_REGIONS: &[&str] = &[
    "ams3", "blr1", "fra1", "nyc3", "sfo2", "sfo3", "sgp1", "syd1",
];

/// Spaces accepts this region name in signatures for every endpoint.
const SIGNING_REGION: &str = "us-east-1";
const SERVICE: &str = "s3";
const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";
/// Replaced by the region name in an endpoint override.
const REGION_PLACEHOLDER: &str = "{region}";
const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Headers that authenticate one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Value for `x-amz-date`.
    pub amz_date: String,
    /// Value for `Authorization`.
    pub authorization: String,
}

/// Sign a body-less request.
///
/// `query` must already be in canonical form (sorted, encoded); bucket
/// listing uses none.
pub fn sign_v4(
    access_key_id: &str,
    secret_access_key: &str,
    method: &str,
    host: &str,
    path: &str,
    query: &str,
    at: DateTime<Utc>,
) -> Result<Signature> {
    let amz_date = at.format("%Y%m%dT%H%M%SZ").to_string();
    let date = at.format("%Y%m%d").to_string();

    let canonical_request = format!(
        "{}\n{}\n{}\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
        method, path, query, host, EMPTY_PAYLOAD_SHA256, amz_date, SIGNED_HEADERS,
        EMPTY_PAYLOAD_SHA256
    );

    let scope = format!("{}/{}/{}/aws4_request", date, SIGNING_REGION, SERVICE);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let secret_date = hmac_sha256(
        format!("AWS4{}", secret_access_key).as_bytes(),
        date.as_bytes(),
    )?;
    let secret_region = hmac_sha256(&secret_date, SIGNING_REGION.as_bytes())?;
    let secret_service = hmac_sha256(&secret_region, SERVICE.as_bytes())?;
    let signing_key = hmac_sha256(&secret_service, b"aws4_request")?;
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

    Ok(Signature {
        amz_date,
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, access_key_id, scope, SIGNED_HEADERS, signature
        ),
    })
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ApiError::config(format!("HMAC error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Client for listing Spaces buckets.
#[derive(Clone)]
pub struct SpacesClient {
    http: reqwest::Client,
    access_key_id: Arc<str>,
    secret_access_key: Arc<str>,
    endpoint: Option<String>,
}

impl fmt::Debug for SpacesClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpacesClient")
            .field("access_key_id", &self.access_key_id)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl SpacesClient {
    /// Create a client for the regional `digitaloceanspaces.com` endpoints.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();

        if access_key_id.is_empty() || secret_access_key.is_empty() {
            return Err(ApiError::config(
                "Spaces access key id and secret are both required",
            ));
        }

        Ok(Self {
            http: http_client()?,
            access_key_id: Arc::from(access_key_id),
            secret_access_key: Arc::from(secret_access_key),
            endpoint: None,
        })
    }

    /// Send requests to `endpoint` instead of the regional hosts.
    ///
    /// `{region}` in the endpoint is replaced by the region being listed;
    /// without it every region goes to the same endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        parse_base_url(&endpoint.replace(REGION_PLACEHOLDER, "region"))?;
        self.endpoint = Some(endpoint.to_string());
        Ok(self)
    }

    /// Endpoint used for `region`.
    pub fn endpoint_for(&self, region: &str) -> Result<Url> {
        match &self.endpoint {
            Some(template) => parse_base_url(&template.replace(REGION_PLACEHOLDER, region)),
            None => parse_base_url(&format!("https://{}.digitaloceanspaces.com/", region)),
        }
    }

    /// List the buckets hosted in `region`.
    pub async fn list_buckets(&self, region: &str) -> Result<Vec<Bucket>> {
        let url = self.endpoint_for(region)?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(ApiError::config(format!("Endpoint '{}' has no host", url))),
        };

        let signature = sign_v4(
            &self.access_key_id,
            &self.secret_access_key,
            "GET",
            &host,
            url.path(),
            "",
            Utc::now(),
        )?;

        let request = self
            .http
            .get(url.clone())
            .header("x-amz-date", &signature.amz_date)
            .header("x-amz-content-sha256", EMPTY_PAYLOAD_SHA256)
            .header("authorization", &signature.authorization);

        let body = send(request, "GET", &url).await?;
        parse_list_buckets(&body).map_err(|message| ApiError::decode(url.as_str(), message))
    }
}

/// Extract buckets from a `ListAllMyBucketsResult` document.
pub fn parse_list_buckets(xml: &str) -> std::result::Result<Vec<Bucket>, String> {
    if !xml.contains("<ListAllMyBucketsResult") {
        return Err("missing ListAllMyBucketsResult element".to_string());
    }

    let mut buckets = Vec::new();
    for chunk in xml.split("<Bucket>").skip(1) {
        let body = chunk.split("</Bucket>").next().unwrap_or(chunk);
        let name = element_text(body, "Name").ok_or("bucket without Name element")?;
        let name = unescape_xml(name);
        let creation_date = element_text(body, "CreationDate").and_then(|raw| {
            match DateTime::parse_from_rfc3339(raw) {
                Ok(date) => Some(date.with_timezone(&Utc)),
                Err(e) => {
                    debug!(
                        bucket = %name,
                        creation_date = raw,
                        error = %e,
                        "Ignoring unparsable bucket creation date"
                    );
                    None
                }
            }
        });

        buckets.push(Bucket {
            name,
            creation_date,
        });
    }

    Ok(buckets)
}

fn element_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    Some(xml[start..end].trim())
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
