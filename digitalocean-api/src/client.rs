//! Bearer-authenticated DigitalOcean REST client with pagination and retries.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ApiError, Result};

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.digitalocean.com/";

/// Page size requested from list endpoints (the API maximum).
pub const PER_PAGE: usize = 200;

const USER_AGENT: &str = concat!("digitalocean-exporter/", env!("CARGO_PKG_VERSION"));

/// Automatic retry policy for idempotent reads.
///
/// The wait before retry `n` (zero based) is `wait_min * 2^n`, bounded to
/// `[wait_min, wait_max]`. A numeric `Retry-After` header replaces the
/// computed wait but is bounded the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Shortest wait between attempts.
    pub wait_min: Duration,
    /// Longest wait between attempts.
    pub wait_max: Duration,
}

impl RetryConfig {
    /// Wait before retry number `attempt` (zero based).
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let wait = retry_after.unwrap_or_else(|| {
            self.wait_min
                .saturating_mul(2u32.saturating_pow(attempt))
        });
        wait.max(self.wait_min).min(self.wait_max)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            wait_min: Duration::from_secs(3),
            wait_max: Duration::from_secs(6),
        }
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    token: String,
    base_url: String,
    retry: RetryConfig,
}

impl ClientBuilder {
    /// Override the API endpoint (tests, proxies).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        if self.token.trim().is_empty() {
            return Err(ApiError::config("API token is required"));
        }

        if self.retry.wait_min > self.retry.wait_max {
            return Err(ApiError::config(format!(
                "Retry wait_min ({:?}) exceeds wait_max ({:?})",
                self.retry.wait_min, self.retry.wait_max
            )));
        }

        let base_url = parse_base_url(&self.base_url)?;
        let http = http_client()?;

        Ok(Client {
            http,
            base_url,
            token: Arc::from(self.token),
            retry: self.retry,
        })
    }
}

/// Handle to the DigitalOcean v2 API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    token: Arc<str>,
    retry: RetryConfig,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    pages: Option<Pages>,
}

#[derive(Debug, Default, Deserialize)]
struct Pages {
    #[serde(default)]
    next: Option<String>,
}

impl Client {
    /// Start building a client authenticated with `token`.
    pub fn builder(token: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// The API endpoint this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::config(format!("Invalid API path '{}': {}", path, e)))
    }

    /// Fetch a single JSON document, optionally unwrapping one top-level key.
    pub(crate) async fn get_object<T: DeserializeOwned>(
        &self,
        path: &str,
        key: Option<&str>,
    ) -> Result<T> {
        let url = self.url(path)?;
        let mut document: Map<String, Value> = self.get_json(&url).await?;

        let value = match key {
            Some(key) => document.remove(key).ok_or_else(|| {
                ApiError::decode(url.as_str(), format!("missing field `{}`", key))
            })?,
            None => Value::Object(document),
        };

        serde_json::from_value(value).map_err(|e| ApiError::decode(url.as_str(), e))
    }

    /// Fetch every page of a list endpoint.
    ///
    /// Items are returned only once the last page has been read; an error on
    /// any page discards everything fetched so far.
    pub(crate) async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut url = self.url(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
            pairs.append_pair("page", "1");
            pairs.append_pair("per_page", &PER_PAGE.to_string());
        }

        let mut items = Vec::new();
        let mut pages = 0usize;

        loop {
            let mut page: Map<String, Value> = self.get_json(&url).await?;
            pages += 1;

            match page.remove(key) {
                Some(Value::Null) => {}
                Some(batch) => {
                    let batch: Vec<T> = serde_json::from_value(batch)
                        .map_err(|e| ApiError::decode(url.as_str(), e))?;
                    items.extend(batch);
                }
                None => {
                    return Err(ApiError::decode(
                        url.as_str(),
                        format!("missing field `{}`", key),
                    ));
                }
            }

            let next = page
                .remove("links")
                .and_then(|links| serde_json::from_value::<Links>(links).ok())
                .and_then(|links| links.pages)
                .and_then(|pages| pages.next);

            let Some(next) = next else {
                break;
            };

            let next_url = self.rebase(&next)?;
            if next_url == url {
                return Err(ApiError::decode(
                    url.as_str(),
                    "pagination link points back at the current page",
                ));
            }
            url = next_url;
        }

        debug!(path, pages, items = items.len(), "Listed DigitalOcean resources");
        Ok(items)
    }

    /// Resolve a pagination link against the configured endpoint.
    ///
    /// Only the path and query of the link are used, so the bearer token is
    /// never sent to another host.
    fn rebase(&self, link: &str) -> Result<Url> {
        let resolved = self
            .base_url
            .join(link)
            .map_err(|e| ApiError::decode(link, format!("invalid pagination link: {}", e)))?;

        let mut url = self.base_url.clone();
        url.set_path(resolved.path());
        url.set_query(resolved.query());
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let body = self.get_with_retry(url).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::decode(url.as_str(), e))
    }

    async fn get_with_retry(&self, url: &Url) -> Result<String> {
        let mut attempt = 0u32;

        loop {
            let request = self
                .http
                .get(url.clone())
                .bearer_auth(&*self.token)
                .header(ACCEPT, "application/json");

            let (error, retry_after) = match send(request, "GET", url).await {
                Ok(body) => return Ok(body),
                Err(failure) => (failure.error, failure.retry_after),
            };

            if !error.is_retryable() || attempt >= self.retry.max_retries {
                return Err(error);
            }

            let wait = self.retry.backoff(attempt, retry_after);
            attempt += 1;
            warn!(
                url = %url,
                status = ?error.status(),
                attempt,
                max_retries = self.retry.max_retries,
                wait_ms = wait.as_millis() as u64,
                "Retrying DigitalOcean API request"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

/// A failed request plus the server's retry hint, if any.
pub(crate) struct Failure {
    pub(crate) error: ApiError,
    pub(crate) retry_after: Option<Duration>,
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        failure.error
    }
}

/// Send a request and return the body of a successful response.
pub(crate) async fn send(
    request: RequestBuilder,
    method: &str,
    url: &Url,
) -> std::result::Result<String, Failure> {
    let transport = |source| Failure {
        error: ApiError::Transport {
            method: method.to_string(),
            url: url.to_string(),
            source,
        },
        retry_after: None,
    };

    let response = request.send().await.map_err(transport)?;
    let status = response.status();

    if status.is_success() {
        return response.text().await.map_err(transport);
    }

    let retry_after = parse_retry_after(response.headers());
    let body = response.text().await.unwrap_or_default();

    Err(Failure {
        error: ApiError::Status {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            body: body.trim().to_string(),
        },
        retry_after,
    })
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Parse an endpoint URL, making sure relative joins land below its path.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| ApiError::config(format!("Invalid base URL '{}': {}", raw, e)))?;

    if url.cannot_be_a_base() {
        return Err(ApiError::config(format!("Invalid base URL '{}'", raw)));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Shared HTTP client settings for all API clients.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ApiError::config(format!("Failed to build HTTP client: {}", e)))
}
