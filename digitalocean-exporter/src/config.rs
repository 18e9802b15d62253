//! Configuration for the DigitalOcean exporter.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults,
//! 2. an optional JSON5 file (non-secret settings only),
//! 3. environment variables and command-line flags.
//!
//! Environment variables may also come from a `.env` file in the working
//! directory; variables already set in the process environment win.
//! Credentials are never read from the JSON5 file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use clap::builder::BoolishValueParser;
use digitalocean_api::{DEFAULT_BASE_URL, DEFAULT_SPACES_REGIONS, DEFAULT_STATUS_URL, RetryConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Paths reserved by the HTTP server.
const RESERVED_PATHS: &[&str] = &["/", "/healthz"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("DIGITALOCEAN_TOKEN is required")]
    MissingToken,
    #[error("Failed to load env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// Default env file, relative to the working directory.
pub const ENV_FILE: &str = ".env";

/// Load variables from an env file into the process environment.
///
/// Returns `false` when the file does not exist. Variables that are
/// already set are not overwritten.
pub fn load_env_file<P: AsRef<Path>>(path: P) -> Result<bool, ConfigError> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Command-line flags, each also settable from the environment.
#[derive(Parser, Debug, Default)]
#[command(name = "digitalocean-exporter")]
#[command(about = "Export DigitalOcean account resources as Prometheus metrics")]
#[command(version)]
pub struct CliArgs {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long, env = "DIGITALOCEAN_EXPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// DigitalOcean API token.
    #[arg(long, env = "DIGITALOCEAN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Spaces access key id.
    #[arg(long, env = "DIGITALOCEAN_SPACES_ACCESS_KEY_ID", hide_env_values = true)]
    pub spaces_access_key_id: Option<String>,

    /// Spaces access key secret.
    #[arg(long, env = "DIGITALOCEAN_SPACES_ACCESS_KEY_SECRET", hide_env_values = true)]
    pub spaces_access_key_secret: Option<String>,

    /// Spaces regions to list buckets in (comma separated).
    #[arg(long, env = "DIGITALOCEAN_SPACES_REGIONS", value_delimiter = ',')]
    pub spaces_regions: Option<Vec<String>>,

    /// Per-call API timeout in milliseconds.
    #[arg(long, env = "HTTP_TIMEOUT", value_name = "MS")]
    pub http_timeout: Option<u64>,

    /// Enable debug logging.
    #[arg(
        long,
        env = "DEBUG",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub debug: Option<bool>,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// HTTP listen address; a leading ':' listens on all interfaces.
    #[arg(long, env = "WEB_ADDR")]
    pub web_addr: Option<String>,

    /// Path of the metrics endpoint.
    #[arg(long, env = "WEB_PATH")]
    pub web_path: Option<String>,

    /// DigitalOcean API base URL.
    #[arg(long, env = "DIGITALOCEAN_API_URL")]
    pub api_url: Option<String>,

    /// Status page base URL.
    #[arg(long, env = "DIGITALOCEAN_STATUS_URL")]
    pub status_url: Option<String>,
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// API token; only ever taken from the environment or flags.
    #[serde(skip)]
    pub token: String,

    /// API client settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Spaces settings.
    #[serde(default)]
    pub spaces: SpacesConfig,

    /// HTTP endpoint settings.
    #[serde(default)]
    pub web: WebConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// DigitalOcean API and status page client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub url: String,

    #[serde(default = "default_status_url")]
    pub status_url: String,

    /// Deadline for each collector call, retries included (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_wait_min_ms")]
    pub retry_wait_min_ms: u64,

    #[serde(default = "default_retry_wait_max_ms")]
    pub retry_wait_max_ms: u64,
}

fn default_api_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_status_url() -> String {
    DEFAULT_STATUS_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_wait_min_ms() -> u64 {
    3000
}

fn default_retry_wait_max_ms() -> u64 {
    6000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            status_url: default_status_url(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_wait_min_ms: default_retry_wait_min_ms(),
            retry_wait_max_ms: default_retry_wait_max_ms(),
        }
    }
}

impl ApiConfig {
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            wait_min: Duration::from_millis(self.retry_wait_min_ms),
            wait_max: Duration::from_millis(self.retry_wait_max_ms),
        }
    }
}

/// Spaces (S3-compatible object storage) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacesConfig {
    #[serde(skip)]
    pub access_key_id: String,

    #[serde(skip)]
    pub access_key_secret: String,

    /// Regions to list buckets in.
    #[serde(default = "default_spaces_regions")]
    pub regions: Vec<String>,

    /// Endpoint override (e.g. a local S3 stand-in); `{region}` is
    /// replaced by each region name.
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_spaces_regions() -> Vec<String> {
    DEFAULT_SPACES_REGIONS.iter().map(|r| r.to_string()).collect()
}

impl Default for SpacesConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            access_key_secret: String::new(),
            regions: default_spaces_regions(),
            endpoint: None,
        }
    }
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Address to listen on (default: ":9212").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_listen() -> String {
    ":9212".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log at debug level instead of info.
    #[serde(default)]
    pub debug: bool,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

/// Log output format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(json5::from_str(&content)?)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the effective configuration: file, then flags and environment.
    pub fn resolve(args: CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };

        config.token = args
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        if let Some(id) = args.spaces_access_key_id {
            config.spaces.access_key_id = id;
        }
        if let Some(secret) = args.spaces_access_key_secret {
            config.spaces.access_key_secret = secret;
        }
        if let Some(regions) = args.spaces_regions {
            config.spaces.regions = regions
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
        }
        if let Some(timeout) = args.http_timeout {
            config.api.timeout_ms = timeout;
        }
        if let Some(debug) = args.debug {
            config.logging.debug = debug;
        }
        if let Some(format) = args.log_format {
            config.logging.format = format;
        }
        if let Some(addr) = args.web_addr {
            config.web.listen = addr;
        }
        if let Some(path) = args.web_path {
            config.web.path = path;
        }
        if let Some(url) = args.api_url {
            config.api.url = url;
        }
        if let Some(url) = args.status_url {
            config.api.status_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "timeout_ms must be > 0".to_string(),
            ));
        }

        if self.api.retry_wait_min_ms > self.api.retry_wait_max_ms {
            return Err(ConfigError::Validation(
                "retry_wait_min_ms must not exceed retry_wait_max_ms".to_string(),
            ));
        }

        self.listen_addr()?;

        if !self.web.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if RESERVED_PATHS.contains(&self.web.path.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Metrics path must not be {}",
                self.web.path
            )));
        }

        Ok(())
    }

    /// Address to bind, as `host:port`; `:port` means every interface.
    ///
    /// Host names are kept and resolved when the listener binds.
    pub fn listen_addr(&self) -> Result<String, ConfigError> {
        let listen = self.web.listen.trim();
        let invalid =
            || ConfigError::Validation(format!("Invalid listen address: {}", self.web.listen));

        let (host, port) = listen.rsplit_once(':').ok_or_else(invalid)?;
        port.parse::<u16>().map_err(|_| invalid())?;

        if host.is_empty() {
            Ok(format!("[::]:{}", port))
        } else if host.contains(char::is_whitespace) {
            Err(invalid())
        } else {
            Ok(listen.to_string())
        }
    }

    /// Whether both Spaces credentials are set.
    pub fn spaces_enabled(&self) -> bool {
        !self.spaces.access_key_id.is_empty() && !self.spaces.access_key_secret.is_empty()
    }

    /// Per-call collector timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }
}
