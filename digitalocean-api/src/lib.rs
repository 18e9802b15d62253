//! Read-only DigitalOcean API client.
//!
//! This crate provides the small slice of the DigitalOcean platform the
//! exporter needs:
//!
//! - [`client`] - bearer-authenticated REST client with pagination and retries
//! - [`endpoints`] - typed list/read operations (droplets, volumes, ...)
//! - [`models`] - the records those operations return
//! - [`spaces`] - Spaces bucket listing with AWS Signature V4
//! - [`status`] - unresolved incidents from the public status page
//! - [`error`] - error types

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod spaces;
pub mod status;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, PER_PAGE, RetryConfig};
pub use error::{ApiError, Result};
pub use spaces::{DEFAULT_SPACES_REGIONS, SpacesClient};
pub use status::{DEFAULT_STATUS_URL, StatusPageClient};
