use thiserror::Error;

/// Result type alias using [`ApiError`].
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by the API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client construction or request building failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level failure (connect, TLS, body read).
    #[error("{method} {url}: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status. The body is kept verbatim and may be large.
    #[error("{method} {url}: {status} {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ApiError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a decode error.
    pub fn decode(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// HTTP status code, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a request that failed this way is worth repeating.
    ///
    /// Transport failures, rate limiting and server errors other than
    /// `501 Not Implemented` are retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { source, .. } => !source.is_builder() && !source.is_decode(),
            Self::Status { status, .. } => *status == 429 || (*status >= 500 && *status != 501),
            Self::Config(_) | Self::Decode { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ApiError {
        ApiError::Status {
            method: "GET".to_string(),
            url: "https://api.digitalocean.com/v2/droplets".to_string(),
            status: code,
            body: "boom".to_string(),
        }
    }

    #[test]
    fn test_status_display_includes_request() {
        assert_eq!(
            status(504).to_string(),
            "GET https://api.digitalocean.com/v2/droplets: 504 boom"
        );
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(501).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(404).is_retryable());
    }

    #[test]
    fn test_decode_and_config_not_retryable() {
        assert!(!ApiError::decode("u", "bad json").is_retryable());
        assert!(!ApiError::config("bad").is_retryable());
        assert_eq!(status(418).status(), Some(418));
        assert_eq!(ApiError::config("x").status(), None);
    }
}
