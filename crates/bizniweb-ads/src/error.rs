use thiserror::Error;

use crate::types::AdPlatform;

/// Errors returned by the ad platform clients and the spend cache.
#[derive(Debug, Error)]
pub enum AdsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials were rejected (expired token, revoked refresh token).
    #[error("{platform} authentication failed: {message}")]
    Auth {
        platform: AdPlatform,
        message: String,
    },

    /// The platform returned a structured error payload.
    #[error("{platform} API error: {message}")]
    Api {
        platform: AdPlatform,
        message: String,
    },

    #[error("{platform} rate limited (retry after {retry_after_secs}s)")]
    RateLimited {
        platform: AdPlatform,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {platform}")]
    UnexpectedStatus { platform: AdPlatform, status: u16 },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {platform} base URL '{url}': {reason}")]
    InvalidBaseUrl {
        platform: AdPlatform,
        url: String,
        reason: String,
    },

    #[error("{platform} pagination exceeded {max_pages} pages")]
    PaginationLimit { platform: AdPlatform, max_pages: usize },

    #[error("spend cache I/O error at {path}: {source}")]
    CacheIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("spend cache encoding error at {path}: {source}")]
    CacheEncode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
