use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("order API rejected the token (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("rate limited by order API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("GraphQL error: {}", .messages.join("; "))]
    GraphQl { messages: Vec<String> },

    #[error("order API response carried no getOrderList data")]
    MissingData,

    #[error("pagination limit reached: exceeded {max_pages} pages")]
    PaginationLimit { max_pages: usize },

    #[error("order API returned cursor {cursor} twice")]
    CursorCycle { cursor: String },

    #[error("invalid order API URL \"{url}\": {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("API token cannot be sent as an HTTP header")]
    InvalidToken,

    #[error("BIZNISWEB_API_TOKEN is not set")]
    MissingToken,
}

#[derive(Debug, Error)]
pub enum OrderCacheError {
    #[error("order cache I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("order cache encoding error at {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
