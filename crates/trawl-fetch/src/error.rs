//! Error types for trawl-fetch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("response body is not a JSON array of records: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("record {index} of page {page} is not a JSON object")]
    MalformedRecord { page: u64, index: usize },

    #[error("record {index} of page {page} has no `{field}` timestamp")]
    MissingTimestamp { page: u64, index: usize, field: String },

    #[error("a full page did not move the watermark past {watermark}")]
    Stalled { watermark: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    State(#[from] trawl_state::Error),

    #[error(transparent)]
    Store(#[from] trawl_store::Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;
