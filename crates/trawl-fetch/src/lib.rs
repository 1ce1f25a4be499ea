//! Watermark-driven paginated ingestion.
//!
//! # Architecture
//!
//! - [`data`] - Immutable run configuration, resource descriptors and progress types
//! - [`effects`] - The remote API seam ([`ApiClient`]) and its reqwest implementation
//! - [`Ingestor`] - The page loop tying the API to the checkpoint and staging stores
//!
//! # Crash safety
//!
//! Every record of a page is staged before the page's watermark is checkpointed.
//! A run interrupted anywhere re-fetches at most the last page, and re-staging is
//! idempotent because records are keyed by identity.

pub mod data;
pub mod effects;
mod error;
mod ingest;

pub use data::{
    ContactExpansions, DEFAULT_PAGE_SIZE, FetchOptions, LoopState, MetricsScope, Progress, Resource,
    RunSummary,
};
pub use effects::{ApiClient, ApiResponse};
pub use error::{FetchError, Result};
pub use ingest::Ingestor;

#[cfg(feature = "reqwest")]
pub use effects::{DEFAULT_BASE_URL, ReqwestClient};
