//! The remote API seam.

use std::future::Future;

use serde_json::Value;

#[cfg(feature = "reqwest")]
mod reqwest_client;

#[cfg(feature = "reqwest")]
pub use reqwest_client::{DEFAULT_BASE_URL, ReqwestClient};

/// Status and body of one API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body:   String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// Minimal "send request, get status + body" capability the page loop runs on.
///
/// Implementations own authentication, timeouts and transport details. A non-2xx
/// status is not an error at this layer; the caller decides.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - Scripted clients in tests
pub trait ApiClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// POST `body` as JSON to `path` (relative to the client's base URL).
    fn post_json(
        &self,
        path: &str,
        body: &Value,
    ) -> impl Future<Output = std::result::Result<ApiResponse, Self::Error>> + Send;
}

impl<T: ApiClient> ApiClient for &T {
    type Error = T::Error;

    fn post_json(
        &self,
        path: &str,
        body: &Value,
    ) -> impl Future<Output = std::result::Result<ApiResponse, Self::Error>> + Send {
        (**self).post_json(path, body)
    }
}
