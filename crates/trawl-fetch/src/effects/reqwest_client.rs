use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use super::{ApiClient, ApiResponse};
use crate::error::{FetchError, Result};

pub const DEFAULT_BASE_URL: &str = "https://ipaas.sigparser.com";

const API_KEY_HEADER: &str = "x-api-key";

/// Production API client. Sends the API key on every request.
pub struct ReqwestClient {
    client:   Client,
    base_url: String,
}

impl ReqwestClient {
    pub fn new(base_url: impl Into<String>, api_key: &str) -> Result<Self> {
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| FetchError::InvalidConfig("API key contains characters not allowed in a header".into()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String { format!("{}/{}", self.base_url, path.trim_start_matches('/')) }
}

impl ApiClient for ReqwestClient {
    type Error = reqwest::Error;

    async fn post_json(&self, path: &str, body: &Value) -> std::result::Result<ApiResponse, Self::Error> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}
