//! HTTP client for the external row store
//!
//! Speaks a minimal append protocol: `POST <endpoint>` with body
//! `{"row": ["cell", ...]}` and a bearer token. Any 2xx response means the
//! row was durably appended.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use ssp_common::{Error, Result};

use super::RowStore;

/// Longest slice of an error body carried into error messages
const ERROR_BODY_LIMIT: usize = 200;

/// Row store client over HTTP
pub struct HttpRowStore {
    client: Client,
    endpoint: String,
}

impl HttpRowStore {
    /// Build a client for the given endpoint with a pre-resolved bearer token
    ///
    /// The token is attached as a default header and marked sensitive so it
    /// never surfaces in debug output.
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::Config(format!("store token is not a valid header value: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build store HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    fn classify_status(status: StatusCode, body: &str) -> Error {
        let detail = format!("store returned {}: {}", status, truncate(body));
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Error::StoreTransient(detail)
        } else {
            Error::StorePermanent(detail)
        }
    }
}

#[async_trait]
impl RowStore for HttpRowStore {
    async fn append_row(&self, row: &[String]) -> Result<()> {
        debug!(cells = row.len(), "appending row to external store");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "row": row }))
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "row appended");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Self::classify_status(status, &body))
    }
}

/// Map a request-level failure onto the transient/permanent taxonomy
///
/// Timeouts and connect failures are transient; anything else (bad request
/// construction, redirect loops) will not improve on retry.
fn classify_request_error(err: reqwest::Error) -> Error {
    if err.is_timeout() || err.is_connect() {
        Error::StoreTransient(format!("store request failed: {}", err))
    } else {
        Error::StorePermanent(format!("store request failed: {}", err))
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
