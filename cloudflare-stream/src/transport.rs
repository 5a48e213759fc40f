//! The HTTP seam between the client and the Cloudflare API.
//!
//! [`StreamClient`](crate::StreamClient) builds fully-formed [`ApiRequest`]s
//! (method, account-relative path, auth headers, optional JSON body) and hands
//! them to a [`Transport`]. The transport only moves bytes: it reports the
//! status code and body and leaves status interpretation to the client.

use crate::error::{Error, Result};
use eyre::Context;
use http::{HeaderName, Method, StatusCode};
use std::future::Future;

/// Default base URL of the Cloudflare v4 API.
pub const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4/";

/// A request the client wants sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, including any query string, e.g.
    /// `accounts/{id}/stream/{uid}`.
    pub path: String,
    pub headers: Vec<(HeaderName, String)>,
    /// Present only for writes.
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Whatever the remote end answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Sends a single request and returns the raw response.
///
/// Implementations must not retry; connection-level timeouts are theirs to own.
pub trait Transport: Send + Sync {
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<ApiResponse>> + Send;
}

/// [`Transport`] backed by [`reqwest`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl ReqwestTransport {
    /// Uses `client` against [`DEFAULT_BASE_URL`].
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send_inner(&self, request: ApiRequest) -> eyre::Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path.trim_start_matches('/'));
        let mut builder = self.client.request(request.method.clone(), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("send {} request to {url}", request.method))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("read body of {} {url}", request.method))?;
        Ok(ApiResponse { status, body })
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.send_inner(request)
            .await
            .map_err(|e| Error::RequestFailed {
                status: None,
                message: format!("{e:#}"),
            })
    }
}
