use super::{Download, DownloadFuture, Method, Query, Transport, TransportFuture};
use crate::errors::{ApiError, RegistryError};
use std::collections::HashMap;
use std::time::Duration;

const JSON_CONTENT_TYPE: &str = "application/json";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport layer for communicating with the registry.
#[derive(Clone, Debug)]
pub(crate) struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
    auth_token: Option<String>,
    headers: HashMap<String, String>,
    timeout: Duration,
}

/// Settings the builder hands to [`HttpTransport::new`].
#[derive(Default)]
pub(crate) struct TransportConfig {
    pub auth_token: Option<String>,
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
    pub http_client: Option<reqwest::Client>,
}

impl HttpTransport {
    pub fn new(base_url: &str, config: TransportConfig) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = config.http_client.unwrap_or_else(reqwest::Client::new);

        Self {
            base_url,
            client,
            auth_token: config.auth_token,
            headers: config.headers,
            timeout: config.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        self.apply_headers_accepting(req, JSON_CONTENT_TYPE)
    }

    fn apply_headers_accepting(
        &self,
        mut req: reqwest::RequestBuilder,
        accept: &str,
    ) -> reqwest::RequestBuilder {
        req = req.header("Accept", accept).timeout(self.timeout);

        if let Some(ref token) = self.auth_token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        for (key, value) in &self.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        req
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Query,
        body: Option<serde_json::Value>,
    ) -> crate::Result<Option<serde_json::Value>> {
        let url = self.url(path);
        let mut req = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        if !query.is_empty() {
            req = req.query(&query);
        }
        if let Some(ref body) = body {
            // .json() sets Content-Type: application/json
            req = req.json(body);
        }

        tracing::debug!(method = %method, path = %path, "registry request");

        let response = self.apply_headers(req).send().await.map_err(|e| {
            tracing::warn!(method = %method, path = %path, error = %e, "registry unreachable");
            RegistryError::from(e)
        })?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            tracing::warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                "registry request failed"
            );
            return Err(ApiError::from_status(status.as_u16(), &bytes).into());
        }

        if bytes.is_empty() {
            return Ok(None);
        }

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            RegistryError::Serialization(format!(
                "failed to parse response: {} (body: {})",
                e,
                String::from_utf8_lossy(&bytes)
            ))
        })
    }
}

impl HttpTransport {
    async fn fetch_bytes(&self, path: &str, query: Query) -> crate::Result<Option<Download>> {
        let mut req = self.client.get(self.url(path));
        if !query.is_empty() {
            req = req.query(&query);
        }

        tracing::debug!(path = %path, "registry download");

        let response = self
            .apply_headers_accepting(req, "*/*")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(path = %path, error = %e, "registry unreachable");
                RegistryError::from(e)
            })?;
        let status = response.status();
        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        let content_type = header(reqwest::header::CONTENT_TYPE);
        let file_name = header(reqwest::header::CONTENT_DISPOSITION)
            .as_deref()
            .and_then(super::attachment_file_name);
        let bytes = response.bytes().await?;

        if !status.is_success() {
            tracing::warn!(path = %path, status = status.as_u16(), "registry download failed");
            return Err(ApiError::from_status(status.as_u16(), &bytes).into());
        }
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        Ok(Some(Download {
            content_type,
            file_name,
            bytes: bytes.to_vec(),
        }))
    }
}

impl Transport for HttpTransport {
    fn request(
        &self,
        method: Method,
        path: &str,
        query: Query,
        body: Option<serde_json::Value>,
    ) -> TransportFuture<'_> {
        let path = path.to_string();
        Box::pin(async move { self.send(method, &path, query, body).await })
    }

    fn download(&self, path: &str, query: Query) -> DownloadFuture<'_> {
        let path = path.to_string();
        Box::pin(async move { self.fetch_bytes(&path, query).await })
    }
}
