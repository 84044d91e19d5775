//! Shared HTTP client for the upstream API.
//!
//! Owns transport details only: URL building, timeout, status mapping and
//! turning the response body into a `serde_json::Value`. Field extraction is
//! left to the individual fetchers.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

/// Read-only handle on the upstream API. Cheap to clone; clones share one
/// connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl UpstreamClient {
    /// Create a client for the given base URL with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    /// Build the URL for a path relative to the base.
    pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::transport(format!("invalid upstream path {}: {}", path, e)))
    }

    /// Issue a GET and return the decoded JSON body.
    ///
    /// An empty body decodes to `Value::Null`. A 404 maps to
    /// `FetchError::NotFound`; any other non-2xx status is a transport error.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, FetchError> {
        let url = self.endpoint(path)?;
        debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_transport_error(&url, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(&url, e))?;

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::transport(format!(
                "upstream {} returned {}",
                url, status
            )));
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body)
            .map_err(|e| FetchError::decode(format!("invalid JSON from {}: {}", url, e)))
    }

    fn map_transport_error(&self, url: &Url, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::transport(format!(
                "request to {} timed out after {}s",
                url,
                self.timeout.as_secs()
            ))
        } else if e.is_connect() {
            FetchError::transport(format!("cannot connect to {}: {}", url, e))
        } else {
            FetchError::transport(format!("request to {} failed: {}", url, e))
        }
    }
}

/// Parse the base URL, making sure it ends with `/` so relative joins keep
/// any path prefix.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    let url = Url::parse(&normalized)
        .with_context(|| format!("Invalid upstream base URL: {}", raw))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("Upstream base URL must use http or https: {}", raw);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn client_for(base: &str) -> UpstreamClient {
        UpstreamClient::new(base, Duration::from_secs(5), "userposts-test").unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client_for("http://example.test/api/v2");
        let url = client.endpoint("/users/3").unwrap();
        assert_eq!(url.as_str(), "http://example.test/api/v2/users/3");
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(UpstreamClient::new("ftp://example.test", Duration::from_secs(1), "x").is_err());
        assert!(UpstreamClient::new("not a url", Duration::from_secs(1), "x").is_err());
    }

    #[tokio::test]
    async fn test_get_json_passes_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/posts").query_param("userId", "4");
                then.status(200).json_body(json!([{"id": 1}]));
            })
            .await;

        let client = client_for(&server.base_url());
        let value = assert_ok!(client.get_json("posts", &[("userId", "4".to_string())]).await);

        assert_eq!(value, json!([{"id": 1}]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_json_status_mapping() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/404");
                then.status(404).body("{}");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/500");
                then.status(500).body("boom");
            })
            .await;

        let client = client_for(&server.base_url());

        let err = assert_err!(client.get_json("users/404", &[]).await);
        assert!(matches!(err, FetchError::NotFound));

        let err = assert_err!(client.get_json("users/500", &[]).await);
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_get_json_body_handling() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/empty");
                then.status(200).body("");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/garbage");
                then.status(200).body("<html>nope</html>");
            })
            .await;

        let client = client_for(&server.base_url());

        assert_eq!(client.get_json("empty", &[]).await.unwrap(), Value::Null);

        let err = assert_err!(client.get_json("garbage", &[]).await);
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_get_json_unreachable_is_transport() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = client_for("http://127.0.0.1:9");
        let err = assert_err!(client.get_json("users/1", &[]).await);
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
