use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

use super::request::Request;

/// Where raw responses come from. Implemented over HTTP by [`ErgastClient`] and
/// by scripted sources in tests.
#[allow(async_fn_in_trait)]
pub trait RemoteSource {
    async fn get(&self, request: &Request) -> Result<Value>;
}

/// HTTP client for an Ergast-compatible API (e.g. the Jolpica mirror)
#[derive(Clone, Debug)]
pub struct ErgastClient {
    http: reqwest::Client,
    base_url: String,
}

/// Create a client with a per-request timeout
pub fn create_client(base_url: &str, timeout: Duration) -> Result<ErgastClient> {
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("f1-repoint/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    Ok(ErgastClient {
        http,
        base_url: base_url.trim_end_matches('/').to_string(),
    })
}

/// Full URL for a request. Ergast pages at 30 rows by default, which is
/// too few for a season's driver list.
pub fn request_url(base_url: &str, request: &Request) -> String {
    format!("{}/{}?limit=100", base_url.trim_end_matches('/'), request.path())
}

impl RemoteSource for ErgastClient {
    async fn get(&self, request: &Request) -> Result<Value> {
        let url = request_url(&self.base_url, request);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            anyhow::bail!("Rate limited by upstream API ({})", url);
        }

        response
            .error_for_status()
            .with_context(|| format!("Upstream returned {} for {}", status, url))?
            .json::<Value>()
            .await
            .with_context(|| format!("Failed to parse JSON from {}", url))
    }
}
