// src/client/mod.rs

use anyhow::{Context, Result};
use reqwest::Client;
use std::env;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Environment override for the API root. Resolved once at startup via
/// [`Config::from_env`] and injected; never read again after construction.
pub const API_ROOT_ENV: &str = "RESULTS_API_URL";

/// Root used when no override is present: relative to the current location,
/// matching the consumed API's default.
const DEFAULT_API_ROOT: &str = ".";

const REQUEST_TIMEOUT: Duration = Duration::from_millis(50_000);

/// Transport configuration, fixed for the lifetime of a [`ResultsClient`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL the `/results` tree hangs off.
    pub api_root: String,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    /// Resolve the optional `RESULTS_API_URL` override.
    pub fn from_env() -> Self {
        let api_root =
            env::var(API_ROOT_ENV).unwrap_or_else(|_| DEFAULT_API_ROOT.to_string());
        Self {
            api_root,
            ..Self::default()
        }
    }
}

/// HTTP client bound to `{api_root}/results`.
///
/// Immutable once constructed; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ResultsClient {
    http: Client,
    base: String,
}

impl ResultsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("building HTTP client")?;
        let base = format!("{}/results", config.api_root.trim_end_matches('/'));
        Ok(Self { http, base })
    }

    /// GET `path` under the results base and decode the body with the given
    /// strategy.
    ///
    /// Transport failures (unparseable request URL, network error, non-2xx
    /// status, timeout) propagate unchanged; whatever `decode` returns is
    /// the caller's payload.
    pub async fn get_with<T, F>(&self, path: &str, decode: F) -> Result<T>
    where
        F: FnOnce(&str) -> Result<T>,
    {
        let url = Url::parse(&format!("{}/{}", self.base, path))
            .with_context(|| format!("invalid request URL for {path}"))?;
        debug!(%url, "GET");
        let body = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .with_context(|| format!("non-success status from {url}"))?
            .text()
            .await
            .with_context(|| format!("reading body from {url}"))?;
        decode(&body)
    }
}
