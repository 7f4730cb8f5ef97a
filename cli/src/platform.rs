//! Native platform implementations
//!
//! Implements core platform traits using native Rust libraries:
//! - HttpClient: reqwest
//! - Clock: std::time::SystemTime
//! - Environment: command-line overrides + process environment

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use app_token_core::error::{ApiError, Result};
use app_token_core::platform::{Clock, Environment, HttpClient, HttpResponse};

/// reqwest-based HTTP client
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn send(
        &self,
        mut builder: reqwest::RequestBuilder,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let response = builder.send().await.map_err(classify_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify_error)?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// Connectivity problems are transient; anything else (bad URL, redirect
/// loop, builder error) will not improve on retry.
fn classify_error(e: reqwest::Error) -> ApiError {
    if e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() {
        ApiError::transport(e.to_string())
    } else {
        ApiError::upstream_error(format!("HTTP request failed: {}", e))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.send(self.client.get(url), headers).await
    }

    async fn post(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<HttpResponse> {
        self.send(self.client.post(url).body(body.to_vec()), headers).await
    }
}

/// System clock using std::time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}

/// Process environment, with values from command-line flags taking precedence
pub struct ProcessEnv {
    overrides: HashMap<String, String>,
    masked: HashSet<String>,
}

impl ProcessEnv {
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
            masked: HashSet::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.overrides.insert(name.to_string(), value.into());
    }

    /// Hide `name` from the process environment, as if it were unset
    pub fn mask(&mut self, name: &str) {
        self.masked.insert(name.to_string());
    }

    fn lookup(&self, name: &str) -> Option<String> {
        if let Some(value) = self.overrides.get(name) {
            return Some(value.clone()).filter(|value| !value.is_empty());
        }
        if self.masked.contains(name) {
            return None;
        }
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }
}

impl Environment for ProcessEnv {
    fn get_var(&self, name: &str) -> Result<String> {
        self.lookup(name)
            .ok_or_else(|| ApiError::internal(format!("environment variable '{}' not set", name)))
    }

    fn get_secret(&self, name: &str) -> Result<String> {
        self.lookup(name)
            .ok_or_else(|| ApiError::internal(format!("secret '{}' not set", name)))
    }
}
