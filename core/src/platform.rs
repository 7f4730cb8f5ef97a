//! Platform abstraction traits
//!
//! These traits define the boundary between the token engine and the
//! concrete transport, clock, signer and configuration source supplied by the
//! embedding binary. All of them are `Send + Sync` so one `TokenContext` can be
//! shared across tasks.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// HTTP client for outbound requests to the GitHub API
///
/// Implementations must report connectivity failures (connect, timeout,
/// interrupted body) as [`ApiError::Transport`](crate::error::ApiError::Transport)
/// so the retry policy can tell them apart from fatal errors. Any HTTP status,
/// including 4xx and 5xx, is a successful call and is returned as a response.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse>;
    async fn post(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<HttpResponse>;
}

/// HTTP response from an outbound request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Parse body as UTF-8 string, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Clock for current time (enables testing with deterministic timestamps)
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}

/// Signs GitHub App JWTs
///
/// The assertion must be valid from `issued_at` until
/// `issued_at + validity_mins` minutes.
#[async_trait]
pub trait JwtSigner: Send + Sync {
    async fn sign_app_jwt(&self, issued_at: i64, validity_mins: u32) -> Result<String>;
}

#[async_trait]
impl<T: JwtSigner + ?Sized> JwtSigner for std::sync::Arc<T> {
    async fn sign_app_jwt(&self, issued_at: i64, validity_mins: u32) -> Result<String> {
        (**self).sign_app_jwt(issued_at, validity_mins).await
    }
}

/// Environment/secrets access
pub trait Environment {
    fn get_var(&self, name: &str) -> Result<String>;
    fn get_secret(&self, name: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        let ok = HttpResponse { status: 201, body: Vec::new() };
        let missing = HttpResponse { status: 404, body: Vec::new() };
        assert!(ok.is_success());
        assert!(!missing.is_success());
    }

    #[test]
    fn test_response_text_is_lossy() {
        let response = HttpResponse {
            status: 500,
            body: vec![b'o', b'k', 0xff],
        };
        assert_eq!(response.text(), "ok\u{fffd}");
    }
}
