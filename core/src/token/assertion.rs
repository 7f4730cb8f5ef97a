//! App JWT lifecycle
//!
//! Keeps one signed assertion and re-signs it lazily when it is about to
//! expire.

use parking_lot::RwLock;
use tracing::debug;

use crate::config::REFRESH_BUFFER_SECS;
use crate::error::Result;
use crate::platform::JwtSigner;

#[derive(Clone)]
struct Assertion {
    jwt: String,
    issued_at: i64,
}

/// Holds the current App JWT and its issue time
pub struct AssertionManager {
    signer: Box<dyn JwtSigner>,
    validity_mins: u32,
    current: RwLock<Option<Assertion>>,
}

impl AssertionManager {
    pub fn new(signer: Box<dyn JwtSigner>, validity_mins: u32) -> Self {
        Self {
            signer,
            validity_mins,
            current: RwLock::new(None),
        }
    }

    /// Issue time of the current assertion, if one was signed yet
    pub fn issued_at(&self) -> Option<i64> {
        self.current.read().as_ref().map(|a| a.issued_at)
    }

    /// Return a JWT with more than the refresh buffer of life left, signing a
    /// new one if needed.
    ///
    /// Concurrent callers may both re-sign; the last write wins and either
    /// JWT is valid.
    pub async fn current(&self, now_secs: i64) -> Result<String> {
        let cached = self
            .current
            .read()
            .as_ref()
            .filter(|assertion| !self.needs_refresh(assertion, now_secs))
            .map(|assertion| assertion.jwt.clone());
        if let Some(jwt) = cached {
            return Ok(jwt);
        }

        // Backdated so a slow GitHub clock still accepts it.
        let issued_at = now_secs - REFRESH_BUFFER_SECS;
        let jwt = self.signer.sign_app_jwt(issued_at, self.validity_mins).await?;
        debug!(issued_at, "signed new App JWT");

        *self.current.write() = Some(Assertion {
            jwt: jwt.clone(),
            issued_at,
        });
        Ok(jwt)
    }

    fn needs_refresh(&self, assertion: &Assertion, now_secs: i64) -> bool {
        let expires_at = assertion.issued_at + i64::from(self.validity_mins) * 60;
        expires_at - now_secs < REFRESH_BUFFER_SECS
    }
}
