//! app-token-core: GitHub App installation tokens for repositories
//!
//! Given a repository, produces an installation access token for the GitHub
//! App installed on it, handling the App JWT, installation lookup, token
//! minting, caching, retries and fallback. Transport, clock, signer and
//! configuration source are abstract platform traits supplied by the caller.

pub mod config;
pub mod error;
pub mod github;
pub mod platform;
pub mod retry;
pub mod token;

pub use error::{ApiError, Result};
pub use token::{InstallationCredential, RepoCoordinate, TokenContext};

#[cfg(test)]
pub mod test_support;
