//! GitHub API module
//!
//! Handles GitHub App authentication and the installation endpoints.

pub mod api;
pub mod auth;
