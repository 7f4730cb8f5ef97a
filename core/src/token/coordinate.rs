//! Repository coordinates
//!
//! A coordinate is an `owner/name` pair restricted to `[A-Za-z0-9_.-]`. It is
//! validated before it reaches any cache key, URL or network call.

use std::fmt;

use crate::error::{ApiError, Result};

/// A validated `owner/name` repository coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoCoordinate {
    owner: String,
    name: String,
}

impl RepoCoordinate {
    /// Validate `owner` and `name`, stripping a trailing `.git` from `name`
    pub fn new(owner: &str, name: &str) -> Result<Self> {
        let name = name.strip_suffix(".git").unwrap_or(name);
        validate_part("owner", owner)?;
        validate_part("repository name", name)?;
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Decompose a repository URL.
    ///
    /// `https://github.com/{owner}/{name}[/...]` and
    /// `https://api.github.com/repos/{owner}/{name}[/...]` are both accepted:
    /// on `api.` hosts the first path segment is skipped.
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = url::Url::parse(raw)
            .map_err(|e| ApiError::invalid_request(format!("invalid repository URL '{}': {}", raw, e)))?;

        let skip = match url.host_str() {
            Some(host) if host.starts_with("api.") => 1,
            Some(_) => 0,
            None => {
                return Err(ApiError::invalid_request(format!(
                    "repository URL '{}' has no host",
                    raw
                )))
            }
        };

        let mut segments = url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .skip(skip);

        match (segments.next(), segments.next()) {
            (Some(owner), Some(name)) => Self::new(owner, name),
            _ => Err(ApiError::invalid_request(format!(
                "repository URL '{}' does not name an owner and repository",
                raw
            ))),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cache key, `owner/name`
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RepoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn validate_part(label: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ApiError::invalid_request(format!("{} cannot be empty", label)));
    }

    if let Some(c) = value
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '-'))
    {
        return Err(ApiError::invalid_request(format!(
            "{} contains invalid character: {:?}",
            label, c
        )));
    }

    Ok(())
}
