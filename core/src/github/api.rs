//! GitHub API calls authenticated with the App JWT
//!
//! Each call runs under the retry policy and reports a 404 as `Ok(None)`.

use serde::Deserialize;

use crate::config::{GITHUB_API_VERSION, USER_AGENT};
use crate::error::Result;
use crate::platform::HttpClient;
use crate::retry::{classify, retry_with_backoff, RetryPolicy};

/// Installation token response from GitHub
#[derive(Debug, Deserialize)]
pub struct InstallationTokenResponse {
    pub token: String,
    pub expires_at: String,
}

#[derive(Deserialize)]
struct InstallationResponse {
    id: u64,
}

/// Headers for an App-JWT authenticated request
fn app_headers(auth_header: &str) -> [(&str, &str); 4] {
    [
        ("Authorization", auth_header),
        ("Accept", "application/vnd.github+json"),
        ("User-Agent", USER_AGENT),
        ("X-GitHub-Api-Version", GITHUB_API_VERSION),
    ]
}

/// Look up the installation that covers `owner/repo`
///
/// Returns `None` when the App is not installed on the repository.
pub async fn get_repo_installation_id(
    base_url: &str,
    owner: &str,
    repo: &str,
    app_jwt: &str,
    http: &dyn HttpClient,
    retry: &RetryPolicy,
) -> Result<Option<u64>> {
    let url = format!("{}/repos/{}/{}/installation", base_url, owner, repo);
    let auth_header = format!("Bearer {}", app_jwt);
    let headers = app_headers(&auth_header);
    let (url, headers) = (&url, &headers);

    let installation = retry_with_backoff(retry, move |_| async move {
        classify(http.get(url, headers).await).json::<InstallationResponse>()
    })
    .await?;

    Ok(installation.map(|i| i.id))
}

/// Mint an installation access token
///
/// Returns `None` when the installation no longer exists.
pub async fn create_installation_token(
    base_url: &str,
    installation_id: u64,
    app_jwt: &str,
    http: &dyn HttpClient,
    retry: &RetryPolicy,
) -> Result<Option<InstallationTokenResponse>> {
    let url = format!(
        "{}/app/installations/{}/access_tokens",
        base_url, installation_id
    );
    let auth_header = format!("Bearer {}", app_jwt);
    let headers = app_headers(&auth_header);
    let (url, headers) = (&url, &headers);

    retry_with_backoff(retry, move |_| async move {
        classify(http.post(url, headers, b"{}").await).json::<InstallationTokenResponse>()
    })
    .await
}

/// List the ids of every installation of the App, in the order GitHub returns them
pub async fn list_installations(
    base_url: &str,
    app_jwt: &str,
    http: &dyn HttpClient,
    retry: &RetryPolicy,
) -> Result<Vec<u64>> {
    let url = format!("{}/app/installations?per_page=100", base_url);
    let auth_header = format!("Bearer {}", app_jwt);
    let headers = app_headers(&auth_header);
    let (url, headers) = (&url, &headers);

    let installations = retry_with_backoff(retry, move |_| async move {
        classify(http.get(url, headers).await).json::<Vec<InstallationResponse>>()
    })
    .await?;

    // The endpoint exists for every App; a 404 means "nothing to list".
    Ok(installations
        .unwrap_or_default()
        .into_iter()
        .map(|i| i.id)
        .collect())
}
