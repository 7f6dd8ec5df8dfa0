#[cfg(test)]
pub mod mock;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Environment variable carrying the access token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Maximum number of attempts for the tag listing request
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (100ms, 200ms, 400ms)
const BASE_DELAY_MS: u64 = 100;

/// Read the access token from the environment.
pub fn token_from_env() -> Result<String> {
    std::env::var(TOKEN_ENV)
        .ok()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| anyhow!("{} env var is not set", TOKEN_ENV))
}

/// A repository addressed as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("repository must be in owner/name form")]
pub struct InvalidRepoId;

impl FromStr for RepoId {
    type Err = InvalidRepoId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(InvalidRepoId),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// An existing tag reference: the tag name (without the `refs/tags/`
/// prefix) and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub name: String,
    pub commit: String,
}

/// Where tags live. The real store talks to the GitHub REST API; tests
/// substitute [`mock::MockTagStore`].
#[async_trait]
pub trait TagStore: Send + Sync {
    /// All existing tag references in the repository.
    async fn list_tags(&self) -> Result<Vec<TagRef>>;

    /// Create a new tag reference at the given commit. Not idempotent:
    /// implementations must attempt it exactly once.
    async fn create_tag(&self, tag_name: &str, commit_sha: &str) -> Result<()>;

    /// Store name for display
    fn name(&self) -> &'static str;
}

pub struct GitHubTagStore {
    client: Client,
    api_url: String,
    repo: RepoId,
}

impl fmt::Debug for GitHubTagStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubTagStore")
            .field("api_url", &self.api_url)
            .field("repo", &self.repo)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct RefObject {
    #[serde(rename = "ref")]
    name: String,
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

impl GitHubTagStore {
    pub fn new(token: &str, repo: RepoId) -> Result<Self> {
        Self::with_api_url("https://api.github.com".to_string(), token, repo)
    }

    /// Point the store at a different API base, for tests and GitHub
    /// Enterprise installs.
    pub fn with_api_url(api_url: String, token: &str, repo: RepoId) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| anyhow!("access token contains invalid header characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let client = Client::builder()
            .gzip(true)
            .user_agent(concat!("autotag/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow!("failed to create HTTP client: {e}"))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            repo,
        })
    }
}

#[async_trait]
impl TagStore for GitHubTagStore {
    async fn list_tags(&self) -> Result<Vec<TagRef>> {
        let url = format!(
            "{}/repos/{}/{}/git/matching-refs/tags",
            self.api_url, self.repo.owner, self.repo.name
        );

        let response = get_with_retry(&self.client, &url).await?;

        // No matching refs at all comes back as 404 on some deployments
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            return Err(anyhow!(api_error_message(
                response.status(),
                "list tags for",
                &self.repo,
                read_api_message(response).await,
            )));
        }

        let refs: Vec<RefObject> = response.json().await?;

        Ok(refs
            .into_iter()
            .map(|r| {
                let name = r
                    .name
                    .strip_prefix("refs/tags/")
                    .unwrap_or(&r.name)
                    .to_string();
                TagRef {
                    name,
                    commit: r.object.sha,
                }
            })
            .collect())
    }

    async fn create_tag(&self, tag_name: &str, commit_sha: &str) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/git/refs",
            self.api_url, self.repo.owner, self.repo.name
        );
        let body = json!({
            "ref": format!("refs/tags/{tag_name}"),
            "sha": commit_sha,
        });

        // Exactly one attempt: ref creation is not idempotent
        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(api_error_message(
                response.status(),
                "create tag in",
                &self.repo,
                read_api_message(response).await,
            )));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "GitHub"
    }
}

/// Execute an HTTP GET request with retry and exponential backoff.
/// Retries on transient errors (network issues, 5xx server errors);
/// client errors are returned as-is.
async fn get_with_retry(client: &Client, url: &str) -> Result<Response, reqwest::Error> {
    let mut last_error = None;

    for attempt in 0..MAX_RETRIES {
        match client.get(url).send().await {
            Ok(response) => {
                if !response.status().is_server_error() || attempt == MAX_RETRIES - 1 {
                    return Ok(response);
                }
            }
            Err(e) => {
                if attempt == MAX_RETRIES - 1 {
                    return Err(e);
                }
                last_error = Some(e);
            }
        }

        let delay = Duration::from_millis(BASE_DELAY_MS * (1 << attempt));
        tokio::time::sleep(delay).await;
    }

    // The loop always returns on the last attempt
    Err(last_error.unwrap())
}

/// Best-effort extraction of the `message` field GitHub puts in error bodies.
async fn read_api_message(response: Response) -> Option<String> {
    response
        .json::<ApiError>()
        .await
        .ok()
        .and_then(|e| e.message)
}

/// Turn an API failure into something a user can act on.
fn api_error_message(
    status: StatusCode,
    action: &str,
    repo: &RepoId,
    detail: Option<String>,
) -> String {
    let code = status.as_u16();
    let base = match code {
        401 => format!(
            "Failed to {} '{}': bad credentials (HTTP 401). Check the {} token.",
            action, repo, TOKEN_ENV
        ),
        403 => format!(
            "Failed to {} '{}': access denied (HTTP 403). The token may lack permission or the request may be rate limited.",
            action, repo
        ),
        404 => format!(
            "Failed to {} '{}': not found (HTTP 404). Check the repository name and that the token can see it.",
            action, repo
        ),
        422 => format!(
            "Failed to {} '{}': request rejected (HTTP 422). The reference may already exist or the commit may be unknown.",
            action, repo
        ),
        500..=599 => format!(
            "Failed to {} '{}': server error (HTTP {}). GitHub may be experiencing issues.",
            action, repo, code
        ),
        _ => format!(
            "Failed to {} '{}': HTTP {} {}",
            action,
            repo,
            code,
            status.canonical_reason().unwrap_or("Unknown error")
        ),
    };

    match detail {
        Some(message) => format!("{} ({})", base, message),
        None => base,
    }
}
