use async_trait::async_trait;
use reviews_core::{Result, ReviewsError};
use tracing::{debug, error};

use crate::model::{PullRequest, Review};

/// Where pull requests and their reviews come from.
///
/// [`GitHubClient`] talks to the REST API; tests use canned data.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// The first page of open pull requests for `owner/repo`.
    async fn list_open_pulls(&self, owner: &str, repo: &str) -> Result<Vec<PullRequest>>;

    /// Submitted reviews for pull request `number`.
    async fn list_reviews(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<Review>>;
}

/// GitHub REST client for listing pull requests and reviews.
///
/// # Examples
///
/// ```no_run
/// use reviews_github::client::GitHubClient;
///
/// # async fn demo() -> reviews_core::Result<()> {
/// let client = GitHubClient::new(Some("ghp_xxxx"), None)?;
/// # Ok(())
/// # }
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
}

impl GitHubClient {
    /// Create a client, authenticated when `token` is given and anonymous otherwise.
    ///
    /// `api_url` points at a GitHub Enterprise API root; `None` uses api.github.com.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewsError::Transport`] if the URL is invalid or the client
    /// cannot be built.
    pub fn new(token: Option<&str>, api_url: Option<&str>) -> Result<Self> {
        let build_error = |e: octocrab::Error| ReviewsError::Transport {
            command: "build GitHub client".into(),
            message: e.to_string(),
        };

        let mut builder = octocrab::Octocrab::builder();
        if let Some(token) = token {
            builder = builder.personal_token(token.to_string());
        }
        if let Some(url) = api_url {
            builder = builder.base_uri(url).map_err(build_error)?;
        }

        let octocrab = builder.build().map_err(build_error)?;
        Ok(Self { octocrab })
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    async fn list_open_pulls(&self, owner: &str, repo: &str) -> Result<Vec<PullRequest>> {
        let route = format!("/repos/{owner}/{repo}/pulls");
        debug!(%route, "listing open pull requests");
        self.octocrab
            .get(&route, Some(&[("state", "open")]))
            .await
            .map_err(|e| api_error(&route, e))
    }

    async fn list_reviews(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<Review>> {
        let route = format!("/repos/{owner}/{repo}/pulls/{number}/reviews");
        debug!(%route, "listing reviews");
        self.octocrab
            .get(&route, None::<&()>)
            .await
            .map_err(|e| api_error(&route, e))
    }
}

/// API error payloads carry a message worth showing as-is; everything else is transport.
fn api_error(route: &str, err: octocrab::Error) -> ReviewsError {
    match err {
        octocrab::Error::GitHub { source, .. } => ReviewsError::Remote(source.message.clone()),
        octocrab::Error::Json { source, .. } => {
            ReviewsError::MalformedResponse(format!("GET {route}: {source}"))
        }
        octocrab::Error::Serde { source, .. } => {
            ReviewsError::MalformedResponse(format!("GET {route}: {source}"))
        }
        other => {
            error!(%route, "GitHub request failed: {other}");
            ReviewsError::Transport {
                command: format!("GET {route}"),
                message: other.to_string(),
            }
        }
    }
}
