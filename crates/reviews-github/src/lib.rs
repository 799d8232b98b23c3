//! Pending GitHub pull request reviews.
//!
//! [`run_reviews`] validates its arguments, builds a [`GitHubClient`], and
//! prints pull requests awaiting the user's review followed by the user's
//! own open pull requests.

pub mod client;
pub mod model;
pub mod report;

use std::io::Write;

use reviews_core::{Palette, Result};

pub use client::{GitHubClient, PullRequestSource};
pub use model::{PullRequest, Review, ReviewState};
pub use report::{GitHubReport, GitHubReporter};

/// Settings for [`run_reviews`].
#[derive(Debug, Clone, Default)]
pub struct GitHubOptions {
    /// Personal access token; anonymous access when `None`.
    pub token: Option<String>,
    /// GitHub Enterprise API root; api.github.com when `None`.
    pub api_url: Option<String>,
    pub palette: Palette,
}

/// List pull requests in `owner/repo` that `username` should look at,
/// printing the report to `out`.
///
/// # Errors
///
/// Returns [`ReviewsError::Argument`](reviews_core::ReviewsError::Argument)
/// if any argument is empty, before any request is made.
pub async fn run_reviews(
    owner: &str,
    repo: &str,
    username: &str,
    options: &GitHubOptions,
    out: &mut dyn Write,
) -> Result<GitHubReport> {
    report::require_all(&[owner, repo, username])?;

    let client = GitHubClient::new(options.token.as_deref(), options.api_url.as_deref())?;
    GitHubReporter::new(client, options.palette)
        .run_reviews(owner, repo, username, out)
        .await
}
