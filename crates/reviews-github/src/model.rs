use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A GitHub account reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

/// The head branch of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

/// An open pull request, as returned by `GET /repos/{owner}/{repo}/pulls`.
///
/// Deserializes GitHub's snake_case payload and serializes with camelCase keys.
///
/// # Examples
///
/// ```
/// use reviews_github::model::PullRequest;
///
/// let pr: PullRequest = serde_json::from_value(serde_json::json!({
///     "number": 12,
///     "title": "Add feature",
///     "html_url": "https://github.com/o/r/pull/12",
///     "user": { "login": "alice" },
///     "head": { "ref": "feature" },
///     "draft": false,
///     "requested_reviewers": [{ "login": "bob" }]
/// })).unwrap();
/// assert_eq!(pr.author_login(), "alice");
/// assert!(pr.is_review_requested_from("bob"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub user: Option<GitHubUser>,
    pub head: HeadRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub draft: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requested_reviewers: Vec<GitHubUser>,
}

impl PullRequest {
    /// Author login, or `unknown` for deleted accounts.
    pub fn author_login(&self) -> &str {
        self.user.as_ref().map_or("unknown", |u| u.login.as_str())
    }

    pub fn is_review_requested_from(&self, login: &str) -> bool {
        self.requested_reviewers.iter().any(|r| r.login == login)
    }
}

/// A submitted review, from `GET /repos/{owner}/{repo}/pulls/{number}/reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub state: ReviewState,
    #[serde(default)]
    pub user: Option<GitHubUser>,
}

impl Review {
    pub fn reviewer_login(&self) -> &str {
        self.user.as_ref().map_or("unknown", |u| u.login.as_str())
    }
}

/// Review verdict. Unknown values are kept verbatim.
///
/// # Examples
///
/// ```
/// use reviews_github::model::ReviewState;
///
/// let state: ReviewState = serde_json::from_str("\"CHANGES_REQUESTED\"").unwrap();
/// assert_eq!(state, ReviewState::ChangesRequested);
/// assert_eq!(state.to_string(), "CHANGES_REQUESTED");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReviewState {
    Approved,
    Commented,
    ChangesRequested,
    Dismissed,
    Pending,
    Other(String),
}

impl ReviewState {
    pub fn as_str(&self) -> &str {
        match self {
            ReviewState::Approved => "APPROVED",
            ReviewState::Commented => "COMMENTED",
            ReviewState::ChangesRequested => "CHANGES_REQUESTED",
            ReviewState::Dismissed => "DISMISSED",
            ReviewState::Pending => "PENDING",
            ReviewState::Other(s) => s,
        }
    }
}

impl From<String> for ReviewState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "APPROVED" => ReviewState::Approved,
            "COMMENTED" => ReviewState::Commented,
            "CHANGES_REQUESTED" => ReviewState::ChangesRequested,
            "DISMISSED" => ReviewState::Dismissed,
            "PENDING" => ReviewState::Pending,
            _ => ReviewState::Other(s),
        }
    }
}

impl From<ReviewState> for String {
    fn from(state: ReviewState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
