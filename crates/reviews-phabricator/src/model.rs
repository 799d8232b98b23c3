use reviews_core::{Result, ReviewsError};
use serde::{Deserialize, Deserializer, Serialize};

/// Envelope returned by `arc call-conduit`.
///
/// Exactly one of `error` and `response` is set by a well-behaved server.
///
/// # Examples
///
/// ```
/// use reviews_phabricator::model::ConduitResponse;
///
/// let raw = r#"{"error":"ERR-CONDUIT-CORE","errorMessage":"Bad token","response":null}"#;
/// let resp: ConduitResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();
/// assert_eq!(resp.into_result().unwrap_err().to_string(), "Bad token");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConduitResponse<T> {
    /// Error code, if the call failed.
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable error text, if the call failed.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Result payload, if the call succeeded.
    pub response: Option<T>,
}

impl<T> ConduitResponse<T> {
    /// Unwrap the payload, turning an error envelope into [`ReviewsError::Remote`].
    pub fn into_result(self) -> Result<T> {
        match (self.error, self.response) {
            (None, Some(response)) => Ok(response),
            (error, _) => {
                let message = self
                    .error_message
                    .filter(|m| !m.is_empty())
                    .or(error)
                    .unwrap_or_else(|| "conduit returned an empty response".into());
                Err(ReviewsError::Remote(message))
            }
        }
    }
}

/// One page of results from a `*.search` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cursor<T> {
    pub data: Vec<T>,
}

/// A differential revision as returned by `differential.revision.search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Numeric id, shown as `D<id>`.
    pub id: u64,
    pub fields: RevisionFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionFields {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "authorPHID")]
    pub author_phid: String,
    pub status: RevisionStatus,
    /// Only a non-empty string counts as a bug id.
    #[serde(
        rename = "bugzilla.bug-id",
        default,
        deserialize_with = "non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub bug_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionStatus {
    /// Machine value such as `needs-review` or `accepted`.
    pub value: String,
    /// Display name such as `Needs Review`.
    pub name: String,
    #[serde(default)]
    pub closed: bool,
}

impl Revision {
    pub fn bug_id(&self) -> Option<&str> {
        self.fields.bug_id.as_deref()
    }

    /// Numeric bug id used for ordering; missing or non-numeric ids are 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use reviews_phabricator::model::Revision;
    ///
    /// let rev: Revision = serde_json::from_value(serde_json::json!({
    ///     "id": 1,
    ///     "fields": {
    ///         "title": "Fix",
    ///         "authorPHID": "PHID-USER-a",
    ///         "status": { "value": "accepted", "name": "Accepted", "closed": false },
    ///         "bugzilla.bug-id": "1700000"
    ///     }
    /// })).unwrap();
    /// assert_eq!(rev.bug_sort_key(), 1_700_000);
    /// ```
    pub fn bug_sort_key(&self) -> u64 {
        self.bug_id()
            .and_then(|id| id.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// The account `arc` is authenticated as, from `user.whoami`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhabricatorUser {
    pub phid: String,
    pub user_name: String,
}

fn non_empty_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}
