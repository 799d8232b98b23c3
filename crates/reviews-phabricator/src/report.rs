use std::io::Write;
use std::sync::LazyLock;

use regex::Regex;
use reviews_core::{LinkConfig, Palette, Result, ReviewsError};
use serde::Serialize;
use serde_json::json;

use crate::conduit::Conduit;
use crate::model::{ConduitResponse, Cursor, PhabricatorUser, Revision};

/// Saved query used to list revisions.
pub const ACTIVE_QUERY: &str = "active";

/// Status value of revisions waiting on a reviewer.
pub const NEEDS_REVIEW: &str = "needs-review";

const STATUS_WIDTH: usize = 11;

static WIP_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)WIP(?-u:\b)").expect("valid WIP regex"));

pub(crate) const MISSING_REPO_DIR: &str =
    "The first argument must be the path to the gecko directory where arcanist is configured.";
pub(crate) const MISSING_USER_PHID: &str =
    "The second argument must be the PHID of the user running the command.";

/// Revisions split by who needs to act on them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionReport {
    /// The user's own revisions that are not marked WIP.
    pub mine: Vec<Revision>,
    /// Other authors' revisions waiting for review.
    pub others: Vec<Revision>,
}

impl RevisionReport {
    pub fn is_empty(&self) -> bool {
        self.mine.is_empty() && self.others.is_empty()
    }
}

/// Whether `title` carries `WIP` as a whole word.
///
/// # Examples
///
/// ```
/// use reviews_phabricator::report::is_work_in_progress;
///
/// assert!(is_work_in_progress("WIP fix"));
/// assert!(!is_work_in_progress("Fix WIPER bug"));
/// ```
pub fn is_work_in_progress(title: &str) -> bool {
    WIP_MARKER.is_match(title)
}

/// Stable ascending sort by numeric bug id.
pub fn sort_by_bug(revisions: &mut [Revision]) {
    revisions.sort_by_key(Revision::bug_sort_key);
}

/// Split `revisions` into the user's own and those awaiting their review.
///
/// Order is preserved within each partition. A revision may land in neither.
pub fn partition(revisions: &[Revision], user_phid: &str) -> RevisionReport {
    let mine = revisions
        .iter()
        .filter(|rev| {
            rev.fields.author_phid == user_phid
                && (rev.fields.title.is_empty() || !is_work_in_progress(&rev.fields.title))
        })
        .cloned()
        .collect();

    let others = revisions
        .iter()
        .filter(|rev| rev.fields.author_phid != user_phid && rev.fields.status.value == NEEDS_REVIEW)
        .cloned()
        .collect();

    RevisionReport { mine, others }
}

pub(crate) fn require(value: &str, message: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ReviewsError::Argument(message.into()));
    }
    Ok(())
}

/// Renders revision lists as a terminal report.
#[derive(Debug, Clone)]
pub struct RevisionPrinter<'a> {
    palette: Palette,
    links: &'a LinkConfig,
}

impl<'a> RevisionPrinter<'a> {
    pub fn new(palette: Palette, links: &'a LinkConfig) -> Self {
        Self { palette, links }
    }

    /// Print the non-empty sections of `report`.
    pub fn print_report(&self, out: &mut dyn Write, report: &RevisionReport) -> std::io::Result<()> {
        if !report.mine.is_empty() {
            self.print_header(out, "Mine")?;
            self.print_list(out, &report.mine)?;
        }
        if !report.others.is_empty() {
            self.print_header(out, "Others")?;
            self.print_list(out, &report.others)?;
        }
        Ok(())
    }

    fn print_header(&self, out: &mut dyn Write, text: &str) -> std::io::Result<()> {
        let line = format!(
            "\n======= Phabricator {text} ====================================================="
        );
        writeln!(out, "{}", self.palette.cyan(&line))
    }

    /// A bug header is printed whenever the bug changes from the previous revision.
    fn print_list(&self, out: &mut dyn Write, revisions: &[Revision]) -> std::io::Result<()> {
        let mut prev: Option<Option<&str>> = None;
        for rev in revisions {
            let this = rev.bug_id();
            if prev != Some(this) {
                self.print_bug(out, this)?;
            }
            prev = Some(this);
            self.print_revision(out, rev)?;
        }
        Ok(())
    }

    fn print_bug(&self, out: &mut dyn Write, bug_id: Option<&str>) -> std::io::Result<()> {
        match bug_id {
            Some(id) => {
                let label = self.palette.yellow(&format!("Bug {id}"));
                let url = self.palette.link(&self.links.bug_url(id));
                writeln!(out, "\n{label} - {url}\n")
            }
            None => writeln!(out, "\n{}\n", self.palette.yellow("No Bug")),
        }
    }

    fn print_revision(&self, out: &mut dyn Write, rev: &Revision) -> std::io::Result<()> {
        let status_name = rev.fields.status.name.replace("Needs Review", "Review");
        let padded = format!("{status_name:>STATUS_WIDTH$}");
        let status = if status_name == "Accepted" {
            self.palette.green(&padded)
        } else {
            self.palette.red(&padded)
        };
        writeln!(out, "{status} - {}", rev.fields.title)?;

        let indent = " ".repeat(STATUS_WIDTH + 2);
        let url = self.palette.dim_link(&self.links.revision_url(rev.id));
        writeln!(out, "{indent} {url}")
    }
}

/// Lists pending Phabricator reviews through a [`Conduit`].
pub struct PhabricatorReporter<C> {
    conduit: C,
    palette: Palette,
    links: LinkConfig,
}

impl<C: Conduit> PhabricatorReporter<C> {
    pub fn new(conduit: C, palette: Palette, links: LinkConfig) -> Self {
        Self {
            conduit,
            palette,
            links,
        }
    }

    /// Fetch active revisions, partition them for `user_phid`, and print the report.
    ///
    /// # Errors
    ///
    /// [`ReviewsError::Argument`] for an empty `user_phid` (before any I/O),
    /// [`ReviewsError::ToolNotFound`] if the transport is unavailable, and
    /// [`ReviewsError::Remote`] if the server rejects the search.
    pub async fn run_reviews(&self, user_phid: &str, out: &mut dyn Write) -> Result<RevisionReport> {
        require(user_phid, MISSING_USER_PHID)?;
        self.conduit.ensure_available().await?;

        let raw = self
            .conduit
            .call(
                "differential.revision.search",
                json!({ "queryKey": ACTIVE_QUERY }),
            )
            .await?;
        let envelope: ConduitResponse<Cursor<Revision>> = serde_json::from_value(raw)?;
        let mut revisions = envelope.into_result()?.data;
        tracing::debug!(count = revisions.len(), "fetched active revisions");

        sort_by_bug(&mut revisions);
        let report = partition(&revisions, user_phid);

        RevisionPrinter::new(self.palette, &self.links).print_report(out, &report)?;
        Ok(report)
    }

    /// Look up the account the conduit client is authenticated as.
    pub async fn current_user(&self) -> Result<PhabricatorUser> {
        self.conduit.ensure_available().await?;
        let raw = self.conduit.call("user.whoami", json!({})).await?;
        let envelope: ConduitResponse<PhabricatorUser> = serde_json::from_value(raw)?;
        envelope.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    struct FakeConduit {
        available: bool,
        response: Value,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl FakeConduit {
        fn answering(response: Value) -> Self {
            Self {
                available: true,
                response,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Conduit for FakeConduit {
        async fn ensure_available(&self) -> Result<()> {
            if self.available {
                Ok(())
            } else {
                Err(ReviewsError::ToolNotFound {
                    binary: "arc".into(),
                })
            }
        }

        async fn call(&self, method: &str, params: Value) -> Result<Value> {
            self.calls.lock().unwrap().push((method.to_string(), params));
            Ok(self.response.clone())
        }
    }

    fn rev(id: u64, author: &str, title: &str, status: &str, bug: Option<&str>) -> Value {
        let name = match status {
            "needs-review" => "Needs Review",
            "accepted" => "Accepted",
            "changes-planned" => "Changes Planned",
            _ => "Other",
        };
        let mut fields = json!({
            "title": title,
            "authorPHID": author,
            "status": { "value": status, "name": name, "closed": false },
        });
        if let Some(bug) = bug {
            fields["bugzilla.bug-id"] = json!(bug);
        }
        json!({ "id": id, "fields": fields })
    }

    fn search_response(revisions: Vec<Value>) -> Value {
        json!({
            "error": null,
            "errorMessage": null,
            "response": { "data": revisions, "cursor": { "after": null } }
        })
    }

    fn parse(values: Vec<Value>) -> Vec<Revision> {
        values
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap())
            .collect()
    }

    const ME: &str = "PHID-USER-me";

    #[test]
    fn wip_is_a_whole_word_match() {
        assert!(is_work_in_progress("WIP fix"));
        assert!(is_work_in_progress("Bug 1 - (WIP) refactor"));
        assert!(!is_work_in_progress("Fix WIPER bug"));
        assert!(!is_work_in_progress("wip lowercase"));
    }

    #[test]
    fn wip_boundary_is_ascii_only() {
        assert!(is_work_in_progress("éWIP"));
        assert!(is_work_in_progress("WIPé"));
        assert!(!is_work_in_progress("_WIP"));
    }

    #[test]
    fn only_empty_arguments_are_rejected() {
        assert!(require("", MISSING_REPO_DIR).is_err());
        assert!(require(" ", MISSING_REPO_DIR).is_ok());
    }

    #[test]
    fn mine_excludes_wip_and_keeps_empty_titles() {
        let revs = parse(vec![
            rev(1, ME, "WIP fix", "needs-review", None),
            rev(2, ME, "Fix WIPER bug", "needs-review", None),
            rev(3, ME, "", "accepted", None),
        ]);
        let report = partition(&revs, ME);
        let ids: Vec<u64> = report.mine.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(report.others.is_empty());
    }

    #[test]
    fn others_only_needs_review() {
        let revs = parse(vec![
            rev(1, "PHID-USER-a", "Ready", "needs-review", None),
            rev(2, "PHID-USER-a", "Done", "accepted", None),
            rev(3, "PHID-USER-b", "WIP thing", "changes-planned", None),
        ]);
        let report = partition(&revs, ME);
        assert!(report.mine.is_empty());
        assert_eq!(report.others.len(), 1);
        assert_eq!(report.others[0].id, 1);
    }

    #[test]
    fn partitions_are_disjoint_subsets() {
        let revs = parse(vec![
            rev(1, ME, "Mine", "needs-review", None),
            rev(2, "PHID-USER-a", "Theirs", "needs-review", None),
            rev(3, "PHID-USER-a", "WIP theirs", "accepted", None),
        ]);
        let report = partition(&revs, ME);
        for m in &report.mine {
            assert!(!report.others.contains(m));
            assert!(revs.contains(m));
        }
        for o in &report.others {
            assert!(revs.contains(o));
        }
    }

    #[test]
    fn sort_is_stable_and_missing_bug_is_zero() {
        let mut revs = parse(vec![
            rev(1, ME, "a", "accepted", Some("300")),
            rev(2, ME, "b", "accepted", None),
            rev(3, ME, "c", "accepted", Some("100")),
            rev(4, ME, "d", "accepted", Some("junk")),
            rev(5, ME, "e", "accepted", Some("100")),
        ]);
        sort_by_bug(&mut revs);
        let ids: Vec<u64> = revs.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 4, 3, 5, 1]);
    }

    #[test]
    fn bug_header_repeats_when_bug_changes_back() {
        let revs = parse(vec![
            rev(1, ME, "first", "accepted", Some("10")),
            rev(2, ME, "second", "needs-review", Some("20")),
            rev(3, ME, "third", "accepted", Some("10")),
            rev(4, ME, "fourth", "accepted", Some("10")),
        ]);
        let report = RevisionReport {
            mine: revs,
            others: Vec::new(),
        };
        let links = LinkConfig::default();
        let mut out = Vec::new();
        RevisionPrinter::new(Palette::plain(), &links)
            .print_report(&mut out, &report)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Bug 10 - ").count(), 2);
        assert_eq!(text.matches("Bug 20 - ").count(), 1);
        assert!(!text.contains("Others"));
    }

    #[test]
    fn revision_lines_are_formatted() {
        let revs = parse(vec![
            rev(7, ME, "Accepted one", "accepted", None),
            rev(8, ME, "Pending one", "needs-review", Some("55")),
        ]);
        let report = RevisionReport {
            mine: revs,
            others: Vec::new(),
        };
        let links = LinkConfig::default();
        let mut out = Vec::new();
        RevisionPrinter::new(Palette::plain(), &links)
            .print_report(&mut out, &report)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let expected = "\n======= Phabricator Mine =====================================================\n\
                        \nNo Bug\n\n   Accepted - Accepted one\n              https://phabricator.services.mozilla.com/D7\n\
                        \nBug 55 - https://bugzilla.mozilla.org/show_bug.cgi?id=55\n\n     Review - Pending one\n              https://phabricator.services.mozilla.com/D8\n";
        assert_eq!(text, expected);
    }

    #[tokio::test]
    async fn run_reviews_queries_active_and_prints() {
        let conduit = FakeConduit::answering(search_response(vec![
            rev(1, ME, "Mine", "accepted", Some("2")),
            rev(2, "PHID-USER-a", "Theirs", "needs-review", Some("1")),
        ]));
        let reporter = PhabricatorReporter::new(conduit, Palette::plain(), LinkConfig::default());
        let mut out = Vec::new();
        let report = reporter.run_reviews(ME, &mut out).await.unwrap();

        assert_eq!(report.mine.len(), 1);
        assert_eq!(report.others.len(), 1);
        let calls = reporter.conduit.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "differential.revision.search");
        assert_eq!(calls[0].1, json!({ "queryKey": "active" }));

        let text = String::from_utf8(out).unwrap();
        let mine_at = text.find("Phabricator Mine").unwrap();
        let others_at = text.find("Phabricator Others").unwrap();
        assert!(mine_at < others_at);
    }

    #[tokio::test]
    async fn empty_list_prints_nothing() {
        let conduit = FakeConduit::answering(search_response(Vec::new()));
        let reporter = PhabricatorReporter::new(conduit, Palette::plain(), LinkConfig::default());
        let mut out = Vec::new();
        let report = reporter.run_reviews(ME, &mut out).await.unwrap();
        assert!(report.is_empty());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn empty_user_is_rejected_before_io() {
        let conduit = FakeConduit::answering(search_response(Vec::new()));
        let reporter = PhabricatorReporter::new(conduit, Palette::plain(), LinkConfig::default());
        let err = reporter.run_reviews("", &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, ReviewsError::Argument(_)));
        assert!(reporter.conduit.calls().is_empty());
    }

    #[tokio::test]
    async fn unavailable_tool_stops_before_call() {
        let mut conduit = FakeConduit::answering(search_response(Vec::new()));
        conduit.available = false;
        let reporter = PhabricatorReporter::new(conduit, Palette::plain(), LinkConfig::default());
        let err = reporter.run_reviews(ME, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, ReviewsError::ToolNotFound { .. }));
        assert!(reporter.conduit.calls().is_empty());
    }

    #[tokio::test]
    async fn remote_error_message_passes_through() {
        let conduit = FakeConduit::answering(json!({
            "error": "ERR-CONDUIT-CORE",
            "errorMessage": "ERR-CONDUIT-CORE: Unknown query key.",
            "response": null
        }));
        let reporter = PhabricatorReporter::new(conduit, Palette::plain(), LinkConfig::default());
        let err = reporter.run_reviews(ME, &mut Vec::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "ERR-CONDUIT-CORE: Unknown query key.");
    }

    #[tokio::test]
    async fn unexpected_shape_is_malformed() {
        let conduit = FakeConduit::answering(json!({
            "error": null,
            "errorMessage": null,
            "response": { "data": [{ "id": "not a number" }] }
        }));
        let reporter = PhabricatorReporter::new(conduit, Palette::plain(), LinkConfig::default());
        let err = reporter.run_reviews(ME, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, ReviewsError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn current_user_calls_whoami() {
        let conduit = FakeConduit::answering(json!({
            "error": null,
            "errorMessage": null,
            "response": { "phid": "PHID-USER-me", "userName": "me" }
        }));
        let reporter = PhabricatorReporter::new(conduit, Palette::plain(), LinkConfig::default());
        let user = reporter.current_user().await.unwrap();
        assert_eq!(user.phid, "PHID-USER-me");
        assert_eq!(user.user_name, "me");
        assert_eq!(reporter.conduit.calls()[0].0, "user.whoami");
    }
}
