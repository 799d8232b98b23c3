use std::collections::BTreeMap;
use std::io::Write;

use reviews_core::{Palette, Result, ReviewsError};
use serde::Serialize;

use crate::client::PullRequestSource;
use crate::model::{PullRequest, Review, ReviewState};

/// Title markers that hide a pull request from the report. Matched case-sensitively.
pub const EXCLUDED_MARKERS: [&str; 6] = [
    "[wip]",
    "(wip)",
    "[deploy-preview]",
    "(deploy-preview)",
    "[deploy preview]",
    "(deploy preview)",
];

pub(crate) const MISSING_ARGUMENTS: &str =
    "GitHub reviews requires the owner, repo, and user passed as arguments.";

/// Whether a pull request title carries one of the [`EXCLUDED_MARKERS`].
///
/// # Examples
///
/// ```
/// use reviews_github::report::is_excluded;
///
/// assert!(is_excluded("[wip] add feature"));
/// assert!(!is_excluded("[WIP] add feature"));
/// ```
pub fn is_excluded(title: &str) -> bool {
    EXCLUDED_MARKERS.iter().any(|marker| title.contains(marker))
}

/// Pull requests split by what the user needs to do with them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubReport {
    /// Pull requests where the user is a requested reviewer.
    pub prs_to_handle: Vec<PullRequest>,
    /// The user's own pull requests that are ready for review.
    pub my_prs: Vec<PullRequest>,
    /// Reviews fetched while printing, keyed by pull request number.
    pub reviews: BTreeMap<u64, Vec<Review>>,
}

/// Drop excluded titles, then split into (to handle, mine).
///
/// A pull request can land in both lists.
pub fn partition(pulls: &[PullRequest], username: &str) -> (Vec<PullRequest>, Vec<PullRequest>) {
    let mut prs_to_handle = Vec::new();
    let mut my_prs = Vec::new();

    for pr in pulls.iter().filter(|pr| !is_excluded(&pr.title)) {
        if pr.author_login() == username && pr.user.is_some() && !pr.draft {
            my_prs.push(pr.clone());
        }
        if pr.is_review_requested_from(username) {
            prs_to_handle.push(pr.clone());
        }
    }

    (prs_to_handle, my_prs)
}

pub(crate) fn require_all(args: &[&str]) -> Result<()> {
    if args.iter().any(|a| a.is_empty()) {
        return Err(ReviewsError::Argument(MISSING_ARGUMENTS.into()));
    }
    Ok(())
}

/// Renders pull requests and their reviews.
#[derive(Debug, Clone, Copy)]
pub struct PullRequestPrinter {
    palette: Palette,
}

impl PullRequestPrinter {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn print_header(
        &self,
        out: &mut dyn Write,
        owner: &str,
        repo: &str,
        text: &str,
    ) -> std::io::Result<()> {
        let line = format!(
            "\n======= {text} ({owner}/{repo}) ====================================================="
        );
        writeln!(out, "{}", self.palette.cyan(&line))
    }

    /// Number, title, link, author and branch.
    pub fn print_summary(&self, out: &mut dyn Write, pr: &PullRequest) -> std::io::Result<()> {
        let p = &self.palette;
        writeln!(out)?;
        writeln!(
            out,
            "{}{}",
            p.yellow(&format!("PR #{}: ", pr.number)),
            p.bright_white(&pr.title)
        )?;
        writeln!(out, "{}{}", p.gray("     url: "), p.link(&pr.html_url))?;
        writeln!(out, "{}{}", p.gray("  author: "), pr.author_login())?;
        writeln!(out, "{}{}", p.gray("  branch: "), pr.head.ref_name)
    }

    /// One line per submitted review, then one per outstanding request.
    ///
    /// `COMMENTED` reviews are skipped.
    pub fn print_reviewers(
        &self,
        out: &mut dyn Write,
        pr: &PullRequest,
        reviews: &[Review],
    ) -> std::io::Result<()> {
        let p = &self.palette;
        for review in reviews {
            let state = match review.state {
                ReviewState::Approved => p.green(review.state.as_str()),
                ReviewState::Commented => continue,
                _ => review.state.to_string(),
            };
            writeln!(
                out,
                "{}{state} {}",
                p.gray("reviewer: "),
                review.reviewer_login()
            )?;
        }

        for reviewer in &pr.requested_reviewers {
            writeln!(
                out,
                "{}{}{}",
                p.gray("reviewer: "),
                p.magenta("REQUESTED "),
                reviewer.login
            )?;
        }
        Ok(())
    }
}

/// Lists pending GitHub reviews through a [`PullRequestSource`].
pub struct GitHubReporter<S> {
    source: S,
    printer: PullRequestPrinter,
}

impl<S: PullRequestSource> GitHubReporter<S> {
    pub fn new(source: S, palette: Palette) -> Self {
        Self {
            source,
            printer: PullRequestPrinter::new(palette),
        }
    }

    /// Fetch open pull requests, partition them for `username`, and print
    /// each one with its reviews.
    ///
    /// Reviews are fetched one pull request at a time in print order, so the
    /// output is fully ordered: all "To Review" entries, then "My PRs".
    ///
    /// # Errors
    ///
    /// [`ReviewsError::Argument`] if any argument is empty; otherwise the
    /// first failing request aborts the whole report.
    pub async fn run_reviews(
        &self,
        owner: &str,
        repo: &str,
        username: &str,
        out: &mut dyn Write,
    ) -> Result<GitHubReport> {
        require_all(&[owner, repo, username])?;

        let pulls = self.source.list_open_pulls(owner, repo).await?;
        tracing::debug!(count = pulls.len(), "fetched open pull requests");
        let (prs_to_handle, my_prs) = partition(&pulls, username);

        let mut reviews = BTreeMap::new();
        for (title, section) in [("To Review", &prs_to_handle), ("My PRs", &my_prs)] {
            if section.is_empty() {
                continue;
            }
            self.printer.print_header(out, owner, repo, title)?;
            for pr in section {
                self.printer.print_summary(out, pr)?;
                let fetched = self.source.list_reviews(owner, repo, pr.number).await?;
                self.printer.print_reviewers(out, pr, &fetched)?;
                reviews.insert(pr.number, fetched);
            }
        }

        Ok(GitHubReport {
            prs_to_handle,
            my_prs,
            reviews,
        })
    }
}
