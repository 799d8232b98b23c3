//! Pending Phabricator reviews, fetched through `arc call-conduit`.
//!
//! The entry points [`run_reviews`] and [`current_user`] validate their
//! arguments before touching the filesystem or spawning anything, then drive
//! a [`PhabricatorReporter`] over an [`ArcConduit`](conduit::ArcConduit).

pub mod conduit;
pub mod model;
pub mod report;

use std::io::Write;

use reviews_core::{ArcBinary, LinkConfig, Palette, Result};

pub use model::{PhabricatorUser, Revision};
pub use report::{PhabricatorReporter, RevisionReport};

use conduit::ArcConduit;
use report::{require, MISSING_REPO_DIR, MISSING_USER_PHID};

/// Settings shared by the Phabricator entry points.
#[derive(Debug, Clone, Default)]
pub struct PhabricatorOptions {
    pub arc: ArcBinary,
    pub palette: Palette,
    pub links: LinkConfig,
}

/// List the user's own revisions and those awaiting their review, printing
/// the report to `out`.
///
/// `repo_dir` is a checkout where arcanist is configured.
///
/// # Errors
///
/// Returns [`ReviewsError::Argument`](reviews_core::ReviewsError::Argument)
/// for empty arguments before any process is spawned, and propagates
/// transport and remote errors unchanged.
pub async fn run_reviews(
    repo_dir: &str,
    user_phid: &str,
    options: &PhabricatorOptions,
    out: &mut dyn Write,
) -> Result<RevisionReport> {
    require(repo_dir, MISSING_REPO_DIR)?;
    require(user_phid, MISSING_USER_PHID)?;

    let conduit = ArcConduit::new(options.arc.clone(), repo_dir);
    PhabricatorReporter::new(conduit, options.palette, options.links.clone())
        .run_reviews(user_phid, out)
        .await
}

/// Look up the PHID and username `arc` is authenticated as in `repo_dir`.
pub async fn current_user(repo_dir: &str, options: &PhabricatorOptions) -> Result<PhabricatorUser> {
    require(repo_dir, MISSING_REPO_DIR)?;

    let conduit = ArcConduit::new(options.arc.clone(), repo_dir);
    PhabricatorReporter::new(conduit, options.palette, options.links.clone())
        .current_user()
        .await
}
