use std::path::{Path, PathBuf};

/// Environment variable that overrides the path to the `arc` binary.
pub const ARC_PATH_ENV: &str = "MY_REVIEWS_ARC_PATH";

/// Bare command name used when no override or bundled copy exists.
pub const DEFAULT_ARC_COMMAND: &str = "arc";

/// Default base URL for revision links.
pub const DEFAULT_PHABRICATOR_URL: &str = "https://phabricator.services.mozilla.com";

/// Default base URL for bug links.
pub const DEFAULT_BUGZILLA_URL: &str = "https://bugzilla.mozilla.org";

/// Pick the `arc` binary to run.
///
/// Resolution order: a non-empty `env_override`, then
/// `<bundled_dir>/arcanist/bin/arc` when `exists` reports it present, then the
/// bare `arc` command left for `PATH` lookup at spawn time.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use reviews_core::config::resolve_arc_binary;
///
/// let path = resolve_arc_binary(None, Some(Path::new("/opt/tool")), |_| true);
/// assert_eq!(path, PathBuf::from("/opt/tool/arcanist/bin/arc"));
///
/// let path = resolve_arc_binary(Some("/usr/local/bin/arc"), None, |_| false);
/// assert_eq!(path, PathBuf::from("/usr/local/bin/arc"));
/// ```
pub fn resolve_arc_binary(
    env_override: Option<&str>,
    bundled_dir: Option<&Path>,
    exists: impl Fn(&Path) -> bool,
) -> PathBuf {
    if let Some(path) = env_override.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    if let Some(dir) = bundled_dir {
        let local = dir.join("arcanist").join("bin").join("arc");
        if exists(&local) {
            return local;
        }
    }

    PathBuf::from(DEFAULT_ARC_COMMAND)
}

/// The resolved `arc` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcBinary(PathBuf);

impl ArcBinary {
    /// Wrap an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Resolve from [`ARC_PATH_ENV`] and the directory of the running executable.
    pub fn from_env() -> Self {
        let env_override = std::env::var(ARC_PATH_ENV).ok();
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self(resolve_arc_binary(
            env_override.as_deref(),
            exe_dir.as_deref(),
            Path::exists,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Name used in error messages (`arc` for the default command).
    pub fn display_name(&self) -> String {
        self.0.display().to_string()
    }
}

impl Default for ArcBinary {
    fn default() -> Self {
        Self(PathBuf::from(DEFAULT_ARC_COMMAND))
    }
}

/// Read a GitHub token from `GITHUB_TOKEN`, falling back to `GH_TOKEN`.
///
/// Empty values are ignored. `None` means anonymous API access.
pub fn github_token_from_env() -> Option<String> {
    pick_token(
        std::env::var("GITHUB_TOKEN").ok(),
        std::env::var("GH_TOKEN").ok(),
    )
}

fn pick_token(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    primary
        .filter(|t| !t.trim().is_empty())
        .or_else(|| fallback.filter(|t| !t.trim().is_empty()))
}

/// Base URLs used when printing links.
///
/// # Examples
///
/// ```
/// use reviews_core::LinkConfig;
///
/// let links = LinkConfig::default();
/// assert_eq!(
///     links.revision_url(1234),
///     "https://phabricator.services.mozilla.com/D1234"
/// );
/// assert_eq!(
///     links.bug_url("1800000"),
///     "https://bugzilla.mozilla.org/show_bug.cgi?id=1800000"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Phabricator instance, without trailing slash.
    pub phabricator_url: String,
    /// Bugzilla instance, without trailing slash.
    pub bugzilla_url: String,
}

impl LinkConfig {
    /// Build from optional overrides, trimming trailing slashes.
    pub fn new(phabricator_url: Option<&str>, bugzilla_url: Option<&str>) -> Self {
        Self {
            phabricator_url: phabricator_url
                .unwrap_or(DEFAULT_PHABRICATOR_URL)
                .trim_end_matches('/')
                .to_string(),
            bugzilla_url: bugzilla_url
                .unwrap_or(DEFAULT_BUGZILLA_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    pub fn revision_url(&self, id: u64) -> String {
        format!("{}/D{id}", self.phabricator_url)
    }

    pub fn bug_url(&self, bug_id: &str) -> String {
        format!("{}/show_bug.cgi?id={bug_id}", self.bugzilla_url)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new(None, None)
    }
}
