use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use reviews_core::{ArcBinary, Result, ReviewsError};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error};

/// A conduit endpoint that answers JSON requests with JSON envelopes.
///
/// [`ArcConduit`] is the production implementation; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait Conduit: Send + Sync {
    /// Check that the transport can be used at all.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewsError::ToolNotFound`] if the client binary is missing.
    async fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    /// Call `method` with `params` and return the raw response envelope.
    async fn call(&self, method: &str, params: Value) -> Result<Value>;
}

/// Conduit transport that shells out to `arc call-conduit`.
///
/// Requests run with the working directory set to a checkout where arcanist
/// is configured, so `arc` picks up the right server and credentials.
///
/// # Examples
///
/// ```no_run
/// use reviews_core::ArcBinary;
/// use reviews_phabricator::conduit::{ArcConduit, Conduit};
///
/// # async fn demo() -> reviews_core::Result<()> {
/// let conduit = ArcConduit::new(ArcBinary::from_env(), "/src/gecko");
/// conduit.ensure_available().await?;
/// let whoami = conduit.call("user.whoami", serde_json::json!({})).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArcConduit {
    binary: ArcBinary,
    cwd: PathBuf,
}

impl ArcConduit {
    pub fn new(binary: ArcBinary, cwd: impl Into<PathBuf>) -> Self {
        Self {
            binary,
            cwd: cwd.into(),
        }
    }

    fn describe(&self, method: &str) -> String {
        format!("{} call-conduit -- {method}", self.binary.display_name())
    }
}

#[async_trait]
impl Conduit for ArcConduit {
    async fn ensure_available(&self) -> Result<()> {
        let status = Command::new(self.binary.path())
            .arg("help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ReviewsError::ToolNotFound {
                binary: self.binary.display_name(),
            }),
            // Anything else, including a failing `arc help`, means the binary exists.
            _ => Ok(()),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let command = self.describe(method);
        let payload = serde_json::to_vec(&params)?;
        debug!(%command, cwd = %self.cwd.display(), "calling conduit");

        let transport = |message: String| {
            error!(%command, "error running conduit call: {message}");
            ReviewsError::Transport {
                command: command.clone(),
                message,
            }
        };

        let mut child = Command::new(self.binary.path())
            .args(["call-conduit", "--", method])
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| transport(format!("failed to spawn: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&payload).await {
                Ok(()) => {}
                // arc exited without reading the request; its status and stderr say why.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!(%command, "conduit client closed stdin early");
                }
                Err(e) => return Err(transport(format!("failed to write request: {e}"))),
            }
            // Dropping stdin closes the pipe so arc sees EOF.
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| transport(format!("failed to wait for process: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            };
            return Err(transport(message));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ReviewsError::MalformedResponse(format!("{command}: {e}")))
    }
}
