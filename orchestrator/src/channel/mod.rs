//! Remote execution channel
//!
//! One authenticated session to one remote host: run commands, upload a
//! directory tree, upload an in-memory blob. No business logic lives here;
//! callers are responsible for only interpolating validated values into
//! command strings.

pub mod ssh;

use std::path::Path;

use async_trait::async_trait;

use crate::errors::OrchestratorError;

/// Captured result of one remote command.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Remote exit code
    pub exit_code: u32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,
}

impl ExecOutput {
    /// Whether the command exited zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// One scripted session to the target host.
///
/// A channel instance is owned by exactly one orchestrator invocation and is
/// never shared. `run` does NOT error on a non-zero exit code; callers must
/// inspect `ExecOutput::exit_code`. Only transport-level problems surface as
/// errors.
#[async_trait]
pub trait RemoteChannel: Send {
    /// Establish the authenticated session. Fails fast, no retry.
    async fn connect(&mut self) -> Result<(), OrchestratorError>;

    /// Execute one command in the remote shell and capture its output.
    async fn run(&mut self, command: &str) -> Result<ExecOutput, OrchestratorError>;

    /// Recursively copy a local directory to a remote path, creating the
    /// remote directory first. Skips hidden files and build-artifact
    /// directories; per-file failures are aggregated into the returned
    /// error after a best-effort pass.
    async fn upload_tree(
        &mut self,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<(), OrchestratorError>;

    /// Write an in-memory buffer to a path on the remote host.
    async fn upload_blob(
        &mut self,
        content: &[u8],
        remote_path: &str,
    ) -> Result<(), OrchestratorError>;

    /// Close the session. Idempotent; safe to call without a prior
    /// successful `connect`.
    async fn dispose(&mut self);
}
