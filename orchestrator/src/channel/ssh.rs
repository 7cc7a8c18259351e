//! SSH implementation of the remote execution channel
//!
//! Built on russh for the session and the SFTP subsystem for transfers.
//! Authentication is key-based only; a failed handshake or rejected key
//! surfaces immediately as a connection error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use russh::client;
use russh::{ChannelMsg, Disconnect};
use russh_keys::key;
use russh_sftp::client::SftpSession;
use secrecy::ExposeSecret;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::channel::{ExecOutput, RemoteChannel};
use crate::errors::OrchestratorError;
use crate::options::ChannelOptions;

/// Directory names that are never uploaded.
const SKIP_DIRS: [&str; 2] = ["node_modules", "target"];

/// Hidden files and build artifacts stay local.
fn should_upload(name: &str) -> bool {
    !name.starts_with('.') && !SKIP_DIRS.contains(&name)
}

fn remote_join(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name)
}

/// russh client event handler.
///
/// Host key verification is accepted unconditionally: the target host is
/// operator-configured, not user-supplied, and key pinning is handled at
/// the infrastructure layer.
struct Handler;

#[async_trait]
impl client::Handler for Handler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// SSH-backed channel to a single configured host.
pub struct SshChannel {
    options: ChannelOptions,
    session: Option<client::Handle<Handler>>,
}

impl SshChannel {
    /// Create a channel for the given connection options. No I/O happens
    /// until `connect`.
    pub fn new(options: ChannelOptions) -> Self {
        Self {
            options,
            session: None,
        }
    }

    fn session(&mut self) -> Result<&mut client::Handle<Handler>, OrchestratorError> {
        self.session
            .as_mut()
            .ok_or_else(|| OrchestratorError::ConnectionError("channel is not connected".to_string()))
    }

    async fn open_sftp(&mut self) -> Result<SftpSession, OrchestratorError> {
        let session = self.session()?;

        let mut channel = session.channel_open_session().await.map_err(|e| {
            OrchestratorError::UploadError(format!("failed to open SFTP channel: {}", e))
        })?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| {
                OrchestratorError::UploadError(format!("failed to request SFTP subsystem: {}", e))
            })?;

        SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| OrchestratorError::UploadError(format!("failed to start SFTP: {}", e)))
    }

    async fn write_remote_file(
        sftp: &SftpSession,
        content: &[u8],
        remote_path: &str,
    ) -> Result<(), OrchestratorError> {
        let mut file = sftp.create(remote_path).await.map_err(|e| {
            OrchestratorError::UploadError(format!("failed to create {}: {}", remote_path, e))
        })?;
        file.write_all(content).await.map_err(|e| {
            OrchestratorError::UploadError(format!("failed to write {}: {}", remote_path, e))
        })?;
        file.shutdown().await.map_err(|e| {
            OrchestratorError::UploadError(format!("failed to flush {}: {}", remote_path, e))
        })?;
        Ok(())
    }

    async fn ensure_remote_dir(
        sftp: &SftpSession,
        remote_dir: &str,
    ) -> Result<(), OrchestratorError> {
        if sftp.metadata(remote_dir).await.is_ok() {
            return Ok(());
        }
        sftp.create_dir(remote_dir).await.map_err(|e| {
            OrchestratorError::UploadError(format!(
                "failed to create remote directory {}: {}",
                remote_dir, e
            ))
        })
    }
}

#[async_trait]
impl RemoteChannel for SshChannel {
    async fn connect(&mut self) -> Result<(), OrchestratorError> {
        let config = Arc::new(client::Config {
            inactivity_timeout: Some(self.options.inactivity_timeout),
            ..Default::default()
        });

        let passphrase = self
            .options
            .key_passphrase
            .as_ref()
            .map(|p| p.expose_secret().to_string());
        let key_pair = russh_keys::load_secret_key(&self.options.key_path, passphrase.as_deref())
            .map_err(|e| {
                OrchestratorError::ConnectionError(format!(
                    "failed to load private key {}: {}",
                    self.options.key_path.display(),
                    e
                ))
            })?;

        debug!(
            "Connecting to {}:{} as {}",
            self.options.host, self.options.port, self.options.user
        );

        let mut handle = client::connect(
            config,
            (self.options.host.as_str(), self.options.port),
            Handler,
        )
        .await
        .map_err(|e| {
            OrchestratorError::ConnectionError(format!(
                "failed to connect to {}:{}: {}",
                self.options.host, self.options.port, e
            ))
        })?;

        let authenticated = handle
            .authenticate_publickey(&self.options.user, Arc::new(key_pair))
            .await
            .map_err(|e| {
                OrchestratorError::ConnectionError(format!("authentication error: {}", e))
            })?;
        if !authenticated {
            return Err(OrchestratorError::ConnectionError(format!(
                "public key authentication rejected for user {}",
                self.options.user
            )));
        }

        info!("SSH session established with {}", self.options.host);
        self.session = Some(handle);
        Ok(())
    }

    async fn run(&mut self, command: &str) -> Result<ExecOutput, OrchestratorError> {
        debug!("Running remote command: {}", command);

        let session = self.session()?;
        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| OrchestratorError::ExecError(format!("failed to open channel: {}", e)))?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| OrchestratorError::ExecError(format!("failed to exec: {}", e)))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status } => exit_code = Some(exit_status),
                _ => {}
            }
        }

        let exit_code = exit_code.ok_or_else(|| {
            OrchestratorError::ExecError("remote command ended without an exit status".to_string())
        })?;

        Ok(ExecOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    async fn upload_tree(
        &mut self,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<(), OrchestratorError> {
        // The base directory is created through the shell so that missing
        // parents are handled in one round-trip.
        let output = self.run(&format!("mkdir -p {}", remote_path)).await?;
        if !output.success() {
            return Err(OrchestratorError::UploadError(format!(
                "failed to create remote directory {}: {}",
                remote_path, output.stderr
            )));
        }

        let sftp = self.open_sftp().await?;
        let mut failures: Vec<String> = Vec::new();
        let mut pending: Vec<(PathBuf, String)> =
            vec![(local_path.to_path_buf(), remote_path.to_string())];

        while let Some((local_dir, remote_dir)) = pending.pop() {
            Self::ensure_remote_dir(&sftp, &remote_dir).await?;

            let mut entries = fs::read_dir(&local_dir).await.map_err(|e| {
                OrchestratorError::UploadError(format!(
                    "failed to read local directory {}: {}",
                    local_dir.display(),
                    e
                ))
            })?;

            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                OrchestratorError::UploadError(format!(
                    "failed to read local directory {}: {}",
                    local_dir.display(),
                    e
                ))
            })? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !should_upload(&name) {
                    debug!("Skipping {}", entry.path().display());
                    continue;
                }

                let file_type = match entry.file_type().await {
                    Ok(t) => t,
                    Err(e) => {
                        failures.push(format!("{}: {}", entry.path().display(), e));
                        continue;
                    }
                };

                if file_type.is_dir() {
                    pending.push((entry.path(), remote_join(&remote_dir, &name)));
                } else if file_type.is_file() {
                    let target = remote_join(&remote_dir, &name);
                    let result = match fs::read(entry.path()).await {
                        Ok(content) => Self::write_remote_file(&sftp, &content, &target).await,
                        Err(e) => Err(OrchestratorError::UploadError(e.to_string())),
                    };
                    if let Err(e) = result {
                        warn!("Failed to upload {}: {}", entry.path().display(), e);
                        failures.push(format!("{}: {}", entry.path().display(), e));
                    }
                }
                // Symlinks and special files are not uploaded.
            }
        }

        if !failures.is_empty() {
            return Err(OrchestratorError::UploadError(format!(
                "{} file(s) failed to upload: {}",
                failures.len(),
                failures.join("; ")
            )));
        }

        info!(
            "Uploaded {} to {}:{}",
            local_path.display(),
            self.options.host,
            remote_path
        );
        Ok(())
    }

    async fn upload_blob(
        &mut self,
        content: &[u8],
        remote_path: &str,
    ) -> Result<(), OrchestratorError> {
        let sftp = self.open_sftp().await?;
        Self::write_remote_file(&sftp, content, remote_path).await?;
        debug!("Wrote {} bytes to {}", content.len(), remote_path);
        Ok(())
    }

    async fn dispose(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session
                .disconnect(Disconnect::ByApplication, "", "English")
                .await
            {
                debug!("Error during SSH disconnect: {}", e);
            }
            debug!("SSH session with {} closed", self.options.host);
        }
    }
}
