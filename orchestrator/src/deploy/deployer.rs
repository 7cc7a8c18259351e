//! Deployment orchestrator
//!
//! Drives one site deployment over a remote execution channel: directory
//! preparation, content upload, nginx config install, config test, live
//! reload. Remote side effects completed before a failure are not rolled
//! back; a later successful run overwrites prior partial state, since the
//! same domain always maps to the same remote paths.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::channel::RemoteChannel;
use crate::deploy::fsm::DeployFsm;
use crate::deploy::recorder::StepRecorder;
use crate::deploy::RunOutcome;
use crate::errors::OrchestratorError;
use crate::models::run::{RunKind, RunStatus};
use crate::nginx;
use crate::options::OrchestratorOptions;
use crate::store::{RecordStore, SiteUpdate};
use crate::validate::{validate_domain, validate_site_id, Domain};

/// Orchestrates content deployments for sites.
pub struct Deployer {
    store: Arc<dyn RecordStore>,
    options: OrchestratorOptions,
}

impl Deployer {
    /// Create a deployer backed by the given record store.
    pub fn new(store: Arc<dyn RecordStore>, options: OrchestratorOptions) -> Self {
        Self { store, options }
    }

    /// Deploy local content for a site.
    ///
    /// Never returns an error: every failure becomes a failed run step plus
    /// a FAILED run, reported through the outcome. The channel is disposed
    /// on every exit path once the remote stage begins.
    pub async fn deploy(
        &self,
        channel: &mut dyn RemoteChannel,
        site_id: &str,
        local_content_path: &Path,
    ) -> RunOutcome {
        let run = match self.store.create_run(site_id, RunKind::Deploy).await {
            Ok(run) => run,
            Err(e) => {
                warn!("Failed to create deployment run for {}: {}", site_id, e);
                return RunOutcome::failed(None, Vec::new(), e.to_string());
            }
        };

        let mut fsm = DeployFsm::new();
        let mut recorder = StepRecorder::new(self.store.as_ref(), &run.id);

        // Input validation happens before the channel is touched; a
        // rejected value must never reach the remote host.
        fsm.advance();
        let site_id = match validate_site_id(site_id) {
            Ok(id) => id,
            Err(e) => return self.finish_failed(&mut fsm, recorder, e).await,
        };
        let site = match self.store.find_site(site_id.as_str()).await {
            Ok(Some(site)) => site,
            Ok(None) => {
                let e = OrchestratorError::NotFound(format!("Site {}", site_id));
                return self.finish_failed(&mut fsm, recorder, e).await;
            }
            Err(e) => return self.finish_failed(&mut fsm, recorder, e).await,
        };
        let domain = match validate_domain(&site.domain) {
            Ok(domain) => domain,
            Err(e) => return self.finish_failed(&mut fsm, recorder, e).await,
        };
        recorder
            .success(
                fsm.phase().step_name(),
                format!("Validated site {} with domain {}", site_id, domain),
            )
            .await;

        // Remote stage. The channel is disposed exactly once whatever
        // happens inside.
        let result = self
            .run_remote(channel, &mut fsm, &mut recorder, &domain, local_content_path)
            .await;
        channel.dispose().await;

        match result {
            Ok(content_dir) => {
                fsm.advance();
                if let Err(e) = self
                    .store
                    .update_site(
                        site_id.as_str(),
                        SiteUpdate {
                            deployed_path: Some(content_dir),
                            ..Default::default()
                        },
                    )
                    .await
                {
                    warn!("Failed to record deployed path for {}: {}", site_id, e);
                }
                recorder
                    .success(
                        fsm.phase().step_name(),
                        format!("Deployment completed successfully for {}", domain),
                    )
                    .await;
                if let Err(e) = self
                    .store
                    .update_run(recorder.run_id(), RunStatus::Deployed)
                    .await
                {
                    warn!("Failed to mark run {} deployed: {}", recorder.run_id(), e);
                }
                RunOutcome::succeeded(run.id, recorder.into_steps())
            }
            Err(e) => self.finish_failed(&mut fsm, recorder, e).await,
        }
    }

    /// The post-validation sequence of remote side effects. Returns the
    /// remote content directory on success.
    async fn run_remote(
        &self,
        channel: &mut dyn RemoteChannel,
        fsm: &mut DeployFsm,
        recorder: &mut StepRecorder<'_>,
        domain: &Domain,
        local_content_path: &Path,
    ) -> Result<String, OrchestratorError> {
        let layout = &self.options.layout;

        fsm.advance();
        channel.connect().await?;
        recorder
            .success(fsm.phase().step_name(), "Connected to remote host")
            .await;

        fsm.advance();
        let content_dir = layout.content_dir(domain);
        let output = channel.run(&format!("mkdir -p {}", content_dir)).await?;
        if !output.success() {
            return Err(OrchestratorError::CommandFailed(format!(
                "Failed to create remote directory {}: {}",
                content_dir, output.stderr
            )));
        }
        recorder
            .success(
                fsm.phase().step_name(),
                format!("Prepared remote directory {}", content_dir),
            )
            .await;

        fsm.advance();
        channel.upload_tree(local_content_path, &content_dir).await?;
        recorder
            .success(
                fsm.phase().step_name(),
                format!(
                    "Uploaded {} to {}",
                    local_content_path.display(),
                    content_dir
                ),
            )
            .await;

        // The rendered config goes to a staging path first; the move into
        // the live configuration directory is atomic, so nginx never reads
        // a partially written file.
        fsm.advance();
        let config = nginx::generate_config(domain);
        let staging_path = layout.staging_path(domain);
        channel.upload_blob(config.as_bytes(), &staging_path).await?;
        recorder
            .success(
                fsm.phase().step_name(),
                format!("Rendered nginx config to {}", staging_path),
            )
            .await;

        fsm.advance();
        let config_path = layout.config_path(domain);
        let output = channel
            .run(&format!("sudo mv {} {}", staging_path, config_path))
            .await?;
        if !output.success() {
            return Err(OrchestratorError::CommandFailed(format!(
                "Failed to install nginx config: {}",
                output.stderr
            )));
        }
        let output = channel
            .run(&format!("sudo chown root:root {}", config_path))
            .await?;
        if !output.success() {
            return Err(OrchestratorError::CommandFailed(format!(
                "Failed to set config ownership: {}",
                output.stderr
            )));
        }
        recorder
            .success(
                fsm.phase().step_name(),
                format!("Installed nginx config at {}", config_path),
            )
            .await;

        fsm.advance();
        let enabled_path = layout.enabled_path(domain);
        let output = channel
            .run(&format!("sudo ln -sf {} {}", config_path, enabled_path))
            .await?;
        if !output.success() {
            return Err(OrchestratorError::CommandFailed(format!(
                "Failed to enable site: {}",
                output.stderr
            )));
        }
        recorder
            .success(
                fsm.phase().step_name(),
                format!("Enabled site via {}", enabled_path),
            )
            .await;

        // A broken config must never be loaded into the running server.
        fsm.advance();
        let output = channel.run("sudo nginx -t").await?;
        if !output.success() {
            return Err(OrchestratorError::CommandFailed(format!(
                "Nginx configuration test failed: {}",
                output.stderr
            )));
        }
        recorder
            .success(fsm.phase().step_name(), "Nginx configuration test passed")
            .await;

        fsm.advance();
        let output = channel.run("sudo systemctl reload nginx").await?;
        if !output.success() {
            return Err(OrchestratorError::CommandFailed(format!(
                "Failed to reload nginx: {}",
                output.stderr
            )));
        }
        recorder
            .success(fsm.phase().step_name(), "Nginx reloaded")
            .await;

        Ok(content_dir)
    }

    async fn finish_failed(
        &self,
        fsm: &mut DeployFsm,
        mut recorder: StepRecorder<'_>,
        err: OrchestratorError,
    ) -> RunOutcome {
        let step_name = fsm.phase().step_name();
        fsm.fail();

        let message = err.to_string();
        recorder.failure(step_name, message.clone()).await;

        if let Err(e) = self
            .store
            .update_run(recorder.run_id(), RunStatus::Failed)
            .await
        {
            warn!("Failed to mark run {} failed: {}", recorder.run_id(), e);
        }

        let run_id = recorder.run_id().to_string();
        RunOutcome::failed(Some(run_id), recorder.into_steps(), message)
    }
}
