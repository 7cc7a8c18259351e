//! TLS provisioning orchestrator
//!
//! Invokes the certificate-issuance tool on the remote host for a site that
//! has already been deployed. Issuance is delegated to certbot's nginx
//! integration; this orchestrator owns the precondition check, the status
//! claim, and the config re-test after certbot rewrites the server block.

use std::sync::Arc;

use tracing::warn;

use crate::channel::RemoteChannel;
use crate::deploy::fsm::TlsFsm;
use crate::deploy::recorder::StepRecorder;
use crate::deploy::RunOutcome;
use crate::errors::OrchestratorError;
use crate::models::run::{RunKind, RunStatus};
use crate::models::site::TlsStatus;
use crate::options::OrchestratorOptions;
use crate::store::{RecordStore, SiteUpdate};
use crate::validate::{validate_domain, validate_site_id, Domain, SiteId};

/// Orchestrates TLS certificate provisioning for deployed sites.
pub struct TlsProvisioner {
    store: Arc<dyn RecordStore>,
    options: OrchestratorOptions,
}

impl TlsProvisioner {
    /// Create a provisioner backed by the given record store.
    pub fn new(store: Arc<dyn RecordStore>, options: OrchestratorOptions) -> Self {
        Self { store, options }
    }

    /// Provision a TLS certificate for a site.
    ///
    /// The site's TLS status is claimed as PENDING before any remote work,
    /// so concurrent observers see the operation in progress. Any failure
    /// after the claim leaves the status FAILED. Never returns an error;
    /// the outcome carries the full step log.
    pub async fn provision(
        &self,
        channel: &mut dyn RemoteChannel,
        site_id: &str,
    ) -> RunOutcome {
        let run = match self.store.create_run(site_id, RunKind::Tls).await {
            Ok(run) => run,
            Err(e) => {
                warn!("Failed to create TLS run for {}: {}", site_id, e);
                return RunOutcome::failed(None, Vec::new(), e.to_string());
            }
        };

        let mut fsm = TlsFsm::new();
        let mut recorder = StepRecorder::new(self.store.as_ref(), &run.id);

        fsm.advance();
        let site_id = match validate_site_id(site_id) {
            Ok(id) => id,
            Err(e) => return self.finish_failed(&mut fsm, recorder, None, e).await,
        };
        let site = match self.store.find_site(site_id.as_str()).await {
            Ok(Some(site)) => site,
            Ok(None) => {
                let e = OrchestratorError::NotFound(format!("Site {}", site_id));
                return self.finish_failed(&mut fsm, recorder, None, e).await;
            }
            Err(e) => return self.finish_failed(&mut fsm, recorder, None, e).await,
        };
        let domain = match validate_domain(&site.domain) {
            Ok(domain) => domain,
            Err(e) => return self.finish_failed(&mut fsm, recorder, None, e).await,
        };
        recorder
            .success(
                fsm.phase().step_name(),
                format!("Validated site {} with domain {}", site_id, domain),
            )
            .await;

        // Claim the site before touching the remote host.
        fsm.advance();
        if let Err(e) = self
            .store
            .update_site(
                site_id.as_str(),
                SiteUpdate {
                    tls_status: Some(TlsStatus::Pending),
                    ..Default::default()
                },
            )
            .await
        {
            return self.finish_failed(&mut fsm, recorder, None, e).await;
        }
        recorder
            .success(
                fsm.phase().step_name(),
                format!("TLS status set to PENDING for {}", domain),
            )
            .await;

        let result = self
            .run_remote(channel, &mut fsm, &mut recorder, &domain)
            .await;
        channel.dispose().await;

        match result {
            Ok(()) => {
                fsm.advance();
                if let Err(e) = self
                    .store
                    .update_site(
                        site_id.as_str(),
                        SiteUpdate {
                            tls_status: Some(TlsStatus::Active),
                            ..Default::default()
                        },
                    )
                    .await
                {
                    warn!("Failed to mark TLS active for {}: {}", site_id, e);
                }
                recorder
                    .success(
                        fsm.phase().step_name(),
                        format!("TLS provisioned successfully for {}", domain),
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
            Err(e) => {
                self.finish_failed(&mut fsm, recorder, Some(&site_id), e)
                    .await
            }
        }
    }

    async fn run_remote(
        &self,
        channel: &mut dyn RemoteChannel,
        fsm: &mut TlsFsm,
        recorder: &mut StepRecorder<'_>,
        domain: &Domain,
    ) -> Result<(), OrchestratorError> {
        fsm.advance();
        channel.connect().await?;
        recorder
            .success(fsm.phase().step_name(), "Connected to remote host")
            .await;

        // Certbot fails cryptically when no server block exists, so check
        // up front and report the actual remedy.
        fsm.advance();
        let config_path = self.options.layout.config_path(domain);
        let output = channel
            .run(&format!("test -f {} && echo exists", config_path))
            .await?;
        if !output.stdout.contains("exists") {
            return Err(OrchestratorError::PreconditionError(
                "Nginx configuration not found. Please deploy the site first.".to_string(),
            ));
        }
        recorder
            .success(
                fsm.phase().step_name(),
                format!("Found nginx configuration at {}", config_path),
            )
            .await;

        // Issuance can take a while; the operation blocks on it.
        fsm.advance();
        let command = format!(
            "sudo certbot --nginx -d {} --non-interactive --agree-tos --email {} --redirect",
            domain, self.options.contact_email
        );
        let output = channel.run(&command).await?;
        if !output.success() {
            // Best-effort match on certbot's known failure text; breaks
            // silently if the tool's messages change.
            if output.stderr.contains("NXDOMAIN") || output.stderr.contains("Challenge failed") {
                return Err(OrchestratorError::CommandFailed(
                    "DNS verification failed. Please ensure the domain points to the server IP."
                        .to_string(),
                ));
            }
            return Err(OrchestratorError::CommandFailed(format!(
                "Certbot execution failed: {}",
                output.stderr
            )));
        }
        recorder
            .success(
                fsm.phase().step_name(),
                format!("Certificate issued for {}", domain),
            )
            .await;

        // Certbot rewrites the server block, so the config must be checked
        // again before the reload.
        fsm.advance();
        let output = channel.run("sudo nginx -t").await?;
        if !output.success() {
            return Err(OrchestratorError::CommandFailed(format!(
                "Nginx test failed after certificate install: {}",
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

        Ok(())
    }

    async fn finish_failed(
        &self,
        fsm: &mut TlsFsm,
        mut recorder: StepRecorder<'_>,
        claimed_site: Option<&SiteId>,
        err: OrchestratorError,
    ) -> RunOutcome {
        if let Some(site_id) = claimed_site {
            if let Err(e) = self
                .store
                .update_site(
                    site_id.as_str(),
                    SiteUpdate {
                        tls_status: Some(TlsStatus::Failed),
                        ..Default::default()
                    },
                )
                .await
            {
                warn!("Failed to mark TLS failed for {}: {}", site_id, e);
            }
        }

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
