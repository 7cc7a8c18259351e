//! Shared test doubles for the orchestrator tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use sitewright::channel::{ExecOutput, RemoteChannel};
use sitewright::errors::OrchestratorError;
use sitewright::models::run::{Run, RunKind, RunStatus, RunStep};
use sitewright::models::site::{Site, SiteStatus, TlsStatus};
use sitewright::store::memory::MemoryStore;
use sitewright::store::{RecordStore, SiteUpdate};

/// Site fixture with the given id and domain.
pub fn site(id: &str, domain: &str) -> Site {
    Site {
        id: id.to_string(),
        domain: domain.to_string(),
        status: SiteStatus::Active,
        tls_status: TlsStatus::None,
        deployed_path: None,
        server_ip: None,
    }
}

/// Channel double that records every call and answers commands from a
/// scripted response table. Commands without a scripted response succeed
/// with empty output.
pub struct ScriptedChannel {
    responses: Vec<(String, ExecOutput)>,
    pub connect_error: Option<String>,
    pub connect_calls: usize,
    pub dispose_calls: usize,
    pub commands: Vec<String>,
    pub uploads: Vec<String>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            connect_error: None,
            connect_calls: 0,
            dispose_calls: 0,
            commands: Vec::new(),
            uploads: Vec::new(),
        }
    }

    /// Script a response for any command containing `pattern`.
    pub fn respond(mut self, pattern: &str, exit_code: u32, stdout: &str, stderr: &str) -> Self {
        self.responses.push((
            pattern.to_string(),
            ExecOutput {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        ));
        self
    }

    /// Make `connect` fail with the given message.
    pub fn failing_connect(mut self, message: &str) -> Self {
        self.connect_error = Some(message.to_string());
        self
    }

    /// Whether any recorded command contains `pattern`.
    pub fn ran(&self, pattern: &str) -> bool {
        self.commands.iter().any(|c| c.contains(pattern))
    }

    /// Index of the first recorded command containing `pattern`.
    pub fn index_of(&self, pattern: &str) -> Option<usize> {
        self.commands.iter().position(|c| c.contains(pattern))
    }
}

#[async_trait]
impl RemoteChannel for ScriptedChannel {
    async fn connect(&mut self) -> Result<(), OrchestratorError> {
        self.connect_calls += 1;
        if let Some(message) = &self.connect_error {
            return Err(OrchestratorError::ConnectionError(message.clone()));
        }
        Ok(())
    }

    async fn run(&mut self, command: &str) -> Result<ExecOutput, OrchestratorError> {
        self.commands.push(command.to_string());
        for (pattern, output) in &self.responses {
            if command.contains(pattern.as_str()) {
                return Ok(output.clone());
            }
        }
        Ok(ExecOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    async fn upload_tree(
        &mut self,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<(), OrchestratorError> {
        self.uploads
            .push(format!("tree:{}:{}", local_path.display(), remote_path));
        Ok(())
    }

    async fn upload_blob(
        &mut self,
        content: &[u8],
        remote_path: &str,
    ) -> Result<(), OrchestratorError> {
        self.uploads
            .push(format!("blob:{}:{}", content.len(), remote_path));
        Ok(())
    }

    async fn dispose(&mut self) {
        self.dispose_calls += 1;
    }
}

/// Record store double that tracks the history of TLS status writes on top
/// of the in-memory store.
pub struct RecordingStore {
    inner: MemoryStore,
    tls_updates: Mutex<Vec<TlsStatus>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            tls_updates: Mutex::new(Vec::new()),
        }
    }

    pub async fn insert_site(&self, site: Site) {
        self.inner.insert_site(site).await;
    }

    pub async fn get_run(&self, run_id: &str) -> Option<Run> {
        self.inner.get_run(run_id).await
    }

    /// TLS status values written through `update_site`, in order.
    pub fn tls_updates(&self) -> Vec<TlsStatus> {
        self.tls_updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn find_site(&self, id: &str) -> Result<Option<Site>, OrchestratorError> {
        self.inner.find_site(id).await
    }

    async fn update_site(&self, id: &str, update: SiteUpdate) -> Result<(), OrchestratorError> {
        if let Some(tls_status) = update.tls_status {
            self.tls_updates.lock().unwrap().push(tls_status);
        }
        self.inner.update_site(id, update).await
    }

    async fn create_run(&self, site_id: &str, kind: RunKind) -> Result<Run, OrchestratorError> {
        self.inner.create_run(site_id, kind).await
    }

    async fn append_run_step(
        &self,
        run_id: &str,
        step: RunStep,
    ) -> Result<(), OrchestratorError> {
        self.inner.append_run_step(run_id, step).await
    }

    async fn update_run(
        &self,
        run_id: &str,
        status: RunStatus,
    ) -> Result<(), OrchestratorError> {
        self.inner.update_run(run_id, status).await
    }
}
