//! Record store interface
//!
//! The relational store backing the control panel is an external
//! collaborator; the orchestrators only ever see this trait. Site updates
//! are last-write-wins, no optimistic concurrency token.

pub mod memory;

use async_trait::async_trait;

use crate::errors::OrchestratorError;
use crate::models::run::{Run, RunKind, RunStatus, RunStep};
use crate::models::site::{Site, TlsStatus};

/// Partial update applied to a site record.
#[derive(Debug, Clone, Default)]
pub struct SiteUpdate {
    /// New TLS status, if changed
    pub tls_status: Option<TlsStatus>,

    /// Remote path of the latest successful deployment, if changed
    pub deployed_path: Option<String>,
}

/// Keyed access to site and run records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up a site by id.
    async fn find_site(&self, id: &str) -> Result<Option<Site>, OrchestratorError>;

    /// Apply a partial update to a site record.
    async fn update_site(&self, id: &str, update: SiteUpdate) -> Result<(), OrchestratorError>;

    /// Create a new run in PENDING state.
    async fn create_run(&self, site_id: &str, kind: RunKind) -> Result<Run, OrchestratorError>;

    /// Append a step to a run's ordered log.
    async fn append_run_step(
        &self,
        run_id: &str,
        step: RunStep,
    ) -> Result<(), OrchestratorError>;

    /// Write a run's terminal status. A run accepts exactly one terminal
    /// update and is immutable afterwards.
    async fn update_run(&self, run_id: &str, status: RunStatus)
        -> Result<(), OrchestratorError>;
}
