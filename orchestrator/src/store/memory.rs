//! In-memory record store
//!
//! Backs tests and single-process embedders. Enforces the same run
//! invariants a relational backend would: steps are append-only and a run
//! accepts exactly one terminal status update.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::errors::OrchestratorError;
use crate::models::run::{Run, RunKind, RunStatus, RunStep};
use crate::models::site::Site;
use crate::store::{RecordStore, SiteUpdate};

/// In-memory store keyed by site and run id.
#[derive(Default)]
pub struct MemoryStore {
    sites: RwLock<HashMap<String, Site>>,
    runs: RwLock<HashMap<String, Run>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a site record.
    pub async fn insert_site(&self, site: Site) {
        self.sites.write().await.insert(site.id.clone(), site);
    }

    /// Fetch a run by id.
    pub async fn get_run(&self, run_id: &str) -> Option<Run> {
        self.runs.read().await.get(run_id).cloned()
    }

    /// All runs recorded for a site, oldest first.
    pub async fn runs_for_site(&self, site_id: &str) -> Vec<Run> {
        let mut runs: Vec<Run> = self
            .runs
            .read()
            .await
            .values()
            .filter(|r| r.site_id == site_id)
            .cloned()
            .collect();
        runs.sort_by_key(|r| r.created_at);
        runs
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_site(&self, id: &str) -> Result<Option<Site>, OrchestratorError> {
        Ok(self.sites.read().await.get(id).cloned())
    }

    async fn update_site(&self, id: &str, update: SiteUpdate) -> Result<(), OrchestratorError> {
        let mut sites = self.sites.write().await;
        let site = sites
            .get_mut(id)
            .ok_or_else(|| OrchestratorError::NotFound(format!("site {}", id)))?;

        if let Some(tls_status) = update.tls_status {
            site.tls_status = tls_status;
        }
        if let Some(deployed_path) = update.deployed_path {
            site.deployed_path = Some(deployed_path);
        }

        Ok(())
    }

    async fn create_run(&self, site_id: &str, kind: RunKind) -> Result<Run, OrchestratorError> {
        let run = Run {
            id: uuid::Uuid::new_v4().to_string(),
            site_id: site_id.to_string(),
            kind,
            status: RunStatus::Pending,
            steps: Vec::new(),
            created_at: Utc::now(),
        };

        self.runs.write().await.insert(run.id.clone(), run.clone());
        Ok(run)
    }

    async fn append_run_step(
        &self,
        run_id: &str,
        step: RunStep,
    ) -> Result<(), OrchestratorError> {
        let mut runs = self.runs.write().await;
        let run = runs
            .get_mut(run_id)
            .ok_or_else(|| OrchestratorError::NotFound(format!("run {}", run_id)))?;

        if run.status != RunStatus::Pending {
            return Err(OrchestratorError::StoreError(format!(
                "run {} is terminal, cannot append steps",
                run_id
            )));
        }

        run.steps.push(step);
        Ok(())
    }

    async fn update_run(
        &self,
        run_id: &str,
        status: RunStatus,
    ) -> Result<(), OrchestratorError> {
        if status == RunStatus::Pending {
            return Err(OrchestratorError::StoreError(
                "runs are created pending, only terminal updates are accepted".to_string(),
            ));
        }

        let mut runs = self.runs.write().await;
        let run = runs
            .get_mut(run_id)
            .ok_or_else(|| OrchestratorError::NotFound(format!("run {}", run_id)))?;

        if run.status != RunStatus::Pending {
            return Err(OrchestratorError::StoreError(format!(
                "run {} already has a terminal status",
                run_id
            )));
        }

        run.status = status;
        Ok(())
    }
}
