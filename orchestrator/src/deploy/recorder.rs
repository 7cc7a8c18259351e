//! Run step recording

use tracing::{error, info, warn};

use crate::models::run::{RunStep, StepStatus};
use crate::store::RecordStore;

/// Appends ordered run steps to the record store while keeping the
/// in-memory copy returned to the caller.
///
/// A store failure while appending must not mask the step that produced it,
/// so append errors are logged and swallowed.
pub struct StepRecorder<'a> {
    store: &'a dyn RecordStore,
    run_id: String,
    steps: Vec<RunStep>,
}

impl<'a> StepRecorder<'a> {
    /// Create a recorder for one run.
    pub fn new(store: &'a dyn RecordStore, run_id: impl Into<String>) -> Self {
        Self {
            store,
            run_id: run_id.into(),
            steps: Vec::new(),
        }
    }

    /// The run this recorder writes to.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Record a successful step.
    pub async fn success(&mut self, name: &str, output: impl Into<String>) {
        self.record(RunStep::success(name, output)).await;
    }

    /// Record a failed step. The orchestrator appends no further steps
    /// after this.
    pub async fn failure(&mut self, name: &str, output: impl Into<String>) {
        self.record(RunStep::failed(name, output)).await;
    }

    async fn record(&mut self, step: RunStep) {
        match step.status {
            StepStatus::Failed => error!("[{}] {}: {}", self.run_id, step.name, step.output),
            _ => info!("[{}] {}: {}", self.run_id, step.name, step.output),
        }

        if let Err(e) = self.store.append_run_step(&self.run_id, step.clone()).await {
            warn!("Failed to persist run step '{}': {}", step.name, e);
        }
        self.steps.push(step);
    }

    /// Consume the recorder and return the ordered step log.
    pub fn into_steps(self) -> Vec<RunStep> {
        self.steps
    }
}
