//! Deployment and TLS provisioning orchestration

pub mod deployer;
pub mod fsm;
pub mod recorder;
pub mod tls;

use serde::Serialize;

use crate::models::run::RunStep;

/// Final result returned to the caller of a deploy or TLS run.
///
/// Orchestrators never propagate an error; every failure ends up here as a
/// failed run plus a summarizing message.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Whether the operation completed
    pub success: bool,

    /// The run this outcome belongs to; absent only if the run record
    /// itself could not be created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// Ordered, human-readable step log
    pub logs: Vec<RunStep>,

    /// Summarizing error message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    pub(crate) fn succeeded(run_id: String, logs: Vec<RunStep>) -> Self {
        Self {
            success: true,
            run_id: Some(run_id),
            logs,
            error: None,
        }
    }

    pub(crate) fn failed(run_id: Option<String>, logs: Vec<RunStep>, error: String) -> Self {
        Self {
            success: false,
            run_id,
            logs,
            error: Some(error),
        }
    }
}
