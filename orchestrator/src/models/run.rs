//! Run and run-step models
//!
//! A run is the durable audit log of one deployment or TLS-provisioning
//! attempt. Steps are append-only and insertion-ordered; a failed step is
//! always the last step of its run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of operation a run records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    /// Content deployment
    Deploy,

    /// TLS certificate provisioning
    Tls,
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Deployed,
    Failed,
}

/// Status of a single run step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    Success,
    Failed,
}

/// One entry in a run's ordered step log. Never mutated after append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStep {
    /// Step name, e.g. "SSH", "Upload", "Nginx"
    pub name: String,

    /// Free-text output captured for this step
    pub output: String,

    /// Terminal status of the step
    pub status: StepStatus,

    /// When the step was recorded
    pub timestamp: DateTime<Utc>,
}

impl RunStep {
    /// Create a successful step entry.
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            status: StepStatus::Success,
            timestamp: Utc::now(),
        }
    }

    /// Create a failed step entry.
    pub fn failed(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            status: StepStatus::Failed,
            timestamp: Utc::now(),
        }
    }
}

/// One deployment or TLS-provisioning attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique run ID
    pub id: String,

    /// The site this run targets
    pub site_id: String,

    /// Distinguishes a TLS run from a content deploy in history
    pub kind: RunKind,

    /// Lifecycle status; exactly one terminal update per run
    pub status: RunStatus,

    /// Ordered step log
    pub steps: Vec<RunStep>,

    /// When the run was created
    pub created_at: DateTime<Utc>,
}
