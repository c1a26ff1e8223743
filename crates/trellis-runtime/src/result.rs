//! Run result types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Why a job was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  /// The run condition did not match the trigger context.
  ConditionNotMet,
  /// A strict dependency failed or was itself skipped.
  UpstreamFailed,
  /// The whole run was cancelled before the job started.
  RunCancelled,
}

/// Terminal status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
  Succeeded,
  Failed,
  Skipped,
}

/// Per-job record in the run result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
  pub status: JobStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub skip_reason: Option<SkipReason>,
  /// Human-readable cause when the job failed.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  /// Outputs published by the job. Empty unless it succeeded.
  #[serde(default)]
  pub outputs: HashMap<String, String>,
}

impl JobReport {
  pub(crate) fn succeeded(outputs: HashMap<String, String>) -> Self {
    Self {
      status: JobStatus::Succeeded,
      skip_reason: None,
      error: None,
      outputs,
    }
  }

  pub(crate) fn failed(error: Option<String>) -> Self {
    Self {
      status: JobStatus::Failed,
      skip_reason: None,
      error,
      outputs: HashMap::new(),
    }
  }

  pub(crate) fn skipped(reason: SkipReason) -> Self {
    Self {
      status: JobStatus::Skipped,
      skip_reason: Some(reason),
      error: None,
      outputs: HashMap::new(),
    }
  }
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  /// Every non-skipped job succeeded.
  Succeeded,
  /// At least one non-skipped job failed.
  Failed,
  /// The run was cancelled.
  Cancelled,
}

/// Result of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
  /// Unique run id.
  pub run_id: String,
  pub status: RunStatus,
  /// Per-job reports, keyed by job id. Every job in the pipeline appears
  /// here with a terminal status.
  pub jobs: HashMap<String, JobReport>,
}

impl RunResult {
  /// The report for one job.
  pub fn job(&self, job_id: &str) -> Option<&JobReport> {
    self.jobs.get(job_id)
  }
}
