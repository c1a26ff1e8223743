//! The executor boundary.
//!
//! The evaluator knows nothing about what a job does. An executor receives
//! the job's resolved inputs and its secret bindings, runs the referenced
//! external unit of work, and reports a status plus an output map. Secret
//! handles are resolved inside the executor so values never pass through
//! the evaluator and never appear in its events.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use trellis_graph::UsesRef;

/// Everything an executor needs to run one job.
#[derive(Debug, Clone)]
pub struct JobRequest {
  /// The run this job belongs to.
  pub run_id: String,
  /// Unique id for this dispatch.
  pub attempt_id: String,
  /// The job being executed.
  pub job_id: String,
  /// The external unit of work, versioned by tag or branch.
  pub uses: UsesRef,
  /// Fully resolved input parameters.
  pub inputs: HashMap<String, String>,
  /// Secret bindings: name -> external handle. The executor resolves the
  /// handle; the value must never be logged or echoed.
  pub secrets: HashMap<String, String>,
  /// Per-job timeout, enforced by the executor.
  pub timeout_ms: Option<u64>,
}

/// What the unit of work reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
  Success,
  Failure,
}

/// Result of one job execution.
#[derive(Debug, Clone)]
pub struct JobOutcome {
  pub status: OutcomeStatus,
  /// Named outputs published by the job. One of these may itself be a
  /// JSON-encoded object that dependents project fields from.
  pub outputs: HashMap<String, String>,
}

impl JobOutcome {
  pub fn success(outputs: HashMap<String, String>) -> Self {
    Self {
      status: OutcomeStatus::Success,
      outputs,
    }
  }

  pub fn failure() -> Self {
    Self {
      status: OutcomeStatus::Failure,
      outputs: HashMap::new(),
    }
  }
}

/// Errors an executor can raise outside a normal job outcome.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
  #[error("failed to start unit '{uses}': {source}")]
  Spawn {
    uses: String,
    #[source]
    source: std::io::Error,
  },

  /// A timed-out job is treated as failed by the driver.
  #[error("job timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  #[error("execution cancelled")]
  Cancelled,

  #[error("secret handle '{handle}' could not be resolved")]
  MissingSecret { handle: String },

  #[error("malformed output line '{line}'")]
  MalformedOutput { line: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

/// The sole collaborator boundary of the evaluator.
#[async_trait]
pub trait JobExecutor: Send + Sync {
  /// Run one job to completion, honoring the cancellation token and the
  /// request's timeout.
  async fn run_job(
    &self,
    request: JobRequest,
    cancel: CancellationToken,
  ) -> Result<JobOutcome, ExecutorError>;
}
