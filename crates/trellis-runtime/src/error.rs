//! Runtime errors.

use crate::executor::ExecutorError;

/// Errors that can occur while driving a run.
///
/// Resolution and execution failures are fatal to the affected job only;
/// they are recorded in that job's report and cascade as skips, so the
/// driver surfaces them through [`crate::RunResult`] rather than here.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  /// Input resolution failed for a job.
  #[error("failed to resolve inputs for job '{job_id}': {message}")]
  Resolution { job_id: String, message: String },

  /// The executor reported a failure that is not a normal job outcome.
  #[error("execution failed for job '{job_id}'")]
  Execution {
    job_id: String,
    #[source]
    source: ExecutorError,
  },

  /// A dispatched task could not be joined.
  #[error("task join error: {message}")]
  Join { message: String },
}
