//! Pipeline runtime for Trellis.
//!
//! This crate drives a locked pipeline to completion: it computes ready
//! batches, evaluates run conditions against the trigger context, resolves
//! each job's inputs immediately before dispatch, hands the job to a
//! pluggable [`JobExecutor`], and propagates failures and skips along the
//! dependency edges.
//!
//! # Architecture
//!
//! ```text
//! PipelineRuntime
//! ├── new(pipeline, executor) - owns the locked pipeline and the executor
//! └── execute(context, cancel) -> Execution
//!
//! Execution
//! └── wait() - the driver loop: ready batches, conditions, cascades,
//!              concurrent dispatch, output table
//! ```
//!
//! The evaluator does not know what a job does; the [`JobExecutor`] boundary
//! receives resolved inputs and secret bindings and reports back a status
//! and an output map.

mod error;
mod execution;
mod executor;
mod resolve;
mod result;
mod runtime;

pub use error::RuntimeError;
pub use execution::Execution;
pub use executor::{ExecutorError, JobExecutor, JobOutcome, JobRequest, OutcomeStatus};
pub use result::{JobReport, JobStatus, RunResult, RunStatus, SkipReason};
pub use runtime::PipelineRuntime;
