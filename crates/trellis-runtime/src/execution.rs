//! Run execution.

use std::collections::HashMap;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use trellis_config::TriggerContext;
use trellis_expr::evaluate;
use trellis_graph::{Graph, Job, Pipeline};

use crate::error::RuntimeError;
use crate::executor::{ExecutorError, JobRequest, OutcomeStatus};
use crate::resolve::{OutputTable, resolve_inputs};
use crate::result::{JobReport, RunResult, RunStatus, SkipReason};
use crate::runtime::PipelineRuntime;

/// Per-job state during a run.
///
/// `Pending -> Running -> {Succeeded, Failed}` or straight to `Skipped`.
/// No job re-enters `Pending` once it left.
#[derive(Debug, Clone, Copy, PartialEq)]
enum JobState {
  Pending,
  Running,
  Succeeded,
  Failed,
  Skipped(SkipReason),
}

impl JobState {
  fn is_terminal(&self) -> bool {
    matches!(
      self,
      JobState::Succeeded | JobState::Failed | JobState::Skipped(_)
    )
  }
}

/// A handle to one run.
///
/// Call `.wait()` to drive the run and get the result.
pub struct Execution<'a> {
  runtime: &'a PipelineRuntime,
  run_id: String,
  context: TriggerContext,
  cancel: CancellationToken,
}

impl<'a> Execution<'a> {
  pub(crate) fn new(
    runtime: &'a PipelineRuntime,
    run_id: String,
    context: TriggerContext,
    cancel: CancellationToken,
  ) -> Self {
    Self {
      runtime,
      run_id,
      context,
      cancel,
    }
  }

  /// Drive the run to completion.
  #[instrument(
    name = "run_execute",
    skip(self),
    fields(
      pipeline = %self.runtime.pipeline.name,
      run_id = %self.run_id,
    )
  )]
  pub async fn wait(self) -> Result<RunResult, RuntimeError> {
    info!(
      event = %self.context.event.as_str(),
      ref_name = %self.context.ref_name,
      is_tag = self.context.is_tag,
      "run_started"
    );

    let result = self.run_loop().await;

    match &result {
      Ok(run) => {
        info!(status = ?run.status, "run_completed");
      }
      Err(e) => {
        error!(error = %e, "run_failed");
      }
    }

    result
  }

  /// The driver loop: pick the next ready batch, evaluate conditions,
  /// dispatch matching members concurrently, merge outputs, repeat until no
  /// batch remains.
  async fn run_loop(&self) -> Result<RunResult, RuntimeError> {
    let pipeline = &self.runtime.pipeline;
    let graph = pipeline.graph();

    let mut states: HashMap<String, JobState> = pipeline
      .jobs
      .iter()
      .map(|job| (job.job_id.clone(), JobState::Pending))
      .collect();
    let mut outputs = OutputTable::new();
    let mut errors: HashMap<String, String> = HashMap::new();
    let mut cancelled = false;

    loop {
      if self.cancel.is_cancelled() {
        warn!(run_id = %self.run_id, "run cancelled");
        for (job_id, state) in states.iter_mut() {
          if *state == JobState::Pending {
            *state = JobState::Skipped(SkipReason::RunCancelled);
            info!(run_id = %self.run_id, job_id = %job_id, reason = "run cancelled", "job_skipped");
          }
        }
        cancelled = true;
        break;
      }

      let mut progressed = false;
      let mut batch: Vec<&Job> = Vec::new();

      // Declaration order is the tie-break within a batch.
      for job in &pipeline.jobs {
        if states[&job.job_id] != JobState::Pending {
          continue;
        }
        if !deps_satisfied(job, &states) {
          continue;
        }
        if let Some(condition) = &job.condition {
          if !evaluate(condition, &self.context) {
            states.insert(
              job.job_id.clone(),
              JobState::Skipped(SkipReason::ConditionNotMet),
            );
            info!(run_id = %self.run_id, job_id = %job.job_id, reason = "condition not met", "job_skipped");
            cascade(&graph, pipeline, &job.job_id, &mut states, &self.run_id);
            progressed = true;
            continue;
          }
        }
        batch.push(job);
      }

      if batch.is_empty() {
        if progressed {
          continue;
        }
        break;
      }

      let batch_ids: Vec<&str> = batch.iter().map(|j| j.job_id.as_str()).collect();
      info!(run_id = %self.run_id, batch = ?batch_ids, "dispatching ready batch");

      // Resolve inputs immediately before dispatch; a resolution error is
      // fatal to the dependent job only.
      let mut handles = Vec::with_capacity(batch.len());
      for job in batch {
        let resolved = match resolve_inputs(job, &outputs) {
          Ok(resolved) => resolved,
          Err(e) => {
            error!(run_id = %self.run_id, job_id = %job.job_id, error = %e, "job_failed");
            errors.insert(job.job_id.clone(), e.to_string());
            states.insert(job.job_id.clone(), JobState::Failed);
            cascade(&graph, pipeline, &job.job_id, &mut states, &self.run_id);
            continue;
          }
        };

        let request = JobRequest {
          run_id: self.run_id.clone(),
          attempt_id: uuid::Uuid::new_v4().to_string(),
          job_id: job.job_id.clone(),
          uses: job.uses.clone(),
          inputs: resolved,
          secrets: job.secrets.clone(),
          timeout_ms: job.timeout_ms,
        };

        info!(
          run_id = %self.run_id,
          job_id = %job.job_id,
          attempt_id = %request.attempt_id,
          uses = %request.uses,
          "job_started"
        );
        states.insert(job.job_id.clone(), JobState::Running);

        let executor = self.runtime.executor.clone();
        let cancel = self.cancel.clone();
        let job_id = job.job_id.clone();
        handles.push(tokio::spawn(async move {
          let outcome = executor.run_job(request, cancel).await;
          (job_id, outcome)
        }));
      }

      // Suspend until every member of the batch is terminal. In-flight jobs
      // observe the cancellation token themselves, so this also drains a
      // cancelled batch promptly.
      for joined in join_all(handles).await {
        let (job_id, outcome) = joined.map_err(|e| RuntimeError::Join {
          message: e.to_string(),
        })?;

        match outcome {
          Ok(outcome) if outcome.status == OutcomeStatus::Success => {
            info!(run_id = %self.run_id, job_id = %job_id, "job_completed");
            // Published once, read-only thereafter.
            outputs.insert(job_id.clone(), outcome.outputs);
            states.insert(job_id, JobState::Succeeded);
          }
          Ok(_) => {
            error!(run_id = %self.run_id, job_id = %job_id, "job_failed");
            states.insert(job_id.clone(), JobState::Failed);
            cascade(&graph, pipeline, &job_id, &mut states, &self.run_id);
          }
          Err(ExecutorError::Cancelled) => {
            // The loop top sweeps the remaining pending jobs next pass.
            warn!(run_id = %self.run_id, job_id = %job_id, "job cancelled in flight");
            states.insert(job_id.clone(), JobState::Skipped(SkipReason::RunCancelled));
          }
          Err(e) => {
            let cause = RuntimeError::Execution {
              job_id: job_id.clone(),
              source: e,
            };
            error!(run_id = %self.run_id, job_id = %job_id, error = %cause, "job_failed");
            errors.insert(job_id.clone(), cause.to_string());
            states.insert(job_id.clone(), JobState::Failed);
            cascade(&graph, pipeline, &job_id, &mut states, &self.run_id);
          }
        }
      }
    }

    let status = if cancelled {
      RunStatus::Cancelled
    } else if states.values().any(|s| *s == JobState::Failed) {
      RunStatus::Failed
    } else {
      RunStatus::Succeeded
    };

    let jobs = states
      .into_iter()
      .map(|(job_id, state)| {
        let report = match state {
          JobState::Succeeded => {
            JobReport::succeeded(outputs.get(&job_id).cloned().unwrap_or_default())
          }
          JobState::Failed => JobReport::failed(errors.remove(&job_id)),
          JobState::Skipped(reason) => JobReport::skipped(reason),
          // Unreachable for a validated DAG; recorded as skipped so the
          // report still covers every job.
          JobState::Pending | JobState::Running => {
            JobReport::skipped(SkipReason::UpstreamFailed)
          }
        };
        (job_id, report)
      })
      .collect();

    Ok(RunResult {
      run_id: self.run_id.clone(),
      status,
      jobs,
    })
  }
}

/// Whether a job's dependencies allow it to become ready.
///
/// Strict jobs require every dependency to have succeeded; run-always jobs
/// only require every dependency to be terminal.
fn deps_satisfied(job: &Job, states: &HashMap<String, JobState>) -> bool {
  if job.run_always {
    job
      .needs
      .iter()
      .all(|dep| states.get(dep).is_some_and(JobState::is_terminal))
  } else {
    job
      .needs
      .iter()
      .all(|dep| states.get(dep) == Some(&JobState::Succeeded))
  }
}

/// Skip the strict dependents of a failed or skipped job, transitively.
fn cascade(
  graph: &Graph,
  pipeline: &Pipeline,
  from: &str,
  states: &mut HashMap<String, JobState>,
  run_id: &str,
) {
  for dependent_id in graph.downstream(from) {
    let Some(dependent) = pipeline.get_job(dependent_id) else {
      continue;
    };
    if dependent.run_always {
      continue;
    }
    if states.get(dependent_id) == Some(&JobState::Pending) {
      states.insert(
        dependent_id.clone(),
        JobState::Skipped(SkipReason::UpstreamFailed),
      );
      info!(run_id = %run_id, job_id = %dependent_id, reason = "upstream failed", "job_skipped");
      cascade(graph, pipeline, dependent_id, states, run_id);
    }
  }
}
