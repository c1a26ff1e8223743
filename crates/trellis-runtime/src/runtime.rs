//! Pipeline runtime.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use trellis_config::TriggerContext;
use trellis_graph::Pipeline;

use crate::execution::Execution;
use crate::executor::JobExecutor;

/// The pipeline runtime.
///
/// Owns a locked pipeline and the executor, and creates one [`Execution`]
/// per trigger. The runtime holds no per-run state: every run owns its job
/// states and output table and is destroyed at run completion.
pub struct PipelineRuntime {
  pub(crate) pipeline: Pipeline,
  pub(crate) executor: Arc<dyn JobExecutor>,
}

impl PipelineRuntime {
  /// Create a runtime for the given locked pipeline.
  pub fn new(pipeline: Pipeline, executor: Arc<dyn JobExecutor>) -> Self {
    Self { pipeline, executor }
  }

  /// Instantiate a run for the given trigger context.
  ///
  /// Returns an [`Execution`] handle; call `.wait()` to drive the run and
  /// get the result.
  pub fn execute(&self, context: TriggerContext, cancel: CancellationToken) -> Execution<'_> {
    let run_id = uuid::Uuid::new_v4().to_string();
    Execution::new(self, run_id, context, cancel)
  }

  /// Get a reference to the pipeline.
  pub fn pipeline(&self) -> &Pipeline {
    &self.pipeline
  }
}
