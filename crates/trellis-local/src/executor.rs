//! Process spawning and the output-file protocol.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use trellis_runtime::{ExecutorError, JobExecutor, JobOutcome, JobRequest};

use crate::secrets::SecretStore;

/// Executes jobs as local processes.
///
/// The `uses` reference `path@version` maps to the executable
/// `<units_dir>/<path with '/' replaced by '--'>--<version>`.
pub struct ProcessExecutor {
  units_dir: PathBuf,
  secrets: Arc<dyn SecretStore>,
}

impl ProcessExecutor {
  pub fn new(units_dir: impl Into<PathBuf>, secrets: Arc<dyn SecretStore>) -> Self {
    Self {
      units_dir: units_dir.into(),
      secrets,
    }
  }

  fn unit_path(&self, uses: &trellis_graph::UsesRef) -> PathBuf {
    let sanitized = uses.path.replace('/', "--");
    self.units_dir.join(format!("{}--{}", sanitized, uses.version))
  }
}

#[async_trait]
impl JobExecutor for ProcessExecutor {
  #[instrument(
    name = "process_execute",
    skip(self, request, cancel),
    fields(
      run_id = %request.run_id,
      job_id = %request.job_id,
      uses = %request.uses,
    )
  )]
  async fn run_job(
    &self,
    request: JobRequest,
    cancel: CancellationToken,
  ) -> Result<JobOutcome, ExecutorError> {
    if cancel.is_cancelled() {
      return Err(ExecutorError::Cancelled);
    }

    let program = self.unit_path(&request.uses);
    let scratch = tempfile::tempdir()?;
    let output_path = scratch.path().join("outputs");

    let mut cmd = Command::new(&program);
    cmd
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .env("TRELLIS_OUTPUT", &output_path)
      .env("TRELLIS_RUN_ID", &request.run_id)
      .env("TRELLIS_JOB_ID", &request.job_id);

    for (name, value) in &request.inputs {
      cmd.env(input_env_name(name), value);
    }

    // Secret handles resolve here and go straight into the environment;
    // only the binding names appear in events.
    for (name, handle) in &request.secrets {
      let value = self
        .secrets
        .resolve(handle)
        .ok_or_else(|| ExecutorError::MissingSecret {
          handle: handle.clone(),
        })?;
      cmd.env(name, value);
    }

    info!(program = %program.display(), "spawning unit");

    let child = cmd.spawn().map_err(|source| ExecutorError::Spawn {
      uses: request.uses.to_string(),
      source,
    })?;

    let timeout_ms = request.timeout_ms;
    let wait = async move {
      if let Some(ms) = timeout_ms {
        match tokio::time::timeout(Duration::from_millis(ms), child.wait_with_output()).await {
          Ok(result) => result.map_err(ExecutorError::Io),
          // Dropping the timed-out future kills the child.
          Err(_) => Err(ExecutorError::Timeout { timeout_ms: ms }),
        }
      } else {
        child.wait_with_output().await.map_err(ExecutorError::Io)
      }
    };

    let output = tokio::select! {
      result = wait => result?,
      _ = cancel.cancelled() => return Err(ExecutorError::Cancelled),
    };

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      warn!(
        code = output.status.code().unwrap_or(-1),
        stderr = %stderr.trim_end(),
        "unit failed"
      );
      return Ok(JobOutcome::failure());
    }

    debug!(
      stdout_bytes = output.stdout.len(),
      "unit completed"
    );

    let outputs = read_outputs(&output_path).await?;
    Ok(JobOutcome::success(outputs))
  }
}

/// `INPUT_` + name uppercased, with '-' mapped to '_'.
fn input_env_name(name: &str) -> String {
  format!("INPUT_{}", name.replace('-', "_").to_uppercase())
}

/// Parse the output file: one `name=value` per non-empty line.
async fn read_outputs(path: &Path) -> Result<HashMap<String, String>, ExecutorError> {
  let mut outputs = HashMap::new();

  let content = match tokio::fs::read_to_string(path).await {
    Ok(content) => content,
    // The unit published nothing.
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(outputs),
    Err(e) => return Err(ExecutorError::Io(e)),
  };

  for line in content.lines() {
    if line.trim().is_empty() {
      continue;
    }
    let Some((name, value)) = line.split_once('=') else {
      return Err(ExecutorError::MalformedOutput {
        line: line.to_string(),
      });
    };
    outputs.insert(name.trim().to_string(), value.to_string());
  }

  Ok(outputs)
}
