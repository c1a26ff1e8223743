//! Integration tests for ProcessExecutor using real shell scripts.

#![cfg(unix)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use trellis_graph::UsesRef;
use trellis_local::{ProcessExecutor, SecretStore};
use trellis_runtime::{ExecutorError, JobExecutor, JobRequest, OutcomeStatus};

/// Install a unit script under the executable name the executor derives
/// from the uses reference.
fn install_unit(units_dir: &Path, uses: &str, script: &str) {
  use std::os::unix::fs::PermissionsExt;

  let uses = UsesRef::parse(uses).unwrap();
  let file = units_dir.join(format!("{}--{}", uses.path.replace('/', "--"), uses.version));
  std::fs::write(&file, format!("#!/bin/sh\n{}\n", script)).unwrap();
  std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o755)).unwrap();
}

struct StaticSecrets(HashMap<String, String>);

impl SecretStore for StaticSecrets {
  fn resolve(&self, handle: &str) -> Option<String> {
    self.0.get(handle).cloned()
  }
}

fn request(uses: &str, inputs: &[(&str, &str)], secrets: &[(&str, &str)]) -> JobRequest {
  JobRequest {
    run_id: "run-1".to_string(),
    attempt_id: "attempt-1".to_string(),
    job_id: "job".to_string(),
    uses: UsesRef::parse(uses).unwrap(),
    inputs: inputs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect(),
    secrets: secrets
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect(),
    timeout_ms: None,
  }
}

#[tokio::test]
async fn test_successful_unit_publishes_outputs() {
  let units = tempfile::tempdir().unwrap();
  install_unit(
    units.path(),
    "acme/actions/echo@r1",
    r#"echo "artifact=foo-$INPUT_SUFFIX" >> "$TRELLIS_OUTPUT""#,
  );

  let executor = ProcessExecutor::new(units.path(), Arc::new(StaticSecrets(HashMap::new())));
  let outcome = executor
    .run_job(
      request("acme/actions/echo@r1", &[("suffix", "123")], &[]),
      CancellationToken::new(),
    )
    .await
    .unwrap();

  assert_eq!(outcome.status, OutcomeStatus::Success);
  assert_eq!(outcome.outputs["artifact"], "foo-123");
}

#[tokio::test]
async fn test_nonzero_exit_is_a_failure_outcome() {
  let units = tempfile::tempdir().unwrap();
  install_unit(units.path(), "acme/actions/fail@r1", "exit 3");

  let executor = ProcessExecutor::new(units.path(), Arc::new(StaticSecrets(HashMap::new())));
  let outcome = executor
    .run_job(
      request("acme/actions/fail@r1", &[], &[]),
      CancellationToken::new(),
    )
    .await
    .unwrap();

  assert_eq!(outcome.status, OutcomeStatus::Failure);
  assert!(outcome.outputs.is_empty());
}

#[tokio::test]
async fn test_missing_unit_is_a_spawn_error() {
  let units = tempfile::tempdir().unwrap();
  let executor = ProcessExecutor::new(units.path(), Arc::new(StaticSecrets(HashMap::new())));

  let result = executor
    .run_job(
      request("acme/actions/absent@r1", &[], &[]),
      CancellationToken::new(),
    )
    .await;

  assert!(matches!(result, Err(ExecutorError::Spawn { .. })));
}

#[tokio::test]
async fn test_secret_binding_is_injected_by_name() {
  let units = tempfile::tempdir().unwrap();
  install_unit(
    units.path(),
    "acme/actions/secret@r1",
    r#"
if [ "$PYPI_TOKEN" = "hunter2" ]; then
  echo "token=present" >> "$TRELLIS_OUTPUT"
fi"#,
  );

  let store = StaticSecrets(HashMap::from([(
    "CI_PYPI_TOKEN".to_string(),
    "hunter2".to_string(),
  )]));
  let executor = ProcessExecutor::new(units.path(), Arc::new(store));
  let outcome = executor
    .run_job(
      request(
        "acme/actions/secret@r1",
        &[],
        &[("PYPI_TOKEN", "CI_PYPI_TOKEN")],
      ),
      CancellationToken::new(),
    )
    .await
    .unwrap();

  assert_eq!(outcome.outputs["token"], "present");
}

#[tokio::test]
async fn test_unresolvable_secret_handle() {
  let units = tempfile::tempdir().unwrap();
  install_unit(units.path(), "acme/actions/secret@r1", "true");

  let executor = ProcessExecutor::new(units.path(), Arc::new(StaticSecrets(HashMap::new())));
  let result = executor
    .run_job(
      request("acme/actions/secret@r1", &[], &[("TOKEN", "MISSING")]),
      CancellationToken::new(),
    )
    .await;

  assert!(matches!(
    result,
    Err(ExecutorError::MissingSecret { ref handle }) if handle == "MISSING"
  ));
}

#[tokio::test]
async fn test_timeout_kills_the_unit() {
  let units = tempfile::tempdir().unwrap();
  install_unit(units.path(), "acme/actions/slow@r1", "sleep 30");

  let executor = ProcessExecutor::new(units.path(), Arc::new(StaticSecrets(HashMap::new())));
  let mut req = request("acme/actions/slow@r1", &[], &[]);
  req.timeout_ms = Some(200);

  let result = executor.run_job(req, CancellationToken::new()).await;
  assert!(matches!(
    result,
    Err(ExecutorError::Timeout { timeout_ms: 200 })
  ));
}

#[tokio::test]
async fn test_cancellation_interrupts_the_unit() {
  let units = tempfile::tempdir().unwrap();
  install_unit(units.path(), "acme/actions/slow@r1", "sleep 30");

  let executor = ProcessExecutor::new(units.path(), Arc::new(StaticSecrets(HashMap::new())));
  let cancel = CancellationToken::new();
  let canceller = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    canceller.cancel();
  });

  let result = executor
    .run_job(request("acme/actions/slow@r1", &[], &[]), cancel)
    .await;
  assert!(matches!(result, Err(ExecutorError::Cancelled)));
}
