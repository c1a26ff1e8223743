//! Input resolution against the run's output table.
//!
//! Resolution happens immediately before a job dispatches, never earlier:
//! outputs flow only along declared edges and are frozen once the producer
//! finishes.
//!
//! A literal passes through verbatim. A reference looks up the producer's
//! recorded output; a missing output resolves to the empty string (an
//! absent fact, not an error), matching condition semantics. A projected
//! reference additionally parses the output as JSON and projects the named
//! field — a malformed document or an absent field is a resolution error,
//! recorded as the dependent job's failure.

use std::collections::HashMap;

use trellis_expr::{InputExpr, OutputRef};
use trellis_graph::Job;

use crate::error::RuntimeError;

/// Outputs recorded so far, keyed by producer job id.
pub(crate) type OutputTable = HashMap<String, HashMap<String, String>>;

/// Resolve every declared input of a job.
pub(crate) fn resolve_inputs(
  job: &Job,
  outputs: &OutputTable,
) -> Result<HashMap<String, String>, RuntimeError> {
  let mut resolved = HashMap::new();
  for (name, expr) in &job.inputs {
    let value = match expr {
      InputExpr::Literal(value) => value.clone(),
      InputExpr::Reference(reference) => {
        resolve_reference(&job.job_id, name, reference, outputs)?
      }
    };
    resolved.insert(name.clone(), value);
  }
  Ok(resolved)
}

fn resolve_reference(
  job_id: &str,
  input: &str,
  reference: &OutputRef,
  outputs: &OutputTable,
) -> Result<String, RuntimeError> {
  let recorded = outputs
    .get(&reference.job_id)
    .and_then(|map| map.get(&reference.output));

  let Some(raw) = recorded else {
    // The producer published nothing under this name (or was skipped).
    return Ok(String::new());
  };

  let Some(field) = &reference.projection else {
    return Ok(raw.clone());
  };

  let document: serde_json::Value =
    serde_json::from_str(raw).map_err(|e| RuntimeError::Resolution {
      job_id: job_id.to_string(),
      message: format!(
        "input '{}': output '{}.{}' is not well-formed JSON: {}",
        input, reference.job_id, reference.output, e
      ),
    })?;

  let projected = document.get(field).ok_or_else(|| RuntimeError::Resolution {
    job_id: job_id.to_string(),
    message: format!(
      "input '{}': field '{}' absent from output '{}.{}'",
      input, field, reference.job_id, reference.output
    ),
  })?;

  Ok(match projected {
    serde_json::Value::String(s) => s.clone(),
    other => other.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use trellis_expr::parse_input;
  use trellis_graph::{Job, UsesRef};

  use super::*;

  fn job_with_inputs(inputs: &[(&str, &str)]) -> Job {
    Job {
      job_id: "consumer".to_string(),
      uses: UsesRef::parse("acme/actions/consumer@r1").unwrap(),
      needs: vec!["producer".to_string()],
      inputs: inputs
        .iter()
        .map(|(name, raw)| (name.to_string(), parse_input(raw).unwrap()))
        .collect(),
      condition: None,
      run_always: false,
      secrets: HashMap::new(),
      timeout_ms: None,
    }
  }

  fn table(outputs: &[(&str, &str)]) -> OutputTable {
    let mut producer = HashMap::new();
    for (name, value) in outputs {
      producer.insert(name.to_string(), value.to_string());
    }
    HashMap::from([("producer".to_string(), producer)])
  }

  #[test]
  fn test_literal_passthrough() {
    let job = job_with_inputs(&[("python", "3.13")]);
    let resolved = resolve_inputs(&job, &OutputTable::new()).unwrap();
    assert_eq!(resolved["python"], "3.13");
  }

  #[test]
  fn test_plain_reference() {
    let job = job_with_inputs(&[("coverage", "${{ needs.producer.outputs.coverage }}")]);
    let resolved = resolve_inputs(&job, &table(&[("coverage", "87.5")])).unwrap();
    assert_eq!(resolved["coverage"], "87.5");
  }

  #[test]
  fn test_missing_output_resolves_empty() {
    let job = job_with_inputs(&[("coverage", "${{ needs.producer.outputs.coverage }}")]);
    let resolved = resolve_inputs(&job, &OutputTable::new()).unwrap();
    assert_eq!(resolved["coverage"], "");
  }

  #[test]
  fn test_projection() {
    let job = job_with_inputs(&[(
      "xml",
      "${{ fromJson(needs.producer.outputs.artifact_names).x }}",
    )]);
    let resolved = resolve_inputs(
      &job,
      &table(&[("artifact_names", r#"{"artifact_names": 0, "x": "foo-123"}"#)]),
    )
    .unwrap();
    assert_eq!(resolved["xml"], "foo-123");
  }

  #[test]
  fn test_projection_missing_field() {
    let job = job_with_inputs(&[(
      "xml",
      "${{ fromJson(needs.producer.outputs.artifact_names).y }}",
    )]);
    let err = resolve_inputs(&job, &table(&[("artifact_names", r#"{"x": "foo-123"}"#)]))
      .unwrap_err();
    assert!(matches!(err, RuntimeError::Resolution { .. }));
  }

  #[test]
  fn test_projection_malformed_json() {
    let job = job_with_inputs(&[(
      "xml",
      "${{ fromJson(needs.producer.outputs.artifact_names).x }}",
    )]);
    let err =
      resolve_inputs(&job, &table(&[("artifact_names", "not json")])).unwrap_err();
    assert!(matches!(err, RuntimeError::Resolution { .. }));
  }

  #[test]
  fn test_projection_of_non_string_field() {
    let job = job_with_inputs(&[(
      "count",
      "${{ fromJson(needs.producer.outputs.stats).total }}",
    )]);
    let resolved = resolve_inputs(&job, &table(&[("stats", r#"{"total": 42}"#)])).unwrap();
    assert_eq!(resolved["count"], "42");
  }
}
