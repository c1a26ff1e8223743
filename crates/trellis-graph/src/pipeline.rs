use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use trellis_config::{JobDef, PipelineDef, TriggerDef};
use trellis_expr::{InputExpr, parse_condition, parse_input};

use crate::error::ConfigError;
use crate::graph::Graph;
use crate::job::Job;
use crate::schedule;
use crate::uses::UsesRef;
use crate::validate;

/// A locked pipeline ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
  pub name: String,
  pub trigger: TriggerDef,
  /// Jobs in declaration order.
  pub jobs: Vec<Job>,
}

impl Pipeline {
  /// Validate a definition and lock it for execution.
  ///
  /// Parses every expression, then checks id uniqueness, the `needs`
  /// relation (all ids known, no cycles) and that every output reference
  /// names a declared dependency. Fails fast with the offending job named;
  /// nothing is ever dispatched from a definition that does not lock.
  pub fn lock(def: PipelineDef) -> Result<Self, ConfigError> {
    let jobs = def
      .jobs
      .iter()
      .map(lock_job)
      .collect::<Result<Vec<_>, _>>()?;

    validate::validate(&jobs)?;

    Ok(Self {
      name: def.name,
      trigger: def.trigger,
      jobs,
    })
  }

  /// Get a job by id.
  pub fn get_job(&self, job_id: &str) -> Option<&Job> {
    self.jobs.iter().find(|j| j.job_id == job_id)
  }

  /// Build the adjacency structure for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.jobs)
  }

  /// The topological batch schedule, stable by declaration order.
  pub fn schedule(&self) -> Vec<Vec<String>> {
    schedule::batches(&self.jobs)
  }
}

fn lock_job(def: &JobDef) -> Result<Job, ConfigError> {
  let uses = UsesRef::parse(&def.uses).ok_or_else(|| ConfigError::InvalidUses {
    job_id: def.job_id.clone(),
    uses: def.uses.clone(),
  })?;

  let condition = def
    .condition
    .as_deref()
    .map(|src| {
      parse_condition(src).map_err(|source| ConfigError::InvalidExpression {
        job_id: def.job_id.clone(),
        location: "if".to_string(),
        source,
      })
    })
    .transpose()?;

  let mut inputs = HashMap::new();
  for (name, raw) in &def.inputs {
    let expr = parse_input(raw).map_err(|source| ConfigError::InvalidExpression {
      job_id: def.job_id.clone(),
      location: format!("input '{}'", name),
      source,
    })?;
    inputs.insert(name.clone(), expr);
  }

  let run_always = condition
    .as_ref()
    .is_some_and(trellis_expr::Expr::mentions_always);

  Ok(Job {
    job_id: def.job_id.clone(),
    uses,
    needs: def.needs.clone(),
    inputs,
    condition,
    run_always,
    secrets: def.secrets.clone(),
    timeout_ms: def.timeout_ms,
  })
}

#[cfg(test)]
mod tests {
  use trellis_config::PipelineDef;

  use super::*;

  fn lock(doc: &str) -> Result<Pipeline, ConfigError> {
    Pipeline::lock(PipelineDef::from_json(doc).unwrap())
  }

  fn job(job_id: &str, needs: &[&str]) -> String {
    format!(
      r#"{{ "job_id": "{}", "uses": "acme/actions/{}@r1", "needs": [{}] }}"#,
      job_id,
      job_id,
      needs
        .iter()
        .map(|n| format!("\"{}\"", n))
        .collect::<Vec<_>>()
        .join(", ")
    )
  }

  fn doc(jobs: &[String]) -> String {
    format!(r#"{{ "name": "ci", "jobs": [{}] }}"#, jobs.join(", "))
  }

  #[test]
  fn test_lock_diamond() {
    let pipeline = lock(&doc(&[
      job("a", &[]),
      job("b", &["a"]),
      job("c", &["a"]),
      job("d", &["b", "c"]),
    ]))
    .unwrap();

    assert_eq!(pipeline.jobs.len(), 4);
    assert_eq!(
      pipeline.schedule(),
      vec![
        vec!["a".to_string()],
        vec!["b".to_string(), "c".to_string()],
        vec!["d".to_string()],
      ]
    );
  }

  #[test]
  fn test_lock_rejects_cycle() {
    let err = lock(&doc(&[
      job("a", &["c"]),
      job("b", &["a"]),
      job("c", &["b"]),
    ]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::Cycle { .. }));
  }

  #[test]
  fn test_lock_rejects_self_cycle() {
    let err = lock(&doc(&[job("a", &["a"])])).unwrap_err();
    assert!(matches!(err, ConfigError::Cycle { .. }));
  }

  #[test]
  fn test_lock_rejects_unknown_dependency() {
    let err = lock(&doc(&[job("a", &["missing"])])).unwrap_err();
    assert!(matches!(
      err,
      ConfigError::UnknownDependency { ref dependency, .. } if dependency == "missing"
    ));
  }

  #[test]
  fn test_lock_rejects_duplicate_job() {
    let err = lock(&doc(&[job("a", &[]), job("a", &[])])).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateJob { .. }));
  }

  #[test]
  fn test_lock_rejects_undeclared_reference() {
    let err = lock(
      r#"{
        "name": "ci",
        "jobs": [
          { "job_id": "a", "uses": "acme/actions/a@r1" },
          {
            "job_id": "b",
            "uses": "acme/actions/b@r1",
            "inputs": { "x": "${{ needs.a.outputs.value }}" }
          }
        ]
      }"#,
    )
    .unwrap_err();
    assert!(matches!(
      err,
      ConfigError::UndeclaredReference { ref producer, .. } if producer == "a"
    ));
  }

  #[test]
  fn test_lock_rejects_bad_uses() {
    let err = lock(r#"{ "name": "ci", "jobs": [{ "job_id": "a", "uses": "no-version" }] }"#)
      .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUses { .. }));
  }

  #[test]
  fn test_lock_marks_run_always() {
    let pipeline = lock(
      r#"{
        "name": "ci",
        "jobs": [
          { "job_id": "build", "uses": "acme/actions/build@r1" },
          {
            "job_id": "cleanup",
            "uses": "acme/actions/cleanup@r1",
            "needs": ["build"],
            "if": "always()"
          }
        ]
      }"#,
    )
    .unwrap();

    assert!(pipeline.get_job("cleanup").unwrap().run_always);
    assert!(!pipeline.get_job("build").unwrap().run_always);
  }

  #[test]
  fn test_schedule_consistent_with_partial_order() {
    let pipeline = lock(&doc(&[
      job("e", &["d"]),
      job("d", &["b", "c"]),
      job("b", &["a"]),
      job("c", &["a"]),
      job("a", &[]),
    ]))
    .unwrap();

    let schedule = pipeline.schedule();
    let position = |id: &str| {
      schedule
        .iter()
        .position(|batch| batch.iter().any(|j| j == id))
        .unwrap()
    };

    for job in &pipeline.jobs {
      for dep in &job.needs {
        assert!(position(dep) < position(&job.job_id));
      }
    }
    // Declaration order is the tie-break within a batch.
    assert_eq!(schedule[1], vec!["b".to_string(), "c".to_string()]);
  }
}
