//! Static validation of the locked job set.
//!
//! All checks here run before any job dispatches; a failure is fatal to the
//! whole pipeline and names the offending job or edge.

use std::collections::{HashMap, HashSet};

use crate::error::ConfigError;
use crate::job::Job;

/// Run every static check: unique ids, known dependencies, declared
/// references, acyclicity.
pub fn validate(jobs: &[Job]) -> Result<(), ConfigError> {
  check_unique_ids(jobs)?;
  check_known_dependencies(jobs)?;
  check_declared_references(jobs)?;
  check_acyclic(jobs)
}

fn check_unique_ids(jobs: &[Job]) -> Result<(), ConfigError> {
  let mut seen = HashSet::new();
  for job in jobs {
    if !seen.insert(job.job_id.as_str()) {
      return Err(ConfigError::DuplicateJob {
        job_id: job.job_id.clone(),
      });
    }
  }
  Ok(())
}

fn check_known_dependencies(jobs: &[Job]) -> Result<(), ConfigError> {
  let ids: HashSet<&str> = jobs.iter().map(|j| j.job_id.as_str()).collect();
  for job in jobs {
    for dep in &job.needs {
      if !ids.contains(dep.as_str()) {
        return Err(ConfigError::UnknownDependency {
          job_id: job.job_id.clone(),
          dependency: dep.clone(),
        });
      }
    }
  }
  Ok(())
}

/// Every output reference must name a job textually present in the
/// referencing job's own `needs` list.
fn check_declared_references(jobs: &[Job]) -> Result<(), ConfigError> {
  for job in jobs {
    let declared: HashSet<&str> = job.needs.iter().map(String::as_str).collect();
    for (input, expr) in &job.inputs {
      if let Some(reference) = expr.reference() {
        if !declared.contains(reference.job_id.as_str()) {
          return Err(ConfigError::UndeclaredReference {
            job_id: job.job_id.clone(),
            input: input.clone(),
            producer: reference.job_id.clone(),
          });
        }
      }
    }
  }
  Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
  Unvisited,
  InProgress,
  Done,
}

/// Cycle detection: depth-first traversal over the `needs` edges with
/// three-color marking. Seeing an in-progress job again means a cycle.
fn check_acyclic(jobs: &[Job]) -> Result<(), ConfigError> {
  let needs: HashMap<&str, &[String]> = jobs
    .iter()
    .map(|j| (j.job_id.as_str(), j.needs.as_slice()))
    .collect();
  let mut marks: HashMap<&str, Mark> = jobs
    .iter()
    .map(|j| (j.job_id.as_str(), Mark::Unvisited))
    .collect();

  for job in jobs {
    visit(job.job_id.as_str(), &needs, &mut marks)?;
  }
  Ok(())
}

fn visit<'a>(
  job_id: &'a str,
  needs: &HashMap<&'a str, &'a [String]>,
  marks: &mut HashMap<&'a str, Mark>,
) -> Result<(), ConfigError> {
  match marks.get(job_id).copied().unwrap_or(Mark::Unvisited) {
    Mark::Done => return Ok(()),
    Mark::InProgress => {
      return Err(ConfigError::Cycle {
        job_id: job_id.to_string(),
      });
    }
    Mark::Unvisited => {}
  }

  marks.insert(job_id, Mark::InProgress);
  if let Some(deps) = needs.get(job_id) {
    for dep in deps.iter() {
      visit(dep.as_str(), needs, marks)?;
    }
  }
  marks.insert(job_id, Mark::Done);
  Ok(())
}
