use std::collections::HashMap;

use crate::job::Job;

/// Adjacency structure over the `needs` relation, for traversal.
///
/// Edges run from producer to dependent: `downstream(a)` lists the jobs
/// whose `needs` include `a`.
#[derive(Debug, Clone)]
pub struct Graph {
  /// job_id -> jobs that need it, in declaration order.
  dependents: HashMap<String, Vec<String>>,
  /// Jobs with an empty needs list, in declaration order.
  roots: Vec<String>,
}

impl Graph {
  /// Build the adjacency structure from locked jobs.
  pub fn new(jobs: &[Job]) -> Self {
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();

    for job in jobs {
      dependents.entry(job.job_id.clone()).or_default();
    }
    for job in jobs {
      for dep in &job.needs {
        dependents
          .entry(dep.clone())
          .or_default()
          .push(job.job_id.clone());
      }
    }

    let roots = jobs
      .iter()
      .filter(|job| job.needs.is_empty())
      .map(|job| job.job_id.clone())
      .collect();

    Self { dependents, roots }
  }

  /// Jobs with no dependencies.
  pub fn roots(&self) -> &[String] {
    &self.roots
  }

  /// Jobs that directly depend on the given job.
  pub fn downstream(&self, job_id: &str) -> &[String] {
    self
      .dependents
      .get(job_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }
}
