//! Topological batch scheduling.

use std::collections::HashSet;

use crate::job::Job;

/// Compute the batch schedule for a validated job set.
///
/// Each batch holds the jobs whose dependencies are all satisfied by earlier
/// batches; members of one batch are eligible to run concurrently. Within a
/// batch, jobs appear in declaration order, so the schedule is deterministic
/// and reproducible.
///
/// Assumes the jobs already passed validation; on a cyclic input the tail of
/// the graph simply never becomes ready and is not emitted.
pub fn batches(jobs: &[Job]) -> Vec<Vec<String>> {
  let mut scheduled: HashSet<&str> = HashSet::new();
  let mut result = Vec::new();

  loop {
    let batch: Vec<&Job> = jobs
      .iter()
      .filter(|job| !scheduled.contains(job.job_id.as_str()))
      .filter(|job| {
        job
          .needs
          .iter()
          .all(|dep| scheduled.contains(dep.as_str()))
      })
      .collect();

    if batch.is_empty() {
      break;
    }
    // Mark after collecting, so jobs in the same batch never observe each
    // other as satisfied.
    for job in &batch {
      scheduled.insert(job.job_id.as_str());
    }
    result.push(batch.iter().map(|job| job.job_id.clone()).collect());
  }

  result
}
