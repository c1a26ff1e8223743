use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;
use crate::job::JobDef;
use crate::trigger::TriggerDef;

/// A pipeline definition as authored.
///
/// Jobs are kept in declaration order; the scheduler uses that order as the
/// tie-break within a batch so runs are reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDef {
  pub name: String,

  #[serde(default, rename = "on")]
  pub trigger: TriggerDef,

  pub jobs: Vec<JobDef>,
}

impl PipelineDef {
  /// Load a definition from a JSON document.
  pub fn from_json(document: &str) -> Result<Self, DefinitionError> {
    let def: PipelineDef = serde_json::from_str(document)?;
    if let Some(schedule) = &def.trigger.schedule {
      schedule.validate()?;
    }
    Ok(def)
  }

  /// Find a job by id.
  pub fn get_job(&self, job_id: &str) -> Option<&JobDef> {
    self.jobs.iter().find(|j| j.job_id == job_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_minimal_pipeline() {
    let doc = r#"{
      "name": "ci",
      "jobs": [
        { "job_id": "unit", "uses": "acme/actions/unit-testing@r1" }
      ]
    }"#;

    let def = PipelineDef::from_json(doc).unwrap();
    assert_eq!(def.name, "ci");
    assert_eq!(def.jobs.len(), 1);
    assert!(def.get_job("unit").is_some());
    assert!(def.get_job("unit").unwrap().needs.is_empty());
  }

  #[test]
  fn test_parse_full_job() {
    let doc = r#"{
      "name": "ci",
      "on": {
        "push": { "branches": ["main"], "tags": ["v*"] },
        "schedule": { "cron": "0 6 * * 0" }
      },
      "jobs": [
        { "job_id": "unit", "uses": "acme/actions/unit-testing@r1" },
        {
          "job_id": "publish",
          "uses": "acme/actions/publish@r1",
          "needs": ["unit"],
          "inputs": { "coverage": "${{ needs.unit.outputs.coverage }}" },
          "if": "is_tag",
          "secrets": { "PYPI_TOKEN": "PYPI_TOKEN" },
          "timeout_ms": 600000
        }
      ]
    }"#;

    let def = PipelineDef::from_json(doc).unwrap();
    let publish = def.get_job("publish").unwrap();
    assert_eq!(publish.needs, vec!["unit"]);
    assert_eq!(publish.condition.as_deref(), Some("is_tag"));
    assert_eq!(publish.timeout_ms, Some(600000));
  }

  #[test]
  fn test_parse_rejects_bad_cron() {
    let doc = r#"{
      "name": "ci",
      "on": { "schedule": { "cron": "often" } },
      "jobs": []
    }"#;

    assert!(PipelineDef::from_json(doc).is_err());
  }
}
