use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An input value is either a literal string or a `${{ }}` reference
/// expression pointing at an upstream job's output, e.g.
/// `${{ needs.unit.outputs.coverage }}` or
/// `${{ fromJson(needs.unit.outputs.artifact_names).unittesting_xml }}`.
///
/// Classification and parsing happen when the pipeline is locked.
pub type InputValue = String;

/// A single job in a pipeline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDef {
  /// Unique job identifier within the pipeline.
  pub job_id: String,

  /// Reference to the external unit of work, versioned by tag or branch,
  /// e.g. "acme/actions/unit-testing@r1".
  pub uses: String,

  /// Upstream job ids this job depends on.
  #[serde(default)]
  pub needs: Vec<String>,

  /// Input parameters passed to the unit of work.
  #[serde(default)]
  pub inputs: HashMap<String, InputValue>,

  /// Run-condition expression over the trigger context.
  /// Absent means the job always matches.
  #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
  pub condition: Option<String>,

  /// Secret bindings: name -> external secret handle.
  /// Handles are opaque here; values are resolved by the executor and are
  /// never logged or echoed.
  #[serde(default)]
  pub secrets: HashMap<String, String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
}
