use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use trellis_expr::{Expr, InputExpr};

use crate::uses::UsesRef;

/// A locked job, ready for scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
  pub job_id: String,
  pub uses: UsesRef,
  pub needs: Vec<String>,
  /// Inputs with their expressions parsed and validated.
  pub inputs: HashMap<String, InputExpr>,
  /// Parsed run condition, if any.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub condition: Option<Expr>,
  /// Whether the condition mentions `always()`: the job stays eligible once
  /// every dependency is terminal, whatever those terminal states are.
  pub run_always: bool,
  /// Secret bindings, name -> external handle. Values never pass through
  /// the evaluator.
  pub secrets: HashMap<String, String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
}
