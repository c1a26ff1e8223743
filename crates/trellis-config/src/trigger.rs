use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;

/// The events that can create a run.
///
/// A pipeline with no trigger section at all can still be run manually;
/// filters only narrow which pushes match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerDef {
  /// Push events, optionally filtered by branch/tag patterns.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub push: Option<PushFilter>,

  /// Manual dispatch. The value carries no configuration today.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dispatch: Option<serde_json::Value>,

  /// Cron-style recurring schedule.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub schedule: Option<ScheduleDef>,
}

/// Branch/tag filters for push triggers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushFilter {
  #[serde(default)]
  pub branches: Vec<String>,
  #[serde(default)]
  pub tags: Vec<String>,
}

/// A recurring schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDef {
  /// Five-field cron expression (minute hour day-of-month month day-of-week).
  pub cron: String,
}

impl ScheduleDef {
  /// Structural validation of the cron expression.
  ///
  /// The evaluator hosts no clock; schedules create runs externally. This
  /// only rejects expressions that can never describe a time-of-week.
  pub fn validate(&self) -> Result<(), DefinitionError> {
    let fields: Vec<&str> = self.cron.split_whitespace().collect();
    if fields.len() != 5 {
      return Err(DefinitionError::InvalidCron {
        cron: self.cron.clone(),
        message: format!("expected 5 fields, found {}", fields.len()),
      });
    }
    for field in fields {
      let ok = field
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '*' | ',' | '-' | '/'));
      if !ok {
        return Err(DefinitionError::InvalidCron {
          cron: self.cron.clone(),
          message: format!("invalid field '{}'", field),
        });
      }
    }
    Ok(())
  }
}
