use thiserror::Error;

/// Errors raised while loading a pipeline definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
  #[error("failed to parse pipeline document: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("invalid cron expression '{cron}': {message}")]
  InvalidCron { cron: String, message: String },
}
