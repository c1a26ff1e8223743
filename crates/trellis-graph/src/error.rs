use thiserror::Error;
use trellis_expr::ExprError;

/// Fatal configuration errors, detected before any job dispatches.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("duplicate job id '{job_id}'")]
  DuplicateJob { job_id: String },

  #[error("job '{job_id}' needs unknown job '{dependency}'")]
  UnknownDependency { job_id: String, dependency: String },

  #[error("dependency cycle through job '{job_id}'")]
  Cycle { job_id: String },

  #[error(
    "job '{job_id}' input '{input}' references '{producer}', which is not in its needs list"
  )]
  UndeclaredReference {
    job_id: String,
    input: String,
    producer: String,
  },

  #[error("job '{job_id}': invalid expression in {location}: {source}")]
  InvalidExpression {
    job_id: String,
    /// `if` or the input name.
    location: String,
    #[source]
    source: ExprError,
  },

  #[error("job '{job_id}': invalid uses reference '{uses}' (expected 'path@ref')")]
  InvalidUses { job_id: String, uses: String },
}
