use thiserror::Error;

/// Errors raised while parsing an expression.
///
/// All of these are configuration errors: they surface when a pipeline is
/// locked, before any job dispatches.
#[derive(Debug, Error, PartialEq)]
pub enum ExprError {
  #[error("unexpected character '{ch}' at offset {pos}")]
  UnexpectedChar { pos: usize, ch: char },

  #[error("unterminated string literal starting at offset {pos}")]
  UnterminatedString { pos: usize },

  #[error("unexpected token: {message}")]
  UnexpectedToken { message: String },

  #[error("expression ended unexpectedly")]
  UnexpectedEnd,

  #[error("unknown function '{name}'")]
  UnknownFunction { name: String },

  #[error("'{expr}' is not an output reference")]
  NotAReference { expr: String },

  #[error("input value '{value}' embeds an expression; a value must be a literal or a single '${{{{ }}}}' reference")]
  EmbeddedExpression { value: String },
}
