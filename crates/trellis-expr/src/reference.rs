use serde::{Deserialize, Serialize};

use crate::error::ExprError;
use crate::parser::{Expr, parse_body, strip_delimiters};

/// A typed pointer from a job input to an upstream output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRef {
  /// The producing job's id. Must appear in the referencing job's `needs`.
  pub job_id: String,
  /// The output name on the producer.
  pub output: String,
  /// Field projected out of a JSON-encoded output, if any.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub projection: Option<String>,
}

/// A classified input value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputExpr {
  /// Passed through verbatim.
  Literal(String),
  /// Resolved from the output table immediately before the job starts.
  Reference(OutputRef),
}

impl InputExpr {
  /// The reference, if this input is one.
  pub fn reference(&self) -> Option<&OutputRef> {
    match self {
      InputExpr::Reference(r) => Some(r),
      InputExpr::Literal(_) => None,
    }
  }
}

/// Classify a raw input value.
///
/// A value that is exactly one `${{ }}` block must contain a single output
/// reference, `needs.<job>.outputs.<name>` or
/// `fromJson(needs.<job>.outputs.<name>).<field>`. A value with no `${{` is
/// a literal. Anything in between (an expression embedded mid-string) is a
/// configuration error.
pub fn parse_input(raw: &str) -> Result<InputExpr, ExprError> {
  if !raw.contains("${{") {
    return Ok(InputExpr::Literal(raw.to_string()));
  }

  let trimmed = raw.trim();
  let whole_block = trimmed.starts_with("${{")
    && trimmed.ends_with("}}")
    && trimmed.matches("${{").count() == 1;
  if !whole_block {
    return Err(ExprError::EmbeddedExpression {
      value: raw.to_string(),
    });
  }

  let expr = parse_body(strip_delimiters(trimmed))?;
  reference_from_expr(&expr).ok_or_else(|| ExprError::NotAReference {
    expr: trimmed.to_string(),
  })
}

fn reference_from_expr(expr: &Expr) -> Option<InputExpr> {
  match expr {
    Expr::Path(path) => {
      output_path(path).map(|(job_id, output)| {
        InputExpr::Reference(OutputRef {
          job_id,
          output,
          projection: None,
        })
      })
    }
    Expr::Field(inner, field) => match inner.as_ref() {
      Expr::Call { name, args } if name == "fromJson" && args.len() == 1 => {
        let Expr::Path(path) = &args[0] else {
          return None;
        };
        output_path(path).map(|(job_id, output)| {
          InputExpr::Reference(OutputRef {
            job_id,
            output,
            projection: Some(field.clone()),
          })
        })
      }
      _ => None,
    },
    _ => None,
  }
}

/// Match `needs.<job>.outputs.<name>`.
fn output_path(path: &[String]) -> Option<(String, String)> {
  match path {
    [needs, job_id, outputs, output] if needs == "needs" && outputs == "outputs" => {
      Some((job_id.clone(), output.clone()))
    }
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_literal_passthrough() {
    assert_eq!(
      parse_input("3.13").unwrap(),
      InputExpr::Literal("3.13".to_string())
    );
    assert_eq!(
      parse_input("").unwrap(),
      InputExpr::Literal(String::new())
    );
  }

  #[test]
  fn test_plain_reference() {
    let input = parse_input("${{ needs.unit.outputs.coverage }}").unwrap();
    assert_eq!(
      input,
      InputExpr::Reference(OutputRef {
        job_id: "unit".to_string(),
        output: "coverage".to_string(),
        projection: None,
      })
    );
  }

  #[test]
  fn test_projected_reference() {
    let input =
      parse_input("${{ fromJson(needs.params.outputs.artifact_names).unittesting_xml }}").unwrap();
    assert_eq!(
      input,
      InputExpr::Reference(OutputRef {
        job_id: "params".to_string(),
        output: "artifact_names".to_string(),
        projection: Some("unittesting_xml".to_string()),
      })
    );
  }

  #[test]
  fn test_embedded_expression_is_rejected() {
    assert!(matches!(
      parse_input("prefix-${{ needs.unit.outputs.coverage }}"),
      Err(ExprError::EmbeddedExpression { .. })
    ));
  }

  #[test]
  fn test_non_reference_expression_is_rejected() {
    assert!(matches!(
      parse_input("${{ event == 'push' }}"),
      Err(ExprError::NotAReference { .. })
    ));
    assert!(matches!(
      parse_input("${{ unit.outputs.coverage }}"),
      Err(ExprError::NotAReference { .. })
    ));
  }
}
