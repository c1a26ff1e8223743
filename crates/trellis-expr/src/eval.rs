use trellis_config::TriggerContext;

use crate::parser::Expr;

/// A value produced while evaluating a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Str(String),
  Bool(bool),
}

impl Value {
  /// Truthiness: the empty string and `false` are falsy, everything else
  /// is truthy. An absent fact means "condition not met".
  pub fn truthy(&self) -> bool {
    match self {
      Value::Str(s) => !s.is_empty(),
      Value::Bool(b) => *b,
    }
  }

  fn as_str(&self) -> &str {
    match self {
      Value::Str(s) => s.as_str(),
      Value::Bool(true) => "true",
      Value::Bool(false) => "false",
    }
  }
}

/// Evaluate a run condition against the trigger context.
///
/// Evaluation is infallible and short-circuiting. Unknown variables and
/// paths resolve to the empty string rather than erroring, so a condition
/// probing a fact this run does not have simply does not match (a negated
/// form like `!is_tag` still works, since `!''` is true).
pub fn evaluate(expr: &Expr, context: &TriggerContext) -> bool {
  eval_value(expr, context).truthy()
}

fn eval_value(expr: &Expr, context: &TriggerContext) -> Value {
  match expr {
    Expr::Lit(s) => Value::Str(s.clone()),
    Expr::Path(path) => lookup(path, context),
    Expr::Not(inner) => Value::Bool(!eval_value(inner, context).truthy()),
    Expr::And(a, b) => {
      if !eval_value(a, context).truthy() {
        Value::Bool(false)
      } else {
        Value::Bool(eval_value(b, context).truthy())
      }
    }
    Expr::Or(a, b) => {
      if eval_value(a, context).truthy() {
        Value::Bool(true)
      } else {
        Value::Bool(eval_value(b, context).truthy())
      }
    }
    Expr::Eq(a, b) => {
      Value::Bool(eval_value(a, context).as_str() == eval_value(b, context).as_str())
    }
    Expr::Ne(a, b) => {
      Value::Bool(eval_value(a, context).as_str() != eval_value(b, context).as_str())
    }
    Expr::Call { name, args } => call(name, args, context),
    // Field access belongs to output references; in a condition the
    // projected value is not available, so it resolves empty.
    Expr::Field(_, _) => Value::Str(String::new()),
  }
}

/// Resolve a context variable. Unknown names resolve empty.
fn lookup(path: &[String], context: &TriggerContext) -> Value {
  if path.len() != 1 {
    return Value::Str(String::new());
  }
  match path[0].as_str() {
    "event" => Value::Str(context.event.as_str().to_string()),
    "ref" | "ref_name" => Value::Str(context.ref_name.clone()),
    "ref_type" => Value::Str(if context.is_tag { "tag" } else { "branch" }.to_string()),
    "is_tag" => Value::Bool(context.is_tag),
    _ => Value::Str(String::new()),
  }
}

fn call(name: &str, args: &[Expr], context: &TriggerContext) -> Value {
  match name {
    "always" => Value::Bool(true),
    "startsWith" => {
      let haystack = args
        .first()
        .map(|a| eval_value(a, context).as_str().to_string())
        .unwrap_or_default();
      let prefix = args
        .get(1)
        .map(|a| eval_value(a, context).as_str().to_string())
        .unwrap_or_default();
      Value::Bool(haystack.starts_with(&prefix))
    }
    // fromJson over run-time outputs has no meaning in a condition.
    _ => Value::Str(String::new()),
  }
}

#[cfg(test)]
mod tests {
  use trellis_config::TriggerContext;

  use super::*;
  use crate::parser::parse_condition;

  fn eval(src: &str, context: &TriggerContext) -> bool {
    evaluate(&parse_condition(src).unwrap(), context)
  }

  #[test]
  fn test_tag_gate() {
    let tag_push = TriggerContext::push("refs/tags/v1.0.0", true);
    let branch_push = TriggerContext::push("refs/heads/main", false);

    assert!(eval("is_tag", &tag_push));
    assert!(!eval("is_tag", &branch_push));
    assert!(eval("ref_type == 'tag'", &tag_push));
    assert!(eval("ref_type == 'branch'", &branch_push));
  }

  #[test]
  fn test_event_comparison() {
    let dispatch = TriggerContext::dispatch("refs/heads/main");
    assert!(eval("event == 'dispatch'", &dispatch));
    assert!(!eval("event == 'push'", &dispatch));
    assert!(eval("event == 'push' || event == 'dispatch'", &dispatch));
  }

  #[test]
  fn test_starts_with() {
    let tag_push = TriggerContext::push("refs/tags/v1.0.0", true);
    assert!(eval("startsWith(ref, 'refs/tags/')", &tag_push));
    assert!(!eval("startsWith(ref, 'refs/heads/')", &tag_push));
  }

  #[test]
  fn test_unknown_variable_is_falsy() {
    let context = TriggerContext::schedule();
    assert!(!eval("nightly", &context));
    // Negated/defaulted forms still work over absent facts.
    assert!(eval("!nightly", &context));
    assert!(eval("nightly == ''", &context));
  }

  #[test]
  fn test_always_is_true() {
    let context = TriggerContext::schedule();
    assert!(eval("always()", &context));
    // always() keeps the job eligible but the rest still gates it.
    assert!(!eval("always() && is_tag", &context));
  }

  #[test]
  fn test_short_circuit() {
    let context = TriggerContext::push("refs/heads/main", false);
    assert!(!eval("is_tag && startsWith(ref, 'refs/tags/')", &context));
    assert!(eval("!is_tag || unknown_fact", &context));
  }
}
