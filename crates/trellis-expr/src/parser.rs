use serde::{Deserialize, Serialize};

use crate::error::ExprError;
use crate::lexer::{Token, tokenize};

/// Functions the condition grammar knows about.
const KNOWN_FUNCTIONS: &[&str] = &["always", "startsWith", "fromJson"];

/// A parsed expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
  /// Single-quoted string literal.
  Lit(String),
  /// Dotted path; a single segment is a context variable.
  Path(Vec<String>),
  /// Function call, e.g. `always()`, `startsWith(ref, 'refs/tags/')`.
  Call { name: String, args: Vec<Expr> },
  /// Field access on a call result, e.g. `fromJson(...).unittesting_xml`.
  Field(Box<Expr>, String),
  Not(Box<Expr>),
  And(Box<Expr>, Box<Expr>),
  Or(Box<Expr>, Box<Expr>),
  Eq(Box<Expr>, Box<Expr>),
  Ne(Box<Expr>, Box<Expr>),
}

impl Expr {
  /// Whether this expression calls `always()` anywhere.
  ///
  /// A job whose condition mentions `always()` stays eligible once all of
  /// its dependencies are terminal, whatever their terminal states.
  pub fn mentions_always(&self) -> bool {
    match self {
      Expr::Call { name, args } => {
        name == "always" || args.iter().any(Expr::mentions_always)
      }
      Expr::Field(inner, _) | Expr::Not(inner) => inner.mentions_always(),
      Expr::And(a, b) | Expr::Or(a, b) | Expr::Eq(a, b) | Expr::Ne(a, b) => {
        a.mentions_always() || b.mentions_always()
      }
      Expr::Lit(_) | Expr::Path(_) => false,
    }
  }
}

/// Strip a surrounding `${{ }}` wrapper, if present.
pub(crate) fn strip_delimiters(src: &str) -> &str {
  let trimmed = src.trim();
  if let Some(inner) = trimmed.strip_prefix("${{") {
    if let Some(body) = inner.strip_suffix("}}") {
      return body.trim();
    }
  }
  trimmed
}

/// Parse a run-condition expression.
///
/// The `${{ }}` wrapper is optional; `is_tag` and `${{ is_tag }}` are the
/// same condition. Unknown function names are rejected here so the mistake
/// surfaces when the pipeline is locked, not silently at run time.
pub fn parse_condition(src: &str) -> Result<Expr, ExprError> {
  let tokens = tokenize(strip_delimiters(src))?;
  let mut parser = Parser::new(tokens);
  let expr = parser.parse_or()?;
  parser.expect_end()?;
  check_functions(&expr)?;
  Ok(expr)
}

/// Parse a bare expression body (already stripped of delimiters).
pub(crate) fn parse_body(body: &str) -> Result<Expr, ExprError> {
  let tokens = tokenize(body)?;
  let mut parser = Parser::new(tokens);
  let expr = parser.parse_or()?;
  parser.expect_end()?;
  Ok(expr)
}

fn check_functions(expr: &Expr) -> Result<(), ExprError> {
  match expr {
    Expr::Call { name, args } => {
      if !KNOWN_FUNCTIONS.contains(&name.as_str()) {
        return Err(ExprError::UnknownFunction { name: name.clone() });
      }
      args.iter().try_for_each(check_functions)
    }
    Expr::Field(inner, _) | Expr::Not(inner) => check_functions(inner),
    Expr::And(a, b) | Expr::Or(a, b) | Expr::Eq(a, b) | Expr::Ne(a, b) => {
      check_functions(a)?;
      check_functions(b)
    }
    Expr::Lit(_) | Expr::Path(_) => Ok(()),
  }
}

/// Recursive-descent parser over the token stream.
///
/// Precedence, loosest first: `||`, `&&`, `==`/`!=`, `!`, primary.
struct Parser {
  tokens: Vec<Token>,
  pos: usize,
}

impl Parser {
  fn new(tokens: Vec<Token>) -> Self {
    Self { tokens, pos: 0 }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn next(&mut self) -> Option<Token> {
    let token = self.tokens.get(self.pos).cloned();
    if token.is_some() {
      self.pos += 1;
    }
    token
  }

  fn eat(&mut self, token: &Token) -> bool {
    if self.peek() == Some(token) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn expect(&mut self, token: Token) -> Result<(), ExprError> {
    match self.next() {
      Some(found) if found == token => Ok(()),
      Some(found) => Err(ExprError::UnexpectedToken {
        message: format!("expected {:?}, found {:?}", token, found),
      }),
      None => Err(ExprError::UnexpectedEnd),
    }
  }

  fn expect_end(&mut self) -> Result<(), ExprError> {
    match self.peek() {
      None => Ok(()),
      Some(token) => Err(ExprError::UnexpectedToken {
        message: format!("trailing input starting at {:?}", token),
      }),
    }
  }

  fn parse_or(&mut self) -> Result<Expr, ExprError> {
    let mut left = self.parse_and()?;
    while self.eat(&Token::OrOr) {
      let right = self.parse_and()?;
      left = Expr::Or(Box::new(left), Box::new(right));
    }
    Ok(left)
  }

  fn parse_and(&mut self) -> Result<Expr, ExprError> {
    let mut left = self.parse_equality()?;
    while self.eat(&Token::AndAnd) {
      let right = self.parse_equality()?;
      left = Expr::And(Box::new(left), Box::new(right));
    }
    Ok(left)
  }

  fn parse_equality(&mut self) -> Result<Expr, ExprError> {
    let left = self.parse_unary()?;
    if self.eat(&Token::EqEq) {
      let right = self.parse_unary()?;
      return Ok(Expr::Eq(Box::new(left), Box::new(right)));
    }
    if self.eat(&Token::NotEq) {
      let right = self.parse_unary()?;
      return Ok(Expr::Ne(Box::new(left), Box::new(right)));
    }
    Ok(left)
  }

  fn parse_unary(&mut self) -> Result<Expr, ExprError> {
    if self.eat(&Token::Bang) {
      let inner = self.parse_unary()?;
      return Ok(Expr::Not(Box::new(inner)));
    }
    self.parse_primary()
  }

  fn parse_primary(&mut self) -> Result<Expr, ExprError> {
    match self.next() {
      Some(Token::LParen) => {
        let inner = self.parse_or()?;
        self.expect(Token::RParen)?;
        Ok(inner)
      }
      Some(Token::Str(value)) => Ok(Expr::Lit(value)),
      Some(Token::Ident(name)) => {
        if self.eat(&Token::LParen) {
          let mut args = Vec::new();
          if !self.eat(&Token::RParen) {
            loop {
              args.push(self.parse_or()?);
              if self.eat(&Token::RParen) {
                break;
              }
              self.expect(Token::Comma)?;
            }
          }
          let mut expr = Expr::Call { name, args };
          // Postfix field access: fromJson(...).field
          while self.eat(&Token::Dot) {
            let field = self.expect_ident()?;
            expr = Expr::Field(Box::new(expr), field);
          }
          Ok(expr)
        } else {
          let mut path = vec![name];
          while self.eat(&Token::Dot) {
            path.push(self.expect_ident()?);
          }
          Ok(Expr::Path(path))
        }
      }
      Some(token) => Err(ExprError::UnexpectedToken {
        message: format!("unexpected {:?}", token),
      }),
      None => Err(ExprError::UnexpectedEnd),
    }
  }

  fn expect_ident(&mut self) -> Result<String, ExprError> {
    match self.next() {
      Some(Token::Ident(name)) => Ok(name),
      Some(token) => Err(ExprError::UnexpectedToken {
        message: format!("expected identifier, found {:?}", token),
      }),
      None => Err(ExprError::UnexpectedEnd),
    }
  }
}
