use crate::error::ExprError;

/// Tokens of the expression grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
  /// Identifier or path segment, e.g. `needs`, `unit-testing`, `is_tag`.
  Ident(String),
  /// Single-quoted string literal, quotes stripped.
  Str(String),
  AndAnd,
  OrOr,
  Bang,
  EqEq,
  NotEq,
  LParen,
  RParen,
  Comma,
  Dot,
}

/// Identifier characters after the first: job ids and output names may
/// contain '-' and '_'.
fn is_ident_continue(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_ident_start(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenize an expression body (the part inside `${{ }}`, or a bare
/// condition string).
pub fn tokenize(src: &str) -> Result<Vec<Token>, ExprError> {
  let mut tokens = Vec::new();
  let chars: Vec<char> = src.chars().collect();
  let mut i = 0;

  while i < chars.len() {
    let c = chars[i];
    match c {
      c if c.is_whitespace() => {
        i += 1;
      }
      '(' => {
        tokens.push(Token::LParen);
        i += 1;
      }
      ')' => {
        tokens.push(Token::RParen);
        i += 1;
      }
      ',' => {
        tokens.push(Token::Comma);
        i += 1;
      }
      '.' => {
        tokens.push(Token::Dot);
        i += 1;
      }
      '&' if chars.get(i + 1) == Some(&'&') => {
        tokens.push(Token::AndAnd);
        i += 2;
      }
      '|' if chars.get(i + 1) == Some(&'|') => {
        tokens.push(Token::OrOr);
        i += 2;
      }
      '=' if chars.get(i + 1) == Some(&'=') => {
        tokens.push(Token::EqEq);
        i += 2;
      }
      '!' if chars.get(i + 1) == Some(&'=') => {
        tokens.push(Token::NotEq);
        i += 2;
      }
      '!' => {
        tokens.push(Token::Bang);
        i += 1;
      }
      '\'' => {
        let start = i;
        i += 1;
        let mut value = String::new();
        loop {
          match chars.get(i) {
            Some('\'') => {
              i += 1;
              break;
            }
            Some(&c) => {
              value.push(c);
              i += 1;
            }
            None => return Err(ExprError::UnterminatedString { pos: start }),
          }
        }
        tokens.push(Token::Str(value));
      }
      c if is_ident_start(c) => {
        let mut ident = String::new();
        while i < chars.len() && is_ident_continue(chars[i]) {
          ident.push(chars[i]);
          i += 1;
        }
        tokens.push(Token::Ident(ident));
      }
      _ => return Err(ExprError::UnexpectedChar { pos: i, ch: c }),
    }
  }

  Ok(tokens)
}
