//! Trellis Expr
//!
//! The `${{ }}` expression layer shared by run conditions and input values.
//!
//! Two kinds of expression exist in a pipeline definition:
//!
//! - **Run conditions** (`if`): short-circuit boolean expressions over the
//!   trigger context, e.g. `event == 'push' && is_tag`. Evaluation is
//!   infallible — an unknown variable is the empty string, which is falsy.
//! - **Input values**: either literal strings, passed through verbatim, or a
//!   single wrapped reference to an upstream output,
//!   `${{ needs.<job>.outputs.<name> }}`, optionally projecting a field out
//!   of a JSON-encoded output via
//!   `${{ fromJson(needs.<job>.outputs.<name>).<field> }}`.
//!
//! Parsing happens once, when the pipeline is locked; the graph layer uses
//! [`InputExpr::reference`] to check that every reference names a declared
//! dependency before anything runs.

mod error;
mod eval;
mod lexer;
mod parser;
mod reference;

pub use error::ExprError;
pub use eval::{Value, evaluate};
pub use parser::{Expr, parse_condition};
pub use reference::{InputExpr, OutputRef, parse_input};
