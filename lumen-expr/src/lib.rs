pub mod eval;
pub mod extract;
pub mod parse;

pub use eval::{MapScope, Scope, eval_expression, evaluate, substitute, truthy, value_to_string};
pub use extract::{Snippet, extract_executables};
pub use parse::{BinaryOp, Expr, UnaryOp, parse_expression};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExprError {
    #[error("syntax error in `{source_text}`: {message}")]
    Syntax { source_text: String, message: String },
    #[error("undefined identifier `{0}`")]
    Undefined(String),
    #[error("`{0}` is not callable")]
    NotCallable(String),
    #[error("type error: {0}")]
    Type(String),
}
