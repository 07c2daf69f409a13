//! Error taxonomy.
//!
//! `ParseError` is fatal to component construction and returned
//! synchronously. Everything else is caught at per-binding or per-callback
//! granularity and routed to the owning component's error hook; nothing is
//! retried.

use lumen_expr::ExprError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid ref name `{0}`")]
    InvalidRefName(String),
    #[error("invalid shadow mode `{0}` (expected open, closed or none)")]
    InvalidShadowMode(String),
    #[error("invalid observed attribute `{0}`")]
    InvalidObservedAttribute(String),
}

/// Failure inside a directive's `parse_value` or `render`.
#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("invalid ref name `{0}`")]
    InvalidRefName(String),
    #[error(transparent)]
    Expr(#[from] ExprError),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Wrapped with the directive name and the node's original source text.
    #[error("directive `{directive}` failed on `{node_source}`: {source}")]
    Directive {
        directive: String,
        node_source: String,
        #[source]
        source: DirectiveError,
    },

    #[error("evaluation failed on `{node_source}`: {source}")]
    Evaluation {
        node_source: String,
        #[source]
        source: ExprError,
    },

    #[error("lifecycle `{phase}` callback failed: {message}")]
    Lifecycle { phase: &'static str, message: String },
}
