//! Snippet expression parser: pest grammar → `Expr` AST.

use pest::Parser;
use pest::iterators::Pair;

use crate::ExprError;

#[derive(pest_derive::Parser)]
#[grammar = "grammar.pest"]
struct ExprParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Ident(String),
    /// `target.name`
    Field(Box<Expr>, String),
    /// `target[key]`
    Index(Box<Expr>, Box<Expr>),
    /// `target(args...)`
    Call(Box<Expr>, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
}

pub fn parse_expression(source: &str) -> Result<Expr, ExprError> {
    let mut pairs =
        ExprParser::parse(Rule::input, source).map_err(|e| ExprError::Syntax {
            source_text: source.to_string(),
            message: e.to_string(),
        })?;
    let input = pairs.next().ok_or_else(|| ExprError::Syntax {
        source_text: source.to_string(),
        message: "empty expression".to_string(),
    })?;
    let expression = input
        .into_inner()
        .find(|p| p.as_rule() == Rule::expression)
        .ok_or_else(|| ExprError::Syntax {
            source_text: source.to_string(),
            message: "empty expression".to_string(),
        })?;
    Ok(build_expression(expression))
}

fn build_expression(pair: Pair<Rule>) -> Expr {
    // expression wraps a single or_expr
    let inner = pair.into_inner().next().expect("expression has one child");
    build_binary_chain(inner)
}

/// All binary levels share one shape: operand (op operand)*. Fold left.
fn build_binary_chain(pair: Pair<Rule>) -> Expr {
    match pair.as_rule() {
        Rule::or_expr
        | Rule::and_expr
        | Rule::equality
        | Rule::comparison
        | Rule::additive
        | Rule::multiplicative => {
            let mut inner = pair.into_inner();
            let mut lhs = build_binary_chain(inner.next().expect("lhs"));
            while let Some(op_pair) = inner.next() {
                let op = binary_op(op_pair.as_str());
                let rhs = build_binary_chain(inner.next().expect("rhs"));
                lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
            }
            lhs
        }
        Rule::unary => build_unary(pair),
        other => unreachable!("unexpected rule in binary chain: {other:?}"),
    }
}

fn binary_op(symbol: &str) -> BinaryOp {
    match symbol {
        "||" => BinaryOp::Or,
        "&&" => BinaryOp::And,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::Ne,
        "<=" => BinaryOp::Le,
        ">=" => BinaryOp::Ge,
        "<" => BinaryOp::Lt,
        ">" => BinaryOp::Gt,
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Rem,
        other => unreachable!("unknown operator {other:?}"),
    }
}

fn build_unary(pair: Pair<Rule>) -> Expr {
    let mut ops: Vec<UnaryOp> = Vec::new();
    let mut operand: Option<Expr> = None;
    for node in pair.into_inner() {
        match node.as_rule() {
            Rule::unary_op => ops.push(match node.as_str() {
                "!" => UnaryOp::Not,
                _ => UnaryOp::Neg,
            }),
            Rule::postfix => operand = Some(build_postfix(node)),
            _ => {}
        }
    }
    let mut expr = operand.expect("unary operand");
    // Innermost operator applies first.
    for op in ops.into_iter().rev() {
        expr = Expr::Unary(op, Box::new(expr));
    }
    expr
}

fn build_postfix(pair: Pair<Rule>) -> Expr {
    let mut inner = pair.into_inner();
    let mut expr = build_primary(inner.next().expect("primary"));
    for op in inner {
        let op = op.into_inner().next().expect("postfix op");
        match op.as_rule() {
            Rule::call_args => {
                let args = op.into_inner().map(build_expression).collect();
                expr = Expr::Call(Box::new(expr), args);
            }
            Rule::index => {
                let key = build_expression(op.into_inner().next().expect("index expr"));
                expr = Expr::Index(Box::new(expr), Box::new(key));
            }
            Rule::field => {
                let name = op.into_inner().next().expect("field ident").as_str();
                expr = Expr::Field(Box::new(expr), name.to_string());
            }
            other => unreachable!("unexpected postfix rule: {other:?}"),
        }
    }
    expr
}

fn build_primary(pair: Pair<Rule>) -> Expr {
    let inner = pair.into_inner().next().expect("primary child");
    match inner.as_rule() {
        Rule::literal => build_literal(inner),
        Rule::ident => Expr::Ident(inner.as_str().to_string()),
        Rule::expression => build_expression(inner),
        other => unreachable!("unexpected primary rule: {other:?}"),
    }
}

fn build_literal(pair: Pair<Rule>) -> Expr {
    let inner = pair.into_inner().next().expect("literal child");
    match inner.as_rule() {
        Rule::number => Expr::Number(inner.as_str().parse().unwrap_or(0.0)),
        Rule::string => Expr::Str(strip_quotes(inner.as_str())),
        Rule::boolean => Expr::Bool(inner.as_str() == "true"),
        Rule::null => Expr::Null,
        other => unreachable!("unexpected literal rule: {other:?}"),
    }
}

fn strip_quotes(s: &str) -> String {
    let bytes = s.as_bytes();
    if bytes.len() >= 2
        && ((bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\''))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}
