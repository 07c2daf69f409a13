//! Expression evaluation against a scope.
//!
//! Coercion rules follow the host-language conventions templates expect:
//! falsy values are `null`, `false`, `0`, `NaN` and `""`; `+` concatenates
//! when either side is a string; `==` compares structurally with numeric
//! normalization. An undefined top-level identifier is an error; a missing
//! object member or out-of-range index evaluates to `null`.

use serde_json::{Number, Value};

use crate::ExprError;
use crate::extract::{Snippet, extract_executables};
use crate::parse::{BinaryOp, Expr, UnaryOp, parse_expression};

/// Name resolution and call dispatch for one evaluation.
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<Value>;

    fn call(&self, name: &str, _args: &[Value]) -> Result<Value, ExprError> {
        Err(ExprError::NotCallable(name.to_string()))
    }
}

/// A scope backed by a plain map. Used by tests and the CLI.
#[derive(Debug, Default)]
pub struct MapScope(pub serde_json::Map<String, Value>);

impl Scope for MapScope {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.0.get(name).cloned()
    }
}

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a value into template output. `null` renders empty so a missing
/// optional leaves no residue; integral numbers print without a decimal
/// point.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn number_to_string(n: &Number) -> String {
    if let Some(f) = n.as_f64() {
        if f.fract() == 0.0 && f.is_finite() && f.abs() < 9_007_199_254_740_992.0 {
            return format!("{}", f as i64);
        }
    }
    n.to_string()
}

fn number_value(f: f64) -> Result<Value, ExprError> {
    if f.fract() == 0.0 && f.is_finite() && f.abs() < 9_007_199_254_740_992.0 {
        return Ok(Value::Number(Number::from(f as i64)));
    }
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| ExprError::Type("arithmetic produced a non-finite number".to_string()))
}

fn as_number(value: &Value, op: &str) -> Result<f64, ExprError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ExprError::Type(format!("`{op}` on an unrepresentable number"))),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Null => Ok(0.0),
        other => Err(ExprError::Type(format!(
            "`{op}` expects numbers, got {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

pub fn eval_expression(expr: &Expr, scope: &dyn Scope) -> Result<Value, ExprError> {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(f) => number_value(*f),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Ident(name) => scope
            .lookup(name)
            .ok_or_else(|| ExprError::Undefined(name.clone())),
        Expr::Field(target, name) => {
            let target = eval_expression(target, scope)?;
            Ok(field_of(&target, name))
        }
        Expr::Index(target, key) => {
            let target = eval_expression(target, scope)?;
            let key = eval_expression(key, scope)?;
            Ok(index_of(&target, &key))
        }
        Expr::Call(callee, args) => {
            let Expr::Ident(name) = callee.as_ref() else {
                return Err(ExprError::NotCallable(format!("{callee:?}")));
            };
            let args = args
                .iter()
                .map(|a| eval_expression(a, scope))
                .collect::<Result<Vec<_>, _>>()?;
            scope.call(name, &args)
        }
        Expr::Unary(op, operand) => {
            let value = eval_expression(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&value))),
                UnaryOp::Neg => number_value(-as_number(&value, "-")?),
            }
        }
        Expr::Binary(lhs, op, rhs) => eval_binary(lhs, *op, rhs, scope),
    }
}

fn field_of(target: &Value, name: &str) -> Value {
    match target {
        Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
        Value::Array(items) if name == "length" => Value::Number(Number::from(items.len())),
        Value::String(s) if name == "length" => Value::Number(Number::from(s.chars().count())),
        _ => Value::Null,
    }
}

fn index_of(target: &Value, key: &Value) -> Value {
    match (target, key) {
        (Value::Array(items), Value::Number(n)) => n
            .as_u64()
            .and_then(|i| items.get(i as usize))
            .cloned()
            .unwrap_or(Value::Null),
        (Value::Object(map), Value::String(k)) => map.get(k).cloned().unwrap_or(Value::Null),
        (Value::Object(map), Value::Number(n)) => map
            .get(&number_to_string(n))
            .cloned()
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn eval_binary(
    lhs: &Expr,
    op: BinaryOp,
    rhs: &Expr,
    scope: &dyn Scope,
) -> Result<Value, ExprError> {
    // Short-circuit forms yield the deciding operand, not a coerced bool.
    if op == BinaryOp::And {
        let left = eval_expression(lhs, scope)?;
        return if truthy(&left) {
            eval_expression(rhs, scope)
        } else {
            Ok(left)
        };
    }
    if op == BinaryOp::Or {
        let left = eval_expression(lhs, scope)?;
        return if truthy(&left) {
            Ok(left)
        } else {
            eval_expression(rhs, scope)
        };
    }

    let left = eval_expression(lhs, scope)?;
    let right = eval_expression(rhs, scope)?;
    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&left, &right))),
        BinaryOp::Add => {
            if left.is_string() || right.is_string() {
                Ok(Value::String(format!(
                    "{}{}",
                    value_to_string(&left),
                    value_to_string(&right)
                )))
            } else {
                number_value(as_number(&left, "+")? + as_number(&right, "+")?)
            }
        }
        BinaryOp::Sub => number_value(as_number(&left, "-")? - as_number(&right, "-")?),
        BinaryOp::Mul => number_value(as_number(&left, "*")? * as_number(&right, "*")?),
        BinaryOp::Div => number_value(as_number(&left, "/")? / as_number(&right, "/")?),
        BinaryOp::Rem => number_value(as_number(&left, "%")? % as_number(&right, "%")?),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            compare(&left, &right, op)
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

fn compare(left: &Value, right: &Value, op: BinaryOp) -> Result<Value, ExprError> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        let result = match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        };
        return Ok(Value::Bool(result));
    }
    let a = as_number(left, "comparison")?;
    let b = as_number(right, "comparison")?;
    let result = match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        _ => a >= b,
    };
    Ok(Value::Bool(result))
}

/// Evaluate a raw attribute/binding string.
///
/// No snippets → the whole string is one expression. Exactly one snippet
/// spanning the whole (trimmed) string → that expression's raw value, type
/// preserved. Otherwise each snippet's stringified result is spliced into
/// the literal text.
pub fn evaluate(raw: &str, scope: &dyn Scope) -> Result<Value, ExprError> {
    let snippets = extract_executables(raw);
    if snippets.is_empty() {
        let expr = parse_expression(raw.trim())?;
        return eval_expression(&expr, scope);
    }
    if snippets.len() == 1 && raw.trim() == snippets[0].text {
        let expr = parse_expression(&snippets[0].executable)?;
        return eval_expression(&expr, scope);
    }
    substitute(raw, &snippets, scope).map(Value::String)
}

/// Splice each snippet's current evaluation into the literal text around it.
pub fn substitute(raw: &str, snippets: &[Snippet], scope: &dyn Scope) -> Result<String, ExprError> {
    let mut ordered: Vec<&Snippet> = snippets.iter().collect();
    ordered.sort_by_key(|s| s.from);

    let mut out = String::with_capacity(raw.len());
    let mut cursor = 0usize;
    for snippet in ordered {
        out.push_str(&raw[cursor..snippet.from]);
        let expr = parse_expression(&snippet.executable)?;
        let value = eval_expression(&expr, scope)?;
        out.push_str(&value_to_string(&value));
        cursor = snippet.to;
    }
    out.push_str(&raw[cursor..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(entries: serde_json::Value) -> MapScope {
        match entries {
            Value::Object(map) => MapScope(map),
            _ => panic!("scope wants an object"),
        }
    }

    #[test]
    fn substitution_preserves_literal_text() {
        let s = scope(json!({"x": "X", "y": "Y"}));
        assert_eq!(evaluate("{x} {y}", &s).unwrap(), json!("X Y"));
    }

    #[test]
    fn whole_snippet_keeps_raw_value() {
        let s = scope(json!({"items": [1, 2, 3]}));
        assert_eq!(evaluate("{items}", &s).unwrap(), json!([1, 2, 3]));
        assert_eq!(evaluate(" {items} ", &s).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn bare_string_is_an_expression() {
        let s = scope(json!({"count": 3}));
        assert_eq!(evaluate("count > 1", &s).unwrap(), json!(true));
    }

    #[test]
    fn undefined_identifier_errors() {
        let s = scope(json!({}));
        assert!(matches!(
            evaluate("{missing}", &s),
            Err(ExprError::Undefined(name)) if name == "missing"
        ));
    }

    #[test]
    fn missing_member_is_null() {
        let s = scope(json!({"user": {"name": "ada"}}));
        assert_eq!(evaluate("{user.email}", &s).unwrap(), Value::Null);
        assert_eq!(evaluate("{user.name}", &s).unwrap(), json!("ada"));
    }

    #[test]
    fn coercions() {
        let s = scope(json!({"n": 2, "s": "x"}));
        assert_eq!(evaluate("{n + 1}", &s).unwrap(), json!(3));
        assert_eq!(evaluate("{s + n}", &s).unwrap(), json!("x2"));
        assert_eq!(evaluate("{!n}", &s).unwrap(), json!(false));
        assert_eq!(evaluate("{n == 2}", &s).unwrap(), json!(true));
        assert_eq!(evaluate("{n && s}", &s).unwrap(), json!("x"));
    }

    #[test]
    fn integral_floats_print_bare() {
        assert_eq!(value_to_string(&json!(3.0)), "3");
        assert_eq!(value_to_string(&json!(3.5)), "3.5");
        assert_eq!(value_to_string(&Value::Null), "");
    }
}
