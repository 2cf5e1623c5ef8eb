use std::cell::RefCell;
use std::collections::HashMap;

use regex::Regex;
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use thiserror::Error;

use crate::arena::ClauseId;
use crate::ast::{BinOp, Expr};
use crate::executor::DataSource;
use crate::value::Value;

/// Items bound so far for one row, keyed by the clause that bound them.
pub type Bindings = HashMap<ClauseId, Value>;

/// Errors that can occur while evaluating an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Type mismatch or invalid operation for the given type
    #[error("Type error: {0}")]
    TypeError(String),

    /// Invalid field access or array index
    #[error("Access error: {0}")]
    AccessError(String),

    /// Reference to a clause whose item is not bound in the current row
    #[error("Unbound clause: {0} has no item in the current row")]
    UnboundClause(String),

    /// Named source the data source does not know
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Division by zero")]
    DivisionByZero,
}

/// Evaluates expressions against the bindings of one row.
///
/// Named sources (`Expr::Source`) are read from the data source.
///
/// # Examples
///
/// ```
/// use quarry::{BinOp, Bindings, Evaluator, Expr, InMemoryDataSource, Value};
///
/// let source = InMemoryDataSource::new();
/// let evaluator = Evaluator::new(&source);
/// let expr = Expr::binary(BinOp::Multiply, Expr::Integer(6), Expr::Float(1.5));
///
/// let result = evaluator.eval(&expr, &Bindings::new()).unwrap();
/// assert_eq!(result, Value::Integer(9));
/// ```
pub struct Evaluator<'a> {
    data_source: &'a dyn DataSource,
    /// Compiled `matches` patterns, reused across rows.
    patterns: RefCell<HashMap<String, Regex>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(data_source: &'a dyn DataSource) -> Self {
        Evaluator {
            data_source,
            patterns: RefCell::new(HashMap::new()),
        }
    }

    /// Number of distinct regex patterns compiled so far
    pub fn cached_patterns(&self) -> usize {
        self.patterns.borrow().len()
    }

    fn regex(&self, pattern: &str) -> Result<Regex, EvalError> {
        if let Some(re) = self.patterns.borrow().get(pattern) {
            return Ok(re.clone());
        }
        let re = Regex::new(pattern).map_err(|e| EvalError::TypeError(format!("invalid regex: {e}")))?;
        self.patterns.borrow_mut().insert(pattern.to_string(), re.clone());
        Ok(re)
    }

    pub fn eval(&self, expr: &Expr, row: &Bindings) -> Result<Value, EvalError> {
        match expr {
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Key(name) => Ok(Value::String(name.clone())),
            Expr::QuerySource(id) => row
                .get(id)
                .cloned()
                .ok_or_else(|| EvalError::UnboundClause(id.to_string())),
            Expr::Source(name) => self
                .data_source
                .scan(name)
                .map(Value::Array)
                .ok_or_else(|| EvalError::UnknownSource(name.clone())),
            Expr::Access { object, key } => {
                let object = self.eval(object, row)?;
                let key = self.eval(key, row)?;
                apply_access(&object, &key)
            }
            Expr::BinaryOp { op, left, right } => {
                let left = self.eval(left, row)?;
                match op {
                    BinOp::NullCoalesce if left != Value::Null => Ok(left),
                    BinOp::NullCoalesce => self.eval(right, row),
                    // Short-circuit so the right side may assume the left held.
                    BinOp::And if !left.as_bool() => Ok(Value::Boolean(false)),
                    BinOp::Or if left.as_bool() => Ok(Value::Boolean(true)),
                    _ => {
                        let right = self.eval(right, row)?;
                        apply_binop(*op, &left, &right)
                    }
                }
            }
            Expr::Not(inner) => Ok(Value::Boolean(!self.eval(inner, row)?.as_bool())),
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                let object = self.eval(object, row)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, row))
                    .collect::<Result<Vec<_>, _>>()?;
                match (method.as_str(), args.as_slice()) {
                    ("matches", [Value::String(pattern)]) => {
                        let re = self.regex(pattern)?;
                        match object {
                            Value::String(s) => Ok(Value::Boolean(re.is_match(&s))),
                            _ => Ok(Value::Boolean(false)),
                        }
                    }
                    _ => eval_method_call(&object, method, &args),
                }
            }
            Expr::Object(items) => {
                let mut map = HashMap::new();
                for (key, expr) in items {
                    map.insert(key.clone(), self.eval(expr, row)?);
                }
                Ok(Value::Object(map))
            }
            Expr::Array(exprs) => exprs
                .iter()
                .map(|expr| self.eval(expr, row))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }

    /// Evaluate an expression that must produce a sequence of items.
    pub fn eval_sequence(&self, expr: &Expr, row: &Bindings) -> Result<Vec<Value>, EvalError> {
        match self.eval(expr, row)? {
            Value::Array(items) => Ok(items),
            other => Err(EvalError::TypeError(format!(
                "source expression must produce an array, got {}",
                other.type_name()
            ))),
        }
    }
}

fn apply_access(object: &Value, key: &Value) -> Result<Value, EvalError> {
    match (object, key) {
        (Value::Object(map), Value::String(k)) => Ok(map.get(k).cloned().unwrap_or(Value::Null)),
        (Value::Object(map), Value::Integer(_) | Value::Float(_) | Value::Boolean(_)) => {
            Ok(map.get(&key.as_string()).cloned().unwrap_or(Value::Null))
        }
        (Value::Array(arr), Value::Integer(n)) => {
            let index = if *n < 0 {
                // Negative index counts from the end (-1 = last)
                match arr.len().checked_sub(n.unsigned_abs() as usize) {
                    Some(index) => index,
                    None => return Ok(Value::Null),
                }
            } else {
                *n as usize
            };
            Ok(arr.get(index).cloned().unwrap_or(Value::Null))
        }
        // Access through a missing item stays missing
        (Value::Null, _) => Ok(Value::Null),
        (Value::Array(_), Value::String(k)) => Err(EvalError::TypeError(format!(
            "Cannot use string key '{}' on array; use integer index instead",
            k
        ))),
        _ => Err(EvalError::AccessError(format!(
            "Cannot access {} with {} key",
            object.type_name(),
            key.type_name()
        ))),
    }
}

fn apply_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide | BinOp::Modulo => {
            arithmetic(op, left, right)
        }
        BinOp::Equal => Ok(Value::Boolean(left == right)),
        BinOp::NotEqual => Ok(Value::Boolean(left != right)),
        BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => {
            compare(op, left, right)
        }
        BinOp::And => Ok(Value::Boolean(left.as_bool() && right.as_bool())),
        BinOp::Or => Ok(Value::Boolean(left.as_bool() || right.as_bool())),
        BinOp::NullCoalesce => Ok(if *left == Value::Null {
            right.clone()
        } else {
            left.clone()
        }),
    }
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => float_arithmetic(op, *a, *b),
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            decimal_arithmetic(op, left, right)
        }
        (Value::String(a), Value::String(b)) if op == BinOp::Add => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (a, b) => Err(EvalError::TypeError(format!(
            "Cannot apply '{}' to {} and {}",
            op,
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn integer_arithmetic(op: BinOp, a: i64, b: i64) -> Result<Value, EvalError> {
    if matches!(op, BinOp::Divide | BinOp::Modulo) && b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        BinOp::Modulo => a.checked_rem(b),
        // Inexact division falls back to a float
        BinOp::Divide if a.checked_rem(b) != Some(0) => {
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinOp::Divide => a.checked_div(b),
        _ => None,
    };
    result
        .map(Value::Integer)
        .ok_or_else(|| EvalError::TypeError(format!("integer overflow in {} {} {}", a, op, b)))
}

fn float_arithmetic(op: BinOp, a: f64, b: f64) -> Result<Value, EvalError> {
    if matches!(op, BinOp::Divide | BinOp::Modulo) && b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(Value::Float(match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        BinOp::Divide => a / b,
        _ => a % b,
    }))
}

/// Mixed integer/float arithmetic computed in decimal so that results like
/// `6 * 1.5` stay exact integers.
fn decimal_arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (Some(a), Some(b)) = (to_decimal(left), to_decimal(right)) else {
        let (a, b) = (left.as_float().unwrap_or(f64::NAN), right.as_float().unwrap_or(f64::NAN));
        return float_arithmetic(op, a, b);
    };
    if matches!(op, BinOp::Divide | BinOp::Modulo) && b.is_zero() {
        return Err(EvalError::DivisionByZero);
    }
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        BinOp::Divide => a.checked_div(b),
        _ => a.checked_rem(b),
    };
    let Some(result) = result else {
        return Err(EvalError::TypeError(format!("numeric overflow in '{}'", op)));
    };
    if result.is_integer()
        && let Some(n) = result.to_i64()
    {
        return Ok(Value::Integer(n));
    }
    result
        .to_f64()
        .map(Value::Float)
        .ok_or_else(|| EvalError::TypeError(format!("numeric overflow in '{}'", op)))
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(n) => Decimal::from_i64(*n),
        Value::Float(n) => Decimal::from_f64(*n),
        _ => None,
    }
}

fn compare(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let comparable = matches!(
        (left, right),
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_))
            | (Value::String(_), Value::String(_))
    );
    if !comparable {
        return Err(EvalError::TypeError(format!(
            "Cannot compare {} {} {} (comparison requires numbers or strings)",
            left.type_name(),
            op,
            right.type_name()
        )));
    }
    // NaN is unordered here even though it sorts last.
    if left.as_float().is_some_and(f64::is_nan) || right.as_float().is_some_and(f64::is_nan) {
        return Ok(Value::Boolean(false));
    }
    let ordering = left.compare(right);
    Ok(Value::Boolean(match op {
        BinOp::LessThan => ordering.is_lt(),
        BinOp::GreaterThan => ordering.is_gt(),
        BinOp::LessEqual => ordering.is_le(),
        _ => ordering.is_ge(),
    }))
}

fn eval_method_call(object: &Value, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    match (method, args) {
        ("length", []) => match object {
            Value::Array(arr) => Ok(Value::Integer(arr.len() as i64)),
            Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
            Value::Object(obj) => Ok(Value::Integer(obj.len() as i64)),
            other => Err(EvalError::TypeError(format!(
                ".length() not supported on {}",
                other.type_name()
            ))),
        },
        ("upper", []) => string_method(object, method, |s| Value::String(s.to_uppercase())),
        ("lower", []) => string_method(object, method, |s| Value::String(s.to_lowercase())),
        ("contains", [needle]) => match (object, needle) {
            (Value::String(s), Value::String(n)) => Ok(Value::Boolean(s.contains(n.as_str()))),
            (Value::Array(arr), n) => Ok(Value::Boolean(arr.contains(n))),
            (o, n) => Err(EvalError::TypeError(format!(
                ".contains() not supported on {} with {} argument",
                o.type_name(),
                n.type_name()
            ))),
        },
        ("startswith", [Value::String(prefix)]) => {
            string_method(object, method, |s| Value::Boolean(s.starts_with(prefix.as_str())))
        }
        ("endswith", [Value::String(suffix)]) => {
            string_method(object, method, |s| Value::Boolean(s.ends_with(suffix.as_str())))
        }
        ("startswith" | "endswith" | "matches", _) => Err(EvalError::TypeError(format!(
            ".{}() requires exactly one string argument",
            method
        ))),
        _ => Err(EvalError::TypeError(format!(
            "Unknown method .{}() with {} argument(s)",
            method,
            args.len()
        ))),
    }
}

fn string_method<F>(object: &Value, method: &str, f: F) -> Result<Value, EvalError>
where
    F: FnOnce(&str) -> Value,
{
    match object {
        Value::String(s) => Ok(f(s)),
        other => Err(EvalError::TypeError(format!(
            ".{}() requires a string, got {}",
            method,
            other.type_name()
        ))),
    }
}
