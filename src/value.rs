use std::cmp::Ordering;
use std::collections::HashMap;

/// A materialized item flowing through in-memory execution.
///
/// Items produced by data sources, bound by from clauses and consumed by
/// result operators are all `Value`s. Integers and floats are kept apart so
/// aggregation can stay exact.
///
/// # Examples
///
/// ```
/// use quarry::Value;
/// use std::collections::HashMap;
///
/// let mut student = HashMap::new();
/// student.insert("name".to_string(), Value::String("Ada".to_string()));
/// student.insert("age".to_string(), Value::Integer(19));
/// let student = Value::Object(student);
///
/// assert_eq!(student.type_name(), "object");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (also the result of `FirstOrDefault` on an empty sequence)
    Null,

    Boolean(bool),

    /// Floating-point number
    Float(f64),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    String(String),

    Array(Vec<Value>),

    Object(HashMap<String, Value>),
}

impl Value {
    /// Check if the value is truthy (for where predicates)
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Null => false,
            Boolean(b) => *b,
            Float(n) => *n != 0.0,
            Integer(n) => *n != 0,
            String(s) => !s.is_empty(),
            Array(arr) => !arr.is_empty(),
            Object(obj) => !obj.is_empty(),
        }
    }

    /// Convert to boolean for conditions
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            _ => self.is_truthy(),
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string (concatenation and diagnostics)
    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Float(n) => n.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Null => "null".to_string(),
            _ => format!("{:?}", self),
        }
    }

    /// Human-readable type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Total ordering used by order by clauses and the min/max operators.
    ///
    /// Values of different kinds order as
    /// null < boolean < number < string < array < object.
    /// Integers and floats compare numerically. NaN sorts after every other
    /// number and equal to itself.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b) {
                    let ord = x.compare(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Object(a), Value::Object(b)) => a.len().cmp(&b.len()),
            (a, b) => match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => compare_numbers(x, y),
                _ => a.rank().cmp(&b.rank()),
            },
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
}

fn compare_numbers(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        // Neither is NaN, so partial_cmp is always Some; -0.0 equals 0.0.
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_mixed_numbers() {
        assert_eq!(Value::Integer(2).compare(&Value::Float(2.5)), Ordering::Less);
        assert_eq!(Value::Float(3.0).compare(&Value::Integer(3)), Ordering::Equal);
    }

    #[test]
    fn test_compare_across_kinds() {
        assert_eq!(Value::Null.compare(&Value::Boolean(false)), Ordering::Less);
        assert_eq!(
            Value::String("a".into()).compare(&Value::Integer(100)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_compare_arrays_lexicographically() {
        let a = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        let b = Value::Array(vec![Value::Integer(1), Value::Integer(3)]);
        let c = Value::Array(vec![Value::Integer(1)]);
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(a.compare(&c), Ordering::Greater);
    }

    #[test]
    fn test_compare_nan_sorts_after_numbers() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan.compare(&Value::Float(f64::INFINITY)), Ordering::Greater);
        assert_eq!(Value::Integer(i64::MAX).compare(&nan), Ordering::Less);
        assert_eq!(nan.compare(&Value::Float(f64::NAN)), Ordering::Equal);
        assert_eq!(nan.compare(&Value::String("a".into())), Ordering::Less);
    }

    #[test]
    fn test_compare_is_consistent_when_sorting_with_nan() {
        let mut items: Vec<Value> = (0..30)
            .map(|i| {
                if i % 3 == 0 {
                    Value::Float(f64::NAN)
                } else {
                    Value::Float(((i * 37) % 23) as f64)
                }
            })
            .collect();
        items.sort_by(|a, b| a.compare(b));
        let numbers: Vec<f64> = items.iter().filter_map(Value::as_float).collect();
        let first_nan = numbers.iter().position(|n| n.is_nan()).unwrap();
        assert!(numbers[..first_nan].windows(2).all(|w| w[0] <= w[1]));
        assert!(numbers[first_nan..].iter().all(|n| n.is_nan()));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.as_bool());
        assert!(Value::Integer(-1).as_bool());
        assert!(!Value::String(String::new()).as_bool());
        assert!(Value::Array(vec![Value::Null]).as_bool());
    }
}
