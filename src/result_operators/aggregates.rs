use std::fmt;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use super::{ExecutionStrategy, InMemoryData, InMemoryOperator, require_items};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Number of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountResultOperator;

impl InMemoryOperator for CountResultOperator {
    const STRATEGY: ExecutionStrategy = ExecutionStrategy::Scalar;

    fn execute_in_memory(&self, items: Option<Vec<Value>>) -> QueryResult<InMemoryData> {
        let items = require_items(items)?;
        Ok(InMemoryData::Value(Value::Integer(items.len() as i64)))
    }
}

impl fmt::Display for CountResultOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Count()")
    }
}

/// Sum of numeric items, computed exactly in decimal.
///
/// `Null` items are ignored and an empty sequence sums to `0`. The result
/// stays an integer when every item is one and the total fits. A float outside
/// the decimal range (or NaN and infinities) switches the rest of the sum to
/// `f64` arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SumResultOperator;

enum Total {
    Exact(Decimal),
    Approximate(f64),
}

impl Total {
    fn add_exact(self, term: Decimal, fallback: f64) -> Self {
        match self {
            Total::Exact(total) => match total.checked_add(term) {
                Some(sum) => Total::Exact(sum),
                None => Total::Approximate(total.to_f64().unwrap_or(0.0) + fallback),
            },
            Total::Approximate(total) => Total::Approximate(total + fallback),
        }
    }

    fn add_float(self, n: f64) -> Self {
        match (self, Decimal::from_f64(n)) {
            (total @ Total::Exact(_), Some(term)) => total.add_exact(term, n),
            (Total::Exact(total), None) => Total::Approximate(total.to_f64().unwrap_or(0.0) + n),
            (Total::Approximate(total), _) => Total::Approximate(total + n),
        }
    }
}

impl InMemoryOperator for SumResultOperator {
    const STRATEGY: ExecutionStrategy = ExecutionStrategy::Scalar;

    fn execute_in_memory(&self, items: Option<Vec<Value>>) -> QueryResult<InMemoryData> {
        let items = require_items(items)?;
        let mut total = Total::Exact(Decimal::ZERO);
        let mut all_integers = true;

        for item in &items {
            total = match item {
                Value::Null => continue,
                Value::Integer(n) => total.add_exact(Decimal::from(*n), *n as f64),
                Value::Float(n) => {
                    all_integers = false;
                    total.add_float(*n)
                }
                other => {
                    return Err(QueryError::InvalidOperation(format!(
                        "Sum(): cannot sum {} items",
                        other.type_name()
                    )));
                }
            };
        }

        let total = match total {
            Total::Exact(total) => {
                if all_integers && let Some(n) = total.to_i64() {
                    return Ok(InMemoryData::Value(Value::Integer(n)));
                }
                total.to_f64().ok_or_else(|| {
                    QueryError::InvalidOperation("Sum(): total is not representable".to_string())
                })?
            }
            Total::Approximate(total) => total,
        };
        Ok(InMemoryData::Value(Value::Float(total)))
    }
}

impl fmt::Display for SumResultOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sum()")
    }
}

/// Smallest item by [`Value::compare`]; fails on an empty sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MinResultOperator;

impl InMemoryOperator for MinResultOperator {
    const STRATEGY: ExecutionStrategy = ExecutionStrategy::Single;

    fn execute_in_memory(&self, items: Option<Vec<Value>>) -> QueryResult<InMemoryData> {
        let items = require_items(items)?;
        items
            .into_iter()
            .min_by(|a, b| a.compare(b))
            .map(InMemoryData::Value)
            .ok_or_else(|| QueryError::InvalidOperation(format!("{}: sequence contains no elements", self)))
    }
}

impl fmt::Display for MinResultOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Min()")
    }
}

/// Largest item by [`Value::compare`]; fails on an empty sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaxResultOperator;

impl InMemoryOperator for MaxResultOperator {
    const STRATEGY: ExecutionStrategy = ExecutionStrategy::Single;

    fn execute_in_memory(&self, items: Option<Vec<Value>>) -> QueryResult<InMemoryData> {
        let items = require_items(items)?;
        items
            .into_iter()
            .max_by(|a, b| a.compare(b))
            .map(InMemoryData::Value)
            .ok_or_else(|| QueryError::InvalidOperation(format!("{}: sequence contains no elements", self)))
    }
}

impl fmt::Display for MaxResultOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Max()")
    }
}
