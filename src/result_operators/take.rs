use std::fmt;

use super::{ExecutionStrategy, InMemoryData, InMemoryOperator, clamp_count, require_items};
use crate::error::QueryResult;
use crate::value::Value;

/// Keeps the first `count` items.
///
/// Counts are clamped: zero or negative yields an empty sequence, a count
/// larger than the sequence keeps everything.
///
/// ```
/// use quarry::{InMemoryData, TakeResultOperator, Value};
/// use quarry::result_operators::InMemoryOperator;
///
/// let items = vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)];
/// let taken = TakeResultOperator::new(2).execute_in_memory(Some(items)).unwrap();
/// assert_eq!(taken, InMemoryData::Sequence(vec![Value::Integer(1), Value::Integer(2)]));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TakeResultOperator {
    count: i64,
}

impl TakeResultOperator {
    pub fn new(count: i64) -> Self {
        TakeResultOperator { count }
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    /// A replacement operator with a different count.
    pub fn with_count(&self, count: i64) -> Self {
        TakeResultOperator { count }
    }
}

impl InMemoryOperator for TakeResultOperator {
    const STRATEGY: ExecutionStrategy = ExecutionStrategy::Collection;

    fn execute_in_memory(&self, items: Option<Vec<Value>>) -> QueryResult<InMemoryData> {
        let mut items = require_items(items)?;
        items.truncate(clamp_count(self.count));
        Ok(InMemoryData::Sequence(items))
    }
}

impl fmt::Display for TakeResultOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Take({})", self.count)
    }
}
