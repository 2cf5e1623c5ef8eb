use std::fmt;

use super::{ExecutionStrategy, InMemoryData, InMemoryOperator, clamp_count, require_items};
use crate::error::QueryResult;
use crate::value::Value;

/// Drops the first `count` items; non-positive counts keep everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipResultOperator {
    count: i64,
}

impl SkipResultOperator {
    pub fn new(count: i64) -> Self {
        SkipResultOperator { count }
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn with_count(&self, count: i64) -> Self {
        SkipResultOperator { count }
    }
}

impl InMemoryOperator for SkipResultOperator {
    const STRATEGY: ExecutionStrategy = ExecutionStrategy::Collection;

    fn execute_in_memory(&self, items: Option<Vec<Value>>) -> QueryResult<InMemoryData> {
        let items = require_items(items)?;
        let skip = clamp_count(self.count);
        Ok(InMemoryData::Sequence(items.into_iter().skip(skip).collect()))
    }
}

impl fmt::Display for SkipResultOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Skip({})", self.count)
    }
}
