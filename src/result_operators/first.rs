use std::fmt;

use super::{ExecutionStrategy, InMemoryData, InMemoryOperator, require_items};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Picks the first item.
///
/// On an empty sequence `FirstOrDefault()` yields `Null` while `First()`
/// fails with an invalid-operation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstResultOperator {
    return_default_when_empty: bool,
}

impl FirstResultOperator {
    pub fn new(return_default_when_empty: bool) -> Self {
        FirstResultOperator {
            return_default_when_empty,
        }
    }

    pub fn return_default_when_empty(&self) -> bool {
        self.return_default_when_empty
    }
}

impl InMemoryOperator for FirstResultOperator {
    const STRATEGY: ExecutionStrategy = ExecutionStrategy::Single;

    fn execute_in_memory(&self, items: Option<Vec<Value>>) -> QueryResult<InMemoryData> {
        let items = require_items(items)?;
        match items.into_iter().next() {
            Some(first) => Ok(InMemoryData::Value(first)),
            None if self.return_default_when_empty => Ok(InMemoryData::Value(Value::Null)),
            None => Err(QueryError::InvalidOperation(
                "First(): sequence contains no elements".to_string(),
            )),
        }
    }
}

impl fmt::Display for FirstResultOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.return_default_when_empty {
            f.write_str("FirstOrDefault()")
        } else {
            f.write_str("First()")
        }
    }
}
