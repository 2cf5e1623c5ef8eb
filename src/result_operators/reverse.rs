use std::fmt;

use super::{ExecutionStrategy, InMemoryData, InMemoryOperator, require_items};
use crate::error::QueryResult;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReverseResultOperator;

impl InMemoryOperator for ReverseResultOperator {
    const STRATEGY: ExecutionStrategy = ExecutionStrategy::Collection;

    fn execute_in_memory(&self, items: Option<Vec<Value>>) -> QueryResult<InMemoryData> {
        let mut items = require_items(items)?;
        items.reverse();
        Ok(InMemoryData::Sequence(items))
    }
}

impl fmt::Display for ReverseResultOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reverse()")
    }
}
