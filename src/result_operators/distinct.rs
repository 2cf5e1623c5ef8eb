use std::fmt;

use super::{ExecutionStrategy, InMemoryData, InMemoryOperator, require_items};
use crate::error::QueryResult;
use crate::value::Value;

/// Removes repeated items, keeping the first occurrence of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DistinctResultOperator;

impl InMemoryOperator for DistinctResultOperator {
    const STRATEGY: ExecutionStrategy = ExecutionStrategy::Collection;

    fn execute_in_memory(&self, items: Option<Vec<Value>>) -> QueryResult<InMemoryData> {
        let items = require_items(items)?;
        // Value holds floats and maps, so equality is the only test available.
        let mut unique: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Ok(InMemoryData::Sequence(unique))
    }
}

impl fmt::Display for DistinctResultOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Distinct()")
    }
}
