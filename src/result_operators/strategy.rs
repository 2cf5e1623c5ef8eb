use std::fmt;

use crate::value::Value;

/// What an operator's in-memory fallback produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Still a sequence (take, skip, distinct, reverse)
    Collection,
    /// One item picked from the sequence (first, min, max)
    Single,
    /// One value computed from the sequence (count, sum)
    Scalar,
}

impl ExecutionStrategy {
    pub fn yields_sequence(self) -> bool {
        matches!(self, ExecutionStrategy::Collection)
    }
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStrategy::Collection => f.write_str("collection"),
            ExecutionStrategy::Single => f.write_str("single"),
            ExecutionStrategy::Scalar => f.write_str("scalar"),
        }
    }
}

/// Output of in-memory execution.
#[derive(Debug, Clone, PartialEq)]
pub enum InMemoryData {
    Sequence(Vec<Value>),
    Value(Value),
}

impl InMemoryData {
    /// The sequence, or `None` once the pipeline has collapsed to one value.
    pub fn into_sequence(self) -> Option<Vec<Value>> {
        match self {
            InMemoryData::Sequence(items) => Some(items),
            InMemoryData::Value(_) => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            InMemoryData::Sequence(items) => Some(items),
            InMemoryData::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            InMemoryData::Value(value) => Some(value),
            InMemoryData::Sequence(_) => None,
        }
    }

    /// Collapse into a single value; sequences become arrays.
    pub fn into_value(self) -> Value {
        match self {
            InMemoryData::Sequence(items) => Value::Array(items),
            InMemoryData::Value(value) => value,
        }
    }
}
