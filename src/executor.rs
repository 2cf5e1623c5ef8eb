//! In-memory fallback execution.
//!
//! When a translator cannot push a query down to its backend, the
//! [`InMemoryExecutor`] runs the whole model against materialized sequences
//! supplied by a [`DataSource`].

mod in_memory;

pub use in_memory::InMemoryExecutor;

use std::collections::HashMap;

use crate::value::Value;

/// Supplies the named sequences referenced by `Expr::Source`.
pub trait DataSource {
    /// All items of the named sequence, or `None` if it does not exist.
    fn scan(&self, name: &str) -> Option<Vec<Value>>;

    fn contains(&self, name: &str) -> bool {
        self.scan(name).is_some()
    }

    /// Names of all sequences.
    fn source_names(&self) -> Vec<String> {
        vec![]
    }
}

/// Configuration for in-memory execution limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Maximum number of items one source expression may produce (default: 10,000)
    pub max_source_items: usize,
    /// Maximum number of intermediate rows after joins and cross products (default: 100,000)
    pub max_rows: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_source_items: 10_000,
            max_rows: 100_000,
        }
    }
}

impl ExecutionLimits {
    /// No limits; for trusted, already-bounded inputs
    pub fn unbounded() -> Self {
        Self {
            max_source_items: usize::MAX,
            max_rows: usize::MAX,
        }
    }
}

/// Named sequences held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    sources: HashMap<String, Vec<Value>>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a named sequence.
    pub fn add_source(&mut self, name: &str, items: Vec<Value>) {
        self.sources.insert(name.to_string(), items);
    }

    pub fn with_source(mut self, name: &str, items: Vec<Value>) -> Self {
        self.add_source(name, items);
        self
    }
}

impl DataSource for InMemoryDataSource {
    fn scan(&self, name: &str) -> Option<Vec<Value>> {
        self.sources.get(name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    fn source_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.keys().cloned().collect();
        names.sort();
        names
    }
}
