//! Result operators: the post-processing pipeline applied after all clauses.
//!
//! Operators are immutable values. To change a parameter, build a
//! replacement (for example [`TakeResultOperator::with_count`]) and
//! substitute the pipeline entry with
//! [`QueryModel::replace_result_operator`](crate::QueryModel::replace_result_operator).
//!
//! Each kind carries a fixed [`ExecutionStrategy`] that tells the in-memory
//! fallback whether the operator still yields a sequence.
mod aggregates;
mod distinct;
mod first;
mod reverse;
mod skip;
mod strategy;
mod take;

pub use aggregates::{
    CountResultOperator, MaxResultOperator, MinResultOperator, SumResultOperator,
};
pub use distinct::DistinctResultOperator;
pub use first::FirstResultOperator;
pub use reverse::ReverseResultOperator;
pub use skip::SkipResultOperator;
pub use strategy::{ExecutionStrategy, InMemoryData};
pub use take::TakeResultOperator;

use std::fmt;

use crate::error::{QueryError, QueryResult};
use crate::model::QueryModel;
use crate::value::Value;
use crate::visitor::QueryModelVisitor;

/// Behaviour shared by every operator kind.
pub trait InMemoryOperator: fmt::Display {
    /// Fixed per kind; never changes with the operator's parameters.
    const STRATEGY: ExecutionStrategy;

    /// Apply this operator to a materialized sequence.
    ///
    /// Fails with an argument error when `items` is absent.
    fn execute_in_memory(&self, items: Option<Vec<Value>>) -> QueryResult<InMemoryData>;
}

/// One step of a query model's result-operator pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultOperator {
    Take(TakeResultOperator),
    Skip(SkipResultOperator),
    Distinct(DistinctResultOperator),
    Reverse(ReverseResultOperator),
    First(FirstResultOperator),
    Count(CountResultOperator),
    Sum(SumResultOperator),
    Min(MinResultOperator),
    Max(MaxResultOperator),
}

impl ResultOperator {
    pub fn take(count: i64) -> Self {
        ResultOperator::Take(TakeResultOperator::new(count))
    }

    pub fn skip(count: i64) -> Self {
        ResultOperator::Skip(SkipResultOperator::new(count))
    }

    pub fn distinct() -> Self {
        ResultOperator::Distinct(DistinctResultOperator)
    }

    pub fn reverse() -> Self {
        ResultOperator::Reverse(ReverseResultOperator)
    }

    pub fn first() -> Self {
        ResultOperator::First(FirstResultOperator::new(false))
    }

    pub fn first_or_default() -> Self {
        ResultOperator::First(FirstResultOperator::new(true))
    }

    pub fn count() -> Self {
        ResultOperator::Count(CountResultOperator)
    }

    pub fn sum() -> Self {
        ResultOperator::Sum(SumResultOperator)
    }

    pub fn min() -> Self {
        ResultOperator::Min(MinResultOperator)
    }

    pub fn max() -> Self {
        ResultOperator::Max(MaxResultOperator)
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        match self {
            ResultOperator::Take(_) => TakeResultOperator::STRATEGY,
            ResultOperator::Skip(_) => SkipResultOperator::STRATEGY,
            ResultOperator::Distinct(_) => DistinctResultOperator::STRATEGY,
            ResultOperator::Reverse(_) => ReverseResultOperator::STRATEGY,
            ResultOperator::First(_) => FirstResultOperator::STRATEGY,
            ResultOperator::Count(_) => CountResultOperator::STRATEGY,
            ResultOperator::Sum(_) => SumResultOperator::STRATEGY,
            ResultOperator::Min(_) => MinResultOperator::STRATEGY,
            ResultOperator::Max(_) => MaxResultOperator::STRATEGY,
        }
    }

    pub fn execute_in_memory(&self, items: Option<Vec<Value>>) -> QueryResult<InMemoryData> {
        match self {
            ResultOperator::Take(op) => op.execute_in_memory(items),
            ResultOperator::Skip(op) => op.execute_in_memory(items),
            ResultOperator::Distinct(op) => op.execute_in_memory(items),
            ResultOperator::Reverse(op) => op.execute_in_memory(items),
            ResultOperator::First(op) => op.execute_in_memory(items),
            ResultOperator::Count(op) => op.execute_in_memory(items),
            ResultOperator::Sum(op) => op.execute_in_memory(items),
            ResultOperator::Min(op) => op.execute_in_memory(items),
            ResultOperator::Max(op) => op.execute_in_memory(items),
        }
    }

    /// Dispatch to the visitor method for this operator's kind.
    pub fn accept<V>(&self, index: usize, visitor: &mut V, model: &QueryModel) -> Result<(), V::Error>
    where
        V: QueryModelVisitor + ?Sized,
    {
        tracing::trace!(index, operator = %self, "visiting result operator");
        match self {
            ResultOperator::Take(op) => visitor.visit_take(op, index, model),
            ResultOperator::Skip(op) => visitor.visit_skip(op, index, model),
            ResultOperator::Distinct(op) => visitor.visit_distinct(op, index, model),
            ResultOperator::Reverse(op) => visitor.visit_reverse(op, index, model),
            ResultOperator::First(op) => visitor.visit_first(op, index, model),
            ResultOperator::Count(op) => visitor.visit_count(op, index, model),
            ResultOperator::Sum(op) => visitor.visit_sum(op, index, model),
            ResultOperator::Min(op) => visitor.visit_min(op, index, model),
            ResultOperator::Max(op) => visitor.visit_max(op, index, model),
        }
    }
}

impl fmt::Display for ResultOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultOperator::Take(op) => fmt::Display::fmt(op, f),
            ResultOperator::Skip(op) => fmt::Display::fmt(op, f),
            ResultOperator::Distinct(op) => fmt::Display::fmt(op, f),
            ResultOperator::Reverse(op) => fmt::Display::fmt(op, f),
            ResultOperator::First(op) => fmt::Display::fmt(op, f),
            ResultOperator::Count(op) => fmt::Display::fmt(op, f),
            ResultOperator::Sum(op) => fmt::Display::fmt(op, f),
            ResultOperator::Min(op) => fmt::Display::fmt(op, f),
            ResultOperator::Max(op) => fmt::Display::fmt(op, f),
        }
    }
}

/// Apply `operators` left to right, starting from a materialized sequence.
///
/// A collection operator that follows a single or scalar operator receives
/// no sequence and fails with an argument error.
pub fn apply_in_memory(operators: &[ResultOperator], items: Vec<Value>) -> QueryResult<InMemoryData> {
    let mut current = InMemoryData::Sequence(items);
    for operator in operators {
        tracing::trace!(%operator, "applying result operator in memory");
        current = operator.execute_in_memory(current.into_sequence())?;
    }
    Ok(current)
}

fn require_items(items: Option<Vec<Value>>) -> QueryResult<Vec<Value>> {
    items.ok_or_else(|| QueryError::absent("items"))
}

/// Clamp a signed count to a usable length; non-positive counts become zero.
fn clamp_count(count: i64) -> usize {
    if count <= 0 {
        0
    } else {
        usize::try_from(count).unwrap_or(usize::MAX)
    }
}
