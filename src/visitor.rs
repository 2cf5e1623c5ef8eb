//! Visitor protocol for walking a query model.
//!
//! [`QueryModel::accept`](crate::QueryModel::accept) drives the walk in a
//! fixed order that every visitor may rely on:
//!
//! 1. the main from clause, followed by its join clauses
//! 2. each body clause in declaration order (from clauses again followed by
//!    their join clauses)
//! 3. each result operator in pipeline order
//!
//! Every method is required. Adding a clause or operator kind adds a method
//! here, and every existing visitor stops compiling until it handles the new
//! kind.

use crate::arena::ClauseId;
use crate::clauses::{FromClause, JoinClause, OrderByClause, WhereClause};
use crate::error::QueryError;
use crate::model::QueryModel;
use crate::result_operators::{
    CountResultOperator, DistinctResultOperator, FirstResultOperator, MaxResultOperator,
    MinResultOperator, ReverseResultOperator, SkipResultOperator, SumResultOperator,
    TakeResultOperator,
};

/// One method per clause kind and per result operator kind.
///
/// Clause methods receive the clause's handle; operator methods receive the
/// operator's pipeline index. Both receive the model being walked, so a
/// translator can resolve clause references.
pub trait QueryModelVisitor {
    /// Walk failures. Model lookups inside the walk surface as `QueryError`.
    type Error: From<QueryError>;

    fn visit_main_from_clause(
        &mut self,
        clause: &FromClause,
        id: ClauseId,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_additional_from_clause(
        &mut self,
        clause: &FromClause,
        id: ClauseId,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_join_clause(
        &mut self,
        clause: &JoinClause,
        id: ClauseId,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_where_clause(
        &mut self,
        clause: &WhereClause,
        id: ClauseId,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_order_by_clause(
        &mut self,
        clause: &OrderByClause,
        id: ClauseId,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_take(
        &mut self,
        operator: &TakeResultOperator,
        index: usize,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_skip(
        &mut self,
        operator: &SkipResultOperator,
        index: usize,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_distinct(
        &mut self,
        operator: &DistinctResultOperator,
        index: usize,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_reverse(
        &mut self,
        operator: &ReverseResultOperator,
        index: usize,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_first(
        &mut self,
        operator: &FirstResultOperator,
        index: usize,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_count(
        &mut self,
        operator: &CountResultOperator,
        index: usize,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_sum(
        &mut self,
        operator: &SumResultOperator,
        index: usize,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_min(
        &mut self,
        operator: &MinResultOperator,
        index: usize,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;

    fn visit_max(
        &mut self,
        operator: &MaxResultOperator,
        index: usize,
        model: &QueryModel,
    ) -> Result<(), Self::Error>;
}
