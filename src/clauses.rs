//! Clauses: the data-binding steps of a query model.
//!
//! A model always starts with one main from clause. Body clauses follow in
//! declaration order: additional from clauses (cross product), where clauses
//! (filters) and order by clauses. From clauses own their join clauses.
//!
//! ```text
//! from s in Students                                // MainFrom
//! join c in Courses on s.id equals c.student_id      // Join, owned by MainFrom
//! from f in s.friends                                // AdditionalFrom
//! where (f.age > 18)                                 // Where
//! orderby f.name asc                                 // OrderBy
//! ```
mod from_clause;
mod join_clause;
mod order_by_clause;
mod where_clause;

pub use from_clause::{FromClause, FromClauseBuilder};
pub use join_clause::JoinClause;
pub use order_by_clause::{OrderByClause, Ordering, OrderingDirection};
pub use where_clause::WhereClause;

use crate::arena::{ClauseArena, ClauseId};
use crate::ast::{Expr, ItemType};
use crate::clone_context::CloneContext;
use crate::error::QueryResult;
use crate::model::QueryModel;
use crate::visitor::QueryModelVisitor;

/// One clause of a query model.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// The first from clause; every model has exactly one.
    MainFrom(FromClause),
    AdditionalFrom(FromClause),
    /// Owned by a from clause, never a body clause itself.
    Join(JoinClause),
    Where(WhereClause),
    OrderBy(OrderByClause),
}

impl Clause {
    /// Short kind name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Clause::MainFrom(_) => "main from",
            Clause::AdditionalFrom(_) => "additional from",
            Clause::Join(_) => "join",
            Clause::Where(_) => "where",
            Clause::OrderBy(_) => "order by",
        }
    }

    /// Name of the item this clause binds, for clauses that bind one.
    pub fn item_name(&self) -> Option<&str> {
        match self {
            Clause::MainFrom(from) | Clause::AdditionalFrom(from) => Some(from.item_name()),
            Clause::Join(join) => Some(join.item_name()),
            Clause::Where(_) | Clause::OrderBy(_) => None,
        }
    }

    pub fn item_type(&self) -> Option<&ItemType> {
        match self {
            Clause::MainFrom(from) | Clause::AdditionalFrom(from) => Some(from.item_type()),
            Clause::Join(join) => Some(join.item_type()),
            Clause::Where(_) | Clause::OrderBy(_) => None,
        }
    }

    /// True for clauses whose item other clauses may reference.
    pub fn is_query_source(&self) -> bool {
        self.item_name().is_some()
    }

    pub fn as_from(&self) -> Option<&FromClause> {
        match self {
            Clause::MainFrom(from) | Clause::AdditionalFrom(from) => Some(from),
            _ => None,
        }
    }

    pub fn as_join(&self) -> Option<&JoinClause> {
        match self {
            Clause::Join(join) => Some(join),
            _ => None,
        }
    }

    /// Every expression held directly by this clause (not by its joins).
    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            Clause::MainFrom(from) | Clause::AdditionalFrom(from) => vec![from.from_expression()],
            Clause::Join(join) => vec![join.inner_sequence(), join.outer_key(), join.inner_key()],
            Clause::Where(clause) => vec![clause.predicate()],
            Clause::OrderBy(clause) => clause.orderings().iter().map(Ordering::expression).collect(),
        }
    }

    /// Dispatch to the visitor method for this clause's kind.
    pub fn accept<V>(&self, id: ClauseId, visitor: &mut V, model: &QueryModel) -> Result<(), V::Error>
    where
        V: QueryModelVisitor + ?Sized,
    {
        tracing::trace!(clause = %id, kind = self.kind_name(), "visiting clause");
        match self {
            Clause::MainFrom(from) => visitor.visit_main_from_clause(from, id, model),
            Clause::AdditionalFrom(from) => visitor.visit_additional_from_clause(from, id, model),
            Clause::Join(join) => visitor.visit_join_clause(join, id, model),
            Clause::Where(clause) => visitor.visit_where_clause(clause, id, model),
            Clause::OrderBy(clause) => visitor.visit_order_by_clause(clause, id, model),
        }
    }

    /// Clone this clause (stored in `source` under `original`) into `target`.
    ///
    /// The clone's handle is registered in `context` before owned join
    /// clauses are cloned and before any expression is rewritten, so joins
    /// and self-references resolve to the clone. Returns the clone's handle.
    pub fn clone_into(
        &self,
        original: ClauseId,
        source: &ClauseArena,
        context: &mut CloneContext,
        target: &mut ClauseArena,
    ) -> QueryResult<ClauseId> {
        let clone_id = target.reserve();
        context.add_mapping(original, clone_id)?;

        let clone = match self {
            Clause::MainFrom(from) => Clause::MainFrom(from.clone_with(source, context, target)?),
            Clause::AdditionalFrom(from) => {
                Clause::AdditionalFrom(from.clone_with(source, context, target)?)
            }
            Clause::Join(join) => Clause::Join(join.clone_with(context)?),
            Clause::Where(clause) => Clause::Where(clause.clone_with(context)?),
            Clause::OrderBy(clause) => Clause::OrderBy(clause.clone_with(context)?),
        };

        target.fill(clone_id, clone)?;
        tracing::trace!(%original, clone = %clone_id, "cloned clause");
        Ok(clone_id)
    }
}
