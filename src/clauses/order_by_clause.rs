use std::fmt;

use crate::ast::Expr;
use crate::clone_context::CloneContext;
use crate::error::{QueryError, QueryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingDirection {
    #[default]
    Ascending,
    Descending,
}

impl fmt::Display for OrderingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingDirection::Ascending => f.write_str("asc"),
            OrderingDirection::Descending => f.write_str("desc"),
        }
    }
}

/// One sort key of an order by clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    expression: Expr,
    direction: OrderingDirection,
}

impl Ordering {
    pub fn new(expression: Expr, direction: OrderingDirection) -> Self {
        Ordering {
            expression,
            direction,
        }
    }

    pub fn ascending(expression: Expr) -> Self {
        Self::new(expression, OrderingDirection::Ascending)
    }

    pub fn descending(expression: Expr) -> Self {
        Self::new(expression, OrderingDirection::Descending)
    }

    pub fn expression(&self) -> &Expr {
        &self.expression
    }

    pub fn direction(&self) -> OrderingDirection {
        self.direction
    }
}

/// Sorts rows by one or more keys; earlier keys take precedence.
///
/// # Example
/// ```text
/// orderby s.last_name asc, s.age desc
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    orderings: Vec<Ordering>,
}

impl OrderByClause {
    /// Fails with an argument error when `orderings` is empty.
    pub fn new(orderings: Vec<Ordering>) -> QueryResult<Self> {
        if orderings.is_empty() {
            return Err(QueryError::empty("orderings"));
        }
        Ok(OrderByClause { orderings })
    }

    pub fn orderings(&self) -> &[Ordering] {
        &self.orderings
    }

    pub(crate) fn clone_with(&self, context: &CloneContext) -> QueryResult<Self> {
        let orderings = self
            .orderings
            .iter()
            .map(|ordering| {
                Ok(Ordering {
                    expression: context.rewrite(&ordering.expression)?,
                    direction: ordering.direction,
                })
            })
            .collect::<QueryResult<_>>()?;
        Ok(OrderByClause { orderings })
    }
}
