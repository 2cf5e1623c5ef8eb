use crate::ast::Expr;
use crate::clone_context::CloneContext;
use crate::error::QueryResult;

/// Keeps the rows for which the predicate is truthy.
///
/// # Example
/// ```text
/// where (s.age >= 18)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    predicate: Expr,
}

impl WhereClause {
    pub fn new(predicate: Expr) -> Self {
        WhereClause { predicate }
    }

    pub fn predicate(&self) -> &Expr {
        &self.predicate
    }

    pub(crate) fn clone_with(&self, context: &CloneContext) -> QueryResult<Self> {
        Ok(WhereClause {
            predicate: context.rewrite(&self.predicate)?,
        })
    }
}
