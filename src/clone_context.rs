use std::collections::HashMap;

use crate::arena::ClauseId;
use crate::ast::{Expr, walk};
use crate::error::{QueryError, QueryResult};

/// Old-handle to new-handle table for one clone operation.
///
/// A clause is registered before anything that references it is cloned, so
/// by the time a dependent clause rewrites its expressions every edge it
/// holds resolves to the clone of its target.
///
/// # Examples
///
/// ```
/// use quarry::{CloneContext, Expr, FromClause, ItemType, QueryModel};
///
/// let model = QueryModel::new(
///     FromClause::new("s", ItemType::named("Student"), Expr::source("Students")).unwrap(),
/// )
/// .unwrap();
/// let mut context = CloneContext::new();
/// let copy = model.clone_with_context(&mut context).unwrap();
///
/// let mapped = context.resolve(model.main_clause_id()).unwrap();
/// assert_eq!(mapped, copy.main_clause_id());
/// ```
#[derive(Debug, Default)]
pub struct CloneContext {
    mapping: HashMap<ClauseId, ClauseId>,
}

impl CloneContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `substitute` as the clone of `original`.
    ///
    /// Fails with an invalid-operation error when `original` is already
    /// mapped, which means the clause was cloned twice.
    pub fn add_mapping(&mut self, original: ClauseId, substitute: ClauseId) -> QueryResult<()> {
        if let Some(existing) = self.mapping.get(&original) {
            return Err(QueryError::InvalidOperation(format!(
                "clause {} is already mapped to {}",
                original, existing
            )));
        }
        tracing::trace!(%original, %substitute, "registered clause mapping");
        self.mapping.insert(original, substitute);
        Ok(())
    }

    /// The clone registered for `original`.
    ///
    /// Fails with a not-found error when `original` was never cloned, which
    /// means a clause references something outside the cloned model.
    pub fn resolve(&self, original: ClauseId) -> QueryResult<ClauseId> {
        self.mapping.get(&original).copied().ok_or_else(|| {
            QueryError::NotFound(format!("no clone registered for clause {}", original))
        })
    }

    pub fn contains(&self, original: ClauseId) -> bool {
        self.mapping.contains_key(&original)
    }

    /// Rewrite every clause reference in `expr` to its registered clone.
    pub fn rewrite(&self, expr: &Expr) -> QueryResult<Expr> {
        walk::rewrite_query_sources(expr, &mut |id| self.resolve(id))
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}
