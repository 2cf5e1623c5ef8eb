use crate::ast::{Expr, ItemType};
use crate::clone_context::CloneContext;
use crate::error::{QueryError, QueryResult};

/// An inner equi-join owned by a from clause.
///
/// # Example
/// ```text
/// from s in Students
/// join c in Courses on s.id equals c.student_id
/// ```
///
/// `outer_key` is evaluated against the items bound so far, `inner_key`
/// against each item of `inner_sequence` (bound to this clause).
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    item_name: String,
    item_type: ItemType,
    inner_sequence: Expr,
    outer_key: Expr,
    inner_key: Expr,
}

impl JoinClause {
    pub fn new(
        item_name: impl Into<String>,
        item_type: ItemType,
        inner_sequence: Expr,
        outer_key: Expr,
        inner_key: Expr,
    ) -> QueryResult<Self> {
        let item_name = item_name.into();
        if item_name.trim().is_empty() {
            return Err(QueryError::empty("item_name"));
        }
        item_type.validate("item_type")?;

        Ok(JoinClause {
            item_name,
            item_type,
            inner_sequence,
            outer_key,
            inner_key,
        })
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn item_type(&self) -> &ItemType {
        &self.item_type
    }

    pub fn inner_sequence(&self) -> &Expr {
        &self.inner_sequence
    }

    pub fn outer_key(&self) -> &Expr {
        &self.outer_key
    }

    pub fn inner_key(&self) -> &Expr {
        &self.inner_key
    }

    pub(crate) fn clone_with(&self, context: &CloneContext) -> QueryResult<Self> {
        Ok(JoinClause {
            item_name: self.item_name.clone(),
            item_type: self.item_type.clone(),
            inner_sequence: context.rewrite(&self.inner_sequence)?,
            outer_key: context.rewrite(&self.outer_key)?,
            inner_key: context.rewrite(&self.inner_key)?,
        })
    }
}
