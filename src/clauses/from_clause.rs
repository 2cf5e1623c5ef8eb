use crate::arena::{ClauseArena, ClauseId};
use crate::ast::{Expr, ItemType};
use crate::clone_context::CloneContext;
use crate::error::{QueryError, QueryResult};

/// A clause producing the items that later clauses filter, join or order.
///
/// Used both for the model's main clause and for additional from clauses.
///
/// # Example
/// ```text
/// from s in Students
/// from f in s.friends
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    item_name: String,
    item_type: ItemType,
    from_expression: Expr,
    joins: Vec<ClauseId>,
}

impl FromClause {
    /// Create a from clause.
    ///
    /// Fails with an argument error if `item_name` is empty or `item_type`
    /// is an empty descriptor.
    ///
    /// ```
    /// use quarry::{Expr, FromClause, ItemType};
    ///
    /// let clause = FromClause::new("s", ItemType::named("Student"), Expr::source("Students")).unwrap();
    /// assert_eq!(clause.item_name(), "s");
    /// assert!(FromClause::new("", ItemType::named("Student"), Expr::source("Students")).is_err());
    /// ```
    pub fn new(
        item_name: impl Into<String>,
        item_type: ItemType,
        from_expression: Expr,
    ) -> QueryResult<Self> {
        let item_name = item_name.into();
        if item_name.trim().is_empty() {
            return Err(QueryError::empty("item_name"));
        }
        item_type.validate("item_type")?;

        Ok(FromClause {
            item_name,
            item_type,
            from_expression,
            joins: Vec::new(),
        })
    }

    /// Builder for callers assembling a clause from optional parts.
    pub fn builder() -> FromClauseBuilder {
        FromClauseBuilder::default()
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn item_type(&self) -> &ItemType {
        &self.item_type
    }

    /// The expression producing this clause's items
    pub fn from_expression(&self) -> &Expr {
        &self.from_expression
    }

    /// Handles of the join clauses owned by this clause, in declaration order
    pub fn join_clauses(&self) -> &[ClauseId] {
        &self.joins
    }

    pub(crate) fn push_join(&mut self, join: ClauseId) {
        self.joins.push(join);
    }

    pub(crate) fn clone_with(
        &self,
        source: &ClauseArena,
        context: &mut CloneContext,
        target: &mut ClauseArena,
    ) -> QueryResult<Self> {
        let mut joins = Vec::with_capacity(self.joins.len());
        for &join_id in &self.joins {
            let join = source.get(join_id)?;
            joins.push(join.clone_into(join_id, source, context, target)?);
        }

        Ok(FromClause {
            item_name: self.item_name.clone(),
            item_type: self.item_type.clone(),
            from_expression: context.rewrite(&self.from_expression)?,
            joins,
        })
    }
}

/// Collects the parts of a [`FromClause`]; `build` reports absent parts.
#[derive(Debug, Clone, Default)]
pub struct FromClauseBuilder {
    item_name: Option<String>,
    item_type: Option<ItemType>,
    from_expression: Option<Expr>,
}

impl FromClauseBuilder {
    pub fn item_name(mut self, name: impl Into<String>) -> Self {
        self.item_name = Some(name.into());
        self
    }

    pub fn item_type(mut self, item_type: ItemType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    pub fn from_expression(mut self, expr: Expr) -> Self {
        self.from_expression = Some(expr);
        self
    }

    /// Fails with an argument error naming the first absent or empty part.
    pub fn build(self) -> QueryResult<FromClause> {
        let item_name = self.item_name.ok_or_else(|| QueryError::absent("item_name"))?;
        let item_type = self.item_type.ok_or_else(|| QueryError::absent("item_type"))?;
        let from_expression = self
            .from_expression
            .ok_or_else(|| QueryError::absent("from_expression"))?;
        FromClause::new(item_name, item_type, from_expression)
    }
}
