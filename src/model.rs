use crate::arena::{ClauseArena, ClauseId, ModelId};
use crate::ast::{Expr, walk};
use crate::clauses::{Clause, FromClause, JoinClause};
use crate::clone_context::CloneContext;
use crate::error::{QueryError, QueryResult};
use crate::result_operators::ResultOperator;
use crate::visitor::QueryModelVisitor;

/// A composable query: one main from clause, ordered body clauses, an
/// optional selector and an ordered result-operator pipeline.
///
/// Clauses live in an arena owned by the model and refer to each other
/// through [`ClauseId`] handles. Every expression added to the model is
/// checked so that it only references clauses of this model, which keeps two
/// models from ever sharing a clause.
///
/// `QueryModel` deliberately does not implement `Clone`: a field-wise copy
/// would keep handles pointing into the original. Use
/// [`clone_model`](Self::clone_model).
///
/// # Examples
///
/// ```
/// use quarry::{Expr, FromClause, ItemType, QueryModel, ResultOperator};
///
/// let mut model = QueryModel::new(
///     FromClause::new("s", ItemType::named("Student"), Expr::source("Students")).unwrap(),
/// )
/// .unwrap();
/// model.add_result_operator(ResultOperator::take(3));
///
/// let copy = model.clone_model().unwrap();
/// assert_ne!(copy.id(), model.id());
/// assert!(copy.structurally_equals(&model).unwrap());
/// ```
#[derive(Debug)]
pub struct QueryModel {
    arena: ClauseArena,
    main_clause: ClauseId,
    body_clauses: Vec<ClauseId>,
    selector: Option<Expr>,
    result_operators: Vec<ResultOperator>,
}

impl QueryModel {
    /// Create a model around its main from clause.
    ///
    /// The main clause is the first clause of the model, so its source
    /// expression cannot reference any clause.
    pub fn new(main: FromClause) -> QueryResult<Self> {
        let mut arena = ClauseArena::new();
        check_no_joins(&main)?;
        if let Some(id) = walk::query_sources(main.from_expression()).first() {
            return Err(QueryError::argument(
                "from_expression",
                format!("of the main clause cannot reference clause {}", id),
            ));
        }
        let main_clause = arena.insert(Clause::MainFrom(main));

        Ok(QueryModel {
            arena,
            main_clause,
            body_clauses: Vec::new(),
            selector: None,
            result_operators: Vec::new(),
        })
    }

    pub fn id(&self) -> ModelId {
        self.arena.model_id()
    }

    pub fn main_clause_id(&self) -> ClauseId {
        self.main_clause
    }

    pub fn main_from_clause(&self) -> QueryResult<&FromClause> {
        match self.clause(self.main_clause)? {
            Clause::MainFrom(from) => Ok(from),
            other => Err(QueryError::InvalidOperation(format!(
                "main clause {} is a {} clause",
                self.main_clause,
                other.kind_name()
            ))),
        }
    }

    pub fn clause(&self, id: ClauseId) -> QueryResult<&Clause> {
        self.arena.get(id)
    }

    pub fn body_clause_ids(&self) -> &[ClauseId] {
        &self.body_clauses
    }

    /// Body clauses with their handles, in declaration order.
    pub fn body_clauses(&self) -> QueryResult<Vec<(ClauseId, &Clause)>> {
        self.body_clauses
            .iter()
            .map(|&id| Ok((id, self.clause(id)?)))
            .collect()
    }

    /// Join clauses owned by the from clause `owner`, in declaration order.
    pub fn join_clauses(&self, owner: ClauseId) -> QueryResult<Vec<(ClauseId, &JoinClause)>> {
        let from = self.from_clause(owner)?;
        from.join_clauses()
            .iter()
            .map(|&id| match self.clause(id)? {
                Clause::Join(join) => Ok((id, join)),
                other => Err(QueryError::InvalidOperation(format!(
                    "clause {} owned as a join is a {} clause",
                    id,
                    other.kind_name()
                ))),
            })
            .collect()
    }

    /// Name of the item bound by clause `id`.
    pub fn item_name(&self, id: ClauseId) -> QueryResult<&str> {
        let clause = self.clause(id)?;
        clause.item_name().ok_or_else(|| {
            QueryError::InvalidOperation(format!(
                "clause {} is a {} clause and binds no item",
                id,
                clause.kind_name()
            ))
        })
    }

    /// Append a body clause (additional from, where or order by).
    ///
    /// Fails with an argument error for main from and join clauses, for a
    /// from clause that already owns joins, and for expressions referencing
    /// clauses outside this model.
    pub fn add_body_clause(&mut self, clause: Clause) -> QueryResult<ClauseId> {
        match &clause {
            Clause::MainFrom(_) => {
                return Err(QueryError::argument(
                    "clause",
                    "a model has exactly one main from clause",
                ));
            }
            Clause::Join(_) => {
                return Err(QueryError::argument(
                    "clause",
                    "join clauses are added to their from clause with add_join",
                ));
            }
            Clause::AdditionalFrom(from) => check_no_joins(from)?,
            Clause::Where(_) | Clause::OrderBy(_) => {}
        }
        for expr in clause.expressions() {
            self.check_references(expr, None)?;
        }

        let id = self.arena.insert(clause);
        self.body_clauses.push(id);
        Ok(id)
    }

    /// Add a join clause owned by the from clause `owner`.
    ///
    /// `build` receives the handle the join will have, so its inner key can
    /// reference the join's own item.
    ///
    /// ```
    /// use quarry::{Expr, FromClause, ItemType, JoinClause, QueryModel};
    ///
    /// let mut model = QueryModel::new(
    ///     FromClause::new("s", ItemType::named("Student"), Expr::source("Students")).unwrap(),
    /// )
    /// .unwrap();
    /// let s = model.main_clause_id();
    /// let c = model
    ///     .add_join(s, |c| {
    ///         JoinClause::new(
    ///             "c",
    ///             ItemType::named("Course"),
    ///             Expr::source("Courses"),
    ///             Expr::member(Expr::query_source(s), "id"),
    ///             Expr::member(Expr::query_source(c), "student_id"),
    ///         )
    ///     })
    ///     .unwrap();
    /// assert_eq!(model.item_name(c).unwrap(), "c");
    /// ```
    pub fn add_join<F>(&mut self, owner: ClauseId, build: F) -> QueryResult<ClauseId>
    where
        F: FnOnce(ClauseId) -> QueryResult<JoinClause>,
    {
        let owned = self.from_clause(owner)?.join_clauses().len();
        let join_id = self.arena.next_id();
        let join = build(join_id)?;

        // A join may only see clauses that precede it in visiting order.
        let mut visible = self.clause_ids()?;
        if let Some(position) = visible.iter().position(|&id| id == owner) {
            visible.truncate(position + 1 + owned);
        }
        for expr in [join.inner_sequence(), join.outer_key()] {
            self.check_references(expr, None)?;
            check_visible(expr, &visible, None)?;
        }
        self.check_references(join.inner_key(), Some(join_id))?;
        check_visible(join.inner_key(), &visible, Some(join_id))?;

        let id = self.arena.insert(Clause::Join(join));
        match self.arena.get_mut(owner)? {
            Clause::MainFrom(from) | Clause::AdditionalFrom(from) => from.push_join(id),
            other => {
                return Err(QueryError::InvalidOperation(format!(
                    "clause {} is a {} clause and cannot own joins",
                    owner,
                    other.kind_name()
                )));
            }
        }
        Ok(id)
    }

    /// The projection applied to each row; defaults to the main clause's item.
    pub fn selector(&self) -> Expr {
        self.selector
            .clone()
            .unwrap_or(Expr::QuerySource(self.main_clause))
    }

    pub fn explicit_selector(&self) -> Option<&Expr> {
        self.selector.as_ref()
    }

    pub fn set_selector(&mut self, selector: Expr) -> QueryResult<()> {
        self.check_references(&selector, None)?;
        self.selector = Some(selector);
        Ok(())
    }

    /// Append an operator to the end of the pipeline.
    pub fn add_result_operator(&mut self, operator: ResultOperator) {
        self.result_operators.push(operator);
    }

    pub fn result_operators(&self) -> &[ResultOperator] {
        &self.result_operators
    }

    /// Substitute the operator at `index`, returning the one it replaced.
    pub fn replace_result_operator(
        &mut self,
        index: usize,
        operator: ResultOperator,
    ) -> QueryResult<ResultOperator> {
        let len = self.result_operators.len();
        let slot = self.result_operators.get_mut(index).ok_or_else(|| {
            QueryError::argument(
                "index",
                format!("{} is out of range for a pipeline of {} operators", index, len),
            )
        })?;
        Ok(std::mem::replace(slot, operator))
    }

    /// Walk the model: main clause, body clauses, then result operators.
    ///
    /// Join clauses are visited right after the from clause that owns them.
    pub fn accept<V>(&self, visitor: &mut V) -> Result<(), V::Error>
    where
        V: QueryModelVisitor + ?Sized,
    {
        self.accept_clause(self.main_clause, visitor)?;
        for &id in &self.body_clauses {
            self.accept_clause(id, visitor)?;
        }
        for (index, operator) in self.result_operators.iter().enumerate() {
            operator.accept(index, visitor, self)?;
        }
        Ok(())
    }

    fn accept_clause<V>(&self, id: ClauseId, visitor: &mut V) -> Result<(), V::Error>
    where
        V: QueryModelVisitor + ?Sized,
    {
        let clause = self.clause(id)?;
        clause.accept(id, visitor, self)?;
        if let Some(from) = clause.as_from() {
            for &join in from.join_clauses() {
                self.clause(join)?.accept(join, visitor, self)?;
            }
        }
        Ok(())
    }

    /// Deep copy with fresh clause identities.
    ///
    /// Every clause reference in the copy points at the copy's own clauses.
    pub fn clone_model(&self) -> QueryResult<QueryModel> {
        let mut context = CloneContext::new();
        self.clone_with_context(&mut context)
    }

    /// Deep copy recording the old-to-new clause mapping in `context`.
    ///
    /// Fails with an invalid-operation error if `context` already maps one of
    /// this model's clauses.
    pub fn clone_with_context(&self, context: &mut CloneContext) -> QueryResult<QueryModel> {
        let mut target = ClauseArena::new();

        let main_clause = self.clause(self.main_clause)?.clone_into(
            self.main_clause,
            &self.arena,
            context,
            &mut target,
        )?;

        let mut body_clauses = Vec::with_capacity(self.body_clauses.len());
        for &id in &self.body_clauses {
            let clone = self
                .clause(id)?
                .clone_into(id, &self.arena, context, &mut target)?;
            body_clauses.push(clone);
        }

        let selector = self
            .selector
            .as_ref()
            .map(|selector| context.rewrite(selector))
            .transpose()?;

        tracing::debug!(
            original = %self.id(),
            clone = %target.model_id(),
            clauses = target.len(),
            result_operators = self.result_operators.len(),
            "cloned query model"
        );

        Ok(QueryModel {
            arena: target,
            main_clause,
            body_clauses,
            selector,
            result_operators: self.result_operators.clone(),
        })
    }

    /// Every clause handle referenced by an expression of this model.
    pub fn referenced_clauses(&self) -> QueryResult<Vec<ClauseId>> {
        let mut exprs = Vec::new();
        for id in self.clause_ids()? {
            exprs.extend(self.clause(id)?.expressions());
        }
        exprs.extend(self.selector.as_ref());

        let mut found: Vec<ClauseId> = Vec::new();
        for id in exprs.into_iter().flat_map(walk::query_sources) {
            if !found.contains(&id) {
                found.push(id);
            }
        }
        Ok(found)
    }

    /// Every clause handle of this model in visiting order.
    pub fn clause_ids(&self) -> QueryResult<Vec<ClauseId>> {
        let mut ids = Vec::with_capacity(self.arena.len());
        for id in std::iter::once(self.main_clause).chain(self.body_clauses.iter().copied()) {
            ids.push(id);
            if let Some(from) = self.clause(id)?.as_from() {
                ids.extend_from_slice(from.join_clauses());
            }
        }
        Ok(ids)
    }

    /// Compare two models by content, ignoring clause identities.
    ///
    /// Clauses are paired in visiting order; references are compared through
    /// that pairing.
    pub fn structurally_equals(&self, other: &QueryModel) -> QueryResult<bool> {
        let ours = self.clause_ids()?;
        let theirs = other.clause_ids()?;
        if ours.len() != theirs.len() || self.result_operators != other.result_operators {
            return Ok(false);
        }

        let mut pairing = CloneContext::new();
        for (&a, &b) in ours.iter().zip(&theirs) {
            pairing.add_mapping(a, b)?;
        }

        for (&a, &b) in ours.iter().zip(&theirs) {
            let (left, right) = (self.clause(a)?, other.clause(b)?);
            if left.kind_name() != right.kind_name()
                || left.item_name() != right.item_name()
                || left.item_type() != right.item_type()
            {
                return Ok(false);
            }
            let (left_exprs, right_exprs) = (left.expressions(), right.expressions());
            if left_exprs.len() != right_exprs.len() {
                return Ok(false);
            }
            for (l, r) in left_exprs.into_iter().zip(right_exprs) {
                if pairing.rewrite(l)? != *r {
                    return Ok(false);
                }
            }
            if let (Clause::OrderBy(l), Clause::OrderBy(r)) = (left, right) {
                let directions = |c: &crate::clauses::OrderByClause| {
                    c.orderings().iter().map(|o| o.direction()).collect::<Vec<_>>()
                };
                if directions(l) != directions(r) {
                    return Ok(false);
                }
            }
        }

        Ok(pairing.rewrite(&self.selector())? == other.selector())
    }

    fn from_clause(&self, id: ClauseId) -> QueryResult<&FromClause> {
        let clause = self
            .clause(id)
            .map_err(|_| QueryError::argument("owner", format!("{} is not a clause of this model", id)))?;
        clause.as_from().ok_or_else(|| {
            QueryError::argument(
                "owner",
                format!("{} is a {} clause, not a from clause", id, clause.kind_name()),
            )
        })
    }

    /// Every reference in `expr` must name an existing item-binding clause of
    /// this model, or `allowed` (the clause being added).
    fn check_references(&self, expr: &Expr, allowed: Option<ClauseId>) -> QueryResult<()> {
        for id in walk::query_sources(expr) {
            if Some(id) == allowed {
                continue;
            }
            let clause = self.arena.get(id).map_err(|_| {
                QueryError::argument(
                    "expression",
                    format!("references clause {} which is not part of model {}", id, self.id()),
                )
            })?;
            if !clause.is_query_source() {
                return Err(QueryError::argument(
                    "expression",
                    format!("references {} clause {} which binds no item", clause.kind_name(), id),
                ));
            }
        }
        Ok(())
    }
}

fn check_visible(expr: &Expr, visible: &[ClauseId], allowed: Option<ClauseId>) -> QueryResult<()> {
    for id in walk::query_sources(expr) {
        if Some(id) != allowed && !visible.contains(&id) {
            return Err(QueryError::argument(
                "expression",
                format!("references clause {} which is declared after the join", id),
            ));
        }
    }
    Ok(())
}

fn check_no_joins(from: &FromClause) -> QueryResult<()> {
    if !from.join_clauses().is_empty() {
        return Err(QueryError::argument(
            "clause",
            "already owns join clauses of another model",
        ));
    }
    Ok(())
}
