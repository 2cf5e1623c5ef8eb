use std::cmp::Ordering as CmpOrdering;

use crate::arena::ClauseId;
use crate::ast::Expr;
use crate::clauses::{FromClause, JoinClause, OrderByClause, OrderingDirection, WhereClause};
use crate::error::{QueryError, QueryResult};
use crate::evaluator::{Bindings, Evaluator};
use crate::executor::{DataSource, ExecutionLimits};
use crate::model::QueryModel;
use crate::result_operators::{
    CountResultOperator, DistinctResultOperator, FirstResultOperator, InMemoryData,
    InMemoryOperator, MaxResultOperator, MinResultOperator, ReverseResultOperator,
    SkipResultOperator, SumResultOperator, TakeResultOperator,
};
use crate::value::Value;
use crate::visitor::QueryModelVisitor;

/// Runs a whole query model in memory.
///
/// Rows are built clause by clause in visiting order: the main clause binds
/// one row per item, joins keep the rows whose keys are equal, additional
/// from clauses expand every row, where clauses filter and order by clauses
/// sort. Rows are then projected through the selector and fed to the result
/// operators.
///
/// # Examples
///
/// ```
/// use quarry::{
///     Expr, FromClause, InMemoryData, InMemoryDataSource, InMemoryExecutor, ItemType,
///     QueryModel, ResultOperator, Value,
/// };
///
/// let source = InMemoryDataSource::new().with_source(
///     "Students",
///     (1..=5).map(Value::Integer).collect(),
/// );
/// let mut model = QueryModel::new(
///     FromClause::new("s", ItemType::named("Student"), Expr::source("Students")).unwrap(),
/// )
/// .unwrap();
/// model.add_result_operator(ResultOperator::take(3));
///
/// let result = InMemoryExecutor::new(&source).execute(&model).unwrap();
/// assert_eq!(
///     result,
///     InMemoryData::Sequence(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
/// );
/// ```
pub struct InMemoryExecutor<'a> {
    data_source: &'a dyn DataSource,
    limits: ExecutionLimits,
}

impl<'a> InMemoryExecutor<'a> {
    pub fn new(data_source: &'a dyn DataSource) -> Self {
        Self::with_limits(data_source, ExecutionLimits::default())
    }

    pub fn with_limits(data_source: &'a dyn DataSource, limits: ExecutionLimits) -> Self {
        InMemoryExecutor {
            data_source,
            limits,
        }
    }

    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    pub fn execute(&self, model: &QueryModel) -> QueryResult<InMemoryData> {
        let mut state = ExecutionState {
            evaluator: Evaluator::new(self.data_source),
            limits: &self.limits,
            rows: Vec::new(),
            data: None,
        };
        model.accept(&mut state)?;

        let data = match state.data {
            Some(data) => data,
            None => InMemoryData::Sequence(state.project(model)?),
        };
        tracing::debug!(
            model = %model.id(),
            result_operators = model.result_operators().len(),
            "executed query model in memory"
        );
        Ok(data)
    }

    /// The projected items before any result operator runs.
    pub fn project(&self, model: &QueryModel) -> QueryResult<Vec<Value>> {
        let mut state = ExecutionState {
            evaluator: Evaluator::new(self.data_source),
            limits: &self.limits,
            rows: Vec::new(),
            data: None,
        };
        model.accept(&mut ClausesOnly(&mut state))?;
        state.project(model)
    }
}

struct ExecutionState<'a, 'l> {
    evaluator: Evaluator<'a>,
    limits: &'l ExecutionLimits,
    rows: Vec<Bindings>,
    /// Set once the first result operator has run.
    data: Option<InMemoryData>,
}

impl ExecutionState<'_, '_> {
    fn source_items(&self, id: ClauseId, expr: &Expr, row: &Bindings) -> QueryResult<Vec<Value>> {
        let items = self.evaluator.eval_sequence(expr, row)?;
        if items.len() > self.limits.max_source_items {
            return Err(QueryError::LimitExceeded(format!(
                "clause {} produced {} items, the limit is {}",
                id,
                items.len(),
                self.limits.max_source_items
            )));
        }
        Ok(items)
    }

    fn check_rows(&self, id: ClauseId) -> QueryResult<()> {
        if self.rows.len() > self.limits.max_rows {
            return Err(QueryError::LimitExceeded(format!(
                "clause {} produced {} rows, the limit is {}",
                id,
                self.rows.len(),
                self.limits.max_rows
            )));
        }
        Ok(())
    }

    fn expand(&mut self, id: ClauseId, clause: &FromClause) -> QueryResult<()> {
        let mut rows = Vec::new();
        'rows: for row in &self.rows {
            for item in self.source_items(id, clause.from_expression(), row)? {
                let mut bound = row.clone();
                bound.insert(id, item);
                rows.push(bound);
                if rows.len() > self.limits.max_rows {
                    break 'rows;
                }
            }
        }
        self.rows = rows;
        tracing::debug!(clause = %id, rows = self.rows.len(), "expanded rows");
        self.check_rows(id)
    }

    fn project(&self, model: &QueryModel) -> QueryResult<Vec<Value>> {
        let selector = model.selector();
        self.rows
            .iter()
            .map(|row| Ok(self.evaluator.eval(&selector, row)?))
            .collect()
    }

    fn apply<O: InMemoryOperator>(&mut self, operator: &O, model: &QueryModel) -> QueryResult<()> {
        let current = match self.data.take() {
            Some(data) => data,
            None => InMemoryData::Sequence(self.project(model)?),
        };
        tracing::trace!(%operator, "applying result operator in memory");
        self.data = Some(operator.execute_in_memory(current.into_sequence())?);
        Ok(())
    }
}

impl QueryModelVisitor for ExecutionState<'_, '_> {
    type Error = QueryError;

    fn visit_main_from_clause(
        &mut self,
        clause: &FromClause,
        id: ClauseId,
        _model: &QueryModel,
    ) -> QueryResult<()> {
        self.rows = vec![Bindings::new()];
        self.expand(id, clause)
    }

    fn visit_additional_from_clause(
        &mut self,
        clause: &FromClause,
        id: ClauseId,
        _model: &QueryModel,
    ) -> QueryResult<()> {
        self.expand(id, clause)
    }

    fn visit_join_clause(
        &mut self,
        clause: &JoinClause,
        id: ClauseId,
        _model: &QueryModel,
    ) -> QueryResult<()> {
        let mut rows = Vec::new();
        'rows: for row in &self.rows {
            let outer = self.evaluator.eval(clause.outer_key(), row)?;
            for item in self.source_items(id, clause.inner_sequence(), row)? {
                let mut bound = row.clone();
                bound.insert(id, item);
                let inner = self.evaluator.eval(clause.inner_key(), &bound)?;
                if inner == outer {
                    rows.push(bound);
                    if rows.len() > self.limits.max_rows {
                        break 'rows;
                    }
                }
            }
        }
        self.rows = rows;
        tracing::debug!(clause = %id, rows = self.rows.len(), "joined rows");
        self.check_rows(id)
    }

    fn visit_where_clause(
        &mut self,
        clause: &WhereClause,
        id: ClauseId,
        _model: &QueryModel,
    ) -> QueryResult<()> {
        let mut kept = Vec::with_capacity(self.rows.len());
        for row in std::mem::take(&mut self.rows) {
            if self.evaluator.eval(clause.predicate(), &row)?.as_bool() {
                kept.push(row);
            }
        }
        self.rows = kept;
        tracing::debug!(clause = %id, rows = self.rows.len(), "filtered rows");
        Ok(())
    }

    fn visit_order_by_clause(
        &mut self,
        clause: &OrderByClause,
        _id: ClauseId,
        _model: &QueryModel,
    ) -> QueryResult<()> {
        let mut keyed = Vec::with_capacity(self.rows.len());
        for row in std::mem::take(&mut self.rows) {
            let keys = clause
                .orderings()
                .iter()
                .map(|ordering| self.evaluator.eval(ordering.expression(), &row))
                .collect::<Result<Vec<_>, _>>()?;
            keyed.push((keys, row));
        }

        // sort_by is stable, so equal keys keep their previous order.
        keyed.sort_by(|(a, _), (b, _)| {
            for ((left, right), ordering) in a.iter().zip(b).zip(clause.orderings()) {
                let cmp = match ordering.direction() {
                    OrderingDirection::Ascending => left.compare(right),
                    OrderingDirection::Descending => right.compare(left),
                };
                if cmp != CmpOrdering::Equal {
                    return cmp;
                }
            }
            CmpOrdering::Equal
        });
        self.rows = keyed.into_iter().map(|(_, row)| row).collect();
        Ok(())
    }

    fn visit_take(&mut self, operator: &TakeResultOperator, _: usize, model: &QueryModel) -> QueryResult<()> {
        self.apply(operator, model)
    }

    fn visit_skip(&mut self, operator: &SkipResultOperator, _: usize, model: &QueryModel) -> QueryResult<()> {
        self.apply(operator, model)
    }

    fn visit_distinct(
        &mut self,
        operator: &DistinctResultOperator,
        _: usize,
        model: &QueryModel,
    ) -> QueryResult<()> {
        self.apply(operator, model)
    }

    fn visit_reverse(
        &mut self,
        operator: &ReverseResultOperator,
        _: usize,
        model: &QueryModel,
    ) -> QueryResult<()> {
        self.apply(operator, model)
    }

    fn visit_first(&mut self, operator: &FirstResultOperator, _: usize, model: &QueryModel) -> QueryResult<()> {
        self.apply(operator, model)
    }

    fn visit_count(&mut self, operator: &CountResultOperator, _: usize, model: &QueryModel) -> QueryResult<()> {
        self.apply(operator, model)
    }

    fn visit_sum(&mut self, operator: &SumResultOperator, _: usize, model: &QueryModel) -> QueryResult<()> {
        self.apply(operator, model)
    }

    fn visit_min(&mut self, operator: &MinResultOperator, _: usize, model: &QueryModel) -> QueryResult<()> {
        self.apply(operator, model)
    }

    fn visit_max(&mut self, operator: &MaxResultOperator, _: usize, model: &QueryModel) -> QueryResult<()> {
        self.apply(operator, model)
    }
}

/// Forwards clause visits and ignores result operators.
struct ClausesOnly<'s, 'a, 'l>(&'s mut ExecutionState<'a, 'l>);

impl QueryModelVisitor for ClausesOnly<'_, '_, '_> {
    type Error = QueryError;

    fn visit_main_from_clause(&mut self, clause: &FromClause, id: ClauseId, model: &QueryModel) -> QueryResult<()> {
        self.0.visit_main_from_clause(clause, id, model)
    }

    fn visit_additional_from_clause(
        &mut self,
        clause: &FromClause,
        id: ClauseId,
        model: &QueryModel,
    ) -> QueryResult<()> {
        self.0.visit_additional_from_clause(clause, id, model)
    }

    fn visit_join_clause(&mut self, clause: &JoinClause, id: ClauseId, model: &QueryModel) -> QueryResult<()> {
        self.0.visit_join_clause(clause, id, model)
    }

    fn visit_where_clause(&mut self, clause: &WhereClause, id: ClauseId, model: &QueryModel) -> QueryResult<()> {
        self.0.visit_where_clause(clause, id, model)
    }

    fn visit_order_by_clause(
        &mut self,
        clause: &OrderByClause,
        id: ClauseId,
        model: &QueryModel,
    ) -> QueryResult<()> {
        self.0.visit_order_by_clause(clause, id, model)
    }

    fn visit_take(&mut self, _: &TakeResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        Ok(())
    }

    fn visit_skip(&mut self, _: &SkipResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        Ok(())
    }

    fn visit_distinct(&mut self, _: &DistinctResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        Ok(())
    }

    fn visit_reverse(&mut self, _: &ReverseResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        Ok(())
    }

    fn visit_first(&mut self, _: &FirstResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        Ok(())
    }

    fn visit_count(&mut self, _: &CountResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        Ok(())
    }

    fn visit_sum(&mut self, _: &SumResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        Ok(())
    }

    fn visit_min(&mut self, _: &MinResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        Ok(())
    }

    fn visit_max(&mut self, _: &MaxResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        Ok(())
    }
}
