//! Comprehension-style text for query models.
//!
//! [`QueryRenderer`] is a translating visitor: it walks a model and produces
//! text such as
//!
//! ```text
//! from Student s in Students where (s.age > 20) orderby s.name asc select s => Take(3)
//! ```

use crate::arena::ClauseId;
use crate::ast::{Expr, ItemType};
use crate::clauses::{FromClause, JoinClause, OrderByClause, WhereClause};
use crate::error::{QueryError, QueryResult};
use crate::model::QueryModel;
use crate::result_operators::{
    CountResultOperator, DistinctResultOperator, FirstResultOperator, MaxResultOperator,
    MinResultOperator, ReverseResultOperator, SkipResultOperator, SumResultOperator,
    TakeResultOperator,
};
use crate::visitor::QueryModelVisitor;

/// Renders a query model as text.
///
/// # Examples
///
/// ```
/// use quarry::{Expr, FromClause, ItemType, QueryModel, QueryRenderer, ResultOperator};
///
/// let mut model = QueryModel::new(
///     FromClause::new("s", ItemType::named("Student"), Expr::source("Students")).unwrap(),
/// )
/// .unwrap();
/// model.add_result_operator(ResultOperator::take(3));
///
/// assert_eq!(
///     QueryRenderer::render(&model).unwrap(),
///     "from Student s in Students select s => Take(3)"
/// );
/// ```
#[derive(Debug, Default)]
pub struct QueryRenderer {
    clauses: Vec<String>,
    operators: Vec<String>,
}

impl QueryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `model` in one call.
    pub fn render(model: &QueryModel) -> QueryResult<String> {
        let mut renderer = QueryRenderer::new();
        model.accept(&mut renderer)?;
        renderer.finish(model)
    }

    /// Join the visited parts and append the select part.
    pub fn finish(self, model: &QueryModel) -> QueryResult<String> {
        let mut text = self.clauses.join(" ");
        text.push_str(" select ");
        text.push_str(&format_expr(&model.selector(), model)?);
        for operator in &self.operators {
            text.push_str(" => ");
            text.push_str(operator);
        }
        Ok(text)
    }

    fn from_part(&mut self, clause: &FromClause, model: &QueryModel) -> QueryResult<()> {
        self.clauses.push(format!(
            "from {}in {}",
            binding(clause.item_type(), clause.item_name()),
            format_expr(clause.from_expression(), model)?
        ));
        Ok(())
    }
}

fn binding(item_type: &ItemType, name: &str) -> String {
    match item_type {
        ItemType::Any => format!("{} ", name),
        other => format!("{} {} ", other, name),
    }
}

/// Render a single expression, naming clause references by their item.
pub fn format_expr(expr: &Expr, model: &QueryModel) -> QueryResult<String> {
    let text = match expr {
        Expr::Float(n) => n.to_string(),
        Expr::Integer(n) => n.to_string(),
        Expr::String(s) => format!("{:?}", s),
        Expr::Boolean(b) => b.to_string(),
        Expr::Null => "null".to_string(),
        Expr::QuerySource(id) => model.item_name(*id)?.to_string(),
        Expr::Source(name) | Expr::Key(name) => name.clone(),
        Expr::Access { object, key } => match key.as_ref() {
            Expr::Key(name) => format!("{}.{}", format_expr(object, model)?, name),
            other => format!(
                "{}[{}]",
                format_expr(object, model)?,
                format_expr(other, model)?
            ),
        },
        Expr::BinaryOp { op, left, right } => format!(
            "({} {} {})",
            format_expr(left, model)?,
            op,
            format_expr(right, model)?
        ),
        Expr::Not(inner) => format!("!{}", format_expr(inner, model)?),
        Expr::MethodCall {
            object,
            method,
            args,
        } => format!(
            "{}.{}({})",
            format_expr(object, model)?,
            method,
            format_list(args, model)?
        ),
        Expr::Object(fields) => {
            let fields = fields
                .iter()
                .map(|(key, value)| Ok(format!("{}: {}", key, format_expr(value, model)?)))
                .collect::<QueryResult<Vec<_>>>()?;
            format!("{{ {} }}", fields.join(", "))
        }
        Expr::Array(items) => format!("[{}]", format_list(items, model)?),
    };
    Ok(text)
}

fn format_list(exprs: &[Expr], model: &QueryModel) -> QueryResult<String> {
    let parts = exprs
        .iter()
        .map(|expr| format_expr(expr, model))
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(parts.join(", "))
}

impl QueryModelVisitor for QueryRenderer {
    type Error = QueryError;

    fn visit_main_from_clause(&mut self, clause: &FromClause, _: ClauseId, model: &QueryModel) -> QueryResult<()> {
        self.from_part(clause, model)
    }

    fn visit_additional_from_clause(
        &mut self,
        clause: &FromClause,
        _: ClauseId,
        model: &QueryModel,
    ) -> QueryResult<()> {
        self.from_part(clause, model)
    }

    fn visit_join_clause(&mut self, clause: &JoinClause, _: ClauseId, model: &QueryModel) -> QueryResult<()> {
        self.clauses.push(format!(
            "join {}in {} on {} equals {}",
            binding(clause.item_type(), clause.item_name()),
            format_expr(clause.inner_sequence(), model)?,
            format_expr(clause.outer_key(), model)?,
            format_expr(clause.inner_key(), model)?
        ));
        Ok(())
    }

    fn visit_where_clause(&mut self, clause: &WhereClause, _: ClauseId, model: &QueryModel) -> QueryResult<()> {
        self.clauses
            .push(format!("where {}", format_expr(clause.predicate(), model)?));
        Ok(())
    }

    fn visit_order_by_clause(
        &mut self,
        clause: &OrderByClause,
        _: ClauseId,
        model: &QueryModel,
    ) -> QueryResult<()> {
        let orderings = clause
            .orderings()
            .iter()
            .map(|o| Ok(format!("{} {}", format_expr(o.expression(), model)?, o.direction())))
            .collect::<QueryResult<Vec<_>>>()?;
        self.clauses.push(format!("orderby {}", orderings.join(", ")));
        Ok(())
    }

    fn visit_take(&mut self, operator: &TakeResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        self.operators.push(operator.to_string());
        Ok(())
    }

    fn visit_skip(&mut self, operator: &SkipResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        self.operators.push(operator.to_string());
        Ok(())
    }

    fn visit_distinct(&mut self, operator: &DistinctResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        self.operators.push(operator.to_string());
        Ok(())
    }

    fn visit_reverse(&mut self, operator: &ReverseResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        self.operators.push(operator.to_string());
        Ok(())
    }

    fn visit_first(&mut self, operator: &FirstResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        self.operators.push(operator.to_string());
        Ok(())
    }

    fn visit_count(&mut self, operator: &CountResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        self.operators.push(operator.to_string());
        Ok(())
    }

    fn visit_sum(&mut self, operator: &SumResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        self.operators.push(operator.to_string());
        Ok(())
    }

    fn visit_min(&mut self, operator: &MinResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        self.operators.push(operator.to_string());
        Ok(())
    }

    fn visit_max(&mut self, operator: &MaxResultOperator, _: usize, _: &QueryModel) -> QueryResult<()> {
        self.operators.push(operator.to_string());
        Ok(())
    }
}
