//! Quarry: a composable query model.
//!
//! A [`QueryModel`] is built from clauses (a main from clause, joins,
//! additional from clauses, where and order by clauses) and a pipeline of
//! [`ResultOperator`]s. Models are walked with a [`QueryModelVisitor`],
//! deep-copied with fresh clause identities through a [`CloneContext`], and
//! can be run in memory with the [`InMemoryExecutor`].
//!
//! # Examples
//!
//! ```
//! use quarry::{
//!     BinOp, Clause, Expr, FromClause, InMemoryData, InMemoryDataSource, InMemoryExecutor,
//!     ItemType, QueryModel, ResultOperator, Value, WhereClause,
//! };
//!
//! let source = InMemoryDataSource::new().with_source(
//!     "Numbers",
//!     (1..=10).map(Value::Integer).collect(),
//! );
//!
//! let mut model = QueryModel::new(
//!     FromClause::new("n", ItemType::Integer, Expr::source("Numbers")).unwrap(),
//! )
//! .unwrap();
//! let n = Expr::query_source(model.main_clause_id());
//! model
//!     .add_body_clause(Clause::Where(WhereClause::new(Expr::binary(
//!         BinOp::GreaterThan,
//!         n,
//!         Expr::Integer(7),
//!     ))))
//!     .unwrap();
//! model.add_result_operator(ResultOperator::count());
//!
//! let result = InMemoryExecutor::new(&source).execute(&model).unwrap();
//! assert_eq!(result, InMemoryData::Value(Value::Integer(3)));
//! ```

pub mod arena;
pub mod ast;
pub mod clauses;
pub mod clone_context;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod model;
pub mod render;
pub mod result_operators;
pub mod value;
pub mod visitor;

#[cfg(feature = "cli")]
pub mod cli;

pub use arena::{ClauseArena, ClauseId, ModelId};
pub use ast::{BinOp, Expr, ItemType};
pub use clauses::{
    Clause, FromClause, FromClauseBuilder, JoinClause, OrderByClause, Ordering,
    OrderingDirection, WhereClause,
};
pub use clone_context::CloneContext;
pub use error::{QueryError, QueryResult};
pub use evaluator::{Bindings, EvalError, Evaluator};
pub use executor::{DataSource, ExecutionLimits, InMemoryDataSource, InMemoryExecutor};
pub use model::QueryModel;
pub use render::{QueryRenderer, format_expr};
pub use result_operators::{
    CountResultOperator, DistinctResultOperator, ExecutionStrategy, FirstResultOperator,
    InMemoryData, InMemoryOperator, MaxResultOperator, MinResultOperator, ResultOperator,
    ReverseResultOperator, SkipResultOperator, SumResultOperator, TakeResultOperator,
    apply_in_memory,
};
pub use value::Value;
pub use visitor::QueryModelVisitor;
