//! # Query Model - Expression Layer
//!
//! Clauses of a query model bind items produced by *source expressions* and
//! filter or order them with further expressions. This module defines those
//! expressions and the semantic type descriptors attached to bound items.
//!
//! - **[expressions]** - The expression tree (literals, access, operations,
//!   named sources and clause references)
//! - **[operators]** - Binary operators (comparison, arithmetic, logical)
//! - **[item_type]** - Type descriptors for items bound by clauses
//! - **[walk]** - Traversals over clause references inside expressions
//!
//! ## Clause References
//!
//! The only edge between two clauses is [`Expr::QuerySource`], which names the
//! item bound by another clause through its [`ClauseId`](crate::ClauseId).
//! For the comprehension
//!
//! ```text
//! from s in Students
//! from f in s.friends
//! where (f.age > 18)
//! ```
//!
//! the second from clause's source expression is
//! `Access { object: QuerySource(<s>), key: Key("friends") }`, and the where
//! clause's predicate references the second clause. Cloning a model rewrites
//! every such edge so the copy never points back into the original.
pub mod expressions;
pub mod item_type;
pub mod operators;
pub mod walk;

pub use expressions::Expr;
pub use item_type::ItemType;
pub use operators::BinOp;
