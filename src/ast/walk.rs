//! Traversals over the clause references inside an expression.

use crate::arena::ClauseId;
use crate::ast::Expr;
use crate::error::QueryResult;

/// Collect every clause handle referenced by `expr`, in first-seen order.
pub fn query_sources(expr: &Expr) -> Vec<ClauseId> {
    let mut found = Vec::new();
    collect(expr, &mut found);
    found
}

fn collect(expr: &Expr, found: &mut Vec<ClauseId>) {
    match expr {
        Expr::QuerySource(id) => {
            if !found.contains(id) {
                found.push(*id);
            }
        }
        Expr::Access { object, key } => {
            collect(object, found);
            collect(key, found);
        }
        Expr::BinaryOp { left, right, .. } => {
            collect(left, found);
            collect(right, found);
        }
        Expr::Not(inner) => collect(inner, found),
        Expr::MethodCall { object, args, .. } => {
            collect(object, found);
            args.iter().for_each(|arg| collect(arg, found));
        }
        Expr::Object(pairs) => pairs.iter().for_each(|(_, value)| collect(value, found)),
        Expr::Array(elements) => elements.iter().for_each(|elem| collect(elem, found)),

        // These never reference a clause
        Expr::Float(_)
        | Expr::Integer(_)
        | Expr::String(_)
        | Expr::Boolean(_)
        | Expr::Null
        | Expr::Source(_)
        | Expr::Key(_) => {}
    }
}

/// Check whether `expr` references the clause `id`.
pub fn references(expr: &Expr, id: ClauseId) -> bool {
    query_sources(expr).contains(&id)
}

/// Rebuild `expr`, replacing every clause handle with `map(handle)`.
///
/// The first failing lookup aborts the rewrite.
pub fn rewrite_query_sources<F>(expr: &Expr, map: &mut F) -> QueryResult<Expr>
where
    F: FnMut(ClauseId) -> QueryResult<ClauseId>,
{
    Ok(match expr {
        Expr::QuerySource(id) => Expr::QuerySource(map(*id)?),
        Expr::Access { object, key } => Expr::Access {
            object: Box::new(rewrite_query_sources(object, map)?),
            key: Box::new(rewrite_query_sources(key, map)?),
        },
        Expr::BinaryOp { op, left, right } => Expr::BinaryOp {
            op: *op,
            left: Box::new(rewrite_query_sources(left, map)?),
            right: Box::new(rewrite_query_sources(right, map)?),
        },
        Expr::Not(inner) => Expr::Not(Box::new(rewrite_query_sources(inner, map)?)),
        Expr::MethodCall {
            object,
            method,
            args,
        } => Expr::MethodCall {
            object: Box::new(rewrite_query_sources(object, map)?),
            method: method.clone(),
            args: args
                .iter()
                .map(|arg| rewrite_query_sources(arg, map))
                .collect::<QueryResult<_>>()?,
        },
        Expr::Object(pairs) => Expr::Object(
            pairs
                .iter()
                .map(|(name, value)| Ok((name.clone(), rewrite_query_sources(value, map)?)))
                .collect::<QueryResult<_>>()?,
        ),
        Expr::Array(elements) => Expr::Array(
            elements
                .iter()
                .map(|elem| rewrite_query_sources(elem, map))
                .collect::<QueryResult<_>>()?,
        ),
        leaf => leaf.clone(),
    })
}
