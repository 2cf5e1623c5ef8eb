use crate::arena::ClauseId;
use crate::ast::BinOp;

/// Expression node used as a clause's source, predicate, key or ordering.
///
/// To the query model an expression is opaque: the model only cares about
/// [`Expr::QuerySource`] edges, which it validates on insertion and rewrites
/// when cloning. Evaluation happens in [`Evaluator`](crate::Evaluator).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Literal floating point number
    Float(f64),

    /// Literal integer
    Integer(i64),

    /// String literal
    String(String),

    Boolean(bool),

    Null,

    // References
    /// The item bound by another clause of the same model.
    ///
    /// # Example
    /// ```text
    /// from s in Students
    /// where s.age > 18     // `s` is QuerySource(<main clause>)
    /// ```
    QuerySource(ClauseId),

    /// A named external sequence, resolved through the executor's data source.
    ///
    /// # Example
    /// ```text
    /// from s in Students    // Source("Students")
    /// ```
    Source(String),

    /// Field name in access expressions. Only appears as the `key` of
    /// `Expr::Access`.
    Key(String),

    // Access
    /// Field or index access
    ///
    /// # Examples
    /// ```text
    /// s.name
    /// s.courses[0]
    /// ```
    Access {
        object: Box<Expr>,
        key: Box<Expr>,
    },

    // Operations
    /// Binary operation (arithmetic, comparison, logical)
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Logical negation
    Not(Box<Expr>),

    /// Method call
    ///
    /// # Examples
    /// ```text
    /// s.name.startswith("A")
    /// s.courses.length()
    /// ```
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },

    // Object and Array Literals
    /// Object literal, typically a projection
    ///
    /// # Example
    /// ```text
    /// { name: s.name, course: c.title }
    /// ```
    Object(Vec<(String, Expr)>),

    Array(Vec<Expr>),
}

impl Expr {
    pub fn query_source(id: ClauseId) -> Self {
        Expr::QuerySource(id)
    }

    pub fn source(name: impl Into<String>) -> Self {
        Expr::Source(name.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::String(s.into())
    }

    /// `object.member`
    pub fn member(object: Expr, member: impl Into<String>) -> Self {
        Expr::Access {
            object: Box::new(object),
            key: Box::new(Expr::Key(member.into())),
        }
    }

    /// `object[index]`
    pub fn index(object: Expr, index: i64) -> Self {
        Expr::Access {
            object: Box::new(object),
            key: Box::new(Expr::Integer(index)),
        }
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    pub fn call(object: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            object: Box::new(object),
            method: method.into(),
            args,
        }
    }

    /// True for literal nodes that need no bindings to evaluate.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expr::Float(_) | Expr::Integer(_) | Expr::String(_) | Expr::Boolean(_) | Expr::Null
        )
    }
}
