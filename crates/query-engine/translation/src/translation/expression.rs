//! Expression trees over the columns of an entity, and a small DSL to build them.
//!
//! ```ignore
//! let min_age = 30;
//! let predicate = col("Age").ge(captured("min_age", min_age)) & col("Email").contains("@x.com");
//! ```

use std::fmt;
use std::ops;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use query_engine_sql::sql::Value;

use super::evaluate::EvaluationError;

/// A node of an expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Member access. Rooted at the row parameter it denotes a column, otherwise a captured value.
    Member { root: MemberRoot, path: Vec<String> },
    Constant(Value),
    Unary { op: UnaryOp, operand: Box<Expr> },
    MethodCall {
        method: Method,
        receiver: Option<Box<Expr>>,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone)]
pub enum MemberRoot {
    /// The row the predicate is evaluated against.
    Parameter,
    /// A value closed over when the expression was built.
    Captured(Capture),
}

/// A closed-over value, evaluated on demand.
#[derive(Clone)]
pub struct Capture {
    thunk: Arc<dyn Fn() -> Result<Value, EvaluationError> + Send + Sync>,
}

impl Capture {
    pub fn new<F>(thunk: F) -> Self
    where
        F: Fn() -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        Capture {
            thunk: Arc::new(thunk),
        }
    }

    /// Capture an already known value.
    pub fn value(value: impl Into<Value>) -> Self {
        let value = value.into();
        Capture::new(move || Ok(value.clone()))
    }

    pub fn evaluate(&self) -> Result<Value, EvaluationError> {
        (self.thunk)()
    }
}

impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Capture(..)")
    }
}

/// Methods understood by the predicate translator, resolved once from their name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// Substring match on a text receiver, or membership with a collection argument.
    Contains,
    StartsWith,
    EndsWith,
    /// Membership of the argument in the receiver collection.
    CollectionContains,
    /// Anything else. Rejected at translation.
    Other(String),
}

impl Method {
    /// Names are matched exactly.
    pub fn from_name(name: &str) -> Method {
        match name {
            "Contains" => Method::Contains,
            "StartsWith" => Method::StartsWith,
            "EndsWith" => Method::EndsWith,
            "CollectionContains" => Method::CollectionContains,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Method::Contains => "Contains",
            Method::StartsWith => "StartsWith",
            Method::EndsWith => "EndsWith",
            Method::CollectionContains => "CollectionContains",
            Method::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    And,
    Or,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Modulo
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    /// A type conversion. Transparent to translation.
    Convert,
    /// Arithmetic negation, only ever evaluated host-side.
    Negate,
}

// DSL //

/// A column of the row the predicate is evaluated against.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Member {
        root: MemberRoot::Parameter,
        path: vec![name.into()],
    }
}

/// A nested member of the row, such as `Address.City`.
pub fn member_path<I, S>(path: I) -> Expr
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Expr::Member {
        root: MemberRoot::Parameter,
        path: path.into_iter().map(Into::into).collect(),
    }
}

/// A constant.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Constant(value.into())
}

/// A named value captured from the caller's scope.
pub fn captured(name: impl Into<String>, value: impl Into<Value>) -> Expr {
    captured_with(name, Capture::value(value))
}

/// A named value computed when the expression is translated.
pub fn captured_with(name: impl Into<String>, capture: Capture) -> Expr {
    Expr::Member {
        root: MemberRoot::Captured(capture),
        path: vec![name.into()],
    }
}

impl Expr {
    fn binary(self, op: BinaryOp, right: impl Into<Expr>) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right.into()),
        }
    }

    fn unary(self, op: UnaryOp) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(self),
        }
    }

    pub fn eq(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Equal, right)
    }

    pub fn ne(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::NotEqual, right)
    }

    pub fn gt(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::GreaterThan, right)
    }

    pub fn ge(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::GreaterThanOrEqual, right)
    }

    pub fn lt(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::LessThan, right)
    }

    pub fn le(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::LessThanOrEqual, right)
    }

    pub fn and(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::And, right)
    }

    pub fn or(self, right: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Or, right)
    }

    /// Wrap in a type conversion.
    pub fn convert(self) -> Expr {
        self.unary(UnaryOp::Convert)
    }

    pub fn contains(self, pattern: impl Into<Expr>) -> Expr {
        self.call(Method::Contains, vec![pattern.into()])
    }

    pub fn starts_with(self, prefix: impl Into<Expr>) -> Expr {
        self.call(Method::StartsWith, vec![prefix.into()])
    }

    pub fn ends_with(self, suffix: impl Into<Expr>) -> Expr {
        self.call(Method::EndsWith, vec![suffix.into()])
    }

    /// Membership of this value in a collection.
    pub fn is_in(self, collection: impl Into<Expr>) -> Expr {
        collection.into().call(Method::CollectionContains, vec![self])
    }

    /// Call a method on this expression.
    pub fn call(self, method: Method, args: Vec<Expr>) -> Expr {
        Expr::MethodCall {
            method,
            receiver: Some(Box::new(self)),
            args,
        }
    }

    /// Call a method by name on this expression.
    pub fn call_named(self, name: &str, args: Vec<Expr>) -> Expr {
        self.call(Method::from_name(name), args)
    }

    /// Call a free-standing method, such as the two argument form of `Contains`.
    pub fn call_static(name: &str, args: Vec<Expr>) -> Expr {
        Expr::MethodCall {
            method: Method::from_name(name),
            receiver: None,
            args,
        }
    }

    /// Does any member of this tree refer to the row parameter?
    pub fn references_parameter(&self) -> bool {
        match self {
            Expr::Binary { left, right, .. } => {
                left.references_parameter() || right.references_parameter()
            }
            Expr::Member { root, .. } => matches!(root, MemberRoot::Parameter),
            Expr::Constant(_) => false,
            Expr::Unary { operand, .. } => operand.references_parameter(),
            Expr::MethodCall { receiver, args, .. } => {
                receiver
                    .as_ref()
                    .is_some_and(|receiver| receiver.references_parameter())
                    || args.iter().any(Expr::references_parameter)
            }
        }
    }
}

macro_rules! expr_from_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Expr {
                fn from(value: $t) -> Self {
                    Expr::Constant(Value::from(value))
                }
            }
        )*
    };
}

expr_from_value!(
    bool,
    i32,
    i64,
    u32,
    f64,
    &str,
    String,
    Uuid,
    NaiveDate,
    NaiveDateTime,
    Value
);

impl<R: Into<Expr>> ops::Add<R> for Expr {
    type Output = Expr;
    fn add(self, right: R) -> Expr {
        self.binary(BinaryOp::Add, right)
    }
}

impl<R: Into<Expr>> ops::Sub<R> for Expr {
    type Output = Expr;
    fn sub(self, right: R) -> Expr {
        self.binary(BinaryOp::Subtract, right)
    }
}

impl<R: Into<Expr>> ops::Mul<R> for Expr {
    type Output = Expr;
    fn mul(self, right: R) -> Expr {
        self.binary(BinaryOp::Multiply, right)
    }
}

impl<R: Into<Expr>> ops::Div<R> for Expr {
    type Output = Expr;
    fn div(self, right: R) -> Expr {
        self.binary(BinaryOp::Divide, right)
    }
}

impl<R: Into<Expr>> ops::Rem<R> for Expr {
    type Output = Expr;
    fn rem(self, right: R) -> Expr {
        self.binary(BinaryOp::Modulo, right)
    }
}

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.unary(UnaryOp::Negate)
    }
}

impl ops::Not for Expr {
    type Output = Expr;
    fn not(self) -> Expr {
        self.unary(UnaryOp::Not)
    }
}

/// `a & b` is `a AND b`.
impl<R: Into<Expr>> ops::BitAnd<R> for Expr {
    type Output = Expr;
    fn bitand(self, right: R) -> Expr {
        self.binary(BinaryOp::And, right)
    }
}

/// `a | b` is `a OR b`.
impl<R: Into<Expr>> ops::BitOr<R> for Expr {
    type Output = Expr;
    fn bitor(self, right: R) -> Expr {
        self.binary(BinaryOp::Or, right)
    }
}

/// A readable rendering, used in error messages and logs. Captured values are shown by name.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Member { path, .. } => write!(f, "{}", path.join(".")),
            Expr::Constant(value) => write!(f, "{value:?}"),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!{operand}"),
                UnaryOp::Convert => write!(f, "{operand}"),
                UnaryOp::Negate => write!(f, "-{operand}"),
            },
            Expr::MethodCall {
                method,
                receiver,
                args,
            } => {
                if let Some(receiver) = receiver {
                    write!(f, "{receiver}.")?;
                }
                write!(f, "{}(", method.name())?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
