//! Host-side evaluation of closed sub-expressions.
//!
//! Arithmetic is never pushed into SQL: a closed arithmetic operand is computed here and bound as
//! a single parameter.

use query_engine_sql::sql::Value;

use super::expression::{BinaryOp, Expr, MemberRoot, UnaryOp};

/// Why a sub-expression could not be computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("'{0}' refers to a column")]
    ColumnReference(String),
    #[error("cannot apply '{operator}' to {left} and {right}")]
    TypeMismatch {
        operator: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("'{0}' overflowed")]
    Overflow(&'static str),
    #[error("division by zero")]
    DivisionByZero,
    #[error("'{0}' cannot be evaluated")]
    NotEvaluable(String),
    /// Raised by a captured value.
    #[error("{0}")]
    Captured(String),
}

/// Compute the value of an expression which does not depend on the row.
pub fn evaluate(expr: &Expr) -> Result<Value, EvaluationError> {
    match expr {
        Expr::Constant(value) => Ok(value.clone()),
        Expr::Member {
            root: MemberRoot::Captured(capture),
            ..
        } => capture.evaluate(),
        Expr::Member {
            root: MemberRoot::Parameter,
            path,
        } => Err(EvaluationError::ColumnReference(path.join("."))),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand)?;
            match op {
                UnaryOp::Convert => Ok(value),
                UnaryOp::Negate => negate(value),
                UnaryOp::Not => match value {
                    Value::Bool(b) => Ok(Value::Bool(!b)),
                    other => Err(EvaluationError::TypeMismatch {
                        operator: "!",
                        left: other.kind(),
                        right: "nothing",
                    }),
                },
            }
        }
        Expr::Binary { op, left, right } if op.is_arithmetic() => {
            arithmetic(*op, evaluate(left)?, evaluate(right)?)
        }
        Expr::Binary { .. } | Expr::MethodCall { .. } => {
            Err(EvaluationError::NotEvaluable(expr.to_string()))
        }
    }
}

fn negate(value: Value) -> Result<Value, EvaluationError> {
    match value {
        Value::Int(i) => i.checked_neg().map(Value::Int).ok_or(EvaluationError::Overflow("-")),
        Value::Float(f) => Ok(Value::Float(-f)),
        other => Err(EvaluationError::TypeMismatch {
            operator: "-",
            left: other.kind(),
            right: "nothing",
        }),
    }
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvaluationError> {
    let operator = op.symbol();
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => {
            if matches!(op, BinaryOp::Divide | BinaryOp::Modulo) && r == 0 {
                return Err(EvaluationError::DivisionByZero);
            }
            let result = match op {
                BinaryOp::Add => l.checked_add(r),
                BinaryOp::Subtract => l.checked_sub(r),
                BinaryOp::Multiply => l.checked_mul(r),
                BinaryOp::Divide => l.checked_div(r),
                BinaryOp::Modulo => l.checked_rem(r),
                _ => return Err(EvaluationError::NotEvaluable(operator.to_string())),
            };
            result.map(Value::Int).ok_or(EvaluationError::Overflow(operator))
        }
        #[allow(clippy::cast_precision_loss)]
        (Value::Int(l), Value::Float(r)) => float_arithmetic(op, l as f64, r),
        #[allow(clippy::cast_precision_loss)]
        (Value::Float(l), Value::Int(r)) => float_arithmetic(op, l, r as f64),
        (Value::Float(l), Value::Float(r)) => float_arithmetic(op, l, r),
        (Value::Text(l), Value::Text(r)) if op == BinaryOp::Add => Ok(Value::Text(l + &r)),
        (left, right) => Err(EvaluationError::TypeMismatch {
            operator,
            left: left.kind(),
            right: right.kind(),
        }),
    }
}

fn float_arithmetic(op: BinaryOp, l: f64, r: f64) -> Result<Value, EvaluationError> {
    match op {
        BinaryOp::Add => Ok(Value::Float(l + r)),
        BinaryOp::Subtract => Ok(Value::Float(l - r)),
        BinaryOp::Multiply => Ok(Value::Float(l * r)),
        BinaryOp::Divide => Ok(Value::Float(l / r)),
        BinaryOp::Modulo => Ok(Value::Float(l % r)),
        _ => Err(EvaluationError::NotEvaluable(op.symbol().to_string())),
    }
}
