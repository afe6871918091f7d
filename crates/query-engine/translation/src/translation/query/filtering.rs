//! Handle filtering/where clauses translation.

use std::cell::Cell;

use query_engine_sql::sql;
use query_engine_sql::sql::{Dialect, Value};

use crate::translation::error::Error;
use crate::translation::evaluate::evaluate;
use crate::translation::expression::{BinaryOp, Expr, MemberRoot, Method, UnaryOp};
use crate::translation::options::{EvaluationFailure, TranslationOptions};

/// Translate a predicate into a rendered SQL fragment with its parameters.
pub fn translate_predicate(expr: &Expr, dialect: Dialect) -> Result<sql::string::SQL, Error> {
    translate_predicate_with(expr, dialect, &TranslationOptions::default())
}

pub fn translate_predicate_with(
    expr: &Expr,
    dialect: Dialect,
    options: &TranslationOptions,
) -> Result<sql::string::SQL, Error> {
    let expression = translate_expression(expr, options)?;
    let mut sql = sql::string::SQL::new(dialect);
    expression.to_sql(&mut sql);
    Ok(sql)
}

/// Translate a predicate into a boolean SQL expression.
pub fn translate_expression(
    expr: &Expr,
    options: &TranslationOptions,
) -> Result<sql::ast::Expression, Error> {
    Translator {
        options,
        fallbacks: Cell::new(0),
    }
    .translate_boolean(expr)
}

struct Translator<'a> {
    options: &'a TranslationOptions,
    /// How many values were replaced by NULL after a failed evaluation.
    fallbacks: Cell<usize>,
}

impl Translator<'_> {
    /// Translate a node in boolean position: the root, or an operand of AND, OR and NOT.
    fn translate_boolean(&self, expr: &Expr) -> Result<sql::ast::Expression, Error> {
        match expr {
            Expr::Binary { op, left, right } if op.is_logical() => {
                let left = Box::new(self.translate_boolean(left)?);
                let right = Box::new(self.translate_boolean(right)?);
                Ok(match op {
                    BinaryOp::And => sql::ast::Expression::And { left, right },
                    _ => sql::ast::Expression::Or { left, right },
                })
            }
            Expr::Binary { op, left, right } if op.is_comparison() => {
                self.translate_comparison(*op, left, right)
            }
            Expr::Binary { op, .. } => Err(Error::UnsupportedExpression(format!(
                "arithmetic operator '{}' used as a condition in '{expr}'",
                op.symbol()
            ))),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => Ok(sql::ast::Expression::Not(Box::new(
                self.translate_boolean(operand)?,
            ))),
            Expr::Unary {
                op: UnaryOp::Convert,
                operand,
            } => self.translate_boolean(operand),
            Expr::Unary {
                op: UnaryOp::Negate,
                ..
            } => Err(Error::UnsupportedExpression(format!(
                "negation used as a condition in '{expr}'"
            ))),
            Expr::MethodCall {
                method,
                receiver,
                args,
            } => self.translate_method_call(expr, method, receiver.as_deref(), args),
            Expr::Member { .. } | Expr::Constant(_) => self.translate_operand(expr),
        }
    }

    fn translate_comparison(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<sql::ast::Expression, Error> {
        let (left, left_fell_back) = self.translate_tracked(left)?;
        let (right, right_fell_back) = self.translate_tracked(right)?;

        // `= NULL` never matches. A NULL standing in for a failed evaluation is compared as is,
        // so the condition matches nothing instead of every row.
        let null_test = match op {
            BinaryOp::Equal => Some(sql::ast::UnaryOperator::IsNull),
            BinaryOp::NotEqual => Some(sql::ast::UnaryOperator::IsNotNull),
            _ => None,
        };
        if let Some(operator) = null_test {
            let is_null = |side: &sql::ast::Expression| {
                matches!(side, sql::ast::Expression::Value(Value::Null))
            };
            if is_null(&right) && !right_fell_back {
                return Ok(sql::ast::Expression::UnaryOperation {
                    expression: Box::new(left),
                    operator,
                });
            }
            if is_null(&left) && !left_fell_back {
                return Ok(sql::ast::Expression::UnaryOperation {
                    expression: Box::new(right),
                    operator,
                });
            }
        }

        Ok(sql::ast::Expression::BinaryOperation {
            left: Box::new(left),
            operator: translate_comparison_operator(op),
            right: Box::new(right),
        })
    }

    /// Translate an operand, noting whether any of its values fell back to NULL.
    fn translate_tracked(&self, expr: &Expr) -> Result<(sql::ast::Expression, bool), Error> {
        let before = self.fallbacks.get();
        let expression = self.translate_operand(expr)?;
        Ok((expression, self.fallbacks.get() != before))
    }

    /// Translate a node in value position: a comparison operand or a method argument.
    fn translate_operand(&self, expr: &Expr) -> Result<sql::ast::Expression, Error> {
        match expr {
            Expr::Member {
                root: MemberRoot::Parameter,
                path,
            } => match path.as_slice() {
                [name] => Ok(sql::helpers::make_column(name.clone())),
                _ => Err(Error::UnsupportedExpression(format!(
                    "nested member access '{expr}'"
                ))),
            },
            Expr::Member {
                root: MemberRoot::Captured(_),
                ..
            } => self.evaluate_to_value(expr),
            Expr::Constant(value) => bind(expr, value.clone()),
            Expr::Binary { op, .. } if op.is_arithmetic() => self.translate_arithmetic(expr),
            Expr::Unary {
                op: UnaryOp::Negate,
                ..
            } => self.translate_arithmetic(expr),
            Expr::Unary {
                op: UnaryOp::Convert,
                operand,
            } => self.translate_operand(operand),
            Expr::Binary { .. } | Expr::Unary { .. } | Expr::MethodCall { .. } => {
                self.translate_boolean(expr)
            }
        }
    }

    /// Arithmetic over closed values is computed host-side and bound as one parameter.
    fn translate_arithmetic(&self, expr: &Expr) -> Result<sql::ast::Expression, Error> {
        if expr.references_parameter() {
            return Err(Error::UnsupportedExpression(format!(
                "arithmetic over columns in '{expr}'"
            )));
        }
        match evaluate(expr) {
            Ok(value) => bind(expr, value),
            Err(source) => match self.options.evaluation_failure {
                EvaluationFailure::Fail => Err(Error::Evaluation {
                    expression: expr.to_string(),
                    source,
                }),
                EvaluationFailure::Fallback => {
                    tracing::warn!(
                        expression = %expr,
                        error = %source,
                        "evaluation failed, and arithmetic has no SQL rendering"
                    );
                    Err(Error::UnsupportedExpression(format!(
                        "arithmetic in '{expr}'"
                    )))
                }
            },
        }
    }

    fn evaluate_to_value(&self, expr: &Expr) -> Result<sql::ast::Expression, Error> {
        bind(expr, self.evaluate_closed(expr)?)
    }

    /// Evaluate a captured or constant node. With the fallback policy a failure yields NULL.
    fn evaluate_closed(&self, expr: &Expr) -> Result<Value, Error> {
        match evaluate(expr) {
            Ok(value) => Ok(value),
            Err(source) => match self.options.evaluation_failure {
                EvaluationFailure::Fail => Err(Error::Evaluation {
                    expression: expr.to_string(),
                    source,
                }),
                EvaluationFailure::Fallback => {
                    tracing::warn!(
                        expression = %expr,
                        error = %source,
                        "evaluation failed, binding NULL"
                    );
                    self.fallbacks.set(self.fallbacks.get() + 1);
                    Ok(Value::Null)
                }
            },
        }
    }

    fn translate_method_call(
        &self,
        expr: &Expr,
        method: &Method,
        receiver: Option<&Expr>,
        args: &[Expr],
    ) -> Result<sql::ast::Expression, Error> {
        match (method, receiver, args) {
            // a closed receiver is either a collection or a string
            (Method::Contains, Some(receiver), [argument]) if is_closed_value(receiver) => {
                match self.evaluate_closed(receiver)? {
                    Value::List(items) => self.translate_membership_of(argument, receiver, items),
                    value => Ok(like(
                        bind(receiver, value)?,
                        vec![wildcard(), self.translate_operand(argument)?, wildcard()],
                    )),
                }
            }
            (Method::Contains, Some(receiver), [pattern]) => Ok(like(
                self.translate_operand(receiver)?,
                vec![wildcard(), self.translate_operand(pattern)?, wildcard()],
            )),
            (Method::Contains, None, [collection, value, ..]) => {
                self.translate_membership(value, collection)
            }
            (Method::CollectionContains, Some(collection), [value]) => {
                self.translate_membership(value, collection)
            }
            (Method::StartsWith, Some(receiver), [prefix]) => Ok(like(
                self.translate_operand(receiver)?,
                vec![self.translate_operand(prefix)?, wildcard()],
            )),
            (Method::EndsWith, Some(receiver), [suffix]) => Ok(like(
                self.translate_operand(receiver)?,
                vec![wildcard(), self.translate_operand(suffix)?],
            )),
            (Method::Other(name), _, _) => Err(Error::UnsupportedExpression(format!(
                "method '{name}' in '{expr}'"
            ))),
            (method, _, _) => Err(Error::UnsupportedExpression(format!(
                "'{}' called with {} argument(s) in '{expr}'",
                method.name(),
                args.len()
            ))),
        }
    }

    /// `value IN (@p0, @p1, ...)`, one parameter per element of the collection.
    fn translate_membership(
        &self,
        value: &Expr,
        collection: &Expr,
    ) -> Result<sql::ast::Expression, Error> {
        if collection.references_parameter() {
            return Err(Error::UnsupportedExpression(format!(
                "membership in a column '{collection}'"
            )));
        }
        let items = match self.evaluate_closed(collection)? {
            Value::List(items) => items,
            Value::Null => vec![],
            _ => {
                return Err(Error::UnsupportedExpression(format!(
                    "membership in '{collection}', which is not a collection"
                )))
            }
        };
        self.translate_membership_of(value, collection, items)
    }

    fn translate_membership_of(
        &self,
        value: &Expr,
        collection: &Expr,
        items: Vec<Value>,
    ) -> Result<sql::ast::Expression, Error> {
        let left = self.translate_operand(value)?;
        if items.is_empty() {
            return Ok(sql::ast::Expression::AlwaysFalse);
        }
        Ok(sql::ast::Expression::BinaryArrayOperation {
            left: Box::new(left),
            operator: sql::ast::BinaryArrayOperator::In,
            right: items
                .into_iter()
                .map(|item| bind(collection, item))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

/// Bind a value as a parameter. Collections only make sense inside a membership test.
fn bind(expr: &Expr, value: Value) -> Result<sql::ast::Expression, Error> {
    match value {
        Value::List(_) => Err(Error::UnsupportedExpression(format!(
            "collection '{expr}' outside of a membership test"
        ))),
        value => Ok(sql::ast::Expression::Value(value)),
    }
}

/// A captured value or a constant, possibly behind conversions.
fn is_closed_value(expr: &Expr) -> bool {
    match expr {
        Expr::Member {
            root: MemberRoot::Captured(_),
            ..
        }
        | Expr::Constant(_) => true,
        Expr::Unary {
            op: UnaryOp::Convert,
            operand,
        } => is_closed_value(operand),
        _ => false,
    }
}

/// `left LIKE <concatenation of parts>`
fn like(left: sql::ast::Expression, parts: Vec<sql::ast::Expression>) -> sql::ast::Expression {
    sql::ast::Expression::BinaryOperation {
        left: Box::new(left),
        operator: sql::ast::BinaryOperator::Like,
        right: Box::new(sql::ast::Expression::FunctionCall {
            function: sql::ast::Function::Concat,
            args: parts,
        }),
    }
}

fn wildcard() -> sql::ast::Expression {
    sql::ast::Expression::Wildcard
}

fn translate_comparison_operator(op: BinaryOp) -> sql::ast::BinaryOperator {
    match op {
        BinaryOp::NotEqual => sql::ast::BinaryOperator::NotEquals,
        BinaryOp::GreaterThan => sql::ast::BinaryOperator::GreaterThan,
        BinaryOp::GreaterThanOrEqual => sql::ast::BinaryOperator::GreaterThanOrEqualTo,
        BinaryOp::LessThan => sql::ast::BinaryOperator::LessThan,
        BinaryOp::LessThanOrEqual => sql::ast::BinaryOperator::LessThanOrEqualTo,
        _ => sql::ast::BinaryOperator::Equals,
    }
}
