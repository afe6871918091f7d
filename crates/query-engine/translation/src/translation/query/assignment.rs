//! Translate assignment lists into the body of a SET clause.

use query_engine_sql::sql;
use query_engine_sql::sql::{Dialect, Value};

use crate::translation::error::Error;
use crate::translation::evaluate::evaluate;
use crate::translation::expression::Expr;
use crate::translation::options::{EvaluationFailure, TranslationOptions};

/// An ordered list of `column = value` bindings.
#[derive(Debug, Clone, Default)]
pub struct Assignments(Vec<(String, Expr)>);

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.0.push((column.into(), value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Expr)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>, E: Into<Expr>> FromIterator<(S, E)> for Assignments {
    fn from_iter<I: IntoIterator<Item = (S, E)>>(iter: I) -> Self {
        Assignments(
            iter.into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }
}

/// Render `col = @set0, other = @set1`.
pub fn translate_assignments(
    assignments: &Assignments,
    dialect: Dialect,
) -> Result<sql::string::SQL, Error> {
    let set_list = translate_set_list(assignments, dialect, &TranslationOptions::default())?;
    let mut sql = sql::string::SQL::new(dialect);
    set_list.to_sql(&mut sql);
    Ok(sql)
}

/// Evaluate every assigned value host-side.
pub fn translate_set_list(
    assignments: &Assignments,
    dialect: Dialect,
    options: &TranslationOptions,
) -> Result<sql::ast::SetList, Error> {
    if assignments.is_empty() {
        return Err(Error::EmptyAssignments);
    }
    assignments
        .iter()
        .map(|(column, expr)| {
            let value = translate_assigned_value(expr, options)?;
            Ok((
                sql::helpers::make_column_name(column.clone()),
                dialect.normalize_assignment(value),
            ))
        })
        .collect::<Result<Vec<_>, Error>>()
        .map(sql::ast::SetList)
}

fn translate_assigned_value(expr: &Expr, options: &TranslationOptions) -> Result<Value, Error> {
    if expr.references_parameter() {
        return Err(Error::UnsupportedExpression(format!(
            "column reference in assigned value '{expr}'"
        )));
    }
    let value = match evaluate(expr) {
        Ok(value) => value,
        Err(source) => match options.evaluation_failure {
            EvaluationFailure::Fail => {
                return Err(Error::Evaluation {
                    expression: expr.to_string(),
                    source,
                })
            }
            EvaluationFailure::Fallback => {
                tracing::warn!(
                    expression = %expr,
                    error = %source,
                    "evaluation failed, assigning NULL"
                );
                Value::Null
            }
        },
    };
    match value {
        Value::List(_) => Err(Error::UnsupportedExpression(format!(
            "collection assigned in '{expr}'"
        ))),
        value => Ok(value),
    }
}
