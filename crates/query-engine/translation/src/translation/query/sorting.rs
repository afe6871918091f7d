//! Translate ordering expressions.

use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::expression::{Expr, MemberRoot, UnaryOp};

/// Resolve the column an ordering expression refers to, looking through conversions.
pub fn translate_order_by_target(expr: &Expr) -> Result<sql::ast::ColumnName, Error> {
    match expr {
        Expr::Unary {
            op: UnaryOp::Convert,
            operand,
        } => translate_order_by_target(operand),
        Expr::Member {
            root: MemberRoot::Parameter,
            path,
        } => match path.as_slice() {
            [name] => Ok(sql::helpers::make_column_name(name.clone())),
            _ => Err(Error::UnsupportedExpression(format!(
                "ordering by nested member '{expr}'"
            ))),
        },
        _ => Err(Error::UnsupportedExpression(format!(
            "ordering by '{expr}', which is not a column"
        ))),
    }
}

pub fn translate_order_by_element(
    expr: &Expr,
    direction: sql::ast::OrderByDirection,
) -> Result<sql::ast::OrderByElement, Error> {
    Ok(sql::ast::OrderByElement {
        target: translate_order_by_target(expr)?,
        direction,
    })
}
