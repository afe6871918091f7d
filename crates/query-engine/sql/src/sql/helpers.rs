//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;
use super::dialect::Dialect;
use super::string::{ParamKind, SQL};
use super::value::Value;

// Empty clauses //

/// An empty `WHERE` clause.
pub fn empty_where() -> Where {
    Where(None)
}

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// Empty `LIMIT` and `OFFSET` clauses.
pub fn empty_limit() -> Limit {
    Limit {
        limit: None,
        offset: None,
    }
}

// Names //

pub fn make_table_name(name: impl Into<String>) -> TableName {
    TableName(name.into())
}

pub fn make_column_name(name: impl Into<String>) -> ColumnName {
    ColumnName(name.into())
}

/// Generate a column expression.
pub fn make_column(name: impl Into<String>) -> Expression {
    Expression::ColumnReference(make_column_name(name))
}

// Expressions //

/// `left AND right`
pub fn and(left: Expression, right: Expression) -> Expression {
    Expression::And {
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// `left OR right`
pub fn or(left: Expression, right: Expression) -> Expression {
    Expression::Or {
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// `column = value`
pub fn column_equals(column: impl Into<String>, value: Value) -> Expression {
    Expression::BinaryOperation {
        left: Box::new(make_column(column)),
        operator: BinaryOperator::Equals,
        right: Box::new(Expression::Value(value)),
    }
}

/// `column IN (values...)`, or a contradiction for an empty list.
pub fn column_in(column: impl Into<String>, values: Vec<Value>) -> Expression {
    if values.is_empty() {
        Expression::AlwaysFalse
    } else {
        Expression::BinaryArrayOperation {
            left: Box::new(make_column(column)),
            operator: BinaryArrayOperator::In,
            right: values.into_iter().map(Expression::Value).collect(),
        }
    }
}

// SELECTs //

/// Build a simple `SELECT *` and the rest are empty.
pub fn star_select(from: TableName) -> Select {
    Select {
        select_list: SelectList::SelectStar,
        from,
        where_: empty_where(),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Build a simple `SELECT COUNT(*)` and the rest are empty.
pub fn count_select(from: TableName) -> Select {
    Select {
        select_list: SelectList::Count(CountType::Star),
        from,
        where_: empty_where(),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

// Catalog //

/// A query counting the tables named `table_name`.
pub fn table_exists(table_name: &str, dialect: Dialect) -> SQL {
    let mut sql = SQL::new(dialect);
    sql.append_syntax(dialect.table_exists_query());
    sql.append_param(ParamKind::Predicate, Value::Text(table_name.to_string()));
    sql
}
