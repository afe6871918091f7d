//! Convert a SQL AST to a low-level SQL string.

use super::ast::*;
use super::dialect::Dialect;
use super::string::{ParamKind, DDL, SQL};

// Convert to SQL strings

impl Select {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("SELECT ");

        self.select_list.to_sql(sql);

        sql.append_syntax(" FROM ");
        self.from.to_sql(sql);

        self.where_.to_sql(sql);

        self.order_by.to_sql(sql);

        self.limit.to_sql(sql);
    }
}

impl SelectList {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            SelectList::SelectStar => sql.append_syntax("*"),
            SelectList::Count(count_type) => {
                sql.append_syntax("COUNT(");
                count_type.to_sql(sql);
                sql.append_syntax(")");
            }
        }
    }
}

impl Insert {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("INSERT INTO ");
        self.table.to_sql(sql);

        if self.columns.is_empty() {
            let clause = sql.dialect.default_values_clause();
            sql.append_syntax(clause);
        } else {
            sql.append_syntax(" (");
            for (index, column) in self.columns.iter().enumerate() {
                column.to_sql(sql);
                if index < (self.columns.len() - 1) {
                    sql.append_syntax(", ");
                }
            }
            sql.append_syntax(") VALUES ");

            for (row_index, row) in self.values.iter().enumerate() {
                sql.append_syntax("(");
                for (index, value) in row.iter().enumerate() {
                    sql.append_param(ParamKind::Predicate, value.clone());
                    if index < (row.len() - 1) {
                        sql.append_syntax(", ");
                    }
                }
                sql.append_syntax(")");
                if row_index < (self.values.len() - 1) {
                    sql.append_syntax(", ");
                }
            }
        }

        if self.returning_identity {
            sql.append_syntax("; ");
            let query = sql.dialect.last_insert_id_query();
            sql.append_syntax(query);
        }
    }
}

impl Update {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("UPDATE ");
        self.table.to_sql(sql);
        sql.append_syntax(" SET ");
        self.set.to_sql(sql);
        self.where_.to_sql(sql);
    }
}

impl SetList {
    pub fn to_sql(&self, sql: &mut SQL) {
        let SetList(assignments) = self;
        for (index, (column, value)) in assignments.iter().enumerate() {
            column.to_sql(sql);
            sql.append_syntax(" = ");
            sql.append_param(ParamKind::Assignment, value.clone());
            if index < (assignments.len() - 1) {
                sql.append_syntax(", ");
            }
        }
    }
}

impl Delete {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("DELETE FROM ");
        self.from.to_sql(sql);
        self.where_.to_sql(sql);
    }
}

impl Where {
    pub fn to_sql(&self, sql: &mut SQL) {
        if let Where(Some(expression)) = self {
            sql.append_syntax(" WHERE ");
            expression.to_sql(sql);
        }
    }
}

// scalars
impl Expression {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Expression::ColumnReference(column_name) => column_name.to_sql(sql),
            Expression::Value(value) => sql.append_param(ParamKind::Predicate, value.clone()),
            Expression::Wildcard => sql.append_syntax("'%'"),
            Expression::AlwaysFalse => sql.append_syntax("1 = 0"),
            Expression::And { left, right } => {
                left.to_sql(sql);
                sql.append_syntax(" AND ");
                right.to_sql(sql);
            }
            Expression::Or { left, right } => {
                left.to_sql(sql);
                sql.append_syntax(" OR ");
                right.to_sql(sql);
            }
            Expression::Not(expr) => {
                sql.append_syntax("NOT (");
                expr.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::BinaryOperation {
                left,
                operator,
                right,
            } => {
                left.to_sql(sql);
                operator.to_sql(sql);
                right.to_sql(sql);
            }
            Expression::BinaryArrayOperation {
                left,
                operator,
                right,
            } => {
                left.to_sql(sql);
                operator.to_sql(sql);
                sql.append_syntax("(");
                for (index, item) in right.iter().enumerate() {
                    item.to_sql(sql);
                    if index < (right.len() - 1) {
                        sql.append_syntax(", ");
                    }
                }
                sql.append_syntax(")");
            }
            Expression::UnaryOperation {
                expression,
                operator,
            } => {
                expression.to_sql(sql);
                operator.to_sql(sql);
            }
            Expression::FunctionCall { function, args } => function.to_sql(sql, args),
            Expression::Count(count_type) => {
                sql.append_syntax("COUNT(");
                count_type.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::RawSql(RawSql { text, params }) => sql.append_fragment(text, params),
        }
    }
}

impl UnaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            UnaryOperator::IsNull => sql.append_syntax(" IS NULL"),
            UnaryOperator::IsNotNull => sql.append_syntax(" IS NOT NULL"),
        }
    }
}

impl BinaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            BinaryOperator::Equals => sql.append_syntax(" = "),
            BinaryOperator::NotEquals => sql.append_syntax(" <> "),
            BinaryOperator::GreaterThan => sql.append_syntax(" > "),
            BinaryOperator::GreaterThanOrEqualTo => sql.append_syntax(" >= "),
            BinaryOperator::LessThan => sql.append_syntax(" < "),
            BinaryOperator::LessThanOrEqualTo => sql.append_syntax(" <= "),
            BinaryOperator::Like => sql.append_syntax(" LIKE "),
        }
    }
}

impl BinaryArrayOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            BinaryArrayOperator::In => sql.append_syntax(" IN "),
        }
    }
}

impl Function {
    pub fn to_sql(&self, sql: &mut SQL, args: &[Expression]) {
        match self {
            Function::Concat => match sql.dialect {
                Dialect::ClientServer => {
                    sql.append_syntax("CONCAT(");
                    for (index, arg) in args.iter().enumerate() {
                        arg.to_sql(sql);
                        if index < (args.len() - 1) {
                            sql.append_syntax(", ");
                        }
                    }
                    sql.append_syntax(")");
                }
                Dialect::Embedded => {
                    for (index, arg) in args.iter().enumerate() {
                        arg.to_sql(sql);
                        if index < (args.len() - 1) {
                            sql.append_syntax(" || ");
                        }
                    }
                }
            },
        }
    }
}

impl CountType {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            CountType::Star => sql.append_syntax("*"),
            CountType::Simple(column) => column.to_sql(sql),
        }
    }
}

impl Limit {
    pub fn to_sql(&self, sql: &mut SQL) {
        match (self.limit, self.offset) {
            (None, None) => (),
            (Some(limit), offset) => {
                sql.append_syntax(" LIMIT ");
                sql.append_syntax(&limit.to_string());
                if let Some(offset) = offset {
                    sql.append_syntax(" OFFSET ");
                    sql.append_syntax(&offset.to_string());
                }
            }
            (None, Some(offset)) => {
                sql.append_syntax(" LIMIT ");
                let unbounded = sql.dialect.unbounded_limit();
                sql.append_syntax(unbounded);
                sql.append_syntax(" OFFSET ");
                sql.append_syntax(&offset.to_string());
            }
        }
    }
}

impl OrderBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" ORDER BY ");
            for (index, order_by_item) in self.elements.iter().enumerate() {
                order_by_item.to_sql(sql);
                if index < (self.elements.len() - 1) {
                    sql.append_syntax(", ");
                }
            }
        }
    }
}

impl OrderByElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.target.to_sql(sql);
        self.direction.to_sql(sql);
    }
}

impl OrderByDirection {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            OrderByDirection::Asc => sql.append_syntax(" ASC"),
            OrderByDirection::Desc => sql.append_syntax(" DESC"),
        }
    }
}

// DDL

impl CreateTable {
    pub fn to_sql(&self, sql: &mut SQL) {
        // the embedded backend only auto-increments an inline INTEGER PRIMARY KEY.
        let inline_key = sql.dialect == Dialect::Embedded
            && self.primary_key.len() == 1
            && self
                .columns
                .iter()
                .any(|column| column.auto_increment && column.name == self.primary_key[0]);

        sql.append_syntax("CREATE TABLE ");
        self.table.to_sql(sql);
        sql.append_syntax(" (");
        for (index, column) in self.columns.iter().enumerate() {
            column.to_sql(sql, inline_key);
            if index < (self.columns.len() - 1) {
                sql.append_syntax(", ");
            }
        }
        if !inline_key && !self.primary_key.is_empty() {
            sql.append_syntax(", PRIMARY KEY (");
            for (index, column) in self.primary_key.iter().enumerate() {
                column.to_sql(sql);
                if index < (self.primary_key.len() - 1) {
                    sql.append_syntax(", ");
                }
            }
            sql.append_syntax(")");
        }
        sql.append_syntax(")");
    }
}

impl ColumnDefinition {
    pub fn to_sql(&self, sql: &mut SQL, inline_key: bool) {
        self.name.to_sql(sql);
        sql.append_syntax(" ");
        if inline_key && self.auto_increment {
            sql.append_syntax("INTEGER PRIMARY KEY ");
            let keyword = sql.dialect.auto_increment_keyword();
            sql.append_syntax(keyword);
            return;
        }
        let type_name = sql.dialect.type_name(&self.column_type);
        sql.append_syntax(&type_name);
        if !self.nullable {
            sql.append_syntax(" NOT NULL");
        }
        if self.auto_increment {
            sql.append_syntax(" ");
            let keyword = sql.dialect.auto_increment_keyword();
            sql.append_syntax(keyword);
        }
    }
}

impl CreateIndex {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("CREATE ");
        if self.unique {
            sql.append_syntax("UNIQUE ");
        }
        sql.append_syntax("INDEX ");
        if sql.dialect.supports_if_not_exists_index() {
            sql.append_syntax("IF NOT EXISTS ");
        }
        self.name.to_sql(sql);
        sql.append_syntax(" ON ");
        self.table.to_sql(sql);
        sql.append_syntax(" (");
        for (index, column) in self.columns.iter().enumerate() {
            column.to_sql(sql);
            if index < (self.columns.len() - 1) {
                sql.append_syntax(", ");
            }
        }
        sql.append_syntax(")");
    }
}

// names
impl TableName {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.0);
    }
}

impl ColumnName {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.0);
    }
}

impl IndexName {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.0);
    }
}

// statements

/// Convert a CREATE TABLE to a DDL statement.
pub fn create_table_to_ddl(create_table: &CreateTable, dialect: Dialect) -> DDL {
    let mut sql = SQL::new(dialect);
    create_table.to_sql(&mut sql);
    DDL(sql)
}

/// Convert a CREATE INDEX to a DDL statement.
pub fn create_index_to_ddl(create_index: &CreateIndex, dialect: Dialect) -> DDL {
    let mut sql = SQL::new(dialect);
    create_index.to_sql(&mut sql);
    DDL(sql)
}
