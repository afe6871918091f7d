//! Build complete statements for an entity from its descriptor.

use indexmap::IndexMap;

use query_engine_metadata::metadata::{ColumnInfo, EntityDescriptor, ScalarType};
use query_engine_sql::sql;
use query_engine_sql::sql::{Dialect, Value};

use super::error::Error;
use super::expression::Expr;
use super::options::TranslationOptions;
use super::query::assignment::translate_set_list;
use super::query::filtering::translate_expression;
use super::query::Assignments;

/// The stored values of one entity, by column name.
pub type ColumnValues = IndexMap<String, Value>;

/// Translation inputs shared by every statement of one database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementContext {
    pub dialect: Dialect,
    pub options: TranslationOptions,
}

impl StatementContext {
    pub fn new(dialect: Dialect, options: TranslationOptions) -> Self {
        StatementContext { dialect, options }
    }

    fn render(&self, render: impl FnOnce(&mut sql::string::SQL)) -> sql::string::SQL {
        let mut sql = sql::string::SQL::new(self.dialect);
        render(&mut sql);
        sql
    }

    fn predicate(&self, predicate: &Expr) -> Result<sql::ast::Where, Error> {
        Ok(sql::ast::Where(Some(translate_expression(
            predicate,
            &self.options,
        )?)))
    }
}

fn table_name(descriptor: &EntityDescriptor) -> sql::ast::TableName {
    sql::helpers::make_table_name(descriptor.table_name.clone())
}

/// The key column, or `MissingKeyDescriptor`.
pub fn key_column(descriptor: &EntityDescriptor) -> Result<&ColumnInfo, Error> {
    descriptor
        .key_column()
        .ok_or_else(|| Error::MissingKeyDescriptor(descriptor.table_name.clone()))
}

fn key_equals(descriptor: &EntityDescriptor, key: Value) -> Result<sql::ast::Where, Error> {
    let key_column = key_column(descriptor)?;
    Ok(sql::ast::Where(Some(sql::helpers::column_equals(
        key_column.name.clone(),
        key,
    ))))
}

fn value_of(values: &ColumnValues, column: &ColumnInfo) -> Value {
    values.get(&column.name).cloned().unwrap_or(Value::Null)
}

// SELECTs //

pub fn select_all(context: &StatementContext, descriptor: &EntityDescriptor) -> sql::string::SQL {
    context.render(|sql| sql::helpers::star_select(table_name(descriptor)).to_sql(sql))
}

pub fn select_where(
    context: &StatementContext,
    descriptor: &EntityDescriptor,
    predicate: &Expr,
    limit: Option<u64>,
) -> Result<sql::string::SQL, Error> {
    let mut select = sql::helpers::star_select(table_name(descriptor));
    select.where_ = context.predicate(predicate)?;
    select.limit.limit = limit;
    Ok(context.render(|sql| select.to_sql(sql)))
}

pub fn select_by_key(
    context: &StatementContext,
    descriptor: &EntityDescriptor,
    key: Value,
) -> Result<sql::string::SQL, Error> {
    let mut select = sql::helpers::star_select(table_name(descriptor));
    select.where_ = key_equals(descriptor, key)?;
    Ok(context.render(|sql| select.to_sql(sql)))
}

pub fn count(
    context: &StatementContext,
    descriptor: &EntityDescriptor,
    predicate: Option<&Expr>,
) -> Result<sql::string::SQL, Error> {
    let mut select = sql::helpers::count_select(table_name(descriptor));
    if let Some(predicate) = predicate {
        select.where_ = context.predicate(predicate)?;
    }
    Ok(context.render(|sql| select.to_sql(sql)))
}

// INSERTs //

/// Insert one row per entry of `rows`, with every insertable column.
///
/// With `returning_identity` the statement is followed by a query for the generated key.
pub fn insert(
    context: &StatementContext,
    descriptor: &EntityDescriptor,
    rows: &[ColumnValues],
    returning_identity: bool,
) -> sql::string::SQL {
    let columns = descriptor.insertable_columns().collect::<Vec<_>>();
    let insert = sql::ast::Insert {
        table: table_name(descriptor),
        columns: columns
            .iter()
            .map(|column| sql::helpers::make_column_name(column.name.clone()))
            .collect(),
        values: rows
            .iter()
            .map(|row| columns.iter().map(|column| value_of(row, column)).collect())
            .collect(),
        returning_identity,
    };
    context.render(|sql| insert.to_sql(sql))
}

// UPDATEs //

/// Update every writable column of one entity, keyed on its key value.
pub fn update(
    context: &StatementContext,
    descriptor: &EntityDescriptor,
    values: &ColumnValues,
) -> Result<sql::string::SQL, Error> {
    let key_column = key_column(descriptor)?;
    let set = descriptor
        .updatable_columns()
        .map(|column| {
            (
                sql::helpers::make_column_name(column.name.clone()),
                context.dialect.normalize_assignment(value_of(values, column)),
            )
        })
        .collect::<Vec<_>>();
    if set.is_empty() {
        return Err(Error::EmptyAssignments);
    }
    let update = sql::ast::Update {
        table: table_name(descriptor),
        set: sql::ast::SetList(set),
        where_: key_equals(descriptor, value_of(values, key_column))?,
    };
    Ok(context.render(|sql| update.to_sql(sql)))
}

/// Update the assigned columns of every row matching the predicate.
pub fn update_where(
    context: &StatementContext,
    descriptor: &EntityDescriptor,
    assignments: &Assignments,
    predicate: &Expr,
) -> Result<sql::string::SQL, Error> {
    let update = sql::ast::Update {
        table: table_name(descriptor),
        set: translate_set_list(assignments, context.dialect, &context.options)?,
        where_: context.predicate(predicate)?,
    };
    Ok(context.render(|sql| update.to_sql(sql)))
}

// DELETEs //

pub fn delete_by_key(
    context: &StatementContext,
    descriptor: &EntityDescriptor,
    key: Value,
) -> Result<sql::string::SQL, Error> {
    let delete = sql::ast::Delete {
        from: table_name(descriptor),
        where_: key_equals(descriptor, key)?,
    };
    Ok(context.render(|sql| delete.to_sql(sql)))
}

/// Delete every row whose key is one of `keys`.
pub fn delete_by_keys(
    context: &StatementContext,
    descriptor: &EntityDescriptor,
    keys: Vec<Value>,
) -> Result<sql::string::SQL, Error> {
    let key_column = key_column(descriptor)?;
    let delete = sql::ast::Delete {
        from: table_name(descriptor),
        where_: sql::ast::Where(Some(sql::helpers::column_in(
            key_column.name.clone(),
            keys,
        ))),
    };
    Ok(context.render(|sql| delete.to_sql(sql)))
}

pub fn delete_where(
    context: &StatementContext,
    descriptor: &EntityDescriptor,
    predicate: &Expr,
) -> Result<sql::string::SQL, Error> {
    let delete = sql::ast::Delete {
        from: table_name(descriptor),
        where_: context.predicate(predicate)?,
    };
    Ok(context.render(|sql| delete.to_sql(sql)))
}

// DDL //

fn column_type(column: &ColumnInfo) -> sql::ast::ColumnType {
    match column.scalar_type {
        ScalarType::Boolean => sql::ast::ColumnType::Boolean,
        ScalarType::Integer => sql::ast::ColumnType::Integer,
        ScalarType::Bigint => sql::ast::ColumnType::BigInt,
        ScalarType::Double => sql::ast::ColumnType::Double,
        ScalarType::Text => sql::ast::ColumnType::Text {
            max_length: column.max_length,
        },
        ScalarType::Uuid => sql::ast::ColumnType::Uuid,
        ScalarType::Date => sql::ast::ColumnType::Date,
        ScalarType::DateTime => sql::ast::ColumnType::DateTime,
        ScalarType::Bytes => sql::ast::ColumnType::Blob,
    }
}

/// `CREATE TABLE` with every mapped column.
pub fn create_table(descriptor: &EntityDescriptor, dialect: Dialect) -> sql::string::DDL {
    let create_table = sql::ast::CreateTable {
        table: table_name(descriptor),
        columns: descriptor
            .mapped_columns()
            .map(|column| sql::ast::ColumnDefinition {
                name: sql::helpers::make_column_name(column.name.clone()),
                column_type: column_type(column),
                nullable: column.nullable && !column.is_key,
                auto_increment: column.is_auto_increment,
            })
            .collect(),
        primary_key: descriptor
            .mapped_columns()
            .filter(|column| column.is_key)
            .map(|column| sql::helpers::make_column_name(column.name.clone()))
            .collect(),
    };
    sql::convert::create_table_to_ddl(&create_table, dialect)
}

/// One `CREATE INDEX` per declared index.
pub fn create_indexes(descriptor: &EntityDescriptor, dialect: Dialect) -> Vec<sql::string::DDL> {
    descriptor
        .indexes
        .iter()
        .map(|index| {
            let create_index = sql::ast::CreateIndex {
                name: sql::ast::IndexName(index.name.clone()),
                table: table_name(descriptor),
                columns: index
                    .columns
                    .iter()
                    .map(|column| sql::helpers::make_column_name(column.clone()))
                    .collect(),
                unique: index.unique,
            };
            sql::convert::create_index_to_ddl(&create_index, dialect)
        })
        .collect()
}

pub fn table_exists(descriptor: &EntityDescriptor, dialect: Dialect) -> sql::string::SQL {
    sql::helpers::table_exists(&descriptor.table_name, dialect)
}
