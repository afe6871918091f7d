//! Type definitions of a SQL AST representation.

use super::string::Params;
use super::value::Value;

/// A SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub select_list: SelectList,
    pub from: TableName,
    pub where_: Where,
    pub order_by: OrderBy,
    pub limit: Limit,
}

/// An INSERT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: TableName,
    pub columns: Vec<ColumnName>,
    /// One entry per inserted row.
    pub values: Vec<Vec<Value>>,
    /// Follow the insert with a query for the generated identity.
    pub returning_identity: bool,
}

/// A DELETE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub from: TableName,
    pub where_: Where,
}

/// An UPDATE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: TableName,
    pub set: SetList,
    pub where_: Where,
}

/// The assignments of a SET clause, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SetList(pub Vec<(ColumnName, Value)>);

/// A CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table: TableName,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<ColumnName>,
}

/// A column inside a CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: ColumnName,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub auto_increment: bool,
}

/// A CREATE INDEX statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    pub name: IndexName,
    pub table: TableName,
    pub columns: Vec<ColumnName>,
    pub unique: bool,
}

/// Column types understood by the DDL generator. Rendered per dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    Integer,
    BigInt,
    Double,
    Text { max_length: Option<u32> },
    Uuid,
    Date,
    DateTime,
    Blob,
}

/// A select list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectList {
    SelectStar,
    Count(CountType),
}

/// A WHERE clause. `None` means no filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct Where(pub Option<Expression>);

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub elements: Vec<OrderByElement>,
}

/// A single element in an ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByElement {
    pub target: ColumnName,
    pub direction: OrderByDirection,
}

/// A direction for a single ORDER BY element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    Asc,
    Desc,
}

/// LIMIT and OFFSET clauses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// A scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// AND clause
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// OR clause
    Or {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// NOT clause
    Not(Box<Expression>),
    /// A binary operation on two scalar expression
    BinaryOperation {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// A membership test against a list of scalar expressions
    BinaryArrayOperation {
        left: Box<Expression>,
        operator: BinaryArrayOperator,
        right: Vec<Expression>,
    },
    /// An unary operation on a scalar expression
    UnaryOperation {
        expression: Box<Expression>,
        operator: UnaryOperator,
    },
    /// A scalar function call
    FunctionCall {
        function: Function,
        args: Vec<Expression>,
    },
    /// A column reference
    ColumnReference(ColumnName),
    /// A value, always rendered as a parameter
    Value(Value),
    /// The `'%'` wildcard of a LIKE pattern
    Wildcard,
    /// A condition which never holds, used for membership in an empty list
    AlwaysFalse,
    /// A COUNT clause
    Count(CountType),
    /// SQL text which was already rendered, or supplied by the caller
    RawSql(RawSql),
}

/// Rendered SQL text with the parameters it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSql {
    pub text: String,
    pub params: Params,
}

/// An unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    IsNull,
    IsNotNull,
}

/// A binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    Like,
}

/// A binary operator when the rhs is an array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryArrayOperator {
    In,
}

/// A scalar function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// String concatenation, rendered per dialect
    Concat,
}

/// COUNT clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountType {
    Star,
    Simple(ColumnName),
}

/// A database table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(pub String);

/// A database table's column name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(pub String);

/// A database index name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexName(pub String);
