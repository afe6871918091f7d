//! Compose predicates, orderings and paging into SELECT and COUNT statements.

use query_engine_sql::sql;
use query_engine_sql::sql::string::{ParamCounter, Params, PLACEHOLDER_PREFIX};
use query_engine_sql::sql::Dialect;

use super::filtering::translate_expression;
use super::sorting::translate_order_by_element;
use crate::translation::error::Error;
use crate::translation::expression::Expr;
use crate::translation::options::TranslationOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

/// A condition, already rendered so its parameter names are fixed.
#[derive(Debug, Clone)]
struct Condition {
    connective: Connective,
    fragment: sql::ast::RawSql,
}

/// Builds one SELECT or COUNT statement over a single table.
///
/// Conditions are joined textually in call order: `where_(a).and(b).or(c)` renders
/// `a AND b OR c`. Group explicitly inside a single expression when precedence matters.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: sql::ast::TableName,
    dialect: Dialect,
    options: TranslationOptions,
    conditions: Vec<Condition>,
    order_by: Vec<sql::ast::OrderByElement>,
    limit: sql::ast::Limit,
    param_index: ParamCounter,
}

impl QueryBuilder {
    pub fn new(table: impl Into<String>, dialect: Dialect) -> Self {
        Self::with_options(table, dialect, TranslationOptions::default())
    }

    pub fn with_options(
        table: impl Into<String>,
        dialect: Dialect,
        options: TranslationOptions,
    ) -> Self {
        QueryBuilder {
            table: sql::helpers::make_table_name(table),
            dialect,
            options,
            conditions: vec![],
            order_by: vec![],
            limit: sql::helpers::empty_limit(),
            param_index: ParamCounter::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Add a condition. After the first one this is the same as [`QueryBuilder::and`].
    pub fn where_(&mut self, predicate: &Expr) -> Result<&mut Self, Error> {
        self.push_predicate(Connective::And, predicate)
    }

    pub fn and(&mut self, predicate: &Expr) -> Result<&mut Self, Error> {
        self.push_predicate(Connective::And, predicate)
    }

    /// Join a condition to the preceding one with OR.
    pub fn or(&mut self, predicate: &Expr) -> Result<&mut Self, Error> {
        self.push_predicate(Connective::Or, predicate)
    }

    /// Add a condition written in SQL, with `@name` placeholders bound from `params`.
    pub fn where_raw(&mut self, text: &str, params: Params) -> Result<&mut Self, Error> {
        self.push_raw(Connective::And, text, params)
    }

    pub fn and_raw(&mut self, text: &str, params: Params) -> Result<&mut Self, Error> {
        self.push_raw(Connective::And, text, params)
    }

    pub fn or_raw(&mut self, text: &str, params: Params) -> Result<&mut Self, Error> {
        self.push_raw(Connective::Or, text, params)
    }

    pub fn order_by(&mut self, target: &Expr) -> Result<&mut Self, Error> {
        self.order_by.push(translate_order_by_element(
            target,
            sql::ast::OrderByDirection::Asc,
        )?);
        Ok(self)
    }

    pub fn order_by_descending(&mut self, target: &Expr) -> Result<&mut Self, Error> {
        self.order_by.push(translate_order_by_element(
            target,
            sql::ast::OrderByDirection::Desc,
        )?);
        Ok(self)
    }

    /// Set LIMIT and OFFSET, replacing any earlier call.
    pub fn limit(&mut self, count: u64, offset: Option<u64>) -> &mut Self {
        self.limit = sql::ast::Limit {
            limit: Some(count),
            offset,
        };
        self
    }

    /// `SELECT * FROM table [WHERE ...] [ORDER BY ...] [LIMIT ...]`
    pub fn to_select_statement(&self) -> sql::string::SQL {
        let select = sql::ast::Select {
            select_list: sql::ast::SelectList::SelectStar,
            from: self.table.clone(),
            where_: self.where_clause(),
            order_by: sql::ast::OrderBy {
                elements: self.order_by.clone(),
            },
            limit: self.limit.clone(),
        };
        self.render(&select)
    }

    /// `SELECT COUNT(*) FROM table [WHERE ...]`. Ordering and paging do not affect a count.
    pub fn to_count_statement(&self) -> sql::string::SQL {
        let mut select = sql::helpers::count_select(self.table.clone());
        select.where_ = self.where_clause();
        self.render(&select)
    }

    fn render(&self, select: &sql::ast::Select) -> sql::string::SQL {
        let mut sql = sql::string::SQL::continuing(self.dialect, self.param_index);
        select.to_sql(&mut sql);
        tracing::debug!(generated_sql = %sql.sql, params = ?sql.params, "built statement");
        sql
    }

    fn where_clause(&self) -> sql::ast::Where {
        let mut conditions = self.conditions.iter();
        let Some(first) = conditions.next() else {
            return sql::helpers::empty_where();
        };
        let expression = conditions.fold(
            sql::ast::Expression::RawSql(first.fragment.clone()),
            |acc, condition| {
                let right = sql::ast::Expression::RawSql(condition.fragment.clone());
                match condition.connective {
                    Connective::And => sql::helpers::and(acc, right),
                    Connective::Or => sql::helpers::or(acc, right),
                }
            },
        );
        sql::ast::Where(Some(expression))
    }

    fn push_predicate(
        &mut self,
        connective: Connective,
        predicate: &Expr,
    ) -> Result<&mut Self, Error> {
        let expression = translate_expression(predicate, &self.options)?;
        let mut fragment = sql::string::SQL::continuing(self.dialect, self.param_index);
        expression.to_sql(&mut fragment);
        self.param_index = fragment.param_index;
        self.conditions.push(Condition {
            connective,
            fragment: sql::ast::RawSql {
                text: fragment.sql,
                params: fragment.params,
            },
        });
        Ok(self)
    }

    fn push_raw(
        &mut self,
        connective: Connective,
        text: &str,
        params: Params,
    ) -> Result<&mut Self, Error> {
        let mut validated = Params::new();
        for (name, value) in params {
            let name = name
                .strip_prefix(PLACEHOLDER_PREFIX)
                .map(str::to_string)
                .unwrap_or(name);
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(Error::InvalidParameterName(name));
            }
            // generated names could be handed out to a later fragment
            if ParamCounter::is_generated_name(&name)
                || validated.contains_key(&name)
                || self.is_bound(&name)
            {
                return Err(Error::DuplicateParameter(name));
            }
            validated.insert(name, value);
        }
        self.conditions.push(Condition {
            connective,
            fragment: sql::ast::RawSql {
                text: text.to_string(),
                params: validated,
            },
        });
        Ok(self)
    }

    fn is_bound(&self, name: &str) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.fragment.params.contains_key(name))
    }
}
