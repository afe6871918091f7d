//! Rewrite named `@name` placeholders into the positional `?` form both backends accept.
//!
//! Quoted text is copied verbatim: string literals (`'...'`), quoted identifiers (`"..."`,
//! `` `...` `` and `[...]`) never contain placeholders or statement separators.

use query_engine_sql::sql::string::{Params, PLACEHOLDER_PREFIX};
use query_engine_sql::sql::Value;

use crate::error::Error;

/// One statement with positional placeholders and the values for them, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalStatement {
    pub sql: String,
    pub values: Vec<Value>,
}

fn closing_quote(c: char) -> Option<char> {
    match c {
        '\'' => Some('\''),
        '"' => Some('"'),
        '`' => Some('`'),
        '[' => Some(']'),
        _ => None,
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split a script on the `;` separators outside quoted text.
///
/// Statements are trimmed and empty ones dropped.
pub fn split_statements(script: &str) -> Vec<&str> {
    let mut statements = vec![];
    let mut closing = None;
    let mut start = 0;
    for (index, c) in script.char_indices() {
        match closing {
            Some(close) => {
                if c == close {
                    closing = None;
                }
            }
            None if c == ';' => {
                statements.push(&script[start..index]);
                start = index + 1;
            }
            None => closing = closing_quote(c),
        }
    }
    statements.push(&script[start..]);
    statements
        .into_iter()
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .collect()
}

/// Replace every named placeholder with `?`, collecting values in occurrence order.
///
/// A name used twice is bound twice. A `@` not followed by a name is left alone.
pub fn to_positional(statement: &str, params: &Params) -> Result<PositionalStatement, Error> {
    let mut sql = String::with_capacity(statement.len());
    let mut values = vec![];
    let mut closing = None;
    let mut chars = statement.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(close) = closing {
            sql.push(c);
            if c == close {
                closing = None;
            }
            continue;
        }

        if c != PLACEHOLDER_PREFIX {
            closing = closing_quote(c);
            sql.push(c);
            continue;
        }

        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if !is_name_char(next) {
                break;
            }
            name.push(next);
            chars.next();
        }
        if name.is_empty() {
            sql.push(c);
            continue;
        }

        let value = params
            .get(&name)
            .ok_or_else(|| Error::UnknownParameter(name.clone()))?;
        if let Value::List(_) = value {
            return Err(Error::UnbindableParameter {
                name: format!("{PLACEHOLDER_PREFIX}{name}"),
                kind: value.kind(),
            });
        }
        sql.push('?');
        values.push(value.clone());
    }

    Ok(PositionalStatement { sql, values })
}

/// Split a script and rewrite each statement in it.
pub fn prepare_script(script: &str, params: &Params) -> Result<Vec<PositionalStatement>, Error> {
    split_statements(script)
        .into_iter()
        .map(|statement| to_positional(statement, params))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn params(pairs: &[(&str, Value)]) -> Params {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn placeholders_follow_occurrence_order() {
        let params = params(&[("set0", Value::Int(5)), ("p0", Value::from("ann"))]);
        let statement = to_positional("UPDATE users SET Age = @set0 WHERE Name = @p0", &params)
            .unwrap();
        assert_eq!(statement.sql, "UPDATE users SET Age = ? WHERE Name = ?");
        assert_eq!(statement.values, vec![Value::Int(5), Value::from("ann")]);
    }

    #[test]
    fn repeated_names_are_bound_each_time() {
        let params = params(&[("min", Value::Int(1))]);
        let statement = to_positional("a > @min OR b > @min", &params).unwrap();
        assert_eq!(statement.sql, "a > ? OR b > ?");
        assert_eq!(statement.values, vec![Value::Int(1), Value::Int(1)]);
    }

    #[test]
    fn quoted_text_is_left_alone() {
        let params = params(&[("p0", Value::Int(1))]);
        let statement = to_positional(
            "SELECT '@p0', \"@p0\", `@p0`, [@p0] FROM t WHERE x = @p0 AND y LIKE 'it''s @p0'",
            &params,
        )
        .unwrap();
        assert_eq!(
            statement.sql,
            "SELECT '@p0', \"@p0\", `@p0`, [@p0] FROM t WHERE x = ? AND y LIKE 'it''s @p0'"
        );
        assert_eq!(statement.values, vec![Value::Int(1)]);
    }

    #[test]
    fn unknown_and_list_parameters_are_rejected() {
        let params = params(&[("p0", Value::list([1, 2]))]);
        assert!(matches!(
            to_positional("x = @p1", &params),
            Err(Error::UnknownParameter(name)) if name == "p1"
        ));
        assert!(matches!(
            to_positional("x = @p0", &params),
            Err(Error::UnbindableParameter { kind: "list", .. })
        ));
    }

    #[test]
    fn a_bare_prefix_is_not_a_placeholder() {
        let statement = to_positional("SELECT @ + 1", &Params::new()).unwrap();
        assert_eq!(statement.sql, "SELECT @ + 1");
        assert!(statement.values.is_empty());
    }

    #[test]
    fn scripts_split_outside_quotes() {
        assert_eq!(
            split_statements("INSERT INTO t VALUES ('a;b'); SELECT last_insert_rowid();  "),
            vec!["INSERT INTO t VALUES ('a;b')", "SELECT last_insert_rowid()"]
        );
        assert_eq!(split_statements(" ; "), Vec::<&str>::new());
    }

    #[test]
    fn scripts_share_one_parameter_set() {
        let params = params(&[("p0", Value::from("x"))]);
        let statements =
            prepare_script("INSERT INTO t (a) VALUES (@p0); SELECT last_insert_rowid()", &params)
                .unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].sql, "INSERT INTO t (a) VALUES (?)");
        assert_eq!(statements[0].values, vec![Value::from("x")]);
        assert!(statements[1].values.is_empty());
    }
}
