//! Per-backend differences in SQL syntax.

use enum_iterator::Sequence;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ast::ColumnType;
use super::identifier;
use super::value::{Value, CLIENT_SERVER_DATETIME_FORMAT};

/// Default length of a VARCHAR column on the client-server backend.
pub const DEFAULT_VARCHAR_LENGTH: u32 = 255;

/// The SQL backend a statement is rendered for.
///
/// Resolved once per connection and passed by value into every translation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum Dialect {
    /// An embedded, file based engine (SQLite).
    #[serde(alias = "sqlite")]
    Embedded,
    /// A client-server engine (MySQL).
    #[serde(alias = "mysql")]
    ClientServer,
}

impl Dialect {
    /// Quote an identifier. See [`identifier::escape_identifier`].
    pub fn quote_identifier(self, name: &str) -> String {
        identifier::escape_identifier(name, self)
    }

    pub fn auto_increment_keyword(self) -> &'static str {
        match self {
            Dialect::Embedded => "AUTOINCREMENT",
            Dialect::ClientServer => "AUTO_INCREMENT",
        }
    }

    /// The `LIMIT` value used when only an offset was requested.
    pub fn unbounded_limit(self) -> &'static str {
        match self {
            Dialect::Embedded => "-1",
            Dialect::ClientServer => "18446744073709551615",
        }
    }

    /// A query returning the identity generated by the last insert on this connection.
    pub fn last_insert_id_query(self) -> &'static str {
        match self {
            Dialect::Embedded => "SELECT last_insert_rowid()",
            Dialect::ClientServer => "SELECT LAST_INSERT_ID()",
        }
    }

    /// A query counting the tables with a given name, up to the placeholder for that name.
    pub fn table_exists_query(self) -> &'static str {
        match self {
            Dialect::Embedded => "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ",
            Dialect::ClientServer => "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = ",
        }
    }

    /// The clause inserting a row made only of default values.
    pub fn default_values_clause(self) -> &'static str {
        match self {
            Dialect::Embedded => " DEFAULT VALUES",
            Dialect::ClientServer => " () VALUES ()",
        }
    }

    /// Whether `CREATE INDEX IF NOT EXISTS` is understood by this backend.
    pub fn supports_if_not_exists_index(self) -> bool {
        match self {
            Dialect::Embedded => true,
            Dialect::ClientServer => false,
        }
    }

    /// The column type name used in DDL.
    pub fn type_name(self, column_type: &ColumnType) -> String {
        match self {
            Dialect::Embedded => match column_type {
                ColumnType::Boolean => "BOOLEAN".to_string(),
                ColumnType::Integer | ColumnType::BigInt => "INTEGER".to_string(),
                ColumnType::Double => "REAL".to_string(),
                ColumnType::Text { .. } | ColumnType::Uuid => "TEXT".to_string(),
                ColumnType::Date => "DATE".to_string(),
                ColumnType::DateTime => "DATETIME".to_string(),
                ColumnType::Blob => "BLOB".to_string(),
            },
            Dialect::ClientServer => match column_type {
                ColumnType::Boolean => "TINYINT(1)".to_string(),
                ColumnType::Integer => "INT".to_string(),
                ColumnType::BigInt => "BIGINT".to_string(),
                ColumnType::Double => "DOUBLE".to_string(),
                ColumnType::Text { max_length } => {
                    format!("VARCHAR({})", max_length.unwrap_or(DEFAULT_VARCHAR_LENGTH))
                }
                ColumnType::Uuid => "CHAR(36)".to_string(),
                ColumnType::Date => "DATE".to_string(),
                ColumnType::DateTime => "DATETIME".to_string(),
                ColumnType::Blob => "BLOB".to_string(),
            },
        }
    }

    /// Normalize a value before it is bound as an assignment parameter.
    ///
    /// The client-server backend receives date-times as `YYYY-MM-DD HH:MM:SS` text.
    pub fn normalize_assignment(self, value: Value) -> Value {
        match (self, value) {
            (Dialect::ClientServer, Value::DateTime(datetime)) => {
                Value::Text(datetime.format(CLIENT_SERVER_DATETIME_FORMAT).to_string())
            }
            (_, value) => value,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Dialect::Embedded => write!(f, "embedded"),
            Dialect::ClientServer => write!(f, "client-server"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn datetimes_are_formatted_for_client_server_only() {
        let datetime = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|date| date.and_hms_opt(7, 5, 1))
            .unwrap();

        assert_eq!(
            Dialect::ClientServer.normalize_assignment(Value::DateTime(datetime)),
            Value::Text("2024-03-09 07:05:01".to_string())
        );
        assert_eq!(
            Dialect::Embedded.normalize_assignment(Value::DateTime(datetime)),
            Value::DateTime(datetime)
        );
    }

    #[test]
    fn dialect_deserializes_from_backend_names() {
        let dialect: Dialect = serde_json::from_str("\"sqlite\"").unwrap();
        assert_eq!(dialect, Dialect::Embedded);
        let dialect: Dialect = serde_json::from_str("\"clientServer\"").unwrap();
        assert_eq!(dialect, Dialect::ClientServer);
    }

    #[test]
    fn text_columns_default_to_varchar_255_on_client_server() {
        assert_eq!(
            Dialect::ClientServer.type_name(&ColumnType::Text { max_length: None }),
            "VARCHAR(255)"
        );
        assert_eq!(
            Dialect::Embedded.type_name(&ColumnType::Text { max_length: Some(12) }),
            "TEXT"
        );
    }
}
