use query_engine_metadata::metadata::{ColumnInfo, EntityDescriptor, IndexInfo, ScalarType};
use query_engine_sql::sql::string::SQL;

/// Render a statement and its parameters for comparison.
pub fn render(sql: &SQL) -> String {
    format!("{}\n\n{:?}", sql.sql, sql.params)
}

pub fn users() -> EntityDescriptor {
    EntityDescriptor::new("users")
        .column(
            ColumnInfo::new("Id", ScalarType::Bigint)
                .key()
                .auto_increment(),
        )
        .column(ColumnInfo::new("Name", ScalarType::Text).max_length(100))
        .column(ColumnInfo::new("Age", ScalarType::Integer))
        .column(ColumnInfo::new("Email", ScalarType::Text).nullable())
        .column(ColumnInfo::new("Scratch", ScalarType::Text).ignored())
        .index(IndexInfo::new("ix_users_email", ["Email"]).unique())
}

pub fn audit_log() -> EntityDescriptor {
    EntityDescriptor::new("audit_log")
        .column(ColumnInfo::new("Line", ScalarType::Text))
}
