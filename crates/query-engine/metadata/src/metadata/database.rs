//! Metadata information regarding the table an entity type is mapped to.

use enum_iterator::Sequence;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The scalar types a column can hold.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Sequence,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Boolean,
    Integer,
    Bigint,
    Double,
    Text,
    Uuid,
    Date,
    DateTime,
    Bytes,
}

impl ScalarType {
    /// Keys of these types are generated by the database.
    pub fn is_integral(&self) -> bool {
        matches!(self, ScalarType::Integer | ScalarType::Bigint)
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            ScalarType::Boolean => "boolean",
            ScalarType::Integer => "integer",
            ScalarType::Bigint => "bigint",
            ScalarType::Double => "double",
            ScalarType::Text => "text",
            ScalarType::Uuid => "uuid",
            ScalarType::Date => "date",
            ScalarType::DateTime => "datetime",
            ScalarType::Bytes => "bytes",
        };
        write!(f, "{name}")
    }
}

/// How an entity type is stored: its table, columns and indexes.
///
/// Column names double as the serialized field names of the entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntityDescriptor {
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub indexes: Vec<IndexInfo>,
}

/// Information about a mapped column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub name: String,
    pub scalar_type: ScalarType,
    #[serde(default)]
    pub is_key: bool,
    #[serde(default)]
    pub is_auto_increment: bool,
    /// Present on the entity but never read from or written to the table.
    #[serde(default)]
    pub is_ignored: bool,
    #[serde(default)]
    pub nullable: bool,
    pub max_length: Option<u32>,
}

/// An index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl EntityDescriptor {
    pub fn new(table_name: impl Into<String>) -> Self {
        EntityDescriptor {
            table_name: table_name.into(),
            columns: vec![],
            indexes: vec![],
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnInfo) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn index(mut self, index: IndexInfo) -> Self {
        self.indexes.push(index);
        self
    }

    /// The primary key column, if the entity has one.
    pub fn key_column(&self) -> Option<&ColumnInfo> {
        self.mapped_columns().find(|column| column.is_key)
    }

    /// Look up a mapped column by name.
    pub fn find_column(&self, name: &str) -> Option<&ColumnInfo> {
        self.mapped_columns().find(|column| column.name == name)
    }

    /// Every column stored in the table.
    pub fn mapped_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|column| !column.is_ignored)
    }

    /// Columns written by an INSERT. Auto-increment columns are left to the database.
    pub fn insertable_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.mapped_columns()
            .filter(|column| !column.is_auto_increment)
    }

    /// Columns written by an UPDATE keyed on the primary key.
    pub fn updatable_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.mapped_columns()
            .filter(|column| !column.is_key && !column.is_auto_increment)
    }
}

impl ColumnInfo {
    /// A non-key, non-nullable column.
    pub fn new(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        ColumnInfo {
            name: name.into(),
            scalar_type,
            is_key: false,
            is_auto_increment: false,
            is_ignored: false,
            nullable: false,
            max_length: None,
        }
    }

    #[must_use]
    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }

    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.is_ignored = true;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

impl IndexInfo {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IndexInfo {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}
