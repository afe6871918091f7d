//! Entities used across test cases.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sqlexpr::{ColumnInfo, Entity, EntityDescriptor, IndexInfo, ScalarType};

/// A row of `users`, keyed on an auto-increment id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Age")]
    pub age: i32,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
}

impl User {
    /// A user that has not been saved yet.
    pub fn new(name: &str, age: i32) -> Self {
        User {
            id: 0,
            name: name.to_string(),
            age,
            email: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }
}

impl Entity for User {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("users")
            .column(
                ColumnInfo::new("Id", ScalarType::Bigint)
                    .key()
                    .auto_increment(),
            )
            .column(ColumnInfo::new("Name", ScalarType::Text).max_length(100))
            .column(ColumnInfo::new("Age", ScalarType::Integer))
            .column(ColumnInfo::new("Email", ScalarType::Text).nullable())
            .index(IndexInfo::new("IX_users_Email", ["Email"]).unique())
    }
}

/// A row of `documents`, keyed on a UUID assigned on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "Id")]
    pub id: Uuid,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Published")]
    pub published: bool,
    #[serde(rename = "CreatedAt")]
    pub created_at: NaiveDateTime,
}

impl Entity for Document {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("documents")
            .column(ColumnInfo::new("Id", ScalarType::Uuid).key())
            .column(ColumnInfo::new("Title", ScalarType::Text))
            .column(ColumnInfo::new("Published", ScalarType::Boolean))
            .column(ColumnInfo::new("CreatedAt", ScalarType::DateTime))
    }
}

/// An entity without a key column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(rename = "Message")]
    pub message: String,
}

impl Entity for AuditEntry {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("audit_entries")
            .column(ColumnInfo::new("Message", ScalarType::Text))
    }
}
