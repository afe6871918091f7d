//! Convert between entities and column values, through their serde representation.

use std::num::FpCategory;

use query_engine_execution::{Row, TypeHandlers};
use query_engine_metadata::metadata::{ColumnInfo, EntityDescriptor};
use query_engine_sql::sql::Value;
use query_engine_translation::translation::statements::ColumnValues;
use query_engine_translation::translation::values::translate_json_value;

use crate::entity::Entity;
use crate::error::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

fn to_object<T: Entity>(
    entity: &T,
    descriptor: &EntityDescriptor,
) -> Result<serde_json::Map<String, serde_json::Value>, Error> {
    match serde_json::to_value(entity)? {
        serde_json::Value::Object(object) => Ok(object),
        _ => Err(Error::NotAnObject(descriptor.table_name.clone())),
    }
}

/// The value of every mapped column of an entity. Missing fields are NULL.
pub fn to_column_values<T: Entity>(
    entity: &T,
    descriptor: &EntityDescriptor,
) -> Result<ColumnValues, Error> {
    let object = to_object(entity, descriptor)?;
    descriptor
        .mapped_columns()
        .map(|column| {
            let field = object.get(&column.name).unwrap_or(&serde_json::Value::Null);
            Ok((
                column.name.clone(),
                translate_json_value(field, column.scalar_type)?,
            ))
        })
        .collect()
}

/// The value of one column of an entity.
pub fn column_value<T: Entity>(
    entity: &T,
    descriptor: &EntityDescriptor,
    column: &ColumnInfo,
) -> Result<Value, Error> {
    let object = to_object(entity, descriptor)?;
    let field = object.get(&column.name).unwrap_or(&serde_json::Value::Null);
    Ok(translate_json_value(field, column.scalar_type)?)
}

/// Build an entity from a result row.
///
/// Stored values are decoded by the column's type first, so a UUID kept as text comes back
/// as a UUID.
pub fn from_row<T: Entity>(
    row: Row,
    descriptor: &EntityDescriptor,
    type_handlers: &TypeHandlers,
) -> Result<T, Error> {
    let object = row
        .into_iter()
        .map(|(name, value)| {
            let value = match descriptor.find_column(&name) {
                Some(column) => type_handlers.decode(column.scalar_type, value),
                None => value,
            };
            (name, to_json(value))
        })
        .collect();
    Ok(serde_json::from_value(serde_json::Value::Object(object))?)
}

/// Overwrite one field of an entity.
pub fn set_column<T: Entity>(
    entity: &mut T,
    descriptor: &EntityDescriptor,
    column: &ColumnInfo,
    value: Value,
) -> Result<(), Error> {
    let mut object = to_object(entity, descriptor)?;
    object.insert(column.name.clone(), to_json(value));
    *entity = serde_json::from_value(serde_json::Value::Object(object))?;
    Ok(())
}

/// The JSON form serde expects for a value.
pub fn to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Int(i) => serde_json::Value::from(i),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Text(s) => serde_json::Value::String(s),
        Value::Bytes(bytes) => serde_json::Value::from(bytes),
        Value::Uuid(uuid) => serde_json::Value::String(uuid.hyphenated().to_string()),
        Value::Date(date) => serde_json::Value::String(date.format(DATE_FORMAT).to_string()),
        Value::DateTime(datetime) => {
            serde_json::Value::String(datetime.format(DATETIME_FORMAT).to_string())
        }
        Value::List(items) => serde_json::Value::Array(items.into_iter().map(to_json).collect()),
    }
}

/// Does a key value mean "not stored yet"?
///
/// NULL, numeric zero and the nil UUID do. Boolean keys never do.
pub fn is_unsaved_key(key: &Value) -> bool {
    match key {
        Value::Null => true,
        Value::Int(i) => *i == 0,
        Value::Float(f) => f.classify() == FpCategory::Zero,
        Value::Uuid(uuid) => uuid.is_nil(),
        Value::Bool(_)
        | Value::Text(_)
        | Value::Bytes(_)
        | Value::Date(_)
        | Value::DateTime(_)
        | Value::List(_) => false,
    }
}
