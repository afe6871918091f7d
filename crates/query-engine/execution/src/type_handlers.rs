//! Per-connection conversions between host values and what a backend stores.
//!
//! A handler's `encode` runs on every bound parameter of its scalar type; `decode` runs on
//! stored values read back for a column of that type. NULL is never passed to either.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use query_engine_metadata::metadata::ScalarType;
use query_engine_sql::sql::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A pair of conversions for one scalar type.
#[derive(Debug, Clone, Copy)]
pub struct TypeHandler {
    pub encode: fn(Value) -> Value,
    pub decode: fn(Value) -> Value,
}

fn unchanged(value: Value) -> Value {
    value
}

impl TypeHandler {
    /// UUIDs stored as their hyphenated text.
    pub fn uuid_as_text() -> Self {
        TypeHandler {
            encode: |value| match value {
                Value::Uuid(uuid) => Value::Text(uuid.hyphenated().to_string()),
                value => value,
            },
            decode: decode_uuid,
        }
    }

    /// UUIDs stored as 16 raw bytes.
    pub fn uuid_as_bytes() -> Self {
        TypeHandler {
            encode: |value| match value {
                Value::Uuid(uuid) => Value::Bytes(uuid.as_bytes().to_vec()),
                value => value,
            },
            decode: decode_uuid,
        }
    }

    fn decoding(decode: fn(Value) -> Value) -> Self {
        TypeHandler {
            encode: unchanged,
            decode,
        }
    }
}

fn decode_uuid(value: Value) -> Value {
    match value {
        Value::Text(text) => Uuid::parse_str(&text).map_or(Value::Text(text), Value::Uuid),
        Value::Bytes(bytes) => Uuid::from_slice(&bytes).map_or(Value::Bytes(bytes), Value::Uuid),
        value => value,
    }
}

fn decode_boolean(value: Value) -> Value {
    match value {
        Value::Int(int) => Value::Bool(int != 0),
        value => value,
    }
}

fn decode_double(value: Value) -> Value {
    match value {
        #[allow(clippy::cast_precision_loss)]
        Value::Int(int) => Value::Float(int as f64),
        value => value,
    }
}

fn decode_date(value: Value) -> Value {
    match value {
        Value::Text(text) => {
            NaiveDate::parse_from_str(&text, DATE_FORMAT).map_or(Value::Text(text), Value::Date)
        }
        Value::DateTime(datetime) => Value::Date(datetime.date()),
        value => value,
    }
}

fn decode_datetime(value: Value) -> Value {
    match value {
        Value::Text(text) => DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(&text, format).ok())
            .map_or(Value::Text(text), Value::DateTime),
        value => value,
    }
}

/// The handlers of one connection, by scalar type.
#[derive(Debug, Clone)]
pub struct TypeHandlers {
    handlers: HashMap<ScalarType, TypeHandler>,
}

impl Default for TypeHandlers {
    /// UUIDs as text on both backends, plus decoding for the types SQLite keeps as integers
    /// or text.
    fn default() -> Self {
        TypeHandlers::empty()
            .with(ScalarType::Uuid, TypeHandler::uuid_as_text())
            .with(ScalarType::Boolean, TypeHandler::decoding(decode_boolean))
            .with(ScalarType::Double, TypeHandler::decoding(decode_double))
            .with(ScalarType::Date, TypeHandler::decoding(decode_date))
            .with(ScalarType::DateTime, TypeHandler::decoding(decode_datetime))
    }
}

impl TypeHandlers {
    pub fn empty() -> Self {
        TypeHandlers {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any earlier one for the type.
    #[must_use]
    pub fn with(mut self, scalar_type: ScalarType, handler: TypeHandler) -> Self {
        self.handlers.insert(scalar_type, handler);
        self
    }

    pub fn get(&self, scalar_type: ScalarType) -> Option<&TypeHandler> {
        self.handlers.get(&scalar_type)
    }

    /// Convert a parameter before it is bound.
    pub fn encode(&self, value: Value) -> Value {
        match scalar_type_of(&value).and_then(|scalar_type| self.get(scalar_type)) {
            Some(handler) => (handler.encode)(value),
            None => value,
        }
    }

    /// Convert a stored value read back for a column of the given type.
    pub fn decode(&self, scalar_type: ScalarType, value: Value) -> Value {
        if value.is_null() {
            return value;
        }
        match self.get(scalar_type) {
            Some(handler) => (handler.decode)(value),
            None => value,
        }
    }
}

/// The scalar type whose handler encodes a value.
fn scalar_type_of(value: &Value) -> Option<ScalarType> {
    match value {
        Value::Null | Value::List(_) => None,
        Value::Bool(_) => Some(ScalarType::Boolean),
        Value::Int(_) => Some(ScalarType::Bigint),
        Value::Float(_) => Some(ScalarType::Double),
        Value::Text(_) => Some(ScalarType::Text),
        Value::Bytes(_) => Some(ScalarType::Bytes),
        Value::Uuid(_) => Some(ScalarType::Uuid),
        Value::Date(_) => Some(ScalarType::Date),
        Value::DateTime(_) => Some(ScalarType::DateTime),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_are_stored_as_text_by_default() {
        let handlers = TypeHandlers::default();
        let uuid = Uuid::from_u128(0x1234);
        let stored = handlers.encode(Value::Uuid(uuid));
        assert_eq!(
            stored,
            Value::Text("00000000-0000-0000-0000-000000001234".to_string())
        );
        assert_eq!(handlers.decode(ScalarType::Uuid, stored), Value::Uuid(uuid));
    }

    #[test]
    fn handlers_can_be_replaced_per_connection() {
        let handlers = TypeHandlers::default().with(ScalarType::Uuid, TypeHandler::uuid_as_bytes());
        let uuid = Uuid::from_u128(7);
        let stored = handlers.encode(Value::Uuid(uuid));
        assert!(matches!(&stored, Value::Bytes(bytes) if bytes.len() == 16));
        assert_eq!(handlers.decode(ScalarType::Uuid, stored), Value::Uuid(uuid));
        assert_eq!(
            TypeHandlers::empty().encode(Value::Uuid(uuid)),
            Value::Uuid(uuid)
        );
    }

    #[test]
    fn stored_representations_are_decoded_by_column_type() {
        let handlers = TypeHandlers::default();
        assert_eq!(
            handlers.decode(ScalarType::Boolean, Value::Int(1)),
            Value::Bool(true)
        );
        assert_eq!(
            handlers.decode(ScalarType::Double, Value::Int(2)),
            Value::Float(2.0)
        );
        assert_eq!(
            handlers.decode(ScalarType::DateTime, Value::from("2024-01-02 03:04:05")),
            Value::DateTime(
                NaiveDate::from_ymd_opt(2024, 1, 2)
                    .and_then(|date| date.and_hms_opt(3, 4, 5))
                    .unwrap()
            )
        );
        assert_eq!(
            handlers.decode(ScalarType::Date, Value::from("2024-01-02")),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );
        assert_eq!(handlers.decode(ScalarType::Uuid, Value::Null), Value::Null);
        assert_eq!(
            handlers.decode(ScalarType::Text, Value::from("x")),
            Value::from("x")
        );
    }
}
