//! Handle the translation of serialized field values.

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use query_engine_metadata::metadata::ScalarType;
use query_engine_sql::sql::Value;

use super::error::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Convert a JSON value into a SQL value for a column of the given type.
pub fn translate_json_value(
    value: &serde_json::Value,
    scalar_type: ScalarType,
) -> Result<Value, Error> {
    let mismatch = || Error::TypeMismatch(value.clone(), scalar_type);
    match value {
        // null
        serde_json::Value::Null => Ok(Value::Null),

        // booleans
        serde_json::Value::Bool(b) => match scalar_type {
            ScalarType::Boolean => Ok(Value::Bool(*b)),
            _ => Err(mismatch()),
        },

        // numbers
        serde_json::Value::Number(num) => match scalar_type {
            ScalarType::Integer | ScalarType::Bigint => {
                num.as_i64().map(Value::Int).ok_or_else(mismatch)
            }
            ScalarType::Double => num.as_f64().map(Value::Float).ok_or_else(mismatch),
            _ => Err(mismatch()),
        },

        // strings
        serde_json::Value::String(s) => match scalar_type {
            ScalarType::Text => Ok(Value::Text(s.clone())),
            ScalarType::Uuid => Uuid::parse_str(s).map(Value::Uuid).map_err(|_| mismatch()),
            ScalarType::Date => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| mismatch()),
            ScalarType::DateTime => DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                .map(Value::DateTime)
                .ok_or_else(mismatch),
            _ => Err(mismatch()),
        },

        // byte arrays serialize as arrays of numbers
        serde_json::Value::Array(items) => match scalar_type {
            ScalarType::Bytes => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|byte| u8::try_from(byte).ok())
                        .ok_or_else(mismatch)
                })
                .collect::<Result<Vec<u8>, Error>>()
                .map(Value::Bytes),
            _ => Err(mismatch()),
        },

        // not supported
        serde_json::Value::Object(_) => Err(mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_are_coerced_by_column_type() {
        assert_eq!(
            translate_json_value(&json!(42), ScalarType::Bigint).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            translate_json_value(&json!(42), ScalarType::Double).unwrap(),
            Value::Float(42.0)
        );
        assert_eq!(
            translate_json_value(&json!("2024-03-09T07:05:01"), ScalarType::DateTime).unwrap(),
            Value::DateTime(
                NaiveDate::from_ymd_opt(2024, 3, 9)
                    .and_then(|date| date.and_hms_opt(7, 5, 1))
                    .unwrap()
            )
        );
        assert_eq!(
            translate_json_value(&json!([1, 2, 255]), ScalarType::Bytes).unwrap(),
            Value::Bytes(vec![1, 2, 255])
        );
        assert_eq!(
            translate_json_value(&json!(null), ScalarType::Uuid).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn mismatches_are_reported() {
        assert!(matches!(
            translate_json_value(&json!("abc"), ScalarType::Uuid),
            Err(Error::TypeMismatch(_, ScalarType::Uuid))
        ));
        assert!(matches!(
            translate_json_value(&json!(1.5), ScalarType::Integer),
            Err(Error::TypeMismatch(_, ScalarType::Integer))
        ));
        assert!(matches!(
            translate_json_value(&json!([256]), ScalarType::Bytes),
            Err(Error::TypeMismatch(_, ScalarType::Bytes))
        ));
    }
}
