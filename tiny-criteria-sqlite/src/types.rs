//! Conversions between criteria values, SQLite values and JSON rows.

use rusqlite::types::{Value as SqlValue, ValueRef};
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use tiny_criteria_query::{Row, Value};

use crate::error::{SqliteError, SqliteResult};

/// Convert a bound criteria value to a SQLite value.
///
/// Booleans become 0/1; JSON and list values are stored as JSON text.
pub fn value_to_sqlite(value: &Value) -> SqliteResult<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Json(json) => SqlValue::Text(json.to_string()),
        Value::List(_) => SqlValue::Text(
            serde_json::to_string(value).map_err(|e| SqliteError::type_conversion(e.to_string()))?,
        ),
    })
}

/// Convert a SQLite value to JSON.
///
/// Text stays a string. Blobs that are valid UTF-8 become strings, other
/// blobs become arrays of bytes.
pub fn from_sqlite_value(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ValueRef::Text(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => JsonValue::String(s.to_string()),
            Err(_) => JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect()),
        },
    }
}

/// Read every column of a result row into a [`Row`].
pub fn row_to_json(row: &rusqlite::Row<'_>, columns: &[String]) -> rusqlite::Result<Row> {
    let mut map = Row::new();
    for (i, column) in columns.iter().enumerate() {
        map.insert(column.clone(), from_sqlite_value(row.get_ref(i)?));
    }
    Ok(map)
}

/// Deserialize a boolean stored as an SQLite integer.
///
/// ```rust
/// #[derive(serde::Deserialize)]
/// struct Flagged {
///     #[serde(deserialize_with = "tiny_criteria_sqlite::types::bool_from_int")]
///     active: bool,
/// }
///
/// let row: Flagged = serde_json::from_value(serde_json::json!({"active": 1})).unwrap();
/// assert!(row.active);
/// ```
pub fn bool_from_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}
