//! MySQL row to JSON conversion for tables whose shape is only known at runtime.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::database::manager::DatabaseError;
use crate::types::Record;

/// Convert a row to a JSON map keyed by column name.
pub fn row_to_record(row: &MySqlRow) -> Result<Record, DatabaseError> {
    let mut map = Map::new();

    for column in row.columns() {
        let index = column.ordinal();
        let value = decode_column(row, index, column.type_info().name()).map_err(|e| {
            DatabaseError::Decode {
                column: column.name().to_string(),
                reason: e.to_string(),
            }
        })?;
        map.insert(column.name().to_string(), value);
    }

    Ok(map)
}

fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    // Fall back to text/bytes if the declared type and the driver disagree
    decode_typed(row, index, type_name).or_else(|_| decode_text(row, index))
}

fn decode_typed(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match type_name {
        "BOOLEAN" => Value::Bool(row.try_get::<bool, _>(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            Value::from(row.try_get::<i64, _>(index)?)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" | "YEAR" => Value::from(row.try_get::<u64, _>(index)?),
        "FLOAT" => float_value(row.try_get::<f32, _>(index)? as f64),
        "DOUBLE" => float_value(row.try_get::<f64, _>(index)?),
        // Kept as a string so precision survives the trip through JSON
        "DECIMAL" => Value::String(row.try_get::<Decimal, _>(index)?.to_string()),
        "DATE" => Value::String(row.try_get::<NaiveDate, _>(index)?.to_string()),
        "DATETIME" => Value::String(row.try_get::<NaiveDateTime, _>(index)?.to_string()),
        "TIMESTAMP" => Value::String(row.try_get::<DateTime<Utc>, _>(index)?.to_rfc3339()),
        "TIME" => Value::String(row.try_get::<NaiveTime, _>(index)?.to_string()),
        "JSON" => row.try_get::<Value, _>(index)?,
        _ => decode_text(row, index)?,
    };
    Ok(value)
}

fn decode_text(row: &MySqlRow, index: usize) -> Result<Value, sqlx::Error> {
    if let Ok(s) = row.try_get::<String, _>(index) {
        return Ok(Value::String(s));
    }
    let bytes = row.try_get::<Vec<u8>, _>(index)?;
    Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}
