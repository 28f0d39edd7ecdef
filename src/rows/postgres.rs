//! Row source over sqlx Postgres rows
//!
//! Values are decoded by the column's Postgres type name. Types without a
//! dedicated mapping (PostGIS `geometry`/`geography` among them) are handed
//! over as their raw binary encoding, which for PostGIS is EWKB.

use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::error::RowSourceError;

use super::capture::ColumnCapture;
use super::source::{ColumnDescriptor, RowSource};
use super::value::ScalarValue;

/// Row source over the rows of one fetched query
pub struct PgRowSource {
    columns: Vec<ColumnDescriptor>,
    rows: std::vec::IntoIter<PgRow>,
}

impl PgRowSource {
    /// Column descriptors come from the first row; an empty result has none
    pub fn new(rows: Vec<PgRow>) -> Self {
        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|c| ColumnDescriptor::new(c.name(), c.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            columns,
            rows: rows.into_iter(),
        }
    }
}

impl RowSource for PgRowSource {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    fn scan_next(&mut self, destinations: &mut [ColumnCapture]) -> Result<bool, RowSourceError> {
        let row = match self.rows.next() {
            Some(row) => row,
            None => return Ok(false),
        };

        if row.len() != destinations.len() {
            return Err(RowSourceError::ColumnCount {
                expected: destinations.len(),
                found: row.len(),
            });
        }

        for (idx, destination) in destinations.iter_mut().enumerate() {
            destination.scan(decode_column(&row, idx)?);
        }
        Ok(true)
    }
}

fn decode_column(row: &PgRow, idx: usize) -> Result<ScalarValue, RowSourceError> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(ScalarValue::Null);
    }

    let type_name = row.column(idx).type_info().name();
    let value = match type_name {
        "BOOL" => ScalarValue::Bool(row.try_get::<bool, _>(idx)?),
        "INT2" => ScalarValue::Int(i64::from(row.try_get::<i16, _>(idx)?)),
        "INT4" => ScalarValue::Int(i64::from(row.try_get::<i32, _>(idx)?)),
        "INT8" => ScalarValue::Int(row.try_get::<i64, _>(idx)?),
        "FLOAT4" => ScalarValue::Float(f64::from(row.try_get::<f32, _>(idx)?)),
        "FLOAT8" => ScalarValue::Float(row.try_get::<f64, _>(idx)?),
        // NaN and values beyond 28 digits do not fit a Decimal
        "NUMERIC" => match row.try_get::<rust_decimal::Decimal, _>(idx) {
            Ok(value) => ScalarValue::Text(value.to_string()),
            Err(e) => {
                tracing::debug!(column = idx, error = %e, "NUMERIC kept as raw bytes");
                ScalarValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(idx)?)
            }
        },
        "TEXT" | "VARCHAR" | "CHAR" | "NAME" => ScalarValue::Text(row.try_get::<String, _>(idx)?),
        "UUID" => ScalarValue::Text(row.try_get::<uuid::Uuid, _>(idx)?.to_string()),
        "JSON" | "JSONB" => ScalarValue::Json(row.try_get::<serde_json::Value, _>(idx)?),
        "TIMESTAMPTZ" => ScalarValue::Text(
            row.try_get::<chrono::DateTime<chrono::Utc>, _>(idx)?
                .to_rfc3339(),
        ),
        "TIMESTAMP" => ScalarValue::Text(row.try_get::<chrono::NaiveDateTime, _>(idx)?.to_string()),
        "DATE" => ScalarValue::Text(row.try_get::<chrono::NaiveDate, _>(idx)?.to_string()),
        "BYTEA" => ScalarValue::Bytes(row.try_get::<Vec<u8>, _>(idx)?),
        _ => ScalarValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
    };
    Ok(value)
}
