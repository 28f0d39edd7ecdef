//! Row source protocol
//!
//! A row source enumerates its columns once and then scans each row into
//! one destination per column. Implementations exist for sqlx Postgres rows
//! ([`PgRowSource`](super::PgRowSource)) and for in-memory rows.

use std::collections::VecDeque;

use crate::error::RowSourceError;

use super::capture::ColumnCapture;
use super::value::ScalarValue;

/// Name and logical type hint of a result column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub type_hint: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: type_hint.into(),
        }
    }
}

/// A source of rows whose schema is only known at runtime
pub trait RowSource {
    /// Ordered column descriptors, identical for every row
    fn columns(&self) -> &[ColumnDescriptor];

    /// Advance to the next row and scan one value into each destination
    ///
    /// Returns `Ok(false)` once the source is exhausted.
    fn scan_next(&mut self, destinations: &mut [ColumnCapture]) -> Result<bool, RowSourceError>;
}

/// Row source over rows already held in memory
///
/// Failures can be queued between rows to stand in for a source that breaks
/// part way through.
#[derive(Debug, Default)]
pub struct MemoryRowSource {
    columns: Vec<ColumnDescriptor>,
    rows: VecDeque<Result<Vec<ScalarValue>, RowSourceError>>,
}

impl MemoryRowSource {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns,
            rows: VecDeque::new(),
        }
    }

    /// Append a row of values, one per column
    pub fn row(mut self, values: Vec<ScalarValue>) -> Self {
        self.rows.push_back(Ok(values));
        self
    }

    /// Append a scan failure at the current position
    pub fn failure(mut self, error: RowSourceError) -> Self {
        self.rows.push_back(Err(error));
        self
    }

    /// Rows (and queued failures) not yet scanned
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowSource for MemoryRowSource {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    fn scan_next(&mut self, destinations: &mut [ColumnCapture]) -> Result<bool, RowSourceError> {
        let values = match self.rows.pop_front() {
            Some(row) => row?,
            None => return Ok(false),
        };

        if values.len() != destinations.len() {
            return Err(RowSourceError::ColumnCount {
                expected: destinations.len(),
                found: values.len(),
            });
        }

        for (destination, value) in destinations.iter_mut().zip(values) {
            destination.scan(value);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_exhausts() {
        let mut source = MemoryRowSource::new(vec![ColumnDescriptor::new("id", "INT8")])
            .row(vec![ScalarValue::Int(1)]);
        let mut dest = vec![ColumnCapture::for_column("id", "geom")];

        assert!(source.scan_next(&mut dest).unwrap());
        assert!(!source.scan_next(&mut dest).unwrap());
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_memory_source_rejects_short_row() {
        let mut source = MemoryRowSource::new(vec![
            ColumnDescriptor::new("id", "INT8"),
            ColumnDescriptor::new("name", "TEXT"),
        ])
        .row(vec![ScalarValue::Int(1)]);
        let mut dest = vec![
            ColumnCapture::for_column("id", "geom"),
            ColumnCapture::for_column("name", "geom"),
        ];

        let err = source.scan_next(&mut dest).unwrap_err();
        assert!(matches!(
            err,
            RowSourceError::ColumnCount {
                expected: 2,
                found: 1
            }
        ));
    }
}
