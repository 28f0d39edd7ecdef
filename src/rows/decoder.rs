//! Row decoding
//!
//! The capture plan is fixed once per query from the column names. Each row
//! gets fresh captures from that plan, the source fills them, and the decoder
//! reads them back in column order into one [`AttributeMap`].

use crate::error::RowError;

use super::capture::ColumnCapture;
use super::source::{ColumnDescriptor, RowSource};
use super::value::{AttributeMap, AttributeValue};

/// Decodes rows of one result set into attribute maps
#[derive(Debug, Clone)]
pub struct RowDecoder {
    columns: Vec<ColumnDescriptor>,
    geometry_column: String,
    /// `true` at the index of every column that takes geometry decoding
    geometry_mask: Vec<bool>,
}

impl RowDecoder {
    pub fn new(columns: &[ColumnDescriptor], geometry_column: impl Into<String>) -> Self {
        let geometry_column = geometry_column.into();
        let geometry_mask = columns
            .iter()
            .map(|c| c.name == geometry_column)
            .collect();
        Self {
            columns: columns.to_vec(),
            geometry_column,
            geometry_mask,
        }
    }

    pub fn geometry_column(&self) -> &str {
        &self.geometry_column
    }

    /// Whether any column of the result set is the geometry column
    pub fn has_geometry_column(&self) -> bool {
        self.geometry_mask.iter().any(|g| *g)
    }

    /// Fresh destinations for one row, in column order
    pub fn captures(&self) -> Vec<ColumnCapture> {
        self.columns
            .iter()
            .map(|c| ColumnCapture::for_column(&c.name, &self.geometry_column))
            .collect()
    }

    /// Build the attribute map for one scanned row
    ///
    /// Fails with [`RowError::InvalidGeometry`] when the geometry column did
    /// not decode; no partial map is returned.
    pub fn decode(&self, captures: Vec<ColumnCapture>) -> Result<AttributeMap, RowError> {
        let mut map = AttributeMap::with_capacity(captures.len());

        for (column, capture) in self.columns.iter().zip(captures) {
            let value = match capture {
                ColumnCapture::Geometry(geometry) => match geometry.into_shape() {
                    Some(shape) => AttributeValue::Geometry(shape),
                    None => {
                        return Err(RowError::InvalidGeometry {
                            column: column.name.clone(),
                        })
                    }
                },
                ColumnCapture::Scalar(scalar) => AttributeValue::Scalar(scalar.into_value()),
            };
            map.insert(column.name.clone(), value);
        }

        Ok(map)
    }

    /// Scan and decode the next row of `source`
    ///
    /// Returns `Ok(None)` once the source is exhausted.
    pub fn decode_next<S: RowSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<Option<AttributeMap>, RowError> {
        let mut captures = self.captures();
        if !source.scan_next(&mut captures)? {
            return Ok(None);
        }
        self.decode(captures).map(Some)
    }
}
