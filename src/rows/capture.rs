//! Per-column capture strategies
//!
//! A row source scans one value into each destination. The destination for
//! the designated geometry column decodes (E)WKB; every other destination
//! keeps whatever it was handed.

use geo_types::Geometry;
use geozero::wkb::Ewkb;
use geozero::ToGeo;

use super::value::ScalarValue;

/// Passthrough holder with no type coercion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarCapture {
    value: Option<ScalarValue>,
}

impl ScalarCapture {
    pub fn scan(&mut self, value: ScalarValue) {
        self.value = Some(value);
    }

    /// The captured value; a column that was never scanned reads as NULL
    pub fn into_value(self) -> ScalarValue {
        self.value.unwrap_or(ScalarValue::Null)
    }
}

/// Holder for the designated geometry column
///
/// Accepts binary (E)WKB or hex-encoded EWKB text. Anything that fails to
/// decode, including NULL, leaves the capture invalid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryCapture {
    valid: bool,
    shape: Option<Geometry<f64>>,
}

impl GeometryCapture {
    pub fn scan(&mut self, value: ScalarValue) {
        let decoded = match value {
            ScalarValue::Bytes(bytes) => decode_ewkb(bytes),
            ScalarValue::Text(text) => match hex::decode(text.trim()) {
                Ok(bytes) => decode_ewkb(bytes),
                Err(e) => {
                    tracing::debug!(error = %e, "Geometry text is not hex-encoded EWKB");
                    None
                }
            },
            _ => None,
        };
        self.valid = decoded.is_some();
        self.shape = decoded;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The decoded shape, only ever present when the capture is valid
    pub fn into_shape(self) -> Option<Geometry<f64>> {
        if self.valid {
            self.shape
        } else {
            None
        }
    }
}

fn decode_ewkb(bytes: Vec<u8>) -> Option<Geometry<f64>> {
    match Ewkb(bytes).to_geo() {
        Ok(geometry) => Some(geometry),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to decode EWKB geometry");
            None
        }
    }
}

/// Capture destination for one column of one row
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnCapture {
    Scalar(ScalarCapture),
    Geometry(GeometryCapture),
}

impl ColumnCapture {
    /// Pick the strategy for a column by name equality with the geometry column
    pub fn for_column(column: &str, geometry_column: &str) -> Self {
        if column == geometry_column {
            ColumnCapture::Geometry(GeometryCapture::default())
        } else {
            ColumnCapture::Scalar(ScalarCapture::default())
        }
    }

    pub fn scan(&mut self, value: ScalarValue) {
        match self {
            ColumnCapture::Scalar(capture) => capture.scan(value),
            ColumnCapture::Geometry(capture) => capture.scan(value),
        }
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self, ColumnCapture::Geometry(_))
    }
}
