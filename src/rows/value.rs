//! Values produced by row normalization

use std::collections::HashMap;

use geo_types::Geometry;
use serde::Serialize;

/// One decoded row: column name -> geometry or opaque scalar
pub type AttributeMap = HashMap<String, AttributeValue>;

/// An opaque scalar as handed over by a row source
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<Vec<u8>> for ScalarValue {
    fn from(value: Vec<u8>) -> Self {
        ScalarValue::Bytes(value)
    }
}

/// Value stored in an [`AttributeMap`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Decoded shape from the designated geometry column
    Geometry(Geometry<f64>),
    /// Any other column, passed through untouched
    Scalar(ScalarValue),
}

impl AttributeValue {
    pub fn as_geometry(&self) -> Option<&Geometry<f64>> {
        match self {
            AttributeValue::Geometry(geometry) => Some(geometry),
            AttributeValue::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            AttributeValue::Scalar(value) => Some(value),
            AttributeValue::Geometry(_) => None,
        }
    }
}
