//! Backend result normalization
//!
//! Rows arrive from a [`RowSource`] whose schema is only known at runtime.
//! A [`RowDecoder`] picks one capture strategy per column (geometry decoding
//! for the designated geometry column, passthrough for everything else) and
//! [`materialize`] drives the source to completion, returning every row as an
//! [`AttributeMap`] or nothing at all.

pub mod capture;
pub mod decoder;
pub mod materialize;
pub mod postgres;
pub mod source;
pub mod value;

pub use capture::{ColumnCapture, GeometryCapture, ScalarCapture};
pub use decoder::RowDecoder;
pub use materialize::materialize;
pub use postgres::PgRowSource;
pub use source::{ColumnDescriptor, MemoryRowSource, RowSource};
pub use value::{AttributeMap, AttributeValue, ScalarValue};
