//! Result set materialization
//!
//! A tile is either fully renderable from a query or not rendered at all:
//! the first invalid geometry or source failure discards every map built so
//! far for the call.

use tracing::{debug, warn};

use crate::error::RowError;

use super::decoder::RowDecoder;
use super::source::RowSource;
use super::value::AttributeMap;

/// Drive `source` to completion and return one map per row, in source order
pub fn materialize<S: RowSource + ?Sized>(
    source: &mut S,
    geometry_column: &str,
) -> Result<Vec<AttributeMap>, RowError> {
    let decoder = RowDecoder::new(source.columns(), geometry_column);
    if !decoder.has_geometry_column() {
        debug!(geometry_column, "Result set has no geometry column");
    }

    let mut maps = Vec::new();
    loop {
        match decoder.decode_next(source) {
            Ok(Some(map)) => maps.push(map),
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, discarded = maps.len(), "Aborting result set");
                return Err(e);
            }
        }
    }

    debug!(rows = maps.len(), geometry_column, "Materialized result set");
    Ok(maps)
}
