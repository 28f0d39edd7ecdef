//! Per-layer zoom range overrides
//!
//! Overrides are written as `"<min>"` or `"<min>-<max>"`. Parsing is
//! fail-open: a part that is not a number leaves that bound at its default
//! instead of failing.

use std::collections::HashMap;

use serde::Serialize;

use crate::{MAX_ZOOM, MIN_ZOOM};

/// Inclusive zoom bounds for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZoomRange {
    pub min: u32,
    pub max: u32,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self {
            min: MIN_ZOOM,
            max: MAX_ZOOM,
        }
    }
}

impl ZoomRange {
    /// Parse a single override, never failing
    pub fn parse(value: &str) -> Self {
        let mut range = ZoomRange::default();
        let parts: Vec<&str> = value.split('-').collect();

        if let Some(min) = parse_bound(parts[0], value) {
            range.min = min;
        }
        if parts.len() == 2 {
            if let Some(max) = parse_bound(parts[1], value) {
                range.max = max;
            }
        }
        range
    }

    pub fn contains(&self, zoom: u32) -> bool {
        self.min <= zoom && zoom <= self.max
    }
}

fn parse_bound(part: &str, value: &str) -> Option<u32> {
    match part.trim().parse() {
        Ok(zoom) => Some(zoom),
        Err(_) => {
            tracing::debug!(value, part, "Ignoring unparsable zoom bound");
            None
        }
    }
}

/// Parse every override of a layer/feature-type -> range string mapping
pub fn parse_zoom_ranges(ranges: &HashMap<String, String>) -> HashMap<String, ZoomRange> {
    ranges
        .iter()
        .map(|(name, value)| (name.clone(), ZoomRange::parse(value)))
        .collect()
}
