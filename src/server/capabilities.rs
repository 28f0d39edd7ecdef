//! Assembled server capability set
//!
//! Built once at startup by [`ServerBuilder`](super::ServerBuilder) and read
//! only afterwards. Fields are crate-private so serving code can observe
//! but never mutate them; share it across request handlers behind an `Arc`.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::Serialize;

use crate::backend::BackendKind;
use crate::cache::CacheClient;
use crate::layer::Layer;
use crate::search::{SearchClient, STARTUP_HEALTHCHECK_TIMEOUT};
use crate::zoom::ZoomRange;

/// Runtime state and client handles of a tile server
#[derive(Debug, Default)]
pub struct ServerCapabilities {
    pub(crate) port: u16,
    pub(crate) internal_port: u16,
    pub(crate) enable_cors: bool,
    pub(crate) simplify: bool,
    pub(crate) cache_client: Option<CacheClient>,
    pub(crate) cache_control: Option<String>,
    pub(crate) cache_ttl: Option<Duration>,
    pub(crate) search_client: Option<SearchClient>,
    pub(crate) search_healthcheck_timeout: Option<Duration>,
    pub(crate) search_field_mappings: HashMap<String, String>,
    pub(crate) zoom_ranges: HashMap<String, ZoomRange>,
    pub(crate) layers: Vec<Layer>,
}

impl ServerCapabilities {
    /// Port serving tile data
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Port serving administrative endpoints
    pub fn internal_port(&self) -> u16 {
        self.internal_port
    }

    pub fn cors_enabled(&self) -> bool {
        self.enable_cors
    }

    pub fn simplify_shapes(&self) -> bool {
        self.simplify
    }

    /// `None` means caching is disabled
    pub fn cache_client(&self) -> Option<&CacheClient> {
        self.cache_client.as_ref()
    }

    /// Fixed `Cache-Control` header value
    pub fn cache_control(&self) -> Option<&str> {
        self.cache_control.as_deref()
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl
    }

    pub fn search_client(&self) -> Option<&SearchClient> {
        self.search_client.as_ref()
    }

    /// How long the search host step waits for the backend to answer
    pub fn search_healthcheck_timeout(&self) -> Duration {
        self.search_healthcheck_timeout.unwrap_or(STARTUP_HEALTHCHECK_TIMEOUT)
    }

    /// Index name -> geometry field name
    pub fn search_field_mappings(&self) -> &HashMap<String, String> {
        &self.search_field_mappings
    }

    pub fn zoom_ranges(&self) -> &HashMap<String, ZoomRange> {
        &self.zoom_ranges
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Zoom bounds for a layer; an override by layer name wins over the
    /// layer's own bounds
    pub fn effective_zoom_range(&self, layer: &Layer) -> ZoomRange {
        self.zoom_ranges
            .get(&layer.name)
            .copied()
            .unwrap_or_else(|| layer.zoom_range())
    }

    pub fn summary(&self) -> CapabilitiesSummary {
        CapabilitiesSummary {
            port: self.port,
            internal_port: self.internal_port,
            enable_cors: self.enable_cors,
            simplify: self.simplify,
            cache_server: self.cache_client.as_ref().map(|c| c.address().to_string()),
            cache_control: self.cache_control.clone(),
            cache_ttl: self
                .cache_ttl
                .map(|ttl| humantime::format_duration(ttl).to_string()),
            search_url: self.search_client.as_ref().map(|c| c.base_url().to_string()),
            search_field_mappings: self
                .search_field_mappings
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            zoom_ranges: self
                .zoom_ranges
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            layers: self
                .layers
                .iter()
                .map(|layer| {
                    let zoom = self.effective_zoom_range(layer);
                    LayerSummary {
                        name: layer.name.clone(),
                        description: layer.description.clone(),
                        minzoom: zoom.min,
                        maxzoom: zoom.max,
                        backend: layer.backend.kind(),
                        geometry_field: layer.backend.geometry_field().to_string(),
                    }
                })
                .collect(),
        }
    }
}

/// Serializable view of [`ServerCapabilities`] for logs and the CLI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilitiesSummary {
    pub port: u16,
    pub internal_port: u16,
    pub enable_cors: bool,
    pub simplify: bool,
    pub cache_server: Option<String>,
    pub cache_control: Option<String>,
    pub cache_ttl: Option<String>,
    pub search_url: Option<String>,
    pub search_field_mappings: BTreeMap<String, String>,
    pub zoom_ranges: BTreeMap<String, ZoomRange>,
    pub layers: Vec<LayerSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub description: String,
    pub minzoom: u32,
    pub maxzoom: u32,
    pub backend: BackendKind,
    pub geometry_field: String,
}
