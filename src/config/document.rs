//! Configuration document schema
//!
//! Every struct rejects unknown keys so that a typo'd field name is an error
//! rather than a silently defaulted value.

use std::collections::HashMap;

use serde::Deserialize;

use crate::{MAX_ZOOM, MIN_ZOOM};

/// Root of the YAML configuration file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
    /// Absent means caching is disabled
    #[serde(default)]
    pub cache: Option<CacheConfig>,
    #[serde(default)]
    pub layers: Vec<LayerDocument>,
}

/// Tile cache settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CacheConfig {
    pub server_address: String,
}

/// One layer entry as written in the document
///
/// Exactly one backend key must be present; that is checked when the layer
/// is resolved, not by the schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_minzoom")]
    pub minzoom: u32,
    #[serde(default = "default_maxzoom")]
    pub maxzoom: u32,
    #[serde(default)]
    pub elasticsearch: Option<ElasticsearchConfig>,
    #[serde(default)]
    pub postgis: Option<PostgisConfig>,
}

fn default_minzoom() -> u32 {
    MIN_ZOOM
}

fn default_maxzoom() -> u32 {
    MAX_ZOOM
}

/// Elasticsearch backend for a layer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ElasticsearchConfig {
    pub host: String,
    #[serde(default = "default_elasticsearch_port")]
    pub port: u16,
    pub index: String,
    pub geometry_field: String,
    /// Output attribute name -> document source field
    #[serde(default)]
    pub source_fields: HashMap<String, String>,
}

fn default_elasticsearch_port() -> u16 {
    9200
}

/// PostGIS backend for a layer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PostgisConfig {
    pub dsn: String,
    /// Table name or parenthesized subquery the features are selected from
    pub table_expression: String,
    #[serde(default = "default_postgis_geometry_field")]
    pub geometry_field: String,
    /// Output attribute name -> table column
    #[serde(default)]
    pub source_fields: HashMap<String, String>,
}

fn default_postgis_geometry_field() -> String {
    "geometry".to_string()
}
