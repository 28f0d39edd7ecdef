//! Layer backends
//!
//! A layer's backend is resolved from its document entry when the
//! configuration is loaded. Each backend names the field carrying its
//! geometry; that name is what row decoding dispatches on.

pub mod elasticsearch;
pub mod postgis;

use std::collections::HashMap;

use serde::Serialize;

pub use elasticsearch::ElasticsearchBackend;
pub use postgis::{Envelope, PostgisBackend};

/// Discriminant of [`Backend`], used in summaries and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Elasticsearch,
    Postgis,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Elasticsearch => write!(f, "elasticsearch"),
            BackendKind::Postgis => write!(f, "postgis"),
        }
    }
}

/// Constructed runtime backend of a layer
#[derive(Debug)]
pub enum Backend {
    Elasticsearch(ElasticsearchBackend),
    Postgis(PostgisBackend),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Elasticsearch(_) => BackendKind::Elasticsearch,
            Backend::Postgis(_) => BackendKind::Postgis,
        }
    }

    /// Name of the field holding the feature geometry
    pub fn geometry_field(&self) -> &str {
        match self {
            Backend::Elasticsearch(es) => es.geometry_field(),
            Backend::Postgis(pg) => pg.geometry_field(),
        }
    }

    /// Output attribute name -> source field
    pub fn source_fields(&self) -> &HashMap<String, String> {
        match self {
            Backend::Elasticsearch(es) => es.source_fields(),
            Backend::Postgis(pg) => pg.source_fields(),
        }
    }
}
