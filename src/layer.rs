//! Layer runtime entries
//!
//! Resolves a [`LayerDocument`] into a [`Layer`] with a constructed backend.

use crate::backend::{Backend, ElasticsearchBackend, PostgisBackend};
use crate::config::LayerDocument;
use crate::error::LayerError;
use crate::zoom::ZoomRange;
use crate::MAX_ZOOM;

/// A served layer with its backend ready for queries
#[derive(Debug)]
pub struct Layer {
    pub name: String,
    pub description: String,
    pub min_zoom: u32,
    pub max_zoom: u32,
    pub backend: Backend,
}

impl Layer {
    /// Validate a document entry and construct its backend
    pub fn from_document(doc: &LayerDocument) -> Result<Self, LayerError> {
        if doc.name.trim().is_empty() {
            return Err(LayerError::EmptyField {
                layer: doc.name.clone(),
                field: "name",
            });
        }
        if doc.minzoom > doc.maxzoom || doc.maxzoom > MAX_ZOOM {
            return Err(LayerError::InvalidZoom {
                layer: doc.name.clone(),
                min: doc.minzoom,
                max: doc.maxzoom,
            });
        }

        let backend = match (&doc.elasticsearch, &doc.postgis) {
            (Some(es), None) => {
                Backend::Elasticsearch(ElasticsearchBackend::from_config(&doc.name, es)?)
            }
            (None, Some(pg)) => Backend::Postgis(PostgisBackend::from_config(&doc.name, pg)?),
            (None, None) => {
                return Err(LayerError::MissingBackend {
                    layer: doc.name.clone(),
                })
            }
            (Some(_), Some(_)) => {
                return Err(LayerError::MultipleBackends {
                    layer: doc.name.clone(),
                })
            }
        };

        tracing::debug!(layer = %doc.name, backend = %backend.kind(), "Resolved layer");
        Ok(Self {
            name: doc.name.clone(),
            description: doc.description.clone(),
            min_zoom: doc.minzoom,
            max_zoom: doc.maxzoom,
            backend,
        })
    }

    pub fn zoom_range(&self) -> ZoomRange {
        ZoomRange {
            min: self.min_zoom,
            max: self.max_zoom,
        }
    }
}
