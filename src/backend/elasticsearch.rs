//! Elasticsearch layer backend

use std::collections::HashMap;

use serde_json::{json, Value as JsonValue};

use crate::config::ElasticsearchConfig;
use crate::error::{LayerError, SearchClientError};
use crate::search::SearchClient;

/// Layer backed by one Elasticsearch index
#[derive(Debug)]
pub struct ElasticsearchBackend {
    client: SearchClient,
    index: String,
    geometry_field: String,
    source_fields: HashMap<String, String>,
}

impl ElasticsearchBackend {
    /// Validate the descriptor and construct its client (no connection yet)
    pub fn from_config(layer: &str, config: &ElasticsearchConfig) -> Result<Self, LayerError> {
        for (field, value) in [
            ("host", &config.host),
            ("index", &config.index),
            ("geometryField", &config.geometry_field),
        ] {
            if value.trim().is_empty() {
                return Err(LayerError::EmptyField {
                    layer: layer.to_string(),
                    field,
                });
            }
        }

        let client = SearchClient::new(&format!("{}:{}", config.host, config.port)).map_err(
            |source| LayerError::SearchClient {
                layer: layer.to_string(),
                source,
            },
        )?;

        Ok(Self {
            client,
            index: config.index.clone(),
            geometry_field: config.geometry_field.clone(),
            source_fields: config.source_fields.clone(),
        })
    }

    pub fn client(&self) -> &SearchClient {
        &self.client
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn geometry_field(&self) -> &str {
        &self.geometry_field
    }

    pub fn source_fields(&self) -> &HashMap<String, String> {
        &self.source_fields
    }

    /// Document fields to fetch per hit: the geometry plus every mapped field
    pub fn requested_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.source_fields.values().map(String::as_str).collect();
        fields.push(&self.geometry_field);
        fields.sort_unstable();
        fields.dedup();
        fields
    }

    /// Run `query` against this layer's index, restricted to the requested fields
    pub async fn search(&self, query: JsonValue, size: usize) -> Result<JsonValue, SearchClientError> {
        let body = json!({
            "size": size,
            "_source": self.requested_fields(),
            "query": query,
        });
        self.client.search(&self.index, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ElasticsearchConfig {
        ElasticsearchConfig {
            host: "es.internal".to_string(),
            port: 9201,
            index: "buildings".to_string(),
            geometry_field: "footprint".to_string(),
            source_fields: HashMap::from([
                ("height".to_string(), "building.height".to_string()),
                ("levels".to_string(), "building.levels".to_string()),
            ]),
        }
    }

    #[test]
    fn test_from_config() {
        let backend = ElasticsearchBackend::from_config("buildings", &config()).unwrap();
        assert_eq!(backend.index(), "buildings");
        assert_eq!(backend.client().base_url().as_str(), "http://es.internal:9201/");
        assert_eq!(
            backend.requested_fields(),
            vec!["building.height", "building.levels", "footprint"]
        );
    }

    #[test]
    fn test_requires_index() {
        let mut cfg = config();
        cfg.index = String::new();
        let err = ElasticsearchBackend::from_config("buildings", &cfg).unwrap_err();
        assert!(matches!(err, LayerError::EmptyField { field: "index", .. }));
    }

    #[test]
    fn test_requires_geometry_field() {
        let mut cfg = config();
        cfg.geometry_field = " ".to_string();
        let err = ElasticsearchBackend::from_config("buildings", &cfg).unwrap_err();
        assert!(matches!(err, LayerError::EmptyField { field: "geometryField", .. }));
    }
}
