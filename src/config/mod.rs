//! Configuration document loading
//!
//! Loads the YAML layer/cache configuration. Parsing is strict: unknown keys
//! at any level fail with the parser's position, and nothing is constructed
//! from a document that did not parse.

mod document;

pub use document::{CacheConfig, ConfigDocument, ElasticsearchConfig, LayerDocument, PostgisConfig};

use std::io::Read;
use std::path::Path;

use crate::error::ConfigError;

impl ConfigDocument {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        tracing::debug!(path = %path.display(), layers = config.layers.len(), "Loaded config");
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: ConfigDocument = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from a byte stream
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: ConfigDocument = serde_yaml::from_reader(reader)?;
        Ok(config)
    }
}
