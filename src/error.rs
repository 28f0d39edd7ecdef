//! Error types for row normalization and server assembly
//!
//! Every failure surfaces to the immediate caller (process bootstrap or the
//! tile request handler). Nothing here is retried internally.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors produced while materializing a result set
#[derive(Error, Debug)]
pub enum RowError {
    /// The designated geometry column did not decode for some row.
    /// The whole result set is discarded.
    #[error("Column '{column}' was not a valid geometry")]
    InvalidGeometry { column: String },

    /// The row source failed; surfaced unchanged
    #[error(transparent)]
    Source(#[from] RowSourceError),
}

/// Failures of the underlying row source while fetching or scanning
#[derive(Error, Debug)]
pub enum RowSourceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Row has {found} values but {expected} columns were described")]
    ColumnCount { expected: usize, found: usize },

    #[error("Failed to scan column '{column}': {reason}")]
    Scan { column: String, reason: String },
}

/// Configuration document errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Structural violation or unknown field, with the parser's position
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Backend-specific validation failures while resolving a layer
#[derive(Error, Debug)]
pub enum LayerError {
    #[error("Layer '{layer}' declares no backend")]
    MissingBackend { layer: String },

    #[error("Layer '{layer}' declares more than one backend")]
    MultipleBackends { layer: String },

    #[error("Layer '{layer}': {field} must not be empty")]
    EmptyField { layer: String, field: &'static str },

    #[error("Layer '{layer}': invalid zoom bounds {min}-{max}")]
    InvalidZoom { layer: String, min: u32, max: u32 },

    #[error("Layer '{layer}': {source}")]
    SearchClient {
        layer: String,
        #[source]
        source: SearchClientError,
    },

    #[error("Layer '{layer}': invalid PostGIS DSN: {source}")]
    InvalidDsn {
        layer: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Cache client errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid cache server address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: redis::RedisError,
    },

    #[error("Cache error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Search client errors
#[derive(Error, Debug)]
pub enum SearchClientError {
    #[error("Invalid search URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Search URL '{url}' has no host")]
    MissingHost { url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search backend at {url} not healthy after {timeout:?}")]
    Unhealthy { url: String, timeout: Duration },

    #[error("Search backend returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Failure of a single server option
#[derive(Error, Debug)]
pub enum OptionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error("Duplicate layer name '{0}'")]
    DuplicateLayer(String),

    #[error("{option} must be a positive integer")]
    InvalidPort { option: &'static str },

    #[error("Invalid cache TTL '{value}': {source}")]
    CacheTtl {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Search(#[from] SearchClientError),
}

/// Assembly aborted at one option; later options did not run
#[derive(Error, Debug)]
#[error("Server option #{index} ({option}) failed: {source}")]
pub struct AssemblyError {
    /// Position of the failing option in the applied sequence
    pub index: usize,
    /// Name of the failing option
    pub option: &'static str,
    #[source]
    pub source: OptionError,
}

impl AssemblyError {
    /// True when the failure came from parsing the configuration document
    pub fn is_config_error(&self) -> bool {
        matches!(self.source, OptionError::Config(_))
    }
}
