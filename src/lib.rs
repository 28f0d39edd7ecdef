//! Tilenol - backend normalization and server assembly for a vector tile server
//!
//! This crate turns loosely-typed external input into strongly-invariant
//! internal state for the tile serving path:
//!
//! - **Row normalization** ([`rows`]): schema-unknown query rows, one column
//!   of which carries a binary geometry, are decoded into ordered
//!   [`AttributeMap`]s with all-or-nothing validity.
//! - **Server assembly** ([`server`]): an ordered list of [`ServerOption`]s is
//!   folded over an empty [`ServerCapabilities`], constructing cache and
//!   search clients along the way.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐     ┌──────────────────────┐
//! │  YAML config file    │     │  CLI flags / env     │
//! └──────────┬───────────┘     └──────────┬───────────┘
//!            │ ConfigDocument             │ ServerOption
//!            ▼                            ▼
//! ┌─────────────────────────────────────────────────────┐
//! │              ServerBuilder (left fold)              │
//! └─────────────────────────┬───────────────────────────┘
//!                           ▼
//! ┌─────────────────────────────────────────────────────┐
//! │   ServerCapabilities (read-only after startup)      │
//! │   layers -> Backend (Elasticsearch | PostGIS)       │
//! └─────────────────────────┬───────────────────────────┘
//!                           │ tile request
//!                           ▼
//! ┌─────────────────────────────────────────────────────┐
//! │  RowSource -> RowDecoder -> materialize()           │
//! │             -> Vec<AttributeMap>                    │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tilenol::{ConfigSource, ServerBuilder, ServerOption};
//!
//! let capabilities = ServerBuilder::new()
//!     .option(ServerOption::LoadConfig(ConfigSource::Path("layers.yaml".into())))
//!     .option(ServerOption::Port(3000))
//!     .option(ServerOption::CacheServer("localhost:6379".into()))
//!     .option(ServerOption::CacheTtl("5m".into()))
//!     .build()
//!     .await?;
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod layer;
pub mod rows;
pub mod search;
pub mod server;
pub mod zoom;

/// Lowest zoom level a layer or zoom range may use
pub const MIN_ZOOM: u32 = 0;

/// Highest zoom level a layer or zoom range may use
pub const MAX_ZOOM: u32 = 22;

// Re-export main types
pub use backend::{Backend, BackendKind, ElasticsearchBackend, PostgisBackend};
pub use cache::CacheClient;
pub use config::{CacheConfig, ConfigDocument, ElasticsearchConfig, LayerDocument, PostgisConfig};
pub use error::{
    AssemblyError, CacheError, ConfigError, LayerError, OptionError, RowError, RowSourceError,
    SearchClientError,
};
pub use layer::Layer;
pub use rows::{
    materialize, AttributeMap, AttributeValue, ColumnCapture, ColumnDescriptor, MemoryRowSource,
    PgRowSource, RowDecoder, RowSource, ScalarValue,
};
pub use search::SearchClient;
pub use server::{CapabilitiesSummary, ConfigSource, ServerBuilder, ServerCapabilities, ServerOption};
pub use zoom::ZoomRange;
