//! Server options
//!
//! Each option is an immutable descriptor of one mutation of
//! [`ServerCapabilities`]. Options are applied strictly in order, so the
//! order callers choose is significant: a later non-empty cache address
//! replaces an earlier client, while an empty one leaves it attached.
//!
//! Applying is async because the search host step waits for the backend's
//! startup health check before recording the client.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::CacheClient;
use crate::config::ConfigDocument;
use crate::error::{ConfigError, OptionError};
use crate::layer::Layer;
use crate::search::SearchClient;
use crate::zoom::parse_zoom_ranges;

use super::capabilities::ServerCapabilities;

/// Where a configuration document is read from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Path(PathBuf),
    Inline(String),
}

impl ConfigSource {
    pub fn load(&self) -> Result<ConfigDocument, ConfigError> {
        match self {
            ConfigSource::Path(path) => ConfigDocument::from_file(path),
            ConfigSource::Inline(yaml) => ConfigDocument::from_yaml(yaml),
        }
    }
}

/// One configuration mutation of the server
#[derive(Debug, Clone, PartialEq)]
pub enum ServerOption {
    /// Parse a document, attach its cache client and resolve its layers
    LoadConfig(ConfigSource),
    /// Port used for serving tile data
    Port(u16),
    /// Port used for administrative endpoints (e.g. healthcheck)
    InternalPort(u16),
    EnableCors,
    SimplifyShapes,
    /// Fixed string for the `Cache-Control` header
    CacheControl(String),
    /// Cache server address; empty is a no-op
    CacheServer(String),
    /// Cache time-to-live as a duration string; empty is a no-op
    CacheTtl(String),
    /// Search backend `host[:port]`; the backend must pass its startup
    /// health check
    SearchHost(String),
    /// Overrides the 30 s startup health check timeout of later
    /// `SearchHost` options
    SearchHealthcheckTimeout(Duration),
    /// Index name -> geometry field name, replacing any earlier mapping
    SearchFieldMappings(HashMap<String, String>),
    /// Layer name -> `"<min>"` or `"<min>-<max>"`, replacing any earlier ranges
    ZoomRanges(HashMap<String, String>),
}

impl ServerOption {
    pub fn name(&self) -> &'static str {
        match self {
            ServerOption::LoadConfig(_) => "load_config",
            ServerOption::Port(_) => "port",
            ServerOption::InternalPort(_) => "internal_port",
            ServerOption::EnableCors => "enable_cors",
            ServerOption::SimplifyShapes => "simplify_shapes",
            ServerOption::CacheControl(_) => "cache_control",
            ServerOption::CacheServer(_) => "cache_server",
            ServerOption::CacheTtl(_) => "cache_ttl",
            ServerOption::SearchHost(_) => "search_host",
            ServerOption::SearchHealthcheckTimeout(_) => "search_healthcheck_timeout",
            ServerOption::SearchFieldMappings(_) => "search_field_mappings",
            ServerOption::ZoomRanges(_) => "zoom_ranges",
        }
    }

    /// Apply this mutation; on error the capabilities may be partially updated
    /// by earlier options and must be discarded by the caller
    pub async fn apply(&self, caps: &mut ServerCapabilities) -> Result<(), OptionError> {
        match self {
            ServerOption::LoadConfig(source) => load_config(source, caps)?,
            ServerOption::Port(port) => {
                caps.port = positive_port(*port, "port")?;
            }
            ServerOption::InternalPort(port) => {
                caps.internal_port = positive_port(*port, "internal_port")?;
            }
            ServerOption::EnableCors => caps.enable_cors = true,
            ServerOption::SimplifyShapes => caps.simplify = true,
            ServerOption::CacheControl(value) => caps.cache_control = Some(value.clone()),
            ServerOption::CacheServer(address) => attach_cache_client(caps, address)?,
            ServerOption::CacheTtl(value) => {
                if !value.is_empty() {
                    let ttl = humantime::parse_duration(value).map_err(|source| {
                        OptionError::CacheTtl {
                            value: value.clone(),
                            source,
                        }
                    })?;
                    caps.cache_ttl = Some(ttl);
                }
            }
            ServerOption::SearchHost(host) => {
                // A client that failed to construct is never recorded
                let client = SearchClient::connect(host, caps.search_healthcheck_timeout()).await?;
                caps.search_client = Some(client);
            }
            ServerOption::SearchHealthcheckTimeout(timeout) => {
                caps.search_healthcheck_timeout = Some(*timeout);
            }
            ServerOption::SearchFieldMappings(mappings) => {
                caps.search_field_mappings = mappings.clone();
            }
            ServerOption::ZoomRanges(ranges) => {
                caps.zoom_ranges = parse_zoom_ranges(ranges);
            }
        }
        Ok(())
    }
}

fn positive_port(port: u16, option: &'static str) -> Result<u16, OptionError> {
    if port == 0 {
        return Err(OptionError::InvalidPort { option });
    }
    Ok(port)
}

/// Attach a new cache client for a non-empty address, replacing any other
fn attach_cache_client(caps: &mut ServerCapabilities, address: &str) -> Result<(), OptionError> {
    if address.is_empty() {
        debug!("Empty cache server address, keeping current cache client");
        return Ok(());
    }
    if let Some(previous) = &caps.cache_client {
        debug!(previous = previous.address(), address, "Replacing cache client");
    }
    caps.cache_client = Some(CacheClient::new(address)?);
    Ok(())
}

fn load_config(source: &ConfigSource, caps: &mut ServerCapabilities) -> Result<(), OptionError> {
    let config = source.load()?;

    let mut names = HashSet::new();
    let mut layers = Vec::with_capacity(config.layers.len());
    for layer_doc in &config.layers {
        if !names.insert(layer_doc.name.as_str()) {
            return Err(OptionError::DuplicateLayer(layer_doc.name.clone()));
        }
        layers.push(Layer::from_document(layer_doc)?);
    }

    if let Some(cache) = &config.cache {
        attach_cache_client(caps, &cache.server_address)?;
    }
    caps.layers = layers;

    info!(
        layers = caps.layers.len(),
        cache = caps.cache_client.is_some(),
        "Applied configuration document"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tests::{fixed_response_backend, HEALTHY_RESPONSE};

    async fn applied(options: &[ServerOption]) -> ServerCapabilities {
        let mut caps = ServerCapabilities::default();
        for option in options {
            option.apply(&mut caps).await.unwrap();
        }
        caps
    }

    fn inline(yaml: &str) -> ServerOption {
        ServerOption::LoadConfig(ConfigSource::Inline(yaml.to_string()))
    }

    #[tokio::test]
    async fn test_scalar_options() {
        let caps = applied(&[
            ServerOption::Port(3000),
            ServerOption::InternalPort(3001),
            ServerOption::EnableCors,
            ServerOption::SimplifyShapes,
            ServerOption::CacheControl("max-age=86400".to_string()),
        ])
        .await;
        assert_eq!(caps.port(), 3000);
        assert_eq!(caps.internal_port(), 3001);
        assert!(caps.cors_enabled());
        assert!(caps.simplify_shapes());
        assert_eq!(caps.cache_control(), Some("max-age=86400"));
    }

    #[tokio::test]
    async fn test_zero_port_rejected() {
        let mut caps = ServerCapabilities::default();
        let err = ServerOption::Port(0).apply(&mut caps).await.unwrap_err();
        assert!(matches!(err, OptionError::InvalidPort { option: "port" }));
    }

    #[tokio::test]
    async fn test_cache_ttl() {
        let caps = applied(&[ServerOption::CacheTtl("5m".to_string())]).await;
        assert_eq!(caps.cache_ttl(), Some(Duration::from_secs(300)));

        let caps = applied(&[
            ServerOption::CacheTtl("30s".to_string()),
            ServerOption::CacheTtl(String::new()),
        ])
        .await;
        assert_eq!(caps.cache_ttl(), Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_malformed_cache_ttl() {
        let mut caps = ServerCapabilities::default();
        let err = ServerOption::CacheTtl("soon".to_string())
            .apply(&mut caps)
            .await
            .unwrap_err();
        assert!(matches!(err, OptionError::CacheTtl { .. }));
        assert!(caps.cache_ttl().is_none());
    }

    #[tokio::test]
    async fn test_search_host_waits_for_healthy_backend() {
        let host = fixed_response_backend(HEALTHY_RESPONSE).await;
        let caps = applied(&[ServerOption::SearchHost(host.clone())]).await;
        assert_eq!(
            caps.search_client().unwrap().base_url().as_str(),
            format!("http://{}/", host)
        );
        assert_eq!(
            caps.search_client().unwrap().healthcheck_timeout(),
            Duration::from_secs(30)
        );
    }

    #[tokio::test]
    async fn test_unhealthy_search_host_keeps_previous_client() {
        let host = fixed_response_backend(HEALTHY_RESPONSE).await;
        let mut caps = applied(&[
            ServerOption::SearchHealthcheckTimeout(Duration::from_millis(200)),
            ServerOption::SearchHost(host.clone()),
        ])
        .await;

        let err = ServerOption::SearchHost("127.0.0.1:1".to_string())
            .apply(&mut caps)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OptionError::Search(crate::error::SearchClientError::Unhealthy { .. })
        ));
        assert_eq!(
            caps.search_client().unwrap().base_url().as_str(),
            format!("http://{}/", host)
        );
    }

    #[tokio::test]
    async fn test_malformed_search_host_records_nothing() {
        let mut caps = ServerCapabilities::default();
        let err = ServerOption::SearchHost("es-b:notaport".to_string())
            .apply(&mut caps)
            .await;
        assert!(err.is_err());
        assert!(caps.search_client().is_none());
    }

    #[tokio::test]
    async fn test_mappings_replace_wholesale() {
        let caps = applied(&[
            ServerOption::SearchFieldMappings(HashMap::from([(
                "buildings".to_string(),
                "footprint".to_string(),
            )])),
            ServerOption::SearchFieldMappings(HashMap::from([(
                "parks".to_string(),
                "outline".to_string(),
            )])),
        ])
        .await;
        assert_eq!(caps.search_field_mappings().len(), 1);
        assert_eq!(caps.search_field_mappings()["parks"], "outline");
    }

    #[tokio::test]
    async fn test_zoom_ranges_replace_wholesale() {
        let caps = applied(&[
            ServerOption::ZoomRanges(HashMap::from([("a".to_string(), "1-2".to_string())])),
            ServerOption::ZoomRanges(HashMap::from([("b".to_string(), "5-12".to_string())])),
        ])
        .await;
        assert!(!caps.zoom_ranges().contains_key("a"));
        assert_eq!(caps.zoom_ranges()["b"].min, 5);
        assert_eq!(caps.zoom_ranges()["b"].max, 12);
    }

    #[tokio::test]
    async fn test_duplicate_layer_names() {
        let yaml = r#"
layers:
  - name: buildings
    elasticsearch: { host: localhost, index: a, geometryField: g }
  - name: buildings
    elasticsearch: { host: localhost, index: b, geometryField: g }
"#;
        let mut caps = ServerCapabilities::default();
        let err = inline(yaml).apply(&mut caps).await.unwrap_err();
        assert!(matches!(err, OptionError::DuplicateLayer(ref name) if name == "buildings"));
        assert!(caps.layers().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_layer_leaves_cache_unattached() {
        let yaml = r#"
cache:
  serverAddress: "localhost:6379"
layers:
  - name: buildings
    elasticsearch: { host: localhost, index: "", geometryField: g }
"#;
        let mut caps = ServerCapabilities::default();
        let err = inline(yaml).apply(&mut caps).await.unwrap_err();
        assert!(matches!(err, OptionError::Layer(_)));
        assert!(caps.cache_client().is_none());
    }

    #[tokio::test]
    async fn test_document_cache_with_empty_address_attaches_nothing() {
        let yaml = "cache:\n  serverAddress: \"\"\nlayers: []\n";

        let caps = applied(&[inline(yaml)]).await;
        assert!(caps.cache_client().is_none());

        let caps = applied(&[ServerOption::CacheServer("addrA".to_string()), inline(yaml)]).await;
        assert_eq!(caps.cache_client().map(|c| c.address()), Some("addrA"));
    }
}
