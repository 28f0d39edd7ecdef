//! Left fold of server options

use tracing::{debug, info};

use crate::error::AssemblyError;

use super::capabilities::ServerCapabilities;
use super::options::ServerOption;

/// Collects options in the order they should be applied
#[derive(Debug, Clone, Default)]
pub struct ServerBuilder {
    options: Vec<ServerOption>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one option
    pub fn option(mut self, option: ServerOption) -> Self {
        self.options.push(option);
        self
    }

    /// Append several options, keeping their order
    pub fn options<I: IntoIterator<Item = ServerOption>>(mut self, options: I) -> Self {
        self.options.extend(options);
        self
    }

    pub async fn build(self) -> Result<ServerCapabilities, AssemblyError> {
        assemble(self.options).await
    }
}

/// Apply `options` in order to an empty capability set
///
/// Options run one after another on the calling task. Halts at the first
/// failing option. Options after it never run and the partially built
/// capabilities are dropped.
pub async fn assemble<I>(options: I) -> Result<ServerCapabilities, AssemblyError>
where
    I: IntoIterator<Item = ServerOption>,
{
    let mut caps = ServerCapabilities::default();

    for (index, option) in options.into_iter().enumerate() {
        debug!(index, option = option.name(), "Applying server option");
        option
            .apply(&mut caps)
            .await
            .map_err(|source| AssemblyError {
                index,
                option: option.name(),
                source,
            })?;
    }

    info!(
        port = caps.port(),
        layers = caps.layers().len(),
        cache = caps.cache_client().is_some(),
        search = caps.search_client().is_some(),
        "Server capabilities assembled"
    );
    Ok(caps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::error::{OptionError, SearchClientError};

    #[tokio::test]
    async fn test_empty_fold_is_default() {
        let caps = ServerBuilder::new().build().await.unwrap();
        assert_eq!(caps.port(), 0);
        assert!(caps.layers().is_empty());
        assert!(caps.cache_client().is_none());
        assert!(caps.search_client().is_none());
    }

    #[tokio::test]
    async fn test_fold_halts_at_first_error() {
        let err = ServerBuilder::new()
            .option(ServerOption::Port(8080))
            .option(ServerOption::CacheTtl("forever".to_string()))
            .option(ServerOption::Port(0))
            .build()
            .await
            .unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.option, "cache_ttl");
        assert!(matches!(err.source, OptionError::CacheTtl { .. }));
        assert!(!err.is_config_error());
    }

    #[tokio::test]
    async fn test_options_keep_order() {
        let caps = ServerBuilder::new()
            .options([ServerOption::Port(1), ServerOption::Port(2)])
            .option(ServerOption::Port(3))
            .build()
            .await
            .unwrap();
        assert_eq!(caps.port(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_search_host_fails_assembly() {
        let err = ServerBuilder::new()
            .option(ServerOption::Port(8080))
            .option(ServerOption::SearchHealthcheckTimeout(Duration::from_millis(200)))
            .option(ServerOption::SearchHost("127.0.0.1:1".to_string()))
            .option(ServerOption::EnableCors)
            .build()
            .await
            .unwrap_err();

        assert_eq!(err.index, 2);
        assert_eq!(err.option, "search_host");
        assert!(matches!(
            err.source,
            OptionError::Search(SearchClientError::Unhealthy { .. })
        ));
    }
}
