//! Tile cache client
//!
//! Backed by Redis. Construction only validates the address; the connection
//! is opened on first use and shared by every caller afterwards.

use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use crate::error::CacheError;

/// Key-value cache for rendered tiles
pub struct CacheClient {
    address: String,
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("address", &self.address)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl CacheClient {
    /// Create a client bound to `host:port` without connecting
    pub fn new(address: &str) -> Result<Self, CacheError> {
        let url = format!("redis://{}/", address);
        let client = redis::Client::open(url.as_str()).map_err(|source| {
            CacheError::InvalidAddress {
                address: address.to_string(),
                source,
            }
        })?;

        tracing::debug!(address, "Created cache client");
        Ok(Self {
            address: address.to_string(),
            client,
            connection: OnceCell::new(),
        })
    }

    /// The `host:port` this client is bound to
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                tracing::info!(address = %self.address, "Connecting to cache server");
                self.client.get_multiplexed_async_connection().await
            })
            .await?;
        Ok(conn.clone())
    }

    /// Fetch a cached value
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    /// Store a value, expiring after `ttl` when one is given
    pub async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => {
                conn.pset_ex::<_, _, ()>(key, value, expiry_millis(ttl)).await?;
            }
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }
}

/// Expiry in milliseconds; Redis rejects a zero expiry
fn expiry_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}
