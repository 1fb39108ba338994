//! # Redis Store
//!
//! `KeyValueConnector` backed by the `redis` crate. Each backup opens its own
//! multiplexed connection; nothing is pooled across reconciliations so a
//! rotated password is picked up on the next run.

use super::{DriverError, KeyValueConnector, KeyValueStore};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, IntoConnectionInfo};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RedisConnector {
    connect_timeout: Duration,
}

impl RedisConnector {
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

/// `host:port` or a full `redis://`/`rediss://` URL
fn connection_url(address: &str) -> String {
    if address.starts_with("redis://") || address.starts_with("rediss://") {
        address.to_string()
    } else {
        format!("redis://{address}")
    }
}

#[async_trait]
impl KeyValueConnector for RedisConnector {
    type Store = RedisStore;

    async fn connect(&self, address: &str, password: &str) -> Result<RedisStore, DriverError> {
        let connect_error = |e: redis::RedisError| DriverError::Connect {
            address: address.to_string(),
            message: e.to_string(),
        };

        let mut info = connection_url(address)
            .into_connection_info()
            .map_err(connect_error)?;
        if !password.is_empty() {
            info.redis.password = Some(password.to_string());
        }
        let client = redis::Client::open(info).map_err(connect_error)?;

        debug!(address, "Connecting to Redis");
        let con = tokio::time::timeout(
            self.connect_timeout,
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_elapsed| DriverError::ConnectTimeout {
            address: address.to_string(),
            timeout: self.connect_timeout,
        })?
        .map_err(connect_error)?;

        Ok(RedisStore { con })
    }
}

pub struct RedisStore {
    con: MultiplexedConnection,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn keys(&mut self) -> Result<Vec<String>, DriverError> {
        let keys: Vec<String> = self
            .con
            .keys("*")
            .await
            .map_err(|e| DriverError::ListKeys(e.to_string()))?;
        Ok(keys)
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>, DriverError> {
        let value: Option<String> =
            self.con
                .get(key)
                .await
                .map_err(|e| DriverError::ReadKey {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_url() {
        assert_eq!(connection_url("localhost:6379"), "redis://localhost:6379");
        assert_eq!(
            connection_url("rediss://cache.internal:6380"),
            "rediss://cache.internal:6380"
        );
    }

    #[tokio::test]
    async fn test_unparseable_address_is_a_connect_error() {
        let connector = RedisConnector::new(Duration::from_secs(1));
        let result = connector.connect("not a host:port:junk", "").await;
        assert!(matches!(
            result,
            Err(DriverError::Connect { .. } | DriverError::ConnectTimeout { .. })
        ));
    }
}
