//! # External Effect Drivers
//!
//! - `dump`: enumerate every key of a key-value store and write them to a
//!   fresh backup file
//! - `redis`: `KeyValueStore` over a Redis connection
//! - `label`: add labels to a Pod unless they are already present
//!
//! Drivers hold no state shared between invocations, so different keys can
//! be processed concurrently.

pub mod dump;
pub mod label;
pub mod redis;

pub use dump::{BackupReport, DumpDriver};
pub use label::{LabelDriver, PatchResult};

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("connecting to {address} failed: {message}")]
    Connect { address: String, message: String },
    #[error("connecting to {address} timed out after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },
    #[error("listing keys failed: {0}")]
    ListKeys(String),
    #[error("reading key '{key}' failed: {message}")]
    ReadKey { key: String, message: String },
    #[error("writing backup into {}: {source}", .directory.display())]
    Io {
        directory: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("backup writer task failed: {0}")]
    Writer(String),
}

/// A live connection to a key-value store
#[async_trait]
pub trait KeyValueStore: Send {
    /// Every key currently in the store
    async fn keys(&mut self) -> Result<Vec<String>, DriverError>;

    /// Value of `key`, `None` if it no longer exists
    async fn get(&mut self, key: &str) -> Result<Option<String>, DriverError>;
}

/// Opens `KeyValueStore` connections
#[async_trait]
pub trait KeyValueConnector: Send + Sync + 'static {
    type Store: KeyValueStore;

    async fn connect(&self, address: &str, password: &str) -> Result<Self::Store, DriverError>;
}
