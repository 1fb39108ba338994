//! # Dump Driver
//!
//! Enumerates every key of a store and writes `"<key>: <value>\n"` records to
//! a new `backup_<unix-seconds>.txt` file.
//!
//! Records are staged in a temporary file inside the target directory and then
//! linked into place without clobbering. When a file for the same second
//! already exists the name gets a `_1`, `_2`, ... suffix, so a completed backup
//! is never overwritten and a crash mid-write leaves only the temporary file.

use super::{DriverError, KeyValueConnector, KeyValueStore};
use crate::observability::metrics;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Outcome of one backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub path: PathBuf,
    /// Records written
    pub written: usize,
    /// Keys that vanished or could not be read
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct DumpDriver<C> {
    connector: C,
}

impl<C: KeyValueConnector> DumpDriver<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Back up every key reachable at `address` into `directory`
    pub async fn run(
        &self,
        address: &str,
        password: &str,
        directory: &Path,
    ) -> Result<BackupReport, DriverError> {
        let mut store = self.connector.connect(address, password).await?;
        let keys = store.keys().await?;
        debug!(keys = keys.len(), "Enumerated keys");

        let mut contents = String::new();
        let mut written = 0;
        let mut skipped = 0;
        for key in &keys {
            match store.get(key).await {
                Ok(Some(value)) => {
                    contents.push_str(key);
                    contents.push_str(": ");
                    contents.push_str(&value);
                    contents.push('\n');
                    written += 1;
                }
                Ok(None) => {
                    debug!(key, "Key disappeared before it could be read, skipping");
                    skipped += 1;
                }
                Err(e) => {
                    warn!("Skipping key: {}", e);
                    metrics::increment_key_read_failures();
                    skipped += 1;
                }
            }
        }

        let dir = directory.to_path_buf();
        let now = SystemTime::now();
        let path = tokio::task::spawn_blocking(move || write_backup(&dir, now, contents.as_bytes()))
            .await
            .map_err(|e| DriverError::Writer(e.to_string()))??;

        info!(
            path = %path.display(),
            written,
            skipped,
            "Backup written"
        );
        Ok(BackupReport {
            path,
            written,
            skipped,
        })
    }
}

/// File name for a backup taken at `secs`, with `attempt` as tie-breaker
#[must_use]
pub fn backup_file_name(secs: u64, attempt: u32) -> String {
    if attempt == 0 {
        format!("backup_{secs}.txt")
    } else {
        format!("backup_{secs}_{attempt}.txt")
    }
}

/// Write `contents` to a new backup file in `directory`, creating it if needed
///
/// Returns the path of the file written. Never replaces an existing file.
pub fn write_backup(
    directory: &Path,
    now: SystemTime,
    contents: &[u8],
) -> Result<PathBuf, DriverError> {
    let io_error = |source: std::io::Error| DriverError::Io {
        directory: directory.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(directory).map_err(io_error)?;

    let mut staged = tempfile::Builder::new()
        .prefix(".backup_")
        .suffix(".tmp")
        .tempfile_in(directory)
        .map_err(io_error)?;
    staged.write_all(contents).map_err(io_error)?;
    staged.as_file().sync_all().map_err(io_error)?;

    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let mut attempt = 0;
    loop {
        let target = directory.join(backup_file_name(secs, attempt));
        match staged.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(path = %target.display(), "Backup name taken, trying next suffix");
                staged = e.file;
                attempt += 1;
            }
            Err(e) => return Err(io_error(e.error)),
        }
    }
}
