//! # CRD Generator
//!
//! Prints the `DatabaseBackup` CustomResourceDefinition as YAML.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/databasebackup.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use anyhow::{Context, Result};
use database_backup_controller::crd::DatabaseBackup;
use kube::core::CustomResourceExt;

fn main() -> Result<()> {
    let yaml = serde_yaml::to_string(&DatabaseBackup::crd()).context("Failed to serialize CRD")?;
    print!("{yaml}");
    Ok(())
}
