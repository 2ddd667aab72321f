use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::parser::parse_digest_table;
use super::types::{ImageDigestRecord, InventorySnapshot, InventoryUnavailable};
use crate::config::RuntimeConfig;

/// Source of locally cached (repository, digest) pairs.
///
/// The real implementation shells out to the container runtime; tests and
/// alternative backends provide their own.
#[async_trait]
pub trait ImageInventory: Send + Sync {
    async fn list_digests(&self) -> Result<Vec<ImageDigestRecord>, InventoryUnavailable>;
}

/// Queries a docker-compatible runtime with `images --digests`.
#[derive(Debug, Clone)]
pub struct RuntimeInventory {
    executable: PathBuf,
    timeout: Duration,
}

impl RuntimeInventory {
    pub fn new(executable: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(
            config.executable.clone(),
            Duration::from_secs(config.inventory_timeout_secs),
        )
    }
}

#[async_trait]
impl ImageInventory for RuntimeInventory {
    /// Runs the runtime's image listing, bounded by the configured timeout.
    ///
    /// The child process is killed if the query times out or the future is
    /// dropped, so cancelling the caller also cancels the query.
    async fn list_digests(&self) -> Result<Vec<ImageDigestRecord>, InventoryUnavailable> {
        let runtime = self.executable.display().to_string();
        debug!("Querying image inventory with {} images --digests", runtime);

        let mut command = Command::new(&self.executable);
        command
            .args(["images", "--digests"])
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = timeout(self.timeout, command.output())
            .await
            .map_err(|_| InventoryUnavailable::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|source| InventoryUnavailable::Spawn { runtime, source })?;

        if !output.status.success() {
            return Err(InventoryUnavailable::ExitStatus {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_digest_table(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Fixed inventory, for tests and offline use.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    records: Vec<ImageDigestRecord>,
}

impl StaticInventory {
    pub fn new(records: Vec<ImageDigestRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ImageInventory for StaticInventory {
    async fn list_digests(&self) -> Result<Vec<ImageDigestRecord>, InventoryUnavailable> {
        Ok(self.records.clone())
    }
}

/// Queries the inventory, degrading any failure to an empty snapshot.
pub async fn resolve(inventory: &dyn ImageInventory) -> InventorySnapshot {
    match inventory.list_digests().await {
        Ok(records) => {
            info!("Image inventory holds {} digests", records.len());
            InventorySnapshot::available(records)
        }
        Err(reason) => {
            warn!("Image inventory unavailable: {}", reason);
            InventorySnapshot::unavailable(reason)
        }
    }
}
