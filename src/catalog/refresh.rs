use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::info;

use super::catalog::ModelCatalog;
use super::reconcile::{reconcile, ReconcilePolicy, Reconciliation};
use crate::inventory::{resolve, ImageInventory, InventorySnapshot};
use crate::manifest::{ManifestLoader, ManifestParseError, ModelDescriptor};

/// Everything one catalog refresh produced.
#[derive(Debug)]
pub struct CatalogRefresh {
    pub catalog: ModelCatalog,
    /// Manifest files that could not be loaded
    pub failures: Vec<ManifestParseError>,
    pub inventory: InventorySnapshot,
    /// Descriptors left out by strict reconciliation
    pub excluded: Vec<ModelDescriptor>,
    pub deleted: Vec<PathBuf>,
    /// Manifest files strict reconciliation failed to delete
    pub delete_failures: Vec<(PathBuf, io::Error)>,
    pub refreshed_at: DateTime<Utc>,
}

/// Rebuilds the catalog: queries the inventory, scans manifests and
/// reconciles the two under `policy`.
///
/// Inventory and manifest parse problems are reported in the result, not
/// returned as errors. Only an unreadable manifest directory fails.
pub async fn refresh_catalog(
    loader: &ManifestLoader,
    inventory: &dyn ImageInventory,
    policy: ReconcilePolicy,
) -> io::Result<CatalogRefresh> {
    let snapshot = resolve(inventory).await;
    let scan = loader.scan()?;
    let reconciliation = reconcile(scan.descriptors, &snapshot, policy);
    Ok(assemble(reconciliation, scan.failures, snapshot))
}

fn assemble(
    reconciliation: Reconciliation,
    failures: Vec<ManifestParseError>,
    inventory: InventorySnapshot,
) -> CatalogRefresh {
    info!(
        "Catalog refreshed with {} models ({} manifest failures, {} failed deletions)",
        reconciliation.retained.len(),
        failures.len(),
        reconciliation.delete_failures.len()
    );

    CatalogRefresh {
        catalog: ModelCatalog::new(reconciliation.retained),
        failures,
        inventory,
        excluded: reconciliation.excluded,
        deleted: reconciliation.deleted,
        delete_failures: reconciliation.delete_failures,
        refreshed_at: Utc::now(),
    }
}
