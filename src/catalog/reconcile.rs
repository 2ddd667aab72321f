use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::ModelsConfig;
use crate::inventory::InventorySnapshot;
use crate::manifest::ModelDescriptor;

/// How manifests are checked against the image inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Drop manifests whose image digest is not cached locally
    pub strict: bool,
    /// Also delete dropped manifest files from disk (strict mode only)
    pub delete_unmatched: bool,
}

impl ReconcilePolicy {
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            strict: true,
            delete_unmatched: false,
        }
    }

    pub fn from_config(config: &ModelsConfig) -> Self {
        Self {
            strict: config.strict,
            delete_unmatched: config.strict && config.delete_unmatched,
        }
    }
}

/// Outcome of reconciling manifests against the inventory.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Descriptors that stay in the catalog, in load order
    pub retained: Vec<ModelDescriptor>,
    /// Descriptors dropped because their digest is not cached
    pub excluded: Vec<ModelDescriptor>,
    /// Manifest files removed from disk
    pub deleted: Vec<PathBuf>,
    /// Manifest files that could not be removed
    pub delete_failures: Vec<(PathBuf, io::Error)>,
}

/// Cross-checks manifests against the locally cached image digests.
///
/// Permissive mode keeps every manifest. Strict mode drops manifests whose
/// digest is missing from the inventory, and deletes their files only when
/// the policy asks for it. An unavailable inventory never drops anything.
pub fn reconcile(
    descriptors: Vec<ModelDescriptor>,
    inventory: &InventorySnapshot,
    policy: ReconcilePolicy,
) -> Reconciliation {
    if !policy.strict {
        return Reconciliation {
            retained: descriptors,
            ..Reconciliation::default()
        };
    }
    if !inventory.is_available() {
        warn!("Strict reconciliation skipped: image inventory unavailable");
        return Reconciliation {
            retained: descriptors,
            ..Reconciliation::default()
        };
    }

    let digests = inventory.digests();
    let (retained, excluded): (Vec<_>, Vec<_>) = descriptors.into_iter().partition(|descriptor| {
        descriptor
            .image
            .digest
            .as_deref()
            .is_some_and(|digest| digests.contains(digest))
    });

    let mut reconciliation = Reconciliation {
        retained,
        excluded,
        ..Reconciliation::default()
    };

    if policy.delete_unmatched {
        for descriptor in &reconciliation.excluded {
            match fs::remove_file(&descriptor.source) {
                Ok(()) => {
                    info!("Deleted manifest {} without cached image", descriptor.source.display());
                    reconciliation.deleted.push(descriptor.source.clone());
                }
                Err(e) => {
                    warn!("Failed to delete manifest {}: {}", descriptor.source.display(), e);
                    reconciliation
                        .delete_failures
                        .push((descriptor.source.clone(), e));
                }
            }
        }
    }

    info!(
        "Reconciled catalog: {} retained, {} excluded",
        reconciliation.retained.len(),
        reconciliation.excluded.len()
    );
    reconciliation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{ImageDigestRecord, InventoryUnavailable};
    use crate::manifest::ImageReference;
    use tempfile::TempDir;

    fn descriptor(name: &str, digest: Option<&str>) -> ModelDescriptor {
        ModelDescriptor {
            name: name.to_string(),
            image: ImageReference {
                repository: Some("repo".to_string()),
                digest: digest.map(str::to_string),
            },
            source: PathBuf::from(format!("{name}.json")),
            ..ModelDescriptor::default()
        }
    }

    fn names(descriptors: &[ModelDescriptor]) -> Vec<&str> {
        descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    fn sample() -> Vec<ModelDescriptor> {
        vec![
            descriptor("A", Some("sha256:aa")),
            descriptor("B", Some("sha256:bb")),
            descriptor("C", None),
        ]
    }

    fn inventory() -> InventorySnapshot {
        InventorySnapshot::available(vec![ImageDigestRecord::new("repo", "sha256:aa")])
    }

    #[test]
    fn test_permissive_keeps_everything() {
        let result = reconcile(sample(), &inventory(), ReconcilePolicy::permissive());
        assert_eq!(names(&result.retained), vec!["A", "B", "C"]);
        assert!(result.excluded.is_empty());
    }

    #[test]
    fn test_strict_drops_missing_digests() {
        let result = reconcile(sample(), &inventory(), ReconcilePolicy::strict());
        assert_eq!(names(&result.retained), vec!["A"]);
        assert_eq!(names(&result.excluded), vec!["B", "C"]);
        assert!(result.deleted.is_empty());
    }

    #[test]
    fn test_strict_with_unavailable_inventory_keeps_everything() {
        let snapshot = InventorySnapshot::unavailable(InventoryUnavailable::Timeout { seconds: 1 });
        let result = reconcile(sample(), &snapshot, ReconcilePolicy::strict());
        assert_eq!(result.retained.len(), 3);
    }

    #[test]
    fn test_strict_delete_removes_files() {
        let dir = TempDir::new().unwrap();
        let mut stale = descriptor("B", Some("sha256:bb"));
        stale.source = dir.path().join("B.json");
        fs::write(&stale.source, "{}").unwrap();
        let mut kept = descriptor("A", Some("sha256:aa"));
        kept.source = dir.path().join("A.json");
        fs::write(&kept.source, "{}").unwrap();

        let policy = ReconcilePolicy {
            strict: true,
            delete_unmatched: true,
        };
        let result = reconcile(vec![kept, stale], &inventory(), policy);

        assert_eq!(result.deleted, vec![dir.path().join("B.json")]);
        assert!(!dir.path().join("B.json").exists());
        assert!(dir.path().join("A.json").exists());
    }
}
