use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::types::CloudError;
use crate::manifest::{parse_manifest, ManifestFault, ManifestLoader};

/// Registers a downloaded manifest in the manifest directory.
///
/// The manifest is validated first, written under a hidden staging name and
/// then renamed into place, so a concurrent scan sees either the complete
/// file or nothing. A model whose name is already declared by any manifest
/// in the directory, whatever its file name, is refused. Returns the
/// installed path.
pub fn install_manifest(manifest_dir: &Path, downloaded: &Path) -> Result<PathBuf, CloudError> {
    let text = fs::read_to_string(downloaded).map_err(|source| CloudError::Read {
        path: downloaded.to_path_buf(),
        source,
    })?;
    install_manifest_text(manifest_dir, &text)
}

pub fn install_manifest_text(manifest_dir: &Path, text: &str) -> Result<PathBuf, CloudError> {
    let descriptor =
        parse_manifest(Path::new("<download>"), text).map_err(CloudError::InvalidManifest)?;
    if descriptor.name.contains(['/', '\\']) || descriptor.name.starts_with('.') {
        return Err(CloudError::InvalidManifest(ManifestFault::FieldType {
            field: "name".to_string(),
            expected: "a plain file name",
        }));
    }

    let target = manifest_dir.join(format!("{}.json", descriptor.name));
    if target.exists() || is_declared(manifest_dir, &descriptor.name)? {
        return Err(CloudError::AlreadyInstalled(descriptor.name));
    }

    let install_error = |source| CloudError::Install {
        path: target.clone(),
        source,
    };
    fs::create_dir_all(manifest_dir).map_err(install_error)?;
    let staging = manifest_dir.join(format!(".{}.json.partial", descriptor.name));
    fs::write(&staging, text).map_err(install_error)?;
    if let Err(source) = fs::rename(&staging, &target) {
        let _ = fs::remove_file(&staging);
        return Err(install_error(source));
    }

    info!("Installed manifest for {} at {}", descriptor.name, target.display());
    Ok(target)
}

/// True when a manifest in `manifest_dir` already declares `name`.
fn is_declared(manifest_dir: &Path, name: &str) -> Result<bool, CloudError> {
    let report = ManifestLoader::new(manifest_dir)
        .scan()
        .map_err(|source| CloudError::Read {
            path: manifest_dir.to_path_buf(),
            source,
        })?;
    Ok(report.descriptors.iter().any(|descriptor| descriptor.name == name))
}
