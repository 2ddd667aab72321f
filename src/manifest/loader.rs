use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::types::{
    ImageReference, ManifestFault, ManifestParseError, ModelDescriptor, ScanReport, TaskKind,
};

/// Reads model manifests from a directory.
pub struct ManifestLoader {
    /// Directory holding one `*.json` manifest per model
    directory: PathBuf,
}

impl ManifestLoader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Scans the manifest directory and parses every manifest in it.
    ///
    /// Files are visited in file name order so index positions are stable
    /// between scans. A file that fails to parse is recorded in the report
    /// and the scan moves on to the next one. A missing directory yields an
    /// empty report; any other directory error is returned.
    ///
    /// When several files declare the same model name the first one wins and
    /// the rest are reported as duplicates. This happens before any image
    /// reconciliation, so a later duplicate never stands in for a winner
    /// whose image is missing.
    pub fn scan(&self) -> io::Result<ScanReport> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "Manifest directory {} does not exist, catalog is empty",
                    self.directory.display()
                );
                return Ok(ScanReport::default());
            }
            Err(e) => return Err(e),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_manifest_file(path))
            .collect();
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut report = ScanReport::default();
        let mut seen_names = HashSet::new();

        for path in files {
            let outcome = fs::read_to_string(&path)
                .map_err(ManifestFault::from)
                .and_then(|text| parse_manifest(&path, &text));

            match outcome {
                Ok(descriptor) if !seen_names.insert(descriptor.name.clone()) => {
                    warn!("Duplicate model name {} in {}", descriptor.name, path.display());
                    report.failures.push(ManifestParseError {
                        path,
                        fault: ManifestFault::DuplicateName(descriptor.name),
                    });
                }
                Ok(descriptor) => {
                    debug!("Loaded manifest {} from {}", descriptor.name, path.display());
                    report.descriptors.push(descriptor);
                }
                Err(fault) => {
                    warn!("Skipping manifest {}: {}", path.display(), fault);
                    report.failures.push(ManifestParseError { path, fault });
                }
            }
        }

        info!(
            "Manifest scan of {} complete: {} loaded, {} failed",
            self.directory.display(),
            report.descriptors.len(),
            report.failures.len()
        );
        Ok(report)
    }
}

/// Visible `*.json` files only; staging files written during an install
/// start with a dot and are never picked up.
fn is_manifest_file(path: &Path) -> bool {
    path.is_file()
        && !path
            .file_name()
            .map_or(true, |name| name.to_string_lossy().starts_with('.'))
        && path.extension().is_some_and(|ext| ext == "json")
}

/// Parses one manifest document.
///
/// Known keys are validated and moved into the descriptor's fields; any
/// other key is carried over unchanged into `extras`, keeping document order.
pub fn parse_manifest(path: &Path, text: &str) -> Result<ModelDescriptor, ManifestFault> {
    let Value::Object(document) = serde_json::from_str::<Value>(text)? else {
        return Err(ManifestFault::NotAnObject);
    };

    let mut descriptor = ModelDescriptor {
        source: path.to_path_buf(),
        ..ModelDescriptor::default()
    };
    let mut name = None;

    for (key, value) in document {
        match key.as_str() {
            "name" => name = Some(expect_string(&key, value)?),
            "task" => descriptor.task = Some(TaskKind::parse(&expect_string(&key, value)?)),
            "owner" => descriptor.owner = Some(expect_string(&key, value)?),
            "organ" => descriptor.organ = Some(expect_string(&key, value)?),
            "target" => descriptor.target = Some(expect_string(&key, value)?),
            "modality" => descriptor.modality = Some(expect_string(&key, value)?),
            "sequence" => descriptor.sequence = Some(expect_string(&key, value)?),
            "dataset_description" => {
                descriptor.dataset_description = Some(expect_string(&key, value)?)
            }
            "briefdescription" => descriptor.brief_description = Some(expect_string(&key, value)?),
            "detaileddescription" => {
                descriptor.detailed_description = Some(expect_string(&key, value)?)
            }
            "pipeline" => descriptor.pipeline = Some(expect_string(&key, value)?),
            "docker" => descriptor.image = parse_image(value)?,
            _ => {
                descriptor.extras.insert(key, value);
            }
        }
    }

    descriptor.name = match name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(ManifestFault::MissingName),
    };
    Ok(descriptor)
}

fn expect_string(key: &str, value: Value) -> Result<String, ManifestFault> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(ManifestFault::FieldType {
            field: key.to_string(),
            expected: "a string",
        }),
    }
}

fn parse_image(value: Value) -> Result<ImageReference, ManifestFault> {
    let Value::Object(section) = value else {
        return Err(ManifestFault::FieldType {
            field: "docker".to_string(),
            expected: "an object",
        });
    };

    let mut image = ImageReference::default();
    for (key, value) in section {
        match key.as_str() {
            "image" | "repository" => {
                image.repository = Some(expect_string(&format!("docker.{key}"), value)?)
            }
            "digest" => image.digest = Some(expect_string("docker.digest", value)?),
            _ => {}
        }
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, content: &str) {
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_parse_manifest_fields_and_extras() {
        let text = r#"{
            "name": "MRI_Meningioma",
            "task": "Segmentation",
            "owner": "SINTEF",
            "zeta": 1,
            "docker": {"image": "dbouget/raidionics-rads", "digest": "sha256:abc"},
            "alpha": "kept"
        }"#;
        let descriptor = parse_manifest(Path::new("m.json"), text).unwrap();

        assert_eq!(descriptor.name, "MRI_Meningioma");
        assert_eq!(descriptor.task, Some(TaskKind::Segmentation));
        assert_eq!(descriptor.owner.as_deref(), Some("SINTEF"));
        assert_eq!(descriptor.image.digest.as_deref(), Some("sha256:abc"));
        assert_eq!(
            descriptor.image.repository.as_deref(),
            Some("dbouget/raidionics-rads")
        );
        let keys: Vec<&str> = descriptor.extras.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_parse_manifest_rejects_bad_documents() {
        let path = Path::new("bad.json");
        assert!(matches!(
            parse_manifest(path, "[1, 2]"),
            Err(ManifestFault::NotAnObject)
        ));
        assert!(matches!(
            parse_manifest(path, r#"{"task": "Diagnosis"}"#),
            Err(ManifestFault::MissingName)
        ));
        assert!(matches!(
            parse_manifest(path, r#"{"name": "x", "owner": 3}"#),
            Err(ManifestFault::FieldType { .. })
        ));
        assert!(matches!(
            parse_manifest(path, "{ not json"),
            Err(ManifestFault::Syntax(_))
        ));
    }

    #[test]
    fn test_scan_orders_by_file_name_and_isolates_failures() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.json", r#"{"name": "B", "task": "Segmentation"}"#);
        write(dir.path(), "a.json", r#"{"name": "A", "task": "Diagnosis"}"#);
        write(dir.path(), "c.json", "{ broken");
        write(dir.path(), "d.json", r#"{"name": "A"}"#);
        write(dir.path(), "notes.txt", "ignored");
        write(dir.path(), ".e.json.partial", r#"{"name": "E"}"#);

        let report = ManifestLoader::new(dir.path()).scan().unwrap();

        let names: Vec<&str> = report.descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].path.ends_with("c.json"));
        assert!(matches!(report.failures[0].fault, ManifestFault::Syntax(_)));
        assert!(matches!(
            report.failures[1].fault,
            ManifestFault::DuplicateName(ref name) if name == "A"
        ));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_scan_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let report = ManifestLoader::new(dir.path().join("absent")).scan().unwrap();
        assert!(report.descriptors.is_empty());
        assert!(report.is_clean());
    }
}
