use std::convert::Infallible;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Category of processing a model performs.
///
/// Manifests spell the task with a capital letter ("Segmentation"), the
/// backend configuration uses the lowercase form ("segmentation"). Parsing
/// accepts either; tasks this crate does not know about are kept as
/// `Other` with their lowercase spelling so they still compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TaskKind {
    Segmentation,
    Diagnosis,
    Reporting,
    Other(String),
}

impl TaskKind {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "segmentation" => TaskKind::Segmentation,
            "diagnosis" => TaskKind::Diagnosis,
            "reporting" => TaskKind::Reporting,
            _ => TaskKind::Other(normalized),
        }
    }

    /// Spelling used in manifests and for display.
    pub fn as_str(&self) -> &str {
        match self {
            TaskKind::Segmentation => "Segmentation",
            TaskKind::Diagnosis => "Diagnosis",
            TaskKind::Reporting => "Reporting",
            TaskKind::Other(name) => name,
        }
    }

    /// Spelling the processing backend expects.
    pub fn backend_name(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TaskKind::parse(s))
    }
}

/// Container image a model runs in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageReference {
    pub repository: Option<String>,
    pub digest: Option<String>,
}

/// One model variant as described by its manifest file.
///
/// Descriptors are rebuilt from disk on every scan and never patched in
/// place. Keys the loader does not recognise are kept, in document order,
/// in `extras`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelDescriptor {
    /// Unique, case-sensitive key
    pub name: String,
    /// Absent task kinds keep the model out of every task view
    pub task: Option<TaskKind>,
    pub owner: Option<String>,
    pub organ: Option<String>,
    pub target: Option<String>,
    pub modality: Option<String>,
    pub sequence: Option<String>,
    pub dataset_description: Option<String>,
    pub brief_description: Option<String>,
    pub detailed_description: Option<String>,
    pub image: ImageReference,
    /// Pipeline reference path, when the manifest carries one
    pub pipeline: Option<String>,
    pub extras: Map<String, Value>,
    /// Manifest file the descriptor was read from
    pub source: PathBuf,
}

/// Metadata fields shown in a model's detail view, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailField {
    Owner,
    Task,
    Organ,
    Target,
    Modality,
    Sequence,
    DatasetDescription,
    BriefDescription,
    DetailedDescription,
}

impl DetailField {
    pub const ORDER: [DetailField; 9] = [
        DetailField::Owner,
        DetailField::Task,
        DetailField::Organ,
        DetailField::Target,
        DetailField::Modality,
        DetailField::Sequence,
        DetailField::DatasetDescription,
        DetailField::BriefDescription,
        DetailField::DetailedDescription,
    ];

    /// Manifest key for the field.
    pub fn key(self) -> &'static str {
        match self {
            DetailField::Owner => "owner",
            DetailField::Task => "task",
            DetailField::Organ => "organ",
            DetailField::Target => "target",
            DetailField::Modality => "modality",
            DetailField::Sequence => "sequence",
            DetailField::DatasetDescription => "dataset_description",
            DetailField::BriefDescription => "briefdescription",
            DetailField::DetailedDescription => "detaileddescription",
        }
    }

    pub fn value(self, descriptor: &ModelDescriptor) -> Option<String> {
        let field = match self {
            DetailField::Owner => &descriptor.owner,
            DetailField::Task => return descriptor.task.as_ref().map(|t| t.to_string()),
            DetailField::Organ => &descriptor.organ,
            DetailField::Target => &descriptor.target,
            DetailField::Modality => &descriptor.modality,
            DetailField::Sequence => &descriptor.sequence,
            DetailField::DatasetDescription => &descriptor.dataset_description,
            DetailField::BriefDescription => &descriptor.brief_description,
            DetailField::DetailedDescription => &descriptor.detailed_description,
        };
        field.clone()
    }
}

impl fmt::Display for DetailField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Why a single manifest file was rejected.
#[derive(Debug, Error)]
pub enum ManifestFault {
    #[error("unreadable file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("missing required field `name`")]
    MissingName,
    #[error("field `{field}` must be {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
    },
    #[error("model name `{0}` is already declared by an earlier manifest")]
    DuplicateName(String),
}

/// A manifest file that could not be turned into a descriptor.
///
/// Raised per file; a scan carries on past it.
#[derive(Debug, Error)]
#[error("{}: {fault}", .path.display())]
pub struct ManifestParseError {
    pub path: PathBuf,
    #[source]
    pub fault: ManifestFault,
}

/// Outcome of scanning a manifest directory.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Loaded descriptors, ordered by manifest file name
    pub descriptors: Vec<ModelDescriptor>,
    /// Every rejected file with its reason
    pub failures: Vec<ManifestParseError>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
