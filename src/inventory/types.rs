use std::collections::HashSet;
use std::io;

use serde::Serialize;
use thiserror::Error;

/// A locally cached image and its content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImageDigestRecord {
    pub repository: String,
    pub digest: String,
}

impl ImageDigestRecord {
    pub fn new(repository: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            digest: digest.into(),
        }
    }
}

/// Why the container runtime could not report its images.
#[derive(Debug, Error)]
pub enum InventoryUnavailable {
    #[error("failed to start container runtime `{runtime}`: {source}")]
    Spawn {
        runtime: String,
        #[source]
        source: io::Error,
    },
    #[error("container runtime did not answer within {seconds}s")]
    Timeout { seconds: u64 },
    #[error("container runtime exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },
    #[error("unparsable image listing at line {line}: {reason}")]
    Unparsable { line: usize, reason: String },
}

/// Result of one inventory query.
///
/// A failed query degrades to an empty record list; the reason is kept so
/// callers can report it.
#[derive(Debug, Default)]
pub struct InventorySnapshot {
    pub records: Vec<ImageDigestRecord>,
    pub unavailable: Option<InventoryUnavailable>,
}

impl InventorySnapshot {
    pub fn available(records: Vec<ImageDigestRecord>) -> Self {
        Self {
            records,
            unavailable: None,
        }
    }

    pub fn unavailable(reason: InventoryUnavailable) -> Self {
        Self {
            records: Vec::new(),
            unavailable: Some(reason),
        }
    }

    pub fn is_available(&self) -> bool {
        self.unavailable.is_none()
    }

    pub fn contains_digest(&self, digest: &str) -> bool {
        self.records.iter().any(|record| record.digest == digest)
    }

    pub fn digests(&self) -> HashSet<&str> {
        self.records.iter().map(|record| record.digest.as_str()).collect()
    }
}
