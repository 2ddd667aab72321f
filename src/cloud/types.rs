use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::manifest::ManifestFault;

/// A model offered for download that is not yet installed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudModelEntry {
    pub name: String,
    /// Where the model package is downloaded from
    pub source: String,
    /// Remaining listing fields, in listing order
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("failed to fetch cloud listing: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid cloud listing: {0}")]
    Listing(#[from] serde_json::Error),
    #[error("downloaded manifest is invalid: {0}")]
    InvalidManifest(#[source] ManifestFault),
    #[error("model `{0}` is already installed")]
    AlreadyInstalled(String),
    #[error("failed to install manifest into {}: {source}", .path.display())]
    Install {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
