mod loader;
mod types;

pub use loader::{parse_manifest, ManifestLoader};
pub use types::{
    DetailField, ImageReference, ManifestFault, ManifestParseError, ModelDescriptor, ScanReport,
    TaskKind,
};
