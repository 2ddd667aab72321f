mod install;
mod listing;
mod types;

pub use install::{install_manifest, install_manifest_text};
pub use listing::{available, load_listing, parse_listing};
pub use types::{CloudError, CloudModelEntry};
