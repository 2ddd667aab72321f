use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::types::{CloudError, CloudModelEntry};
use crate::catalog::{matches_terms, ModelCatalog};

/// Loads the cloud listing from an http(s) URL or a local file.
pub async fn load_listing(location: &str) -> Result<Vec<CloudModelEntry>, CloudError> {
    let entries = if location.starts_with("http://") || location.starts_with("https://") {
        debug!("Fetching cloud listing from {}", location);
        reqwest::get(location)
            .await?
            .error_for_status()?
            .json::<Vec<CloudModelEntry>>()
            .await?
    } else {
        let path = Path::new(location);
        let text = fs::read_to_string(path).map_err(|source| CloudError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse_listing(&text)?
    };
    info!("Cloud listing holds {} models", entries.len());
    Ok(entries)
}

/// Parses a listing document: a JSON array of `{name, source, ...}` objects.
pub fn parse_listing(text: &str) -> Result<Vec<CloudModelEntry>, CloudError> {
    Ok(serde_json::from_str(text)?)
}

/// Cloud entries not yet present in the local catalog whose names contain
/// every search term.
pub fn available<'a, S: AsRef<str>>(
    catalog: &ModelCatalog,
    entries: &'a [CloudModelEntry],
    terms: &[S],
) -> Vec<&'a CloudModelEntry> {
    entries
        .iter()
        .filter(|entry| !catalog.exists_by_name(&entry.name))
        .filter(|entry| matches_terms(&entry.name, terms))
        .collect()
}
