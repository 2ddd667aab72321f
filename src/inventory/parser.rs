use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{ImageDigestRecord, InventoryUnavailable};

/// Digest column used when the listing carries no header row.
pub const DEFAULT_DIGEST_COLUMN: usize = 2;
/// Repository column used when the listing carries no header row.
pub const DEFAULT_REPOSITORY_COLUMN: usize = 0;

const DIGEST_HEADER: &str = "DIGEST";
const REPOSITORY_HEADER: &str = "REPOSITORY";
/// Placeholder the runtime prints for images without a registry digest.
const NO_DIGEST: &str = "<none>";

/// `algorithm:encoded`, as content digests are written by OCI registries.
static DIGEST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[.+_-][a-z0-9]+)*:[a-zA-Z0-9=_-]+$").expect("valid digest pattern")
});

/// Parses the tabular output of `images --digests`.
///
/// Column positions come from the header row. Before any header has been
/// seen, [`DEFAULT_DIGEST_COLUMN`] and [`DEFAULT_REPOSITORY_COLUMN`] apply.
/// Rows without a digest are skipped; a row too short to hold the digest
/// column, or whose digest token is not a digest, makes the whole listing
/// unparsable.
pub fn parse_digest_table(output: &str) -> Result<Vec<ImageDigestRecord>, InventoryUnavailable> {
    let mut digest_column = DEFAULT_DIGEST_COLUMN;
    let mut repository_column = DEFAULT_REPOSITORY_COLUMN;
    let mut records = Vec::new();

    for (index, line) in output.lines().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        if let Some(position) = tokens.iter().position(|token| *token == DIGEST_HEADER) {
            digest_column = position;
            repository_column = tokens
                .iter()
                .position(|token| *token == REPOSITORY_HEADER)
                .unwrap_or(DEFAULT_REPOSITORY_COLUMN);
            continue;
        }

        let line_number = index + 1;
        let digest = tokens.get(digest_column).ok_or_else(|| InventoryUnavailable::Unparsable {
            line: line_number,
            reason: format!(
                "expected a digest in column {} but the row has {} columns",
                digest_column + 1,
                tokens.len()
            ),
        })?;

        if *digest == NO_DIGEST {
            continue;
        }
        if !DIGEST_PATTERN.is_match(digest) {
            return Err(InventoryUnavailable::Unparsable {
                line: line_number,
                reason: format!("`{digest}` is not an image digest"),
            });
        }

        let repository = tokens.get(repository_column).copied().unwrap_or_default();
        records.push(ImageDigestRecord::new(repository, *digest));
    }

    Ok(records)
}
