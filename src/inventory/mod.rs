mod parser;
mod resolver;
mod types;

pub use parser::{parse_digest_table, DEFAULT_DIGEST_COLUMN, DEFAULT_REPOSITORY_COLUMN};
pub use resolver::{resolve, ImageInventory, RuntimeInventory, StaticInventory};
pub use types::{ImageDigestRecord, InventorySnapshot, InventoryUnavailable};
