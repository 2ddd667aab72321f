mod catalog;
mod reconcile;
mod refresh;
mod types;

pub use catalog::{matches_terms, ModelCatalog};
pub use reconcile::{reconcile, ReconcilePolicy, Reconciliation};
pub use refresh::{refresh_catalog, CatalogRefresh};
pub use types::NotFoundError;
