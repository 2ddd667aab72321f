use thiserror::Error;

/// Lookup of a model name the catalog does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no model named `{name}` in the catalog")]
pub struct NotFoundError {
    pub name: String,
}

impl NotFoundError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
