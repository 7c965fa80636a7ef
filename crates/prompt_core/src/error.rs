//! Error types for tree and ledger operations

use thiserror::Error;

use crate::types::ItemId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    #[error("Prompt {id} has no version {version}")]
    VersionNotFound { id: ItemId, version: u32 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

pub(crate) fn require_non_empty(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
