//! prompt_core - Version ledger and folder/prompt tree
//!
//! This crate provides the synchronous, storage-agnostic core of the prompt library:
//! - `types` - Folder, Prompt, VersionRecord and the flat/nested item views
//! - `ledger` - When a content edit becomes a new version
//! - `forest` - Arena-backed forest with functional insert/remove/update
//! - `options` - Breadcrumb folder options for pickers
//! - `filter` - Prompt search and favourite filtering

pub mod error;
pub mod filter;
pub mod forest;
pub mod ledger;
pub mod options;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, CoreResult};
pub use filter::PromptFilter;
pub use forest::Forest;
pub use ledger::{
    apply_edit, apply_edit_at, branch, list_versions, renumber_history, restore_version,
    BRANCH_SUFFIX,
};
pub use options::{
    list_folder_options, list_move_targets, FolderOption, BREADCRUMB_SEPARATOR, ROOT_LABEL,
};
pub use types::{
    Folder, Item, ItemId, ItemNode, ItemRecord, ParentRef, Prompt, UserId, VersionRecord,
    ROOT_SENTINEL,
};
