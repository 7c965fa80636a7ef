//! # Prompt Store
//!
//! Per-user prompt libraries on top of `prompt_core`: file persistence,
//! serialised mutations, JSON import/export and AI improvement suggestions.

pub mod config;
pub mod error;
pub mod library;
pub mod storage;
pub mod suggest;
pub mod transfer;

// Re-exports
pub use config::LibraryConfig;
pub use error::{StoreError, StoreResult};
pub use library::PromptLibrary;
pub use storage::{FileForestStorage, ForestStorage};
pub use suggest::{parse_suggestions, OpenAiSuggestionProvider, SuggestionProvider};
pub use transfer::{ExportDocument, ImportPayload, ImportPrompt, EXPORT_FORMAT_VERSION};
