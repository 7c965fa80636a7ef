//! Bulk JSON import and export
//!
//! Exports carry the nested tree with full version history. Imports accept
//! either such an export or a bare list of `{ name, content }` prompts.

use chrono::{DateTime, Utc};
use log::{debug, info};
use prompt_core::{renumber_history, Folder, Forest, ItemNode, ParentRef, Prompt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

pub const EXPORT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportDocument {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub items: Vec<ItemNode>,
}

impl ExportDocument {
    pub fn from_forest(forest: &Forest) -> Self {
        Self {
            format_version: EXPORT_FORMAT_VERSION,
            exported_at: Utc::now(),
            items: forest.tree(),
        }
    }
}

/// Minimal prompt entry accepted by imports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportPrompt {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImportPayload {
    Document(ExportDocument),
    Prompts(Vec<ImportPrompt>),
}

/// Render a forest as a pretty JSON export
pub fn export_json(forest: &Forest) -> StoreResult<String> {
    Ok(serde_json::to_string_pretty(&ExportDocument::from_forest(forest))?)
}

pub fn parse_import(json: &str) -> StoreResult<ImportPayload> {
    let payload: ImportPayload = serde_json::from_str(json)
        .map_err(|e| StoreError::Import(format!("Unrecognised import format: {}", e)))?;

    if let ImportPayload::Document(ref document) = payload {
        if document.format_version > EXPORT_FORMAT_VERSION {
            return Err(StoreError::Import(format!(
                "Export format {} is newer than supported format {}",
                document.format_version, EXPORT_FORMAT_VERSION
            )));
        }
    }

    Ok(payload)
}

/// Insert every imported item under `parent`, each with a fresh id
///
/// Returns the new forest and the number of prompts imported. Nothing is
/// inserted when any entry is invalid.
pub fn apply_import(
    forest: &Forest,
    payload: ImportPayload,
    parent: &ParentRef,
) -> StoreResult<(Forest, usize)> {
    let nodes = match payload {
        ImportPayload::Document(document) => document.items,
        ImportPayload::Prompts(prompts) => prompts
            .into_iter()
            .map(|entry| {
                Prompt::new(entry.name, entry.content, parent.clone())
                    .map(|prompt| ItemNode::Prompt(prompt.with_favorite(entry.is_favorite)))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    for node in &nodes {
        validate_node(node)?;
    }

    let mut next = forest.clone();
    let mut imported = 0;
    for node in nodes {
        next = insert_node(&next, node, parent, &mut imported)?;
    }

    info!("Imported {} prompts under {}", imported, parent);
    Ok((next, imported))
}

fn validate_node(node: &ItemNode) -> StoreResult<()> {
    match node {
        ItemNode::Prompt(prompt) => {
            if prompt.name.trim().is_empty() || prompt.content.trim().is_empty() {
                return Err(StoreError::Import(format!(
                    "Prompt '{}' has an empty name or content",
                    prompt.name
                )));
            }
            if prompt.version_number == 0 {
                return Err(StoreError::Import(format!(
                    "Prompt '{}' has version number 0",
                    prompt.name
                )));
            }
            if prompt.history.len() >= u32::MAX as usize {
                return Err(StoreError::Import(format!(
                    "Prompt '{}' has too many archived versions",
                    prompt.name
                )));
            }
        }
        ItemNode::Folder { folder, children } => {
            if folder.name.trim().is_empty() {
                return Err(StoreError::Import("Folder with an empty name".to_string()));
            }
            for child in children {
                validate_node(child)?;
            }
        }
    }
    Ok(())
}

fn insert_node(
    forest: &Forest,
    node: ItemNode,
    parent: &ParentRef,
    imported: &mut usize,
) -> StoreResult<Forest> {
    match node {
        ItemNode::Prompt(prompt) => {
            let mut prompt = if prompt.is_consistent() {
                prompt
            } else {
                debug!("Renumbering history of imported prompt '{}'", prompt.name);
                renumber_history(&prompt)
            };
            prompt.id = Uuid::new_v4().to_string();
            *imported += 1;
            Ok(forest.insert_prompt(parent, prompt)?)
        }
        ItemNode::Folder { folder, children } => {
            let fresh = Folder {
                id: Uuid::new_v4().to_string(),
                ..folder
            };
            let folder_ref = ParentRef::folder(fresh.id.clone());
            let mut next = forest.insert_folder(parent, fresh)?;
            for child in children {
                next = insert_node(&next, child, &folder_ref, imported)?;
            }
            Ok(next)
        }
    }
}
