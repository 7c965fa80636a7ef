//! Folder option lists for move targets and pickers

use serde::{Deserialize, Serialize};

use crate::forest::Forest;
use crate::types::{Item, ParentRef};

/// Separator between ancestor names in a breadcrumb label
pub const BREADCRUMB_SEPARATOR: &str = " > ";

/// Label of the synthetic top-level option
pub const ROOT_LABEL: &str = "Root";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderOption {
    pub id: ParentRef,
    pub label: String,
}

/// Flatten the folders of a forest into breadcrumb-labelled options
///
/// Folders come out depth-first in insertion order. Only the excluded
/// folder's own entry is skipped; its subfolders are still listed.
pub fn list_folder_options(
    forest: &Forest,
    exclude: Option<&str>,
    include_root: bool,
) -> Vec<FolderOption> {
    let mut options = Vec::new();
    if include_root {
        options.push(root_option());
    }
    collect(forest, &ParentRef::Root, "", exclude, None, &mut options);
    options
}

/// Folders an item could be moved into
///
/// The item's current location is left out, and a folder never lists itself
/// or its descendants. Unknown ids get every location.
pub fn list_move_targets(forest: &Forest, id: &str) -> Vec<FolderOption> {
    let (current, prune) = match forest.get(id) {
        Some(Item::Folder(folder)) => (Some(folder.parent_id.clone()), Some(folder.id.as_str())),
        Some(Item::Prompt(prompt)) => (Some(prompt.parent_id.clone()), None),
        None => (None, None),
    };

    let mut options = Vec::new();
    if current != Some(ParentRef::Root) {
        options.push(root_option());
    }
    let skip = current.as_ref().and_then(ParentRef::folder_id);
    collect(forest, &ParentRef::Root, "", skip, prune, &mut options);
    options
}

fn root_option() -> FolderOption {
    FolderOption {
        id: ParentRef::Root,
        label: ROOT_LABEL.to_string(),
    }
}

fn collect(
    forest: &Forest,
    parent: &ParentRef,
    prefix: &str,
    skip: Option<&str>,
    prune: Option<&str>,
    out: &mut Vec<FolderOption>,
) {
    for item in forest.children(parent) {
        let Item::Folder(folder) = item else {
            continue;
        };
        if prune == Some(folder.id.as_str()) {
            continue;
        }

        let label = if prefix.is_empty() {
            folder.name.clone()
        } else {
            format!("{}{}{}", prefix, BREADCRUMB_SEPARATOR, folder.name)
        };

        let id = ParentRef::folder(folder.id.clone());
        if skip != Some(folder.id.as_str()) {
            out.push(FolderOption {
                id: id.clone(),
                label: label.clone(),
            });
        }
        collect(forest, &id, &label, skip, prune, out);
    }
}
