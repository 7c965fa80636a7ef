//! Hierarchical Item Store
//!
//! A forest of folders and prompts kept as an arena: every item is stored
//! once in a map keyed by id, and folders hold the ordered ids of their
//! children. Mutations never touch `self`; each returns a new forest, so a
//! failed operation leaves the caller's value exactly as it was.

use log::{debug, warn};
use std::collections::{HashMap, HashSet};

use crate::error::{require_non_empty, CoreError, CoreResult};
use crate::ledger;
use crate::types::{
    Folder, Item, ItemId, ItemNode, ItemRecord, ParentRef, Prompt, ROOT_SENTINEL,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    item: Item,
    child_ids: Vec<ItemId>,
}

impl Node {
    fn new(item: Item) -> Self {
        Self {
            item,
            child_ids: Vec::new(),
        }
    }
}

/// One user's folders and prompts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    nodes: HashMap<ItemId, Node>,
    roots: Vec<ItemId>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Lookups ====================

    /// Total number of items (folders and prompts)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.nodes.get(id).map(|node| &node.item)
    }

    /// Look up a prompt, failing if the id is unknown or names a folder
    pub fn get_prompt(&self, id: &str) -> CoreResult<&Prompt> {
        match self.get(id) {
            Some(Item::Prompt(prompt)) => Ok(prompt),
            Some(Item::Folder(_)) => Err(CoreError::InvalidState(format!(
                "{} is a folder, not a prompt",
                id
            ))),
            None => Err(CoreError::NotFound(id.to_string())),
        }
    }

    /// Top-level items in insertion order
    pub fn roots(&self) -> Vec<&Item> {
        self.resolve(&self.roots)
    }

    /// Direct children of a location; empty for unknown ids and prompts
    pub fn children(&self, parent: &ParentRef) -> Vec<&Item> {
        self.resolve(self.child_ids(parent))
    }

    /// Every prompt in pre-order
    pub fn prompts(&self) -> Vec<&Prompt> {
        let mut out = Vec::new();
        self.visit(&self.roots, &mut |item| {
            if let Item::Prompt(prompt) = item {
                out.push(prompt);
            }
        });
        out
    }

    /// Every folder in pre-order
    pub fn folders(&self) -> Vec<&Folder> {
        let mut out = Vec::new();
        self.visit(&self.roots, &mut |item| {
            if let Item::Folder(folder) = item {
                out.push(folder);
            }
        });
        out
    }

    /// Whether `id` sits somewhere below folder `ancestor`
    pub fn is_descendant(&self, ancestor: &str, id: &str) -> bool {
        let mut current = self.get(id).map(|item| item.parent_id().clone());
        while let Some(ParentRef::Folder(parent)) = current {
            if parent == ancestor {
                return true;
            }
            current = self.get(&parent).map(|item| item.parent_id().clone());
        }
        false
    }

    /// Nested view for rendering and export
    pub fn tree(&self) -> Vec<ItemNode> {
        self.roots.iter().filter_map(|id| self.node_view(id)).collect()
    }

    // ==================== Structural Mutations ====================

    /// Append a prompt under a folder or at the top level
    pub fn insert_prompt(&self, parent: &ParentRef, prompt: Prompt) -> CoreResult<Forest> {
        require_non_empty("Prompt content", &prompt.content)?;
        check_history(&prompt)?;
        self.insert_item(parent, Item::Prompt(prompt))
    }

    /// Append a folder under a folder or at the top level
    pub fn insert_folder(&self, parent: &ParentRef, folder: Folder) -> CoreResult<Forest> {
        self.insert_item(parent, Item::Folder(folder))
    }

    /// Remove a prompt or an empty folder
    ///
    /// Folders must be emptied first; there is no cascading delete.
    pub fn remove_item(&self, id: &str) -> CoreResult<Forest> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if !node.child_ids.is_empty() {
            return Err(CoreError::InvalidState(format!(
                "Folder '{}' is not empty ({} items)",
                node.item.name(),
                node.child_ids.len()
            )));
        }

        let parent = node.item.parent_id().clone();
        let mut next = self.clone();
        next.detach(id, &parent);
        next.nodes.remove(id);

        debug!("Removed item {}", id);
        Ok(next)
    }

    /// Edit a prompt's content through the version ledger
    ///
    /// The prompt keeps its position; an unchanged text leaves the forest as is.
    pub fn update_content(&self, id: &str, new_content: &str) -> CoreResult<Forest> {
        let prompt = self.get_prompt(id)?;
        let (updated, record) = ledger::apply_edit(prompt, new_content)?;
        if record.is_none() {
            return Ok(self.clone());
        }
        Ok(self.replace_item(Item::Prompt(updated)))
    }

    /// Re-apply the text of an earlier version as a new edit
    pub fn restore_version(&self, id: &str, version_number: u32) -> CoreResult<Forest> {
        let prompt = self.get_prompt(id)?;
        let (updated, record) = ledger::restore_version(prompt, version_number)?;
        if record.is_none() {
            return Ok(self.clone());
        }
        Ok(self.replace_item(Item::Prompt(updated)))
    }

    /// Change the display name of a folder or prompt (never versions)
    pub fn rename(&self, id: &str, name: &str) -> CoreResult<Forest> {
        require_non_empty("Name", name)?;
        let mut item = self
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        item.set_name(name.to_string());
        Ok(self.replace_item(item))
    }

    /// Set the favourite flag on a prompt (never versions)
    pub fn set_favorite(&self, id: &str, is_favorite: bool) -> CoreResult<Forest> {
        let mut prompt = self.get_prompt(id)?.clone();
        if prompt.is_favorite == is_favorite {
            return Ok(self.clone());
        }
        prompt.is_favorite = is_favorite;
        prompt.touch();
        Ok(self.replace_item(Item::Prompt(prompt)))
    }

    /// Move an item to the end of another location (never versions)
    pub fn move_item(&self, id: &str, new_parent: &ParentRef) -> CoreResult<Forest> {
        let item = self
            .get(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        self.check_parent(new_parent)?;

        if let ParentRef::Folder(target) = new_parent {
            if item.is_folder() && (target == id || self.is_descendant(id, target)) {
                return Err(CoreError::InvalidState(format!(
                    "Cannot move folder '{}' into itself or one of its subfolders",
                    item.name()
                )));
            }
        }

        let old_parent = item.parent_id().clone();
        if &old_parent == new_parent {
            return Ok(self.clone());
        }

        let mut next = self.clone();
        next.detach(id, &old_parent);
        next.attach(id.to_string(), new_parent);
        if let Some(node) = next.nodes.get_mut(id) {
            node.item.set_parent_id(new_parent.clone());
            match &mut node.item {
                Item::Folder(folder) => folder.touch(),
                Item::Prompt(prompt) => prompt.touch(),
            }
        }

        debug!("Moved item {} from {} to {}", id, old_parent, new_parent);
        Ok(next)
    }

    /// Duplicate a prompt's current text into a new prompt placed right after it
    ///
    /// Returns the new forest and the id of the branch.
    pub fn branch_prompt(&self, id: &str) -> CoreResult<(Forest, ItemId)> {
        let original = self.get_prompt(id)?;
        let branched = ledger::branch(original);
        let branch_id = branched.id.clone();
        let parent = original.parent_id.clone();

        let mut next = self.clone();
        let siblings = next.child_ids_mut(&parent);
        let position = siblings
            .iter()
            .position(|sibling| sibling == id)
            .map(|index| index + 1)
            .unwrap_or(siblings.len());
        siblings.insert(position, branch_id.clone());
        next.nodes
            .insert(branch_id.clone(), Node::new(Item::Prompt(branched)));

        debug!("Branched prompt {} into {}", id, branch_id);
        Ok((next, branch_id))
    }

    // ==================== Persistence Bridge ====================

    /// Flatten into per-user records in pre-order
    pub fn to_records(&self, user_id: &str) -> Vec<ItemRecord> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.visit(&self.roots, &mut |item| {
            out.push(ItemRecord {
                user_id: user_id.to_string(),
                item: item.clone(),
            });
        });
        out
    }

    /// Rebuild a forest from flat records joined by `parent_id`
    ///
    /// Children keep the order in which their records appear.
    pub fn from_records(records: impl IntoIterator<Item = ItemRecord>) -> CoreResult<Forest> {
        let mut forest = Forest::new();
        let mut order: Vec<(ItemId, ParentRef)> = Vec::new();

        for record in records {
            let item = record.item;
            let id = item.id().to_string();
            if forest.nodes.contains_key(&id) {
                return Err(CoreError::InvalidState(format!("Duplicate item id {}", id)));
            }
            if let Item::Prompt(prompt) = &item {
                check_history(prompt)?;
            }
            order.push((id.clone(), item.parent_id().clone()));
            forest.nodes.insert(id, Node::new(item));
        }

        for (id, parent) in order {
            if parent.folder_id() == Some(id.as_str()) {
                return Err(CoreError::InvalidState(format!(
                    "Folder {} cannot be its own parent",
                    id
                )));
            }
            forest.check_parent(&parent)?;
            forest.attach(id, &parent);
        }

        let mut reachable = 0;
        forest.visit(&forest.roots, &mut |_| reachable += 1);
        if reachable != forest.nodes.len() {
            return Err(CoreError::InvalidState(
                "Folder hierarchy contains a cycle".to_string(),
            ));
        }

        Ok(forest)
    }

    // ==================== Internals ====================

    fn insert_item(&self, parent: &ParentRef, mut item: Item) -> CoreResult<Forest> {
        let id = item.id().to_string();
        require_non_empty("Item id", &id)?;
        require_non_empty("Name", item.name())?;

        if id == ROOT_SENTINEL {
            return Err(CoreError::InvalidState(format!(
                "'{}' is reserved for the top level",
                ROOT_SENTINEL
            )));
        }
        if self.nodes.contains_key(&id) {
            return Err(CoreError::InvalidState(format!("Item {} already exists", id)));
        }
        if parent.folder_id() == Some(id.as_str()) {
            return Err(CoreError::InvalidState(format!(
                "Folder {} cannot be its own parent",
                id
            )));
        }
        self.check_parent(parent)?;

        item.set_parent_id(parent.clone());

        let mut next = self.clone();
        next.attach(id.clone(), parent);
        next.nodes.insert(id.clone(), Node::new(item));

        debug!("Inserted item {} under {}", id, parent);
        Ok(next)
    }

    /// A parent must be the root or an existing folder
    fn check_parent(&self, parent: &ParentRef) -> CoreResult<()> {
        match parent {
            ParentRef::Root => Ok(()),
            ParentRef::Folder(folder_id) => match self.get(folder_id) {
                Some(Item::Folder(_)) => Ok(()),
                Some(Item::Prompt(_)) => Err(CoreError::InvalidState(format!(
                    "{} is a prompt and cannot contain items",
                    folder_id
                ))),
                None => Err(CoreError::NotFound(folder_id.clone())),
            },
        }
    }

    fn replace_item(&self, item: Item) -> Forest {
        let mut next = self.clone();
        if let Some(node) = next.nodes.get_mut(item.id()) {
            node.item = item;
        }
        next
    }

    fn child_ids(&self, parent: &ParentRef) -> &[ItemId] {
        match parent {
            ParentRef::Root => &self.roots,
            ParentRef::Folder(id) => self
                .nodes
                .get(id)
                .map(|node| node.child_ids.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Callers must have validated `parent` first
    fn child_ids_mut(&mut self, parent: &ParentRef) -> &mut Vec<ItemId> {
        match parent {
            ParentRef::Root => &mut self.roots,
            ParentRef::Folder(id) => match self.nodes.get_mut(id) {
                Some(node) => &mut node.child_ids,
                None => &mut self.roots,
            },
        }
    }

    fn attach(&mut self, id: ItemId, parent: &ParentRef) {
        self.child_ids_mut(parent).push(id);
    }

    fn detach(&mut self, id: &str, parent: &ParentRef) {
        self.child_ids_mut(parent).retain(|child| child != id);
    }

    fn resolve(&self, ids: &[ItemId]) -> Vec<&Item> {
        ids.iter()
            .filter_map(|id| self.nodes.get(id).map(|node| &node.item))
            .collect()
    }

    fn visit<'a>(&'a self, ids: &'a [ItemId], f: &mut dyn FnMut(&'a Item)) {
        for id in ids {
            if let Some(node) = self.nodes.get(id) {
                f(&node.item);
                self.visit(&node.child_ids, f);
            }
        }
    }

    fn node_view(&self, id: &str) -> Option<ItemNode> {
        let node = self.nodes.get(id)?;
        Some(match &node.item {
            Item::Prompt(prompt) => ItemNode::Prompt(prompt.clone()),
            Item::Folder(folder) => ItemNode::Folder {
                folder: folder.clone(),
                children: node
                    .child_ids
                    .iter()
                    .filter_map(|child| self.node_view(child))
                    .collect(),
            },
        })
    }
}

/// Reject prompts whose history does not run `version_number - 1` down to 1
fn check_history(prompt: &Prompt) -> CoreResult<()> {
    if prompt.is_consistent() {
        return Ok(());
    }
    warn!(
        "Prompt {} has version {} but {} archived versions",
        prompt.id,
        prompt.version_number,
        prompt.history.len()
    );
    Err(CoreError::InvalidState(format!(
        "Prompt {} has an inconsistent version history",
        prompt.id
    )))
}
