//! Prompt Library
//!
//! Per-user access to the forest. Every mutation is applied to the cached
//! forest under one lock, persisted, and only then made visible, so a failed
//! save never leaks into later reads.

use log::{debug, info};
use prompt_core::{
    list_folder_options, list_move_targets, list_versions, Folder, FolderOption, Forest, Item,
    ItemId, ItemNode, ParentRef, Prompt, PromptFilter, VersionRecord,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::LibraryConfig;
use crate::error::{StoreError, StoreResult};
use crate::storage::{validate_user_id, FileForestStorage, ForestStorage};
use crate::suggest::{OpenAiSuggestionProvider, SuggestionProvider};
use crate::transfer;

pub struct PromptLibrary {
    storage: Arc<dyn ForestStorage>,
    forests: Mutex<HashMap<String, Forest>>,
    suggestions: Option<Arc<dyn SuggestionProvider>>,
}

impl PromptLibrary {
    pub fn new(storage: Arc<dyn ForestStorage>) -> Self {
        Self {
            storage,
            forests: Mutex::new(HashMap::new()),
            suggestions: None,
        }
    }

    /// File storage in the configured data directory, plus suggestions when a key is set
    pub fn from_config(config: &LibraryConfig) -> Self {
        info!("Opening prompt library at {:?}", config.data_dir);
        let library = Self::new(Arc::new(FileForestStorage::new(&config.data_dir)));
        match OpenAiSuggestionProvider::from_config(config) {
            Some(provider) => library.with_suggestions(Arc::new(provider)),
            None => library,
        }
    }

    pub fn with_suggestions(mut self, provider: Arc<dyn SuggestionProvider>) -> Self {
        self.suggestions = Some(provider);
        self
    }

    // ==================== Reads ====================

    /// Current forest for a user, loading it on first access
    pub async fn forest(&self, user_id: &str) -> StoreResult<Forest> {
        let mut forests = self.forests.lock().await;
        Ok(self.cached(&mut forests, user_id).await?.clone())
    }

    pub async fn tree(&self, user_id: &str) -> StoreResult<Vec<ItemNode>> {
        Ok(self.forest(user_id).await?.tree())
    }

    pub async fn get_item(&self, user_id: &str, id: &str) -> StoreResult<Item> {
        item_in(&self.forest(user_id).await?, id)
    }

    pub async fn get_prompt(&self, user_id: &str, id: &str) -> StoreResult<Prompt> {
        Ok(self.forest(user_id).await?.get_prompt(id)?.clone())
    }

    pub async fn list_versions(&self, user_id: &str, id: &str) -> StoreResult<Vec<VersionRecord>> {
        let forest = self.forest(user_id).await?;
        Ok(list_versions(forest.get_prompt(id)?))
    }

    pub async fn list_prompts(&self, user_id: &str, filter: &PromptFilter) -> StoreResult<Vec<Prompt>> {
        let forest = self.forest(user_id).await?;
        Ok(filter.apply(&forest).into_iter().cloned().collect())
    }

    pub async fn folder_options(
        &self,
        user_id: &str,
        exclude: Option<&str>,
        include_root: bool,
    ) -> StoreResult<Vec<FolderOption>> {
        let forest = self.forest(user_id).await?;
        Ok(list_folder_options(&forest, exclude, include_root))
    }

    /// Folders `id` could be moved into, leaving out where it already is
    pub async fn move_targets(&self, user_id: &str, id: &str) -> StoreResult<Vec<FolderOption>> {
        let forest = self.forest(user_id).await?;
        item_in(&forest, id)?;
        Ok(list_move_targets(&forest, id))
    }

    // ==================== Mutations ====================

    pub async fn create_folder(
        &self,
        user_id: &str,
        name: &str,
        parent: &ParentRef,
    ) -> StoreResult<Folder> {
        let folder = Folder::new(name, parent.clone())?;
        let id = folder.id.clone();
        self.mutate(user_id, |forest| {
            let next = forest.insert_folder(parent, folder)?;
            let created = folder_in(&next, &id)?;
            Ok((next, created))
        })
        .await
    }

    pub async fn create_prompt(
        &self,
        user_id: &str,
        name: &str,
        content: &str,
        parent: &ParentRef,
    ) -> StoreResult<Prompt> {
        let prompt = Prompt::new(name, content, parent.clone())?;
        let id = prompt.id.clone();
        self.mutate(user_id, |forest| {
            let next = forest.insert_prompt(parent, prompt)?;
            let created = next.get_prompt(&id)?.clone();
            Ok((next, created))
        })
        .await
    }

    /// Edit content; identical text keeps the current version
    pub async fn update_content(&self, user_id: &str, id: &str, content: &str) -> StoreResult<Prompt> {
        self.mutate(user_id, |forest| {
            let next = forest.update_content(id, content)?;
            let updated = next.get_prompt(id)?.clone();
            Ok((next, updated))
        })
        .await
    }

    pub async fn restore_version(
        &self,
        user_id: &str,
        id: &str,
        version_number: u32,
    ) -> StoreResult<Prompt> {
        self.mutate(user_id, |forest| {
            let next = forest.restore_version(id, version_number)?;
            let updated = next.get_prompt(id)?.clone();
            Ok((next, updated))
        })
        .await
    }

    pub async fn rename(&self, user_id: &str, id: &str, name: &str) -> StoreResult<Item> {
        self.mutate(user_id, |forest| {
            let next = forest.rename(id, name)?;
            let renamed = item_in(&next, id)?;
            Ok((next, renamed))
        })
        .await
    }

    pub async fn set_favorite(&self, user_id: &str, id: &str, is_favorite: bool) -> StoreResult<Prompt> {
        self.mutate(user_id, |forest| {
            let next = forest.set_favorite(id, is_favorite)?;
            let updated = next.get_prompt(id)?.clone();
            Ok((next, updated))
        })
        .await
    }

    pub async fn toggle_favorite(&self, user_id: &str, id: &str) -> StoreResult<Prompt> {
        self.mutate(user_id, |forest| {
            let current = forest.get_prompt(id)?.is_favorite;
            let next = forest.set_favorite(id, !current)?;
            let updated = next.get_prompt(id)?.clone();
            Ok((next, updated))
        })
        .await
    }

    pub async fn move_item(&self, user_id: &str, id: &str, parent: &ParentRef) -> StoreResult<Item> {
        self.mutate(user_id, |forest| {
            let next = forest.move_item(id, parent)?;
            let moved = item_in(&next, id)?;
            Ok((next, moved))
        })
        .await
    }

    /// Duplicate a prompt without its history
    pub async fn branch_prompt(&self, user_id: &str, id: &str) -> StoreResult<Prompt> {
        self.mutate(user_id, |forest| {
            let (next, branch_id) = forest.branch_prompt(id)?;
            let branched = next.get_prompt(&branch_id)?.clone();
            Ok((next, branched))
        })
        .await
    }

    /// Delete a prompt or an empty folder
    pub async fn delete_item(&self, user_id: &str, id: &str) -> StoreResult<()> {
        self.mutate(user_id, |forest| Ok((forest.remove_item(id)?, ())))
            .await
    }

    /// Drop a user's whole library from storage and the cache
    pub async fn delete_user(&self, user_id: &str) -> StoreResult<()> {
        validate_user_id(user_id)?;
        let mut forests = self.forests.lock().await;
        self.storage.delete_user(user_id).await?;
        forests.remove(user_id);
        info!("Deleted library for user {}", user_id);
        Ok(())
    }

    // ==================== Import / Export ====================

    pub async fn export_json(&self, user_id: &str) -> StoreResult<String> {
        transfer::export_json(&self.forest(user_id).await?)
    }

    /// Import prompts under `parent`, returning how many were added
    pub async fn import_json(&self, user_id: &str, json: &str, parent: &ParentRef) -> StoreResult<usize> {
        let payload = transfer::parse_import(json)?;
        self.mutate(user_id, |forest| transfer::apply_import(forest, payload, parent))
            .await
    }

    // ==================== Suggestions ====================

    pub async fn suggest_improvements(&self, user_id: &str, id: &str) -> StoreResult<Vec<String>> {
        let provider = self
            .suggestions
            .clone()
            .ok_or_else(|| StoreError::Config("No suggestion provider configured".to_string()))?;
        let content = self.get_prompt(user_id, id).await?.content;
        provider.suggest(&content).await
    }

    // ==================== Internals ====================

    async fn cached<'a>(
        &self,
        forests: &'a mut HashMap<String, Forest>,
        user_id: &str,
    ) -> StoreResult<&'a Forest> {
        validate_user_id(user_id)?;
        if !forests.contains_key(user_id) {
            let records = self.storage.load_records(user_id).await?;
            let forest = Forest::from_records(records)?;
            info!("Loaded {} items for user {}", forest.len(), user_id);
            forests.insert(user_id.to_string(), forest);
        }
        forests
            .get(user_id)
            .ok_or_else(|| StoreError::Storage(format!("Library for {} not loaded", user_id)))
    }

    /// Apply one pure operation, persist the result, then publish it
    async fn mutate<T>(
        &self,
        user_id: &str,
        op: impl FnOnce(&Forest) -> StoreResult<(Forest, T)>,
    ) -> StoreResult<T> {
        let mut forests = self.forests.lock().await;
        let current = self.cached(&mut forests, user_id).await?;
        let (next, output) = op(current)?;

        if &next != current {
            self.storage
                .save_records(user_id, &next.to_records(user_id))
                .await?;
            debug!("Persisted library for user {} ({} items)", user_id, next.len());
            forests.insert(user_id.to_string(), next);
        }

        Ok(output)
    }
}

fn item_in(forest: &Forest, id: &str) -> StoreResult<Item> {
    forest
        .get(id)
        .cloned()
        .ok_or_else(|| StoreError::Core(prompt_core::CoreError::NotFound(id.to_string())))
}

fn folder_in(forest: &Forest, id: &ItemId) -> StoreResult<Folder> {
    match item_in(forest, id)? {
        Item::Folder(folder) => Ok(folder),
        Item::Prompt(_) => Err(StoreError::Storage(format!("{} is not a folder", id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prompt_core::ItemRecord;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    /// Storage whose saves can be switched to fail
    #[derive(Default)]
    struct FlakyStorage {
        fail_saves: AtomicBool,
        saved: std::sync::Mutex<Vec<ItemRecord>>,
    }

    #[async_trait]
    impl ForestStorage for FlakyStorage {
        async fn load_records(&self, _user_id: &str) -> StoreResult<Vec<ItemRecord>> {
            Ok(self.saved.lock().unwrap().clone())
        }

        async fn save_records(&self, _user_id: &str, records: &[ItemRecord]) -> StoreResult<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(StoreError::Storage("disk full".to_string()));
            }
            *self.saved.lock().unwrap() = records.to_vec();
            Ok(())
        }

        async fn delete_user(&self, _user_id: &str) -> StoreResult<()> {
            self.saved.lock().unwrap().clear();
            Ok(())
        }
    }

    struct EchoSuggestions;

    #[async_trait]
    impl SuggestionProvider for EchoSuggestions {
        async fn suggest(&self, text: &str) -> StoreResult<Vec<String>> {
            Ok(vec![format!("Clarify: {}", text)])
        }
    }

    fn file_library(dir: &std::path::Path) -> PromptLibrary {
        PromptLibrary::new(Arc::new(FileForestStorage::new(dir)))
    }

    #[tokio::test]
    async fn test_create_edit_and_reload() {
        let dir = tempdir().unwrap();
        let library = file_library(dir.path());

        let folder = library
            .create_folder("alice", "Marketing", &ParentRef::Root)
            .await
            .unwrap();
        let parent = ParentRef::folder(folder.id.clone());
        let prompt = library
            .create_prompt("alice", "Launch", "v1", &parent)
            .await
            .unwrap();
        library
            .update_content("alice", &prompt.id, "v2")
            .await
            .unwrap();

        let reopened = file_library(dir.path());
        let loaded = reopened.get_prompt("alice", &prompt.id).await.unwrap();
        assert_eq!(loaded.content, "v2");
        assert_eq!(loaded.version_number, 2);
        assert_eq!(loaded.parent_id, parent);
        assert_eq!(reopened.forest("alice").await.unwrap(), library.forest("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let dir = tempdir().unwrap();
        let library = file_library(dir.path());
        library
            .create_prompt("alice", "Mine", "secret", &ParentRef::Root)
            .await
            .unwrap();

        assert!(library.forest("bob").await.unwrap().is_empty());
        assert!(matches!(
            library.forest("../bob").await,
            Err(StoreError::InvalidUser(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_state() {
        let storage = Arc::new(FlakyStorage::default());
        let library = PromptLibrary::new(storage.clone());
        let prompt = library
            .create_prompt("u", "Draft", "v1", &ParentRef::Root)
            .await
            .unwrap();

        storage.fail_saves.store(true, Ordering::SeqCst);
        let result = library.update_content("u", &prompt.id, "v2").await;
        assert!(matches!(result, Err(StoreError::Storage(_))));

        let current = library.get_prompt("u", &prompt.id).await.unwrap();
        assert_eq!(current.content, "v1");
        assert_eq!(current.version_number, 1);
    }

    #[tokio::test]
    async fn test_noop_edit_skips_save() {
        let storage = Arc::new(FlakyStorage::default());
        let library = PromptLibrary::new(storage.clone());
        let prompt = library
            .create_prompt("u", "Draft", "same", &ParentRef::Root)
            .await
            .unwrap();

        storage.fail_saves.store(true, Ordering::SeqCst);
        let unchanged = library.update_content("u", &prompt.id, "same").await.unwrap();
        assert_eq!(unchanged.version_number, 1);
    }

    #[tokio::test]
    async fn test_delete_requires_empty_folder() {
        let dir = tempdir().unwrap();
        let library = file_library(dir.path());
        let folder = library
            .create_folder("u", "Box", &ParentRef::Root)
            .await
            .unwrap();
        let prompt = library
            .create_prompt("u", "Inside", "x", &ParentRef::folder(folder.id.clone()))
            .await
            .unwrap();

        assert!(matches!(
            library.delete_item("u", &folder.id).await,
            Err(StoreError::Core(prompt_core::CoreError::InvalidState(_)))
        ));

        library.delete_item("u", &prompt.id).await.unwrap();
        library.delete_item("u", &folder.id).await.unwrap();
        assert!(library.forest("u").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_clears_storage_and_cache() {
        let dir = tempdir().unwrap();
        let library = file_library(dir.path());
        library
            .create_prompt("u", "Gone", "soon", &ParentRef::Root)
            .await
            .unwrap();
        assert!(dir.path().join("u.json").exists());

        library.delete_user("u").await.unwrap();
        assert!(!dir.path().join("u.json").exists());
        assert!(library.forest("u").await.unwrap().is_empty());

        assert!(matches!(
            library.delete_user("../u").await,
            Err(StoreError::InvalidUser(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_favorite_and_filter() {
        let dir = tempdir().unwrap();
        let library = file_library(dir.path());
        let a = library
            .create_prompt("u", "Alpha", "first", &ParentRef::Root)
            .await
            .unwrap();
        library
            .create_prompt("u", "Beta", "second", &ParentRef::Root)
            .await
            .unwrap();

        let toggled = library.toggle_favorite("u", &a.id).await.unwrap();
        assert!(toggled.is_favorite);
        assert_eq!(toggled.version_number, 1);

        let favorites = library
            .list_prompts("u", &PromptFilter::new().favorites_only())
            .await
            .unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, a.id);

        let found = library
            .list_prompts("u", &PromptFilter::new().with_search("SECOND"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Beta");
    }

    #[tokio::test]
    async fn test_branch_and_versions() {
        let dir = tempdir().unwrap();
        let library = file_library(dir.path());
        let prompt = library
            .create_prompt("u", "Base", "v1", &ParentRef::Root)
            .await
            .unwrap();
        library.update_content("u", &prompt.id, "v2").await.unwrap();

        let branched = library.branch_prompt("u", &prompt.id).await.unwrap();
        assert_eq!(branched.content, "v2");
        assert_eq!(branched.version_number, 1);

        let versions = library.list_versions("u", &prompt.id).await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].version_number, 2);

        let restored = library.restore_version("u", &prompt.id, 1).await.unwrap();
        assert_eq!(restored.content, "v1");
        assert_eq!(restored.version_number, 3);
    }

    #[tokio::test]
    async fn test_suggestions_need_provider() {
        let dir = tempdir().unwrap();
        let library = file_library(dir.path());
        let prompt = library
            .create_prompt("u", "Ask", "Summarise this", &ParentRef::Root)
            .await
            .unwrap();

        assert!(matches!(
            library.suggest_improvements("u", &prompt.id).await,
            Err(StoreError::Config(_))
        ));

        let library = file_library(dir.path()).with_suggestions(Arc::new(EchoSuggestions));
        let suggestions = library.suggest_improvements("u", &prompt.id).await.unwrap();
        assert_eq!(suggestions, vec!["Clarify: Summarise this".to_string()]);
    }
}
