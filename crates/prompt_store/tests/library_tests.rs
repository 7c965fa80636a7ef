//! Integration tests for the file-backed prompt library

use std::sync::Arc;

use prompt_core::{ItemNode, ParentRef, PromptFilter};
use prompt_store::{FileForestStorage, LibraryConfig, PromptLibrary, StoreError};
use tempfile::tempdir;

fn open(dir: &std::path::Path) -> PromptLibrary {
    PromptLibrary::new(Arc::new(FileForestStorage::new(dir)))
}

#[tokio::test]
async fn test_export_from_one_user_import_into_another() {
    let dir = tempdir().unwrap();
    let library = open(dir.path());

    let folder = library
        .create_folder("alice", "Support", &ParentRef::Root)
        .await
        .unwrap();
    let prompt = library
        .create_prompt(
            "alice",
            "Refund reply",
            "Apologise and explain the refund steps",
            &ParentRef::folder(folder.id.clone()),
        )
        .await
        .unwrap();
    library
        .update_content("alice", &prompt.id, "Apologise, then list the refund steps")
        .await
        .unwrap();

    let json = library.export_json("alice").await.unwrap();
    let imported = library
        .import_json("bob", &json, &ParentRef::Root)
        .await
        .unwrap();
    assert_eq!(imported, 1);

    let tree = library.tree("bob").await.unwrap();
    assert_eq!(tree.len(), 1);
    match &tree[0] {
        ItemNode::Folder { folder: copy, children } => {
            assert_eq!(copy.name, "Support");
            assert_ne!(copy.id, folder.id);
            assert_eq!(children.len(), 1);
            match &children[0] {
                ItemNode::Prompt(p) => {
                    assert_ne!(p.id, prompt.id);
                    assert_eq!(p.version_number, 2);
                    assert_eq!(p.history[0].content, "Apologise and explain the refund steps");
                }
                other => panic!("expected prompt, got {other:?}"),
            }
        }
        other => panic!("expected folder, got {other:?}"),
    }

    // alice is untouched by bob's import
    assert_eq!(library.forest("alice").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_import_survives_reopen() {
    let dir = tempdir().unwrap();
    {
        let library = open(dir.path());
        let count = library
            .import_json(
                "carol",
                r#"[{"name": "Tweet", "content": "Draft a tweet about {topic}", "is_favorite": true}]"#,
                &ParentRef::Root,
            )
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    let reopened = open(dir.path());
    let favorites = reopened
        .list_prompts("carol", &PromptFilter::new().favorites_only())
        .await
        .unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].name, "Tweet");
}

#[tokio::test]
async fn test_move_and_folder_options() {
    let dir = tempdir().unwrap();
    let library = open(dir.path());

    let parent = library
        .create_folder("dave", "Work", &ParentRef::Root)
        .await
        .unwrap();
    let child = library
        .create_folder("dave", "Reports", &ParentRef::folder(parent.id.clone()))
        .await
        .unwrap();
    let prompt = library
        .create_prompt("dave", "Weekly", "Summarise the week", &ParentRef::Root)
        .await
        .unwrap();

    let options = library.folder_options("dave", None, true).await.unwrap();
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Root", "Work", "Work > Reports"]);

    library
        .move_item("dave", &prompt.id, &ParentRef::folder(child.id.clone()))
        .await
        .unwrap();
    let moved = library.get_prompt("dave", &prompt.id).await.unwrap();
    assert_eq!(moved.parent_id, ParentRef::folder(child.id.clone()));
    assert_eq!(moved.version_number, 1);

    let result = library
        .move_item("dave", &parent.id, &ParentRef::folder(child.id.clone()))
        .await;
    assert!(matches!(result, Err(StoreError::Core(_))));

    let options = library
        .folder_options("dave", Some(&parent.id), false)
        .await
        .unwrap();
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Work > Reports"]);

    let targets = library.move_targets("dave", &parent.id).await.unwrap();
    assert_eq!(targets.len(), 0);

    let targets = library.move_targets("dave", &prompt.id).await.unwrap();
    let labels: Vec<&str> = targets.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Root", "Work"]);
}

#[tokio::test]
async fn test_library_from_config_uses_data_dir() {
    let dir = tempdir().unwrap();
    let config = LibraryConfig::load_from(dir.path(), |_| None);
    let library = PromptLibrary::from_config(&config);

    library
        .create_prompt("erin", "Hello", "Say hello", &ParentRef::Root)
        .await
        .unwrap();
    assert!(dir.path().join("erin.json").exists());
}
