//! End-to-end scenarios over the forest and version ledger

use prompt_core::{
    apply_edit, list_folder_options, list_versions, CoreError, Folder, Forest, ParentRef, Prompt,
};

#[test]
fn test_excluding_prompt_folder_keeps_its_subfolders_as_targets() {
    let sub = Folder::new("Campaigns", ParentRef::Root)
        .unwrap()
        .with_id("f2");
    let prompt = Prompt::new("Launch", "v1", ParentRef::Root)
        .unwrap()
        .with_id("p");
    let forest = Forest::new()
        .insert_folder(&ParentRef::Root, marketing())
        .unwrap()
        .insert_folder(&ParentRef::folder("f1"), sub)
        .unwrap()
        .insert_prompt(&ParentRef::folder("f1"), prompt)
        .unwrap();

    let options = list_folder_options(&forest, Some("f1"), true);
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Root", "Marketing > Campaigns"]);

    let moved = forest.move_item("p", &options[1].id).unwrap();
    assert_eq!(moved.get("p").unwrap().parent_id(), &ParentRef::folder("f2"));
}

fn marketing() -> Folder {
    Folder::new("Marketing", ParentRef::Root)
        .unwrap()
        .with_id("f1")
}

#[test]
fn test_folder_prompt_edit_scenario() {
    let forest = Forest::new();
    let forest = forest.insert_folder(&ParentRef::Root, marketing()).unwrap();
    assert_eq!(forest.roots().len(), 1);
    assert_eq!(forest.roots()[0].id(), "f1");

    let p1 = Prompt::new("Launch", "v1", ParentRef::Root)
        .unwrap()
        .with_id("p1");
    let forest = forest.insert_prompt(&ParentRef::folder("f1"), p1).unwrap();
    let children = forest.children(&ParentRef::folder("f1"));
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id(), "p1");

    let forest = forest.update_content("p1", "v2").unwrap();
    let p1 = forest.get_prompt("p1").unwrap();
    assert_eq!(p1.version_number, 2);
    assert_eq!(p1.content, "v2");
    assert_eq!(p1.history.len(), 1);
    assert_eq!(p1.history[0].version_number, 1);
    assert_eq!(p1.history[0].content, "v1");

    let forest = forest.update_content("p1", "v2").unwrap();
    assert_eq!(forest.get_prompt("p1").unwrap().version_number, 2);
}

#[test]
fn test_folder_options_scenario() {
    let sub = Folder::new("Campaigns", ParentRef::Root)
        .unwrap()
        .with_id("f2");
    let forest = Forest::new()
        .insert_folder(&ParentRef::Root, marketing())
        .unwrap()
        .insert_folder(&ParentRef::folder("f1"), sub)
        .unwrap();

    let labels: Vec<String> = list_folder_options(&forest, None, false)
        .into_iter()
        .map(|option| option.label)
        .collect();
    assert_eq!(labels, vec!["Marketing", "Marketing > Campaigns"]);
}

#[test]
fn test_history_listing_is_strictly_descending() {
    let mut prompt = Prompt::new("Draft", "a", ParentRef::Root).unwrap();
    for content in ["b", "c", "c", "d", "b"] {
        prompt = apply_edit(&prompt, content).unwrap().0;
        assert!(prompt.is_consistent());
    }
    assert_eq!(prompt.version_number, 5);

    let versions = list_versions(&prompt);
    let numbers: Vec<u32> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![5, 4, 3, 2, 1]);
    assert!(numbers.windows(2).all(|pair| pair[0] > pair[1]));
}

#[test]
fn test_failed_operation_leaves_forest_usable() {
    let forest = Forest::new()
        .insert_folder(&ParentRef::Root, marketing())
        .unwrap();
    let snapshot = forest.clone();

    let orphan = Prompt::new("Lost", "text", ParentRef::Root).unwrap();
    let err = forest
        .insert_prompt(&ParentRef::folder("nowhere"), orphan)
        .unwrap_err();
    assert_eq!(err, CoreError::NotFound("nowhere".to_string()));
    assert_eq!(forest, snapshot);
}
