//! Version Ledger
//!
//! Decides when an edit to a prompt's content becomes a new version and
//! archives the superseded text. All functions are pure: they take a prompt
//! by reference and hand back an updated copy.

use chrono::{DateTime, Utc};
use log::debug;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{require_non_empty, CoreError, CoreResult};
use crate::types::{Prompt, VersionRecord};

/// Suffix appended to the name of a branched prompt
pub const BRANCH_SUFFIX: &str = " (branch)";

/// Apply a content edit, stamping any archived record with the current time
pub fn apply_edit(
    prompt: &Prompt,
    new_content: &str,
) -> CoreResult<(Prompt, Option<VersionRecord>)> {
    apply_edit_at(prompt, new_content, Utc::now())
}

/// Apply a content edit at an explicit point in time
///
/// Saving identical text is a no-op: the prompt comes back unchanged and no
/// record is produced.
pub fn apply_edit_at(
    prompt: &Prompt,
    new_content: &str,
    now: DateTime<Utc>,
) -> CoreResult<(Prompt, Option<VersionRecord>)> {
    require_non_empty("Prompt content", new_content)?;

    if new_content == prompt.content {
        return Ok((prompt.clone(), None));
    }

    let record = VersionRecord {
        version_number: prompt.version_number,
        content: prompt.content.clone(),
        timestamp: now,
    };

    let next_version = prompt.version_number.checked_add(1).ok_or_else(|| {
        CoreError::InvalidState(format!("Prompt {} has run out of version numbers", prompt.id))
    })?;

    let mut updated = prompt.clone();
    updated.content = new_content.to_string();
    updated.version_number = next_version;
    updated.updated_at = now;
    updated.history.insert(0, record.clone());
    updated
        .history
        .sort_by(|a, b| b.version_number.cmp(&a.version_number));

    debug!(
        "Prompt {} advanced to version {}",
        updated.id, updated.version_number
    );

    Ok((updated, Some(record)))
}

/// All versions of a prompt, newest first, including the live content
pub fn list_versions(prompt: &Prompt) -> Vec<VersionRecord> {
    let mut by_number: BTreeMap<u32, VersionRecord> = prompt
        .history
        .iter()
        .map(|record| (record.version_number, record.clone()))
        .collect();

    by_number.insert(
        prompt.version_number,
        VersionRecord {
            version_number: prompt.version_number,
            content: prompt.content.clone(),
            timestamp: prompt.updated_at,
        },
    );

    by_number.into_values().rev().collect()
}

/// Bring back the text of an earlier version as a new edit
///
/// History is never rewritten: restoring version 2 of a prompt at version 5
/// archives version 5 and produces version 6 holding version 2's text.
pub fn restore_version(
    prompt: &Prompt,
    version_number: u32,
) -> CoreResult<(Prompt, Option<VersionRecord>)> {
    let content = list_versions(prompt)
        .into_iter()
        .find(|record| record.version_number == version_number)
        .map(|record| record.content)
        .ok_or_else(|| CoreError::VersionNotFound {
            id: prompt.id.clone(),
            version: version_number,
        })?;

    apply_edit(prompt, &content)
}

/// Renumber a prompt's archived versions so they run `n` down to 1
///
/// Records are ordered by their stored number, then by timestamp, newest
/// first. Duplicates keep their own slot and the live content becomes
/// version `n + 1`.
pub fn renumber_history(prompt: &Prompt) -> Prompt {
    let mut renumbered = prompt.clone();
    renumbered.history.sort_by(|a, b| {
        b.version_number
            .cmp(&a.version_number)
            .then(b.timestamp.cmp(&a.timestamp))
    });

    let count = renumbered.history.len() as u32;
    for (index, record) in renumbered.history.iter_mut().enumerate() {
        record.version_number = count - index as u32;
    }
    renumbered.version_number = count + 1;
    renumbered
}

/// Copy a prompt's current text into a fresh prompt at version 1
pub fn branch(prompt: &Prompt) -> Prompt {
    let now = Utc::now();
    Prompt {
        id: Uuid::new_v4().to_string(),
        name: format!("{}{}", prompt.name, BRANCH_SUFFIX),
        parent_id: prompt.parent_id.clone(),
        content: prompt.content.clone(),
        version_number: 1,
        history: Vec::new(),
        is_favorite: false,
        created_at: now,
        updated_at: now,
    }
}
