//! Forest storage trait and implementations

use async_trait::async_trait;
use log::debug;
use prompt_core::ItemRecord;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{StoreError, StoreResult};

/// Durable home for each user's items as flat records
#[async_trait]
pub trait ForestStorage: Send + Sync {
    /// Load a user's records in pre-order; an unknown user has none
    async fn load_records(&self, user_id: &str) -> StoreResult<Vec<ItemRecord>>;

    /// Replace a user's records
    async fn save_records(&self, user_id: &str, records: &[ItemRecord]) -> StoreResult<()>;

    /// Drop everything stored for a user
    async fn delete_user(&self, user_id: &str) -> StoreResult<()>;
}

/// One pretty-printed JSON file per user
#[derive(Debug, Clone)]
pub struct FileForestStorage {
    base_path: PathBuf,
}

impl FileForestStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn user_path(&self, user_id: &str) -> StoreResult<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.base_path.join(format!("{}.json", user_id)))
    }
}

#[async_trait]
impl ForestStorage for FileForestStorage {
    async fn load_records(&self, user_id: &str) -> StoreResult<Vec<ItemRecord>> {
        let path = self.user_path(user_id)?;

        if !path.exists() {
            debug!("No library file for user {}", user_id);
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path).await?;
        let records: Vec<ItemRecord> = serde_json::from_str(&contents)?;

        if let Some(stranger) = records.iter().find(|record| record.user_id != user_id) {
            return Err(StoreError::Storage(format!(
                "{:?} holds a record owned by {}",
                path, stranger.user_id
            )));
        }

        Ok(records)
    }

    async fn save_records(&self, user_id: &str, records: &[ItemRecord]) -> StoreResult<()> {
        let path = self.user_path(user_id)?;
        fs::create_dir_all(&self.base_path).await?;

        let contents = serde_json::to_string_pretty(records)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!("Saved {} records for user {}", records.len(), user_id);
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<()> {
        let path = self.user_path(user_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// User ids become file names, so keep them to a safe character set
pub fn validate_user_id(user_id: &str) -> StoreResult<()> {
    let valid = !user_id.is_empty()
        && !user_id.starts_with('.')
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidUser(user_id.to_string()))
    }
}
