//! File-based SaveRepository implementation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use directories::ProjectDirs;

use battle_core::{AffinityBook, BaseStats, InventoryItem};

use super::{RepositoryError, Result, SaveData, SaveRepository};

/// File-based implementation of SaveRepository.
///
/// The whole record lives in one JSON file. Section writes update an
/// in-memory copy and rewrite the file through a temp-file rename, so a
/// crash mid-write leaves the previous save intact.
pub struct FileSaveRepository {
    path: PathBuf,
    cache: RwLock<SaveData>,
}

impl FileSaveRepository {
    /// Open (or create) the save record at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let cache = RwLock::new(Self::read_record(&path));
        Ok(Self { path, cache })
    }

    /// Open the save record at the platform's data directory.
    pub fn open_default() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "rhythm-battle")
            .ok_or(RepositoryError::NoSaveDirectory)?;
        Self::new(dirs.data_dir().join("save.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable record is a fresh one, never an error.
    fn read_record(path: &Path) -> SaveData {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return SaveData::default();
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "save file unreadable, starting fresh");
                return SaveData::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "save file corrupt, starting fresh");
                SaveData::default()
            }
        }
    }

    fn persist(&self, data: &SaveData) -> Result<()> {
        let temp_path = self.path.with_extension("json.tmp");
        let bytes =
            serde_json::to_vec_pretty(data).map_err(|e| RepositoryError::Json(e.to_string()))?;

        // Write to temp file, then atomic rename
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), "saved battle record");
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut SaveData)) -> Result<()> {
        let mut cache = self
            .cache
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        apply(&mut cache);
        self.persist(&cache)
    }
}

impl SaveRepository for FileSaveRepository {
    fn load(&self) -> Result<SaveData> {
        let cache = self
            .cache
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(cache.clone())
    }

    fn save_character_stats(&self, stats: &BTreeMap<String, BaseStats>) -> Result<()> {
        self.update(|data| data.character_stats = stats.clone())
    }

    fn save_inventory(&self, inventory: &[InventoryItem]) -> Result<()> {
        self.update(|data| data.inventory = inventory.to_vec())
    }

    fn save_affinity_log(&self, affinity: &AffinityBook) -> Result<()> {
        self.update(|data| data.affinity = affinity.clone())
    }

    fn flush(&self) -> Result<()> {
        let cache = self
            .cache
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        self.persist(&cache)
    }
}
