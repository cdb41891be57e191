//! In-memory SaveRepository implementation for tests and local runs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use battle_core::{AffinityBook, BaseStats, InventoryItem};

use super::{RepositoryError, Result, SaveData, SaveRepository};

/// In-memory implementation of SaveRepository.
#[derive(Default)]
pub struct InMemorySaveRepository {
    data: RwLock<SaveData>,
}

impl InMemorySaveRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with an existing record, as if loaded from disk.
    pub fn with_data(data: SaveData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }
}

impl SaveRepository for InMemorySaveRepository {
    fn load(&self) -> Result<SaveData> {
        let data = self
            .data
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(data.clone())
    }

    fn save_character_stats(&self, stats: &BTreeMap<String, BaseStats>) -> Result<()> {
        let mut data = self
            .data
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        data.character_stats = stats.clone();
        Ok(())
    }

    fn save_inventory(&self, inventory: &[InventoryItem]) -> Result<()> {
        let mut data = self
            .data
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        data.inventory = inventory.to_vec();
        Ok(())
    }

    fn save_affinity_log(&self, affinity: &AffinityBook) -> Result<()> {
        let mut data = self
            .data
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        data.affinity = affinity.clone();
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
