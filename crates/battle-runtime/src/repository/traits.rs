//! Repository contract for the persistent battle record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use battle_core::{AffinityBook, BaseStats, InventoryItem};

use super::Result;

/// Everything a save file records, keyed by template id.
///
/// Missing or corrupt save data loads as this default (a fresh record),
/// never as an error.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// Post-battle stat snapshots per character.
    pub character_stats: BTreeMap<String, BaseStats>,
    pub inventory: Vec<InventoryItem>,
    /// Discovered weaknesses and strengths.
    pub affinity: AffinityBook,
}

/// Repository for the save record.
///
/// Section writers replace one slice of the record; `flush` guarantees the
/// whole record has reached durable storage.
pub trait SaveRepository: Send + Sync {
    /// Load the full record, defaulting when none exists.
    fn load(&self) -> Result<SaveData>;

    fn save_character_stats(&self, stats: &BTreeMap<String, BaseStats>) -> Result<()>;

    fn save_inventory(&self, inventory: &[InventoryItem]) -> Result<()>;

    fn save_affinity_log(&self, affinity: &AffinityBook) -> Result<()>;

    fn flush(&self) -> Result<()>;
}
