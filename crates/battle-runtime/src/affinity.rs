//! Persistent affinity discovery log.

use std::sync::Arc;

use battle_core::{AffinityBook, AffinityKind, Element};

use crate::repository::{Result, SaveRepository};

/// Feeds engine affinity observations into the save record.
///
/// The logger owns the authoritative [`AffinityBook`]; the engine carries a
/// battle-local copy hydrated from it at spawn. Notes are idempotent, and
/// the record is only rewritten when an observation is genuinely new.
pub struct AffinityLogger {
    book: AffinityBook,
    repository: Arc<dyn SaveRepository>,
}

impl AffinityLogger {
    /// Hydrate the logger from the save record.
    pub fn load(repository: Arc<dyn SaveRepository>) -> Result<Self> {
        let book = repository.load()?.affinity;
        Ok(Self { book, repository })
    }

    /// Record one observation, persisting on first sight.
    pub fn observe(&mut self, character: &str, element: Element, kind: AffinityKind) -> Result<()> {
        let newly = match kind {
            AffinityKind::Weakness => self.book.note_weakness(character, element),
            AffinityKind::Strength(strength) => {
                self.book.note_strength(character, element, strength)
            }
        };
        if newly {
            tracing::info!(character, %element, ?kind, "new affinity discovered");
            self.repository.save_affinity_log(&self.book)?;
        }
        Ok(())
    }

    pub fn book(&self) -> &AffinityBook {
        &self.book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemorySaveRepository;

    #[test]
    fn repeated_observations_persist_once() {
        let repository = Arc::new(InMemorySaveRepository::new());
        let mut logger = AffinityLogger::load(repository.clone()).unwrap();

        logger
            .observe("shadow", Element::Fire, AffinityKind::Weakness)
            .unwrap();
        logger
            .observe("shadow", Element::Fire, AffinityKind::Weakness)
            .unwrap();

        let saved = repository.load().unwrap();
        assert!(saved.affinity.is_weakness_known("shadow", Element::Fire));
    }

    #[test]
    fn load_hydrates_previous_discoveries() {
        let repository = Arc::new(InMemorySaveRepository::new());
        {
            let mut logger = AffinityLogger::load(repository.clone()).unwrap();
            logger
                .observe("shadow", Element::Ice, AffinityKind::Weakness)
                .unwrap();
        }
        let logger = AffinityLogger::load(repository).unwrap();
        assert!(logger.book().is_weakness_known("shadow", Element::Ice));
    }
}
