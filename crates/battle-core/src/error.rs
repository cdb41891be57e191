//! Battle setup and engine-level errors.

/// Errors raised while configuring or driving a battle.
///
/// Only [`BattleError::InvalidArena`] is fatal to the spawn; everything else
/// is local and recoverable, logged by the caller and ignored.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    /// The requested arena does not exist. The battle cannot start.
    #[error("invalid arena index {index} (arena count {count})")]
    InvalidArena { index: usize, count: usize },

    /// A battle needs at least one combatant on each side.
    #[error("battle roster is missing a {side} side")]
    EmptySide { side: &'static str },

    /// A skill id referenced by a combatant or item is not in the skill book.
    #[error("unknown skill id `{0}`")]
    UnknownSkill(String),
}
