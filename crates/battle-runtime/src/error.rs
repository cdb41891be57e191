//! Runtime-level errors.

use battle_core::BattleError;
use thiserror::Error;

use crate::repository::RepositoryError;

/// Errors surfaced by the battle runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
