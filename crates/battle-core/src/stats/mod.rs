//! Character stats: elements, base values, modifiers, progression.
//!
//! Base stats are immutable template data cloned into each battle; the
//! mutable runtime layer (current HP/SP, active modifiers, guard state) lives
//! in [`crate::character::Combatant`].

mod base;
mod element;
mod modifiers;

pub use base::{BaseStats, Progression};
pub use element::{Element, StrengthKind};
pub use modifiers::{ActiveModifiers, StatKind, StatModifier, StatModifierSet};
