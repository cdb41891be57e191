//! Damage and affinity resolution.
//!
//! The resolver is the only code path that mutates HP/SP: skill costs,
//! offensive damage (evasion, then defense, strength, weakness, clamp),
//! reflection, and the non-offensive skill kinds all flow through here and
//! surface their outcomes as [`crate::events::CombatEvent`]s.

mod affinity;
mod resolver;

pub use affinity::{AffinityBook, AffinityKind};
pub use resolver::{ResolutionCtx, ResolveError, resolve_offensive, use_skill};
