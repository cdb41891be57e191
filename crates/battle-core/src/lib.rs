//! Deterministic rhythm-combat rules shared across clients.
//!
//! `battle-core` defines the canonical combat logic: the beat-timing substrate
//! (input window classification, beat-quantized scheduling, quick-time
//! prompts), the per-battle turn state machine, and the damage/affinity
//! resolution pipeline. All state mutation flows through
//! [`engine::CombatEngine`], and supporting crates depend on the types
//! re-exported here. Audio playback, rendering, and persistence live in
//! collaborator crates; this crate only consumes plain beat events and
//! produces typed combat events.
pub mod character;
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod events;
pub mod skill;
pub mod stats;
pub mod timing;

pub use character::{CharacterTemplate, Combatant, CombatantId};
pub use combat::{AffinityBook, AffinityKind, ResolveError};
pub use config::BattleConfig;
pub use engine::{
    BattleOutcome, BattleRoster, BattleSetup, CombatEngine, InputAction, InventoryItem, TurnPhase,
};
pub use error::BattleError;
pub use events::{CombatEvent, ViewEvent};
pub use skill::{CostKind, Skill, SkillKind, TargetFlags};
pub use stats::{
    BaseStats, Element, Progression, StatKind, StatModifier, StatModifierSet, StrengthKind,
};
pub use timing::{
    BeatClock, BeatEvent, BeatResult, BeatScheduler, BeatWindow, MarkerEvent, QteState,
    QuickTimeWindow,
};
