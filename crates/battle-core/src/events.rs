//! Typed combat events produced by the engine.
//!
//! Damage, death, revive, and affinity notifications fan out through one
//! enum consumed uniformly by the view layer, the affinity logger, and
//! tests. The engine buffers events; callers drain them with
//! [`crate::engine::CombatEngine::drain_events`]. Nothing here renders;
//! view variants are requests for a collaborator.

use crate::character::CombatantId;
use crate::combat::AffinityKind;
use crate::stats::Element;
use crate::timing::BeatResult;

// ============================================================================
// Combat Event
// ============================================================================

/// One observable outcome inside a battle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatEvent {
    // ----- resolution outcomes -----
    Damage {
        target: CombatantId,
        amount: u32,
        hp_left: u32,
    },
    Evaded {
        target: CombatantId,
    },
    Nullified {
        target: CombatantId,
        element: Element,
    },
    Reflected {
        reflector: CombatantId,
        attacker: CombatantId,
    },
    Resisted {
        target: CombatantId,
        element: Element,
        percent: u8,
    },
    WeaknessHit {
        target: CombatantId,
        element: Element,
    },
    /// A strength or weakness was observed for the first time and belongs in
    /// the persistent affinity log. Keyed by template id, not battle handle.
    AffinityObserved {
        character: String,
        element: Element,
        kind: AffinityKind,
    },
    Healed {
        target: CombatantId,
        amount: u32,
        hp: u32,
    },
    SpChanged {
        target: CombatantId,
        sp: u32,
    },
    ModifierApplied {
        target: CombatantId,
        name: String,
    },
    Death {
        target: CombatantId,
    },
    Revived {
        target: CombatantId,
        hp: u32,
    },

    // ----- turn flow -----
    TurnStarted {
        combatant: CombatantId,
    },
    TurnSkipped {
        combatant: CombatantId,
        reason: SkipReason,
    },
    GuardRaised {
        combatant: CombatantId,
        turns: u32,
    },
    BeatResult(BeatResult),
    BattleEnded {
        outcome: crate::engine::BattleOutcome,
    },
    XpAwarded {
        character: String,
        amount: u32,
        levels_gained: u32,
    },

    // ----- view requests (produced, never rendered here) -----
    View(ViewEvent),
}

/// Why a scheduled combatant did not act this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkipReason {
    Dead,
    Guarding,
}

// ============================================================================
// View Event
// ============================================================================

/// Requests toward the view layer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ViewEvent {
    /// Show this combatant's health display with a numeric value.
    ShowHealth { target: CombatantId, hp: u32 },
    HideHealth { target: CombatantId },
    /// Current target highlight set while cycling.
    HighlightTargets { targets: Vec<CombatantId> },
    /// Populate the skill list with these (id, display name) entries.
    PopulateSkillList { entries: Vec<(String, String)> },
    /// Populate the item list with these (name, count) entries.
    PopulateItemList { entries: Vec<(String, u32)> },
}
