//! Character templates and battle-local combatant instances.
//!
//! Templates are immutable definitions; every battle clones them into
//! [`Combatant`] runtime instances so mid-battle mutation can never corrupt
//! the source data. Surviving stats are written back to persistence by the
//! runtime when the battle ends.

use crate::stats::{ActiveModifiers, BaseStats, StatKind, StatModifierSet};

// ============================================================================
// Template
// ============================================================================

/// Immutable character definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterTemplate {
    /// Stable persistence key.
    pub id: String,
    pub display_name: String,
    pub stats: BaseStats,
    /// Owned skill ids.
    pub skills: Vec<String>,
    /// Skill id the Attack command auto-selects.
    pub weapon_skill: String,
    pub is_player: bool,
}

// ============================================================================
// Combatant Id
// ============================================================================

/// Battle-local combatant handle, unique per battle instance.
///
/// Plays the role of the per-battle UUID in the view/save protocol; the
/// persistent identity is the template id string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u32);

impl std::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "combatant-{}", self.0)
    }
}

// ============================================================================
// Combatant
// ============================================================================

/// Mutable battle-local state cloned from a template at battle start.
///
/// Invariant: `0 <= hp <= max_hp()` and `0 <= sp <= max_sp()` where the
/// maxima are post-modifier derived values; both are re-clamped on every
/// mutation and whenever the modifier list changes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: CombatantId,
    pub template_id: String,
    pub display_name: String,
    pub is_player: bool,
    pub skills: Vec<String>,
    pub weapon_skill: String,
    stats: BaseStats,
    hp: u32,
    sp: u32,
    alive: bool,
    guarding: bool,
    guard_turns: u32,
    modifiers: ActiveModifiers,
}

impl Combatant {
    /// Clone a template into a battle instance at full resources.
    pub fn from_template(id: CombatantId, template: &CharacterTemplate) -> Self {
        Self {
            id,
            template_id: template.id.clone(),
            display_name: template.display_name.clone(),
            is_player: template.is_player,
            skills: template.skills.clone(),
            weapon_skill: template.weapon_skill.clone(),
            hp: template.stats.max_hp,
            sp: template.stats.max_sp,
            stats: template.stats.clone(),
            alive: true,
            guarding: false,
            guard_turns: 0,
            modifiers: ActiveModifiers::new(),
        }
    }

    // ===== derived stats (post-modifier) =====

    pub fn max_hp(&self) -> u32 {
        let scaled = self.stats.max_hp as f32 * self.modifiers.multiplier_for(StatKind::Hp);
        (scaled.round() as u32).max(1)
    }

    pub fn max_sp(&self) -> u32 {
        let scaled = self.stats.max_sp as f32 * self.modifiers.multiplier_for(StatKind::Sp);
        scaled.round() as u32
    }

    pub fn atk(&self) -> f32 {
        self.stats.atk * self.modifiers.multiplier_for(StatKind::Atk)
    }

    pub fn def(&self) -> f32 {
        (self.stats.def * self.modifiers.multiplier_for(StatKind::Def)).clamp(0.0, 1.0)
    }

    pub fn evd(&self) -> f32 {
        (self.stats.evd * self.modifiers.multiplier_for(StatKind::Evd)).clamp(0.0, 1.0)
    }

    pub fn vit(&self) -> f32 {
        self.stats.vit * self.modifiers.multiplier_for(StatKind::Vit)
    }

    // ===== resources =====

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn sp(&self) -> u32 {
        self.sp
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Subtract damage, clamping at zero. Returns true if this kill dropped
    /// the combatant to dead.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 && self.alive {
            self.alive = false;
            return true;
        }
        false
    }

    /// Restore HP, clamped to the post-modifier maximum.
    pub fn heal(&mut self, amount: u32) {
        self.hp = (self.hp + amount).min(self.max_hp());
    }

    /// Adjust SP by a signed delta, clamped into `0..=max_sp()`.
    pub fn change_sp(&mut self, delta: i32) {
        let next = self.sp as i64 + delta as i64;
        self.sp = next.clamp(0, self.max_sp() as i64) as u32;
    }

    /// Bring a dead combatant back with the given HP (clamped, at least 1).
    pub fn revive(&mut self, amount: u32) {
        self.alive = true;
        self.hp = amount.clamp(1, self.max_hp());
    }

    // ===== guard =====

    pub fn is_guarding(&self) -> bool {
        self.guarding
    }

    pub fn guard(&mut self, turns: u32) {
        self.guarding = true;
        self.guard_turns = turns;
    }

    /// Consume one guarded turn; clears the stance when the last one is
    /// spent. Returns true if the combatant was guarding.
    pub fn consume_guard_turn(&mut self) -> bool {
        if !self.guarding {
            return false;
        }
        self.guard_turns = self.guard_turns.saturating_sub(1);
        if self.guard_turns == 0 {
            self.guarding = false;
        }
        true
    }

    // ===== modifiers =====

    pub fn apply_modifier(&mut self, set: StatModifierSet) {
        self.modifiers.apply(set);
        self.reclamp();
    }

    /// Turn-start housekeeping: modifier durations tick down and resources
    /// re-clamp against the possibly changed maxima.
    pub fn begin_turn(&mut self) {
        self.modifiers.tick();
        self.reclamp();
    }

    pub fn clear_modifiers(&mut self) {
        self.modifiers.clear();
        self.reclamp();
    }

    fn reclamp(&mut self) {
        self.hp = self.hp.min(self.max_hp());
        self.sp = self.sp.min(self.max_sp());
    }

    // ===== stats access =====

    pub fn stats(&self) -> &BaseStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut BaseStats {
        &mut self.stats
    }
}
