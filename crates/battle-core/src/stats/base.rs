//! Base stat block and level progression.

use std::collections::{BTreeMap, BTreeSet};

use super::element::{Element, StrengthKind};

// ============================================================================
// Base Stats
// ============================================================================

/// Template stat block for a character.
///
/// - `atk` is a multiplier applied to ATK-scaling skill damage.
/// - `def` is the fraction of incoming damage removed (0-1).
/// - `evd` is the chance to evade an evadable attack (0-1).
/// - `vit` scales XP gained from victories (0-1).
///
/// Cloned into every battle instance; the template itself is never mutated
/// mid-battle. Level-ups mutate the battle-local clone and are written back
/// to persistent storage when the battle ends.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseStats {
    pub max_hp: u32,
    pub max_sp: u32,
    pub atk: f32,
    pub def: f32,
    pub evd: f32,
    pub vit: f32,
    /// Multiplier applied to damage when a weakness is struck.
    pub crit_multiplier: f32,
    /// Elements this character takes critical damage from.
    pub weaknesses: BTreeSet<Element>,
    /// Elements this character nullifies, reflects, or resists.
    pub strengths: BTreeMap<Element, StrengthKind>,
    pub progression: Progression,
}

impl BaseStats {
    /// Minimal stat block used as a building base; affinities empty.
    pub fn flat(max_hp: u32, max_sp: u32) -> Self {
        Self {
            max_hp,
            max_sp,
            atk: 1.0,
            def: 0.0,
            evd: 0.0,
            vit: 0.0,
            crit_multiplier: 2.0,
            weaknesses: BTreeSet::new(),
            strengths: BTreeMap::new(),
            progression: Progression::default(),
        }
    }

    /// Strength configured against the given element, if any.
    pub fn strength_against(&self, element: Element) -> Option<StrengthKind> {
        self.strengths.get(&element).copied()
    }

    /// Returns true if the element is a configured weakness.
    pub fn is_weak_to(&self, element: Element) -> bool {
        self.weaknesses.contains(&element)
    }

    /// Award XP scaled by this character's VIT, leveling up for every
    /// threshold crossed.
    ///
    /// Returns the number of levels gained. Crossing several thresholds in
    /// one award grants them all.
    pub fn gain_xp(&mut self, amount: u32) -> u32 {
        let scaled = (amount as f32 * self.vit).ceil() as u32;
        self.progression.current_xp += scaled;

        let mut levels = 0;
        while self.progression.xp_to_level_up > 0
            && self.progression.current_xp
                >= self.progression.xp_to_level_up * self.progression.current_level.max(1)
        {
            self.level_up();
            levels += 1;
        }
        levels
    }

    fn level_up(&mut self) {
        let p = &self.progression;
        self.max_hp += p.hp_per_level;
        self.max_sp += p.sp_per_level;
        self.atk += p.atk_per_level;
        self.def = (self.def + p.def_per_level).clamp(0.0, 1.0);
        self.evd = (self.evd + p.evd_per_level).clamp(0.0, 1.0);

        self.progression.current_xp -= self.progression.xp_to_level_up;
        self.progression.current_level += 1;
    }
}

// ============================================================================
// Progression
// ============================================================================

/// XP and level-up bookkeeping.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Progression {
    /// XP granted to each surviving opponent when this character dies.
    pub xp_dropped_on_death: u32,
    pub current_xp: u32,
    pub current_level: u32,
    /// Per-level XP threshold; 0 disables leveling.
    pub xp_to_level_up: u32,
    pub hp_per_level: u32,
    pub sp_per_level: u32,
    pub atk_per_level: f32,
    pub def_per_level: f32,
    pub evd_per_level: f32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            xp_dropped_on_death: 0,
            current_xp: 0,
            current_level: 1,
            xp_to_level_up: 0,
            hp_per_level: 0,
            sp_per_level: 0,
            atk_per_level: 0.0,
            def_per_level: 0.0,
            evd_per_level: 0.0,
        }
    }
}
