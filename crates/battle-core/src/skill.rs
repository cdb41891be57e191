//! Skill definitions: kinds, costs, targeting capabilities, damage rolls.

use bitflags::bitflags;

use crate::character::Combatant;
use crate::env::RngOracle;
use crate::stats::{Element, StatModifierSet};

// ============================================================================
// Skill Kind & Cost
// ============================================================================

/// What a skill does when it lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum SkillKind {
    /// Deals elemental damage through the full resolution pipeline.
    Offensive,
    /// Applies a stat modifier set to the target.
    BuffDebuff,
    /// Restores HP on a living target.
    Heal,
    /// Restores SP on a living target.
    ReplenishSp,
    /// Brings a dead target back with a fixed HP amount.
    Revive,
}

/// Which resource pays the skill cost.
///
/// HP costs are inflicted through the damage pipeline as Almighty
/// self-damage; SP costs are a direct clamped subtraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CostKind {
    Hp,
    Sp,
}

// ============================================================================
// Target Flags
// ============================================================================

bitflags! {
    /// Targeting capabilities of a skill.
    ///
    /// Eligibility is these flags intersected with the liveness constraint:
    /// Revive skills target the dead subset, every other kind the living.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TargetFlags: u8 {
        /// Pre-selects every eligible target instead of one.
        const TARGETS_ALL = 1 << 0;
        const ALLIES      = 1 << 1;
        const ENEMIES     = 1 << 2;
    }
}

// ============================================================================
// Skill
// ============================================================================

/// An immutable skill definition, referenced by id from characters and items.
#[derive(Clone, Debug, PartialEq)]
pub struct Skill {
    pub id: String,
    pub display_name: String,
    pub kind: SkillKind,
    /// Damage element; only meaningful for Offensive skills.
    pub element: Element,
    pub min_damage: u32,
    pub max_damage: u32,
    /// Whether rolled damage is multiplied by the user's effective ATK.
    pub scales_with_atk: bool,
    pub cost: u32,
    pub cost_kind: CostKind,
    pub targets: TargetFlags,
    /// HP restored by Heal skills.
    pub heal_amount: u32,
    /// SP restored by ReplenishSp skills.
    pub sp_amount: u32,
    /// HP a Revive target comes back with.
    pub revive_amount: u32,
    /// Modifier set applied by BuffDebuff skills.
    pub modifier: Option<StatModifierSet>,
}

impl Skill {
    /// A free single-target offensive skill; the shape weapon skills take.
    pub fn weapon(id: &str, display_name: &str, element: Element, min: u32, max: u32) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            kind: SkillKind::Offensive,
            element,
            min_damage: min,
            max_damage: max,
            scales_with_atk: true,
            cost: 0,
            cost_kind: CostKind::Sp,
            targets: TargetFlags::ENEMIES,
            heal_amount: 0,
            sp_amount: 0,
            revive_amount: 0,
            modifier: None,
        }
    }

    /// Roll base damage in `[min_damage, max_damage]`, ceil-scaled by the
    /// user's effective ATK when the skill scales.
    pub fn roll_damage(&self, rng: &dyn RngOracle, seed: u64, user_atk: f32) -> u32 {
        let base = rng.range(seed, self.min_damage, self.max_damage);
        if self.scales_with_atk {
            (base as f32 * user_atk).ceil() as u32
        } else {
            base
        }
    }

    /// Whether the user can pay this skill's cost right now.
    ///
    /// HP costs are checked against current HP, SP costs against current SP.
    pub fn affordable_by(&self, user: &Combatant) -> bool {
        match self.cost_kind {
            CostKind::Hp => user.hp() >= self.cost,
            CostKind::Sp => user.sp() >= self.cost,
        }
    }
}
