//! Buff/debuff stat modifiers.
//!
//! Modifiers are multiplicative and battle-local: a combatant's effective
//! stat is its base value times the product of every live multiplier for
//! that stat. Durations tick down at the owner's turn start and all
//! modifiers are cleared when the battle ends.

// ============================================================================
// Stat Kind
// ============================================================================

/// Stats a modifier can target.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatKind {
    Hp,
    Sp,
    Atk,
    Def,
    Evd,
    Vit,
}

// ============================================================================
// Modifier Data
// ============================================================================

/// A single stat-to-multiplier entry inside a modifier set.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatModifier {
    pub stat: StatKind,
    pub multiplier: f32,
}

/// A named buff or debuff: a bundle of stat multipliers with a duration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatModifierSet {
    pub name: String,
    pub modifiers: Vec<StatModifier>,
    /// Remaining turns; decremented at the owner's turn start.
    pub duration: u32,
    /// Non-stackable sets refresh the existing instance instead of adding.
    pub can_stack: bool,
}

// ============================================================================
// Active Modifiers
// ============================================================================

/// The live modifier list carried by one combatant.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveModifiers {
    entries: Vec<StatModifierSet>,
}

impl ActiveModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a modifier set, honoring the stack policy.
    ///
    /// A non-stackable set already present (by name) has its duration
    /// refreshed rather than being duplicated.
    pub fn apply(&mut self, set: StatModifierSet) {
        if !set.can_stack
            && let Some(existing) = self.entries.iter_mut().find(|e| e.name == set.name)
        {
            existing.duration = existing.duration.max(set.duration);
            return;
        }
        self.entries.push(set);
    }

    /// Product of all live multipliers for the given stat.
    pub fn multiplier_for(&self, stat: StatKind) -> f32 {
        self.entries
            .iter()
            .flat_map(|e| e.modifiers.iter())
            .filter(|m| m.stat == stat)
            .map(|m| m.multiplier)
            .product()
    }

    /// Tick durations down one turn, dropping expired sets.
    pub fn tick(&mut self) {
        for entry in &mut self.entries {
            entry.duration = entry.duration.saturating_sub(1);
        }
        self.entries.retain(|e| e.duration > 0);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atk_buff(name: &str, multiplier: f32, duration: u32, can_stack: bool) -> StatModifierSet {
        StatModifierSet {
            name: name.to_string(),
            modifiers: vec![StatModifier {
                stat: StatKind::Atk,
                multiplier,
            }],
            duration,
            can_stack,
        }
    }

    #[test]
    fn multipliers_compound() {
        let mut active = ActiveModifiers::new();
        active.apply(atk_buff("tarukaja", 1.5, 3, true));
        active.apply(atk_buff("charge", 2.0, 3, true));
        assert_eq!(active.multiplier_for(StatKind::Atk), 3.0);
        assert_eq!(active.multiplier_for(StatKind::Def), 1.0);
    }

    #[test]
    fn non_stackable_refreshes_duration() {
        let mut active = ActiveModifiers::new();
        active.apply(atk_buff("tarukaja", 1.5, 1, false));
        active.apply(atk_buff("tarukaja", 1.5, 4, false));
        assert_eq!(active.len(), 1);
        active.tick();
        active.tick();
        active.tick();
        assert_eq!(active.multiplier_for(StatKind::Atk), 1.5);
    }

    #[test]
    fn expired_sets_drop_on_tick() {
        let mut active = ActiveModifiers::new();
        active.apply(atk_buff("rakunda", 0.5, 1, true));
        active.tick();
        assert!(active.is_empty());
        assert_eq!(active.multiplier_for(StatKind::Atk), 1.0);
    }
}
