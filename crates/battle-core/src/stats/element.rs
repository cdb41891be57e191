//! Elemental affinity types.

// ============================================================================
// Element
// ============================================================================

/// Damage element carried by offensive skills.
///
/// Almighty damage bypasses evasion, defense, and affinities; it is the
/// element skill HP-costs are inflicted with.
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
pub enum Element {
    /// Physical damage (weapons, strikes).
    Phys,
    Fire,
    Ice,
    Elec,
    Wind,
    Light,
    Dark,
    /// Unblockable damage: no evasion, no defense, no affinity checks.
    Almighty,
}

impl Element {
    /// Returns true if this element skips evasion/defense/affinity entirely.
    pub fn is_unblockable(self) -> bool {
        matches!(self, Element::Almighty)
    }
}

// ============================================================================
// Strength Kind
// ============================================================================

/// How a character resists an element it is configured strong against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StrengthKind {
    /// Incoming damage of this element has no effect.
    Nullify,
    /// Incoming damage is sent back through the pipeline at the attacker.
    Reflect,
    /// Incoming damage is reduced by the given percentage (0-100).
    Resist(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_almighty_is_unblockable() {
        use strum::IntoEnumIterator;
        for element in Element::iter() {
            assert_eq!(element.is_unblockable(), element == Element::Almighty);
        }
    }
}
