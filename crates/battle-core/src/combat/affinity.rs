//! Record of elemental affinities the player has discovered.

use std::collections::{BTreeMap, BTreeSet};

use crate::stats::{Element, StrengthKind};

/// Which side of an affinity was observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AffinityKind {
    Weakness,
    Strength(StrengthKind),
}

/// Per-character log of encountered weaknesses and strengths.
///
/// Keyed by template id so discoveries survive across battles; the runtime
/// hydrates the book from the save file and persists it on change. Notes are
/// idempotent; re-observing a known affinity reports nothing new.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AffinityBook {
    weaknesses: BTreeMap<String, BTreeSet<Element>>,
    strengths: BTreeMap<String, BTreeMap<Element, StrengthKind>>,
}

impl AffinityBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a weakness observation. Returns true when newly observed.
    pub fn note_weakness(&mut self, character: &str, element: Element) -> bool {
        self.weaknesses
            .entry(character.to_string())
            .or_default()
            .insert(element)
    }

    /// Record a strength observation. Returns true when newly observed.
    pub fn note_strength(&mut self, character: &str, element: Element, kind: StrengthKind) -> bool {
        self.strengths
            .entry(character.to_string())
            .or_default()
            .insert(element, kind)
            .is_none()
    }

    pub fn is_weakness_known(&self, character: &str, element: Element) -> bool {
        self.weaknesses
            .get(character)
            .is_some_and(|set| set.contains(&element))
    }

    pub fn weaknesses_of(&self, character: &str) -> Option<&BTreeSet<Element>> {
        self.weaknesses.get(character)
    }

    pub fn strengths_of(&self, character: &str) -> Option<&BTreeMap<Element, StrengthKind>> {
        self.strengths.get(character)
    }

    pub fn is_empty(&self) -> bool {
        self.weaknesses.is_empty() && self.strengths.is_empty()
    }
}
