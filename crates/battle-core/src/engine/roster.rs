//! Battle roster: turn order, the dead set, and combatant storage.

use std::collections::BTreeMap;

use crate::character::{CharacterTemplate, Combatant, CombatantId};
use crate::error::BattleError;

/// Ordered combatant roster for one battle.
///
/// Invariants:
/// - `turn_index` is always a valid index into `turn_order` (mod its length);
/// - a combatant whose HP reaches 0 is removed from `turn_order` the instant
///   it dies and appended to `dead`;
/// - a revived combatant leaves `dead` and joins the tail of `turn_order`.
#[derive(Clone, Debug)]
pub struct BattleRoster {
    combatants: BTreeMap<CombatantId, Combatant>,
    turn_order: Vec<CombatantId>,
    dead: Vec<CombatantId>,
    turn_index: usize,
}

impl BattleRoster {
    /// Build a roster from templates. When `ambush` is set the party acts
    /// first, otherwise the enemies do.
    pub fn new(
        party: &[CharacterTemplate],
        enemies: &[CharacterTemplate],
        ambush: bool,
    ) -> Result<Self, BattleError> {
        if party.is_empty() {
            return Err(BattleError::EmptySide { side: "party" });
        }
        if enemies.is_empty() {
            return Err(BattleError::EmptySide { side: "enemy" });
        }

        let mut roster = Self {
            combatants: BTreeMap::new(),
            turn_order: Vec::new(),
            dead: Vec::new(),
            turn_index: 0,
        };

        let (first, second) = if ambush {
            (party, enemies)
        } else {
            (enemies, party)
        };
        roster.enroll(first);
        roster.enroll(second);
        Ok(roster)
    }

    fn enroll(&mut self, templates: &[CharacterTemplate]) {
        for template in templates {
            let id = CombatantId(self.combatants.len() as u32);
            self.combatants
                .insert(id, Combatant::from_template(id, template));
            self.turn_order.push(id);
        }
    }

    // ===== turn sequencing =====

    /// Combatant whose turn it currently is.
    pub fn current(&self) -> Option<CombatantId> {
        if self.turn_order.is_empty() {
            return None;
        }
        Some(self.turn_order[self.turn_index % self.turn_order.len()])
    }

    /// Advance the turn index, wrapping to the front.
    pub fn advance(&mut self) {
        if self.turn_order.is_empty() {
            self.turn_index = 0;
            return;
        }
        self.turn_index = (self.turn_index + 1) % self.turn_order.len();
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    // ===== death & revival =====

    /// Move a combatant from the turn order to the dead set.
    ///
    /// A combatant not in the turn order is a logged no-op.
    pub fn mark_dead(&mut self, id: CombatantId) {
        let Some(pos) = self.turn_order.iter().position(|&c| c == id) else {
            tracing::warn!(%id, "dead combatant not found in turn order");
            return;
        };
        self.turn_order.remove(pos);
        if pos < self.turn_index {
            self.turn_index -= 1;
        }
        if !self.turn_order.is_empty() {
            self.turn_index %= self.turn_order.len();
        } else {
            self.turn_index = 0;
        }
        self.dead.push(id);
    }

    /// Move a combatant from the dead set to the tail of the turn order.
    ///
    /// Returns false (logged) when the combatant is not in the dead set.
    pub fn revive(&mut self, id: CombatantId) -> bool {
        let Some(pos) = self.dead.iter().position(|&c| c == id) else {
            tracing::warn!(%id, "revive target not found in dead set");
            return false;
        };
        self.dead.remove(pos);
        self.turn_order.push(id);
        true
    }

    // ===== access =====

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    pub fn turn_order(&self) -> &[CombatantId] {
        &self.turn_order
    }

    pub fn dead(&self) -> &[CombatantId] {
        &self.dead
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.values_mut()
    }

    /// Living combatant ids in turn order.
    pub fn living(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.turn_order.iter().copied()
    }

    pub fn living_players(&self) -> Vec<CombatantId> {
        self.side(true)
    }

    pub fn living_enemies(&self) -> Vec<CombatantId> {
        self.side(false)
    }

    fn side(&self, is_player: bool) -> Vec<CombatantId> {
        self.turn_order
            .iter()
            .copied()
            .filter(|&id| {
                self.combatants
                    .get(&id)
                    .is_some_and(|c| c.is_player == is_player)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::BaseStats;

    fn template(id: &str, is_player: bool) -> CharacterTemplate {
        CharacterTemplate {
            id: id.to_string(),
            display_name: id.to_string(),
            stats: BaseStats::flat(100, 20),
            skills: vec![],
            weapon_skill: "slash".to_string(),
            is_player,
        }
    }

    fn three_way_roster() -> BattleRoster {
        BattleRoster::new(
            &[template("hero", true), template("mage", true)],
            &[template("shadow", false)],
            true,
        )
        .unwrap()
    }

    #[test]
    fn empty_side_is_a_config_error() {
        assert!(matches!(
            BattleRoster::new(&[], &[template("shadow", false)], true),
            Err(BattleError::EmptySide { side: "party" })
        ));
    }

    #[test]
    fn ambush_orders_party_first() {
        let roster = three_way_roster();
        let first = roster.current().unwrap();
        assert!(roster.combatant(first).unwrap().is_player);

        let roster = BattleRoster::new(
            &[template("hero", true)],
            &[template("shadow", false)],
            false,
        )
        .unwrap();
        let first = roster.current().unwrap();
        assert!(!roster.combatant(first).unwrap().is_player);
    }

    #[test]
    fn next_turn_wraps_after_all_combatants() {
        let mut roster = three_way_roster();
        let start = roster.turn_index();
        roster.advance();
        roster.advance();
        roster.advance();
        assert_eq!(roster.turn_index(), start);
    }

    #[test]
    fn death_removes_from_order_and_revive_appends_to_tail() {
        let mut roster = three_way_roster();
        let victim = roster.turn_order()[0];

        roster.mark_dead(victim);
        assert!(!roster.turn_order().contains(&victim));
        assert_eq!(roster.dead(), &[victim]);

        assert!(roster.revive(victim));
        assert_eq!(*roster.turn_order().last().unwrap(), victim);
        assert!(roster.dead().is_empty());
    }

    #[test]
    fn unknown_lookups_are_ignored() {
        let mut roster = three_way_roster();
        roster.mark_dead(CombatantId(99));
        assert!(!roster.revive(CombatantId(99)));
        assert_eq!(roster.turn_order().len(), 3);
    }

    #[test]
    fn turn_index_stays_valid_when_earlier_combatant_dies() {
        let mut roster = three_way_roster();
        roster.advance(); // index 1
        let first = roster.turn_order()[0];
        roster.mark_dead(first);
        // index shifted down with the removal; still points at the same combatant
        assert_eq!(roster.turn_index(), 0);
        assert_eq!(roster.turn_order().len(), 2);
    }
}
