//! Skill use and the offensive damage pipeline.

use thiserror::Error;

use crate::character::CombatantId;
use crate::engine::BattleRoster;
use crate::env::{RngOracle, compute_seed};
use crate::events::CombatEvent;
use crate::skill::{CostKind, Skill, SkillKind};
use crate::stats::{Element, StrengthKind};

use super::affinity::{AffinityBook, AffinityKind};

// ============================================================================
// Errors
// ============================================================================

/// Failures surfaced to the caller before or during resolution.
///
/// Per-target mismatches inside a multi-target skill are not errors; they
/// are logged and skipped so the rest of the volley still lands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The user cannot pay the skill cost. Nothing was mutated.
    #[error("insufficient {kind:?}: need {needed}, have {available}")]
    InsufficientResource {
        kind: CostKind,
        needed: u32,
        available: u32,
    },
    #[error("{0} is dead")]
    TargetDead(CombatantId),
    #[error("{0} is not in this battle")]
    UnknownCombatant(CombatantId),
}

// ============================================================================
// Resolution Context
// ============================================================================

/// Borrowed battle state the resolver mutates, plus deterministic RNG
/// plumbing.
///
/// Every roll inside one resolution draws a fresh seed from
/// `(battle_seed, nonce, actor, cursor)` so a battle replays exactly from
/// its seed and action log. The engine bumps `nonce` once per player or AI
/// action before handing the context over.
pub struct ResolutionCtx<'a> {
    pub roster: &'a mut BattleRoster,
    pub affinity: &'a mut AffinityBook,
    pub events: &'a mut Vec<CombatEvent>,
    pub rng: &'a dyn RngOracle,
    pub battle_seed: u64,
    pub nonce: u64,
    /// Fraction of damage removed by a guard stance.
    pub guard_reduction: f32,
    seed_cursor: u32,
}

impl<'a> ResolutionCtx<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        roster: &'a mut BattleRoster,
        affinity: &'a mut AffinityBook,
        events: &'a mut Vec<CombatEvent>,
        rng: &'a dyn RngOracle,
        battle_seed: u64,
        nonce: u64,
        guard_reduction: f32,
    ) -> Self {
        Self {
            roster,
            affinity,
            events,
            rng,
            battle_seed,
            nonce,
            guard_reduction,
            seed_cursor: 0,
        }
    }

    fn next_seed(&mut self, actor: CombatantId) -> u64 {
        let seed = compute_seed(self.battle_seed, self.nonce, actor.0, self.seed_cursor);
        self.seed_cursor += 1;
        seed
    }

    /// Note an observed affinity; emits an event only on first observation.
    fn observe_affinity(&mut self, target: CombatantId, element: Element, kind: AffinityKind) {
        let Some(combatant) = self.roster.combatant(target) else {
            return;
        };
        let character = combatant.template_id.clone();
        let newly = match kind {
            AffinityKind::Weakness => self.affinity.note_weakness(&character, element),
            AffinityKind::Strength(strength) => {
                self.affinity.note_strength(&character, element, strength)
            }
        };
        if newly {
            self.events.push(CombatEvent::AffinityObserved {
                character,
                element,
                kind,
            });
        }
    }
}

// ============================================================================
// Skill Use
// ============================================================================

/// Pay a skill's cost and apply its effect to each target.
///
/// The cost check happens before any mutation; an unaffordable skill is a
/// clean error. `suppressed` pays the cost but skips every effect, which is
/// how a mashed beat input plays out.
pub fn use_skill(
    ctx: &mut ResolutionCtx<'_>,
    user: CombatantId,
    skill: &Skill,
    targets: &[CombatantId],
    suppressed: bool,
) -> Result<(), ResolveError> {
    let user_state = ctx
        .roster
        .combatant(user)
        .ok_or(ResolveError::UnknownCombatant(user))?;
    if !skill.affordable_by(user_state) {
        let available = match skill.cost_kind {
            CostKind::Hp => user_state.hp(),
            CostKind::Sp => user_state.sp(),
        };
        return Err(ResolveError::InsufficientResource {
            kind: skill.cost_kind,
            needed: skill.cost,
            available,
        });
    }
    let user_atk = user_state.atk();

    if skill.cost > 0 {
        match skill.cost_kind {
            CostKind::Sp => {
                let combatant = ctx
                    .roster
                    .combatant_mut(user)
                    .ok_or(ResolveError::UnknownCombatant(user))?;
                combatant.change_sp(-(skill.cost as i32));
                let sp = combatant.sp();
                ctx.events.push(CombatEvent::SpChanged { target: user, sp });
            }
            // HP costs run through the pipeline as unblockable self-damage
            CostKind::Hp => {
                resolve_offensive(ctx, user, user, Element::Almighty, skill.cost, 0)?;
            }
        }
    }

    if suppressed {
        tracing::debug!(skill = %skill.id, %user, "skill effects suppressed");
        return Ok(());
    }

    for &target in targets {
        let Some(target_state) = ctx.roster.combatant(target) else {
            tracing::warn!(%target, skill = %skill.id, "skill target not in battle, skipping");
            continue;
        };
        let target_alive = target_state.is_alive();

        match skill.kind {
            SkillKind::Offensive => {
                if !target_alive {
                    tracing::warn!(%target, skill = %skill.id, "offensive target already dead");
                    continue;
                }
                let seed = ctx.next_seed(user);
                let damage = skill.roll_damage(ctx.rng, seed, user_atk);
                resolve_offensive(ctx, user, target, skill.element, damage, 0)?;
            }
            SkillKind::BuffDebuff => {
                if !target_alive {
                    tracing::warn!(%target, skill = %skill.id, "modifier target already dead");
                    continue;
                }
                let Some(set) = skill.modifier.clone() else {
                    tracing::warn!(skill = %skill.id, "buff skill has no modifier set");
                    continue;
                };
                let name = set.name.clone();
                if let Some(combatant) = ctx.roster.combatant_mut(target) {
                    combatant.apply_modifier(set);
                }
                ctx.events
                    .push(CombatEvent::ModifierApplied { target, name });
            }
            SkillKind::Heal => {
                if !target_alive {
                    tracing::warn!(%target, skill = %skill.id, "heal target already dead");
                    continue;
                }
                if let Some(combatant) = ctx.roster.combatant_mut(target) {
                    let before = combatant.hp();
                    combatant.heal(skill.heal_amount);
                    let hp = combatant.hp();
                    ctx.events.push(CombatEvent::Healed {
                        target,
                        amount: hp - before,
                        hp,
                    });
                }
            }
            SkillKind::ReplenishSp => {
                if !target_alive {
                    tracing::warn!(%target, skill = %skill.id, "sp target already dead");
                    continue;
                }
                if let Some(combatant) = ctx.roster.combatant_mut(target) {
                    combatant.change_sp(skill.sp_amount as i32);
                    let sp = combatant.sp();
                    ctx.events.push(CombatEvent::SpChanged { target, sp });
                }
            }
            SkillKind::Revive => {
                if target_alive {
                    tracing::warn!(%target, skill = %skill.id, "revive target still alive");
                    continue;
                }
                if let Some(combatant) = ctx.roster.combatant_mut(target) {
                    combatant.revive(skill.revive_amount);
                    let hp = combatant.hp();
                    ctx.roster.revive(target);
                    ctx.events.push(CombatEvent::Revived { target, hp });
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// Offensive Pipeline
// ============================================================================

/// Run incoming elemental damage through the full pipeline:
/// evasion, defense, guard, strength, weakness crit, then HP clamp.
///
/// - A weakness hit cannot be evaded and ignores DEF.
/// - Almighty ignores evasion, DEF, and every affinity.
/// - A reflecting target bounces the ORIGINAL incoming damage back through
///   the attacker's own pipeline; a second reflection nullifies instead of
///   ping-ponging.
pub fn resolve_offensive(
    ctx: &mut ResolutionCtx<'_>,
    attacker: CombatantId,
    target: CombatantId,
    element: Element,
    damage: u32,
    depth: u8,
) -> Result<(), ResolveError> {
    let state = ctx
        .roster
        .combatant(target)
        .ok_or(ResolveError::UnknownCombatant(target))?;
    if !state.is_alive() {
        return Err(ResolveError::TargetDead(target));
    }

    let unblockable = element.is_unblockable();
    let is_weak = !unblockable && state.stats().is_weak_to(element);
    let strength = if unblockable {
        None
    } else {
        state.stats().strength_against(element)
    };
    let evd = state.evd();
    let def = state.def();
    let guarding = state.is_guarding();
    let crit = state.stats().crit_multiplier;

    // ----- evasion -----
    if !is_weak && !unblockable && evd > 0.0 {
        let seed = ctx.next_seed(target);
        if ctx.rng.unit_f32(seed) < evd {
            ctx.events.push(CombatEvent::Evaded { target });
            return Ok(());
        }
    }

    let mut working = damage as f32;

    // ----- defense -----
    if !is_weak && !unblockable {
        working *= 1.0 - def;
    }

    // ----- guard -----
    if guarding {
        working -= (working * ctx.guard_reduction).round();
    }

    // ----- strength -----
    if let Some(strength) = strength {
        match strength {
            StrengthKind::Nullify => {
                ctx.events.push(CombatEvent::Nullified { target, element });
                ctx.observe_affinity(target, element, AffinityKind::Strength(strength));
                return Ok(());
            }
            StrengthKind::Reflect => {
                ctx.observe_affinity(target, element, AffinityKind::Strength(strength));
                if depth >= 1 {
                    // reflect vs reflect settles as a nullification
                    ctx.events.push(CombatEvent::Nullified { target, element });
                    return Ok(());
                }
                ctx.events.push(CombatEvent::Reflected {
                    reflector: target,
                    attacker,
                });
                return resolve_offensive(ctx, target, attacker, element, damage, depth + 1);
            }
            StrengthKind::Resist(percent) => {
                working *= (100 - percent.min(100)) as f32 / 100.0;
                ctx.events.push(CombatEvent::Resisted {
                    target,
                    element,
                    percent,
                });
                ctx.observe_affinity(target, element, AffinityKind::Strength(strength));
            }
        }
    }

    // ----- weakness crit (suppressed while guarding) -----
    if is_weak && !guarding {
        working *= crit;
        ctx.events.push(CombatEvent::WeaknessHit { target, element });
        ctx.observe_affinity(target, element, AffinityKind::Weakness);
    }

    // ----- apply -----
    let final_damage = working.round().max(0.0) as u32;
    let combatant = ctx
        .roster
        .combatant_mut(target)
        .ok_or(ResolveError::UnknownCombatant(target))?;
    let died = combatant.apply_damage(final_damage);
    let hp_left = combatant.hp();
    ctx.events.push(CombatEvent::Damage {
        target,
        amount: final_damage,
        hp_left,
    });
    if died {
        ctx.events.push(CombatEvent::Death { target });
        ctx.roster.mark_dead(target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterTemplate;
    use crate::env::PcgRng;
    use crate::stats::BaseStats;

    fn template(id: &str, stats: BaseStats, is_player: bool) -> CharacterTemplate {
        CharacterTemplate {
            id: id.to_string(),
            display_name: id.to_string(),
            stats,
            skills: vec![],
            weapon_skill: "slash".to_string(),
            is_player,
        }
    }

    fn duel(attacker_stats: BaseStats, target_stats: BaseStats) -> BattleRoster {
        BattleRoster::new(
            &[template("hero", attacker_stats, true)],
            &[template("shadow", target_stats, false)],
            true,
        )
        .unwrap()
    }

    fn fire_skill(min: u32, max: u32) -> Skill {
        let mut s = Skill::weapon("agi", "Agi", Element::Fire, min, max);
        s.scales_with_atk = false;
        s
    }

    #[test]
    fn guard_and_weakness_compose_without_crit() {
        // weakness skips DEF, guard removes round(40%), crit suppressed:
        // 10 -> 10 - 4 = 6
        let mut target_stats = BaseStats::flat(100, 0);
        target_stats.def = 0.5;
        target_stats.weaknesses.insert(Element::Fire);
        let mut roster = duel(BaseStats::flat(100, 0), target_stats);
        let target = roster.turn_order()[1];
        roster.combatant_mut(target).unwrap().guard(1);

        let mut book = AffinityBook::new();
        let mut events = Vec::new();
        let rng = PcgRng;
        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 1, 0, 0.4);
        let attacker = CombatantId(0);
        resolve_offensive(&mut ctx, attacker, target, Element::Fire, 10, 0).unwrap();

        assert!(events.contains(&CombatEvent::Damage {
            target,
            amount: 6,
            hp_left: 94,
        }));
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, CombatEvent::WeaknessHit { .. }))
        );
    }

    #[test]
    fn weakness_crit_applies_and_logs_once() {
        let mut target_stats = BaseStats::flat(100, 0);
        target_stats.weaknesses.insert(Element::Fire);
        target_stats.crit_multiplier = 2.0;
        let mut roster = duel(BaseStats::flat(100, 0), target_stats);
        let attacker = CombatantId(0);
        let target = roster.turn_order()[1];

        let mut book = AffinityBook::new();
        let mut events = Vec::new();
        let rng = PcgRng;
        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 1, 0, 0.4);
        resolve_offensive(&mut ctx, attacker, target, Element::Fire, 10, 0).unwrap();
        resolve_offensive(&mut ctx, attacker, target, Element::Fire, 10, 0).unwrap();

        assert_eq!(roster.combatant(target).unwrap().hp(), 60);
        assert!(events.contains(&CombatEvent::Damage {
            target,
            amount: 20,
            hp_left: 80,
        }));
        let observed = events
            .iter()
            .filter(|e| matches!(e, CombatEvent::AffinityObserved { .. }))
            .count();
        assert_eq!(observed, 1);
    }

    #[test]
    fn reflect_bounces_original_damage_back() {
        let mut target_stats = BaseStats::flat(100, 0);
        target_stats
            .strengths
            .insert(Element::Fire, StrengthKind::Reflect);
        let mut attacker_stats = BaseStats::flat(100, 0);
        attacker_stats.def = 0.5;
        let mut roster = duel(attacker_stats, target_stats);
        let attacker = CombatantId(0);
        let target = roster.turn_order()[1];

        let mut book = AffinityBook::new();
        let mut events = Vec::new();
        let rng = PcgRng;
        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 1, 0, 0.4);
        resolve_offensive(&mut ctx, attacker, target, Element::Fire, 10, 0).unwrap();

        // reflected damage re-enters the full pipeline: attacker's DEF halves it
        assert_eq!(roster.combatant(target).unwrap().hp(), 100);
        assert_eq!(roster.combatant(attacker).unwrap().hp(), 95);
        assert!(events.contains(&CombatEvent::Reflected {
            reflector: target,
            attacker,
        }));
    }

    #[test]
    fn mutual_reflect_settles_as_nullify() {
        let mut reflect_stats = BaseStats::flat(100, 0);
        reflect_stats
            .strengths
            .insert(Element::Fire, StrengthKind::Reflect);
        let mut roster = duel(reflect_stats.clone(), reflect_stats);
        let attacker = CombatantId(0);
        let target = roster.turn_order()[1];

        let mut book = AffinityBook::new();
        let mut events = Vec::new();
        let rng = PcgRng;
        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 1, 0, 0.4);
        resolve_offensive(&mut ctx, attacker, target, Element::Fire, 10, 0).unwrap();

        assert_eq!(roster.combatant(attacker).unwrap().hp(), 100);
        assert_eq!(roster.combatant(target).unwrap().hp(), 100);
        assert!(events.contains(&CombatEvent::Nullified {
            target: attacker,
            element: Element::Fire,
        }));
    }

    #[test]
    fn nullify_and_resist_scale_damage() {
        let mut target_stats = BaseStats::flat(100, 0);
        target_stats
            .strengths
            .insert(Element::Fire, StrengthKind::Nullify);
        target_stats
            .strengths
            .insert(Element::Ice, StrengthKind::Resist(50));
        let mut roster = duel(BaseStats::flat(100, 0), target_stats);
        let attacker = CombatantId(0);
        let target = roster.turn_order()[1];

        let mut book = AffinityBook::new();
        let mut events = Vec::new();
        let rng = PcgRng;
        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 1, 0, 0.4);
        resolve_offensive(&mut ctx, attacker, target, Element::Fire, 10, 0).unwrap();
        assert_eq!(roster.combatant(target).unwrap().hp(), 100);

        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 1, 1, 0.4);
        resolve_offensive(&mut ctx, attacker, target, Element::Ice, 10, 0).unwrap();
        assert_eq!(roster.combatant(target).unwrap().hp(), 95);
    }

    #[test]
    fn full_evasion_always_dodges() {
        let mut target_stats = BaseStats::flat(100, 0);
        target_stats.evd = 1.0;
        let mut roster = duel(BaseStats::flat(100, 0), target_stats);
        let attacker = CombatantId(0);
        let target = roster.turn_order()[1];

        let mut book = AffinityBook::new();
        let mut events = Vec::new();
        let rng = PcgRng;
        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 9, 0, 0.4);
        resolve_offensive(&mut ctx, attacker, target, Element::Phys, 10, 0).unwrap();

        assert!(events.contains(&CombatEvent::Evaded { target }));
        assert_eq!(roster.combatant(target).unwrap().hp(), 100);
    }

    #[test]
    fn almighty_ignores_affinities_and_evasion() {
        let mut target_stats = BaseStats::flat(100, 0);
        target_stats.evd = 1.0;
        target_stats.def = 0.9;
        target_stats
            .strengths
            .insert(Element::Almighty, StrengthKind::Nullify);
        let mut roster = duel(BaseStats::flat(100, 0), target_stats);
        let attacker = CombatantId(0);
        let target = roster.turn_order()[1];

        let mut book = AffinityBook::new();
        let mut events = Vec::new();
        let rng = PcgRng;
        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 1, 0, 0.4);
        resolve_offensive(&mut ctx, attacker, target, Element::Almighty, 10, 0).unwrap();

        assert_eq!(roster.combatant(target).unwrap().hp(), 90);
    }

    #[test]
    fn lethal_damage_emits_death_and_removes_from_order() {
        let mut roster = duel(BaseStats::flat(100, 0), BaseStats::flat(5, 0));
        let attacker = CombatantId(0);
        let target = roster.turn_order()[1];

        let mut book = AffinityBook::new();
        let mut events = Vec::new();
        let rng = PcgRng;
        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 1, 0, 0.4);
        resolve_offensive(&mut ctx, attacker, target, Element::Phys, 10, 0).unwrap();

        assert!(events.contains(&CombatEvent::Death { target }));
        assert!(roster.dead().contains(&target));
    }

    #[test]
    fn unaffordable_skill_is_a_clean_error() {
        let mut roster = duel(BaseStats::flat(100, 3), BaseStats::flat(100, 0));
        let user = CombatantId(0);
        let target = roster.turn_order()[1];
        let mut skill = fire_skill(5, 5);
        skill.cost = 10;
        skill.cost_kind = CostKind::Sp;

        let mut book = AffinityBook::new();
        let mut events = Vec::new();
        let rng = PcgRng;
        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 1, 0, 0.4);
        let err = use_skill(&mut ctx, user, &skill, &[target], false).unwrap_err();
        assert_eq!(
            err,
            ResolveError::InsufficientResource {
                kind: CostKind::Sp,
                needed: 10,
                available: 3,
            }
        );
        assert!(events.is_empty());
        assert_eq!(roster.combatant(target).unwrap().hp(), 100);
    }

    #[test]
    fn suppressed_skill_pays_cost_without_effects() {
        let mut roster = duel(BaseStats::flat(100, 20), BaseStats::flat(100, 0));
        let user = CombatantId(0);
        let target = roster.turn_order()[1];
        let mut skill = fire_skill(5, 5);
        skill.cost = 4;

        let mut book = AffinityBook::new();
        let mut events = Vec::new();
        let rng = PcgRng;
        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 1, 0, 0.4);
        use_skill(&mut ctx, user, &skill, &[target], true).unwrap();

        assert_eq!(roster.combatant(user).unwrap().sp(), 16);
        assert_eq!(roster.combatant(target).unwrap().hp(), 100);
        assert_eq!(
            events,
            vec![CombatEvent::SpChanged {
                target: user,
                sp: 16,
            }]
        );
    }

    #[test]
    fn revive_skill_restores_turn_order_membership() {
        let mut roster = duel(BaseStats::flat(100, 20), BaseStats::flat(5, 0));
        let user = CombatantId(0);
        let target = roster.turn_order()[1];

        let mut book = AffinityBook::new();
        let mut events = Vec::new();
        let rng = PcgRng;
        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 1, 0, 0.4);
        resolve_offensive(&mut ctx, user, target, Element::Phys, 10, 0).unwrap();
        assert!(roster.dead().contains(&target));

        let revive = Skill {
            id: "recarm".to_string(),
            display_name: "Recarm".to_string(),
            kind: SkillKind::Revive,
            element: Element::Light,
            min_damage: 0,
            max_damage: 0,
            scales_with_atk: false,
            cost: 8,
            cost_kind: CostKind::Sp,
            targets: crate::skill::TargetFlags::ALLIES,
            heal_amount: 0,
            sp_amount: 0,
            revive_amount: 30,
            modifier: None,
        };
        let mut events = Vec::new();
        let mut ctx = ResolutionCtx::new(&mut roster, &mut book, &mut events, &rng, 1, 1, 0.4);
        use_skill(&mut ctx, user, &revive, &[target], false).unwrap();

        assert!(roster.turn_order().contains(&target));
        assert_eq!(roster.combatant(target).unwrap().hp(), 5);
        assert!(events.contains(&CombatEvent::Revived { target, hp: 5 }));
    }
}
