//! Enemy action policy.

use std::collections::BTreeMap;

use crate::character::CombatantId;
use crate::combat::AffinityBook;
use crate::env::{RngOracle, compute_seed};
use crate::skill::{Skill, SkillKind, TargetFlags};

use super::roster::BattleRoster;

/// Seed contexts so the three draws inside one decision never collide.
const CTX_TARGET: u32 = 0;
const CTX_SKILL: u32 = 1;
const CTX_AVOID: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AiDecision {
    pub skill_id: String,
    pub targets: Vec<CombatantId>,
}

/// Pick a uniformly random living player-side target and a uniformly random
/// owned skill.
///
/// An unaffordable pick falls back to the weapon skill. When the pick's
/// element is a weakness the player has already seen exploited, the enemy
/// avoids it with `avoid_chance` probability and swings the weapon instead,
/// which keeps enemies random but not maximally punishing.
#[allow(clippy::too_many_arguments)]
pub(crate) fn decide(
    roster: &BattleRoster,
    actor: CombatantId,
    skills: &BTreeMap<String, Skill>,
    affinity: &AffinityBook,
    rng: &dyn RngOracle,
    battle_seed: u64,
    nonce: u64,
    avoid_chance: f32,
) -> Option<AiDecision> {
    let combatant = roster.combatant(actor)?;
    let candidates = roster.living_players();
    if candidates.is_empty() {
        return None;
    }

    let seed = compute_seed(battle_seed, nonce, actor.0, CTX_TARGET);
    let target = candidates[rng.pick_index(seed, candidates.len())?];
    let weapon = combatant.weapon_skill.clone();

    let mut chosen = if combatant.skills.is_empty() {
        weapon.clone()
    } else {
        let seed = compute_seed(battle_seed, nonce, actor.0, CTX_SKILL);
        let index = rng.pick_index(seed, combatant.skills.len())?;
        combatant.skills[index].clone()
    };

    match skills.get(&chosen) {
        Some(skill) if !skill.affordable_by(combatant) => chosen = weapon,
        Some(skill) if skill.kind == SkillKind::Offensive => {
            let known = roster
                .combatant(target)
                .is_some_and(|t| affinity.is_weakness_known(&t.template_id, skill.element));
            if known {
                let seed = compute_seed(battle_seed, nonce, actor.0, CTX_AVOID);
                if rng.unit_f32(seed) < avoid_chance {
                    chosen = weapon;
                }
            }
        }
        Some(_) => {}
        None => {
            tracing::warn!(%actor, skill = %chosen, "enemy owns unknown skill id");
            chosen = weapon;
        }
    }

    let targets = match skills.get(&chosen) {
        Some(skill) if skill.targets.contains(TargetFlags::TARGETS_ALL) => candidates,
        _ => vec![target],
    };
    Some(AiDecision {
        skill_id: chosen,
        targets,
    })
}
