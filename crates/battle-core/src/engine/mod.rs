//! Per-battle turn state machine.
//!
//! [`CombatEngine`] sequences combatants, routes player input through the
//! action/target menus, gates attack resolution behind the beat-quantized
//! scheduler and quick-time prompt, and drives the damage resolver. It is
//! strictly single-threaded: beat callbacks hand in plain [`BeatEvent`]
//! values, every wait is an elapsed-time field advanced by
//! [`tick`](CombatEngine::tick), and at most one action is in flight.

mod ai;
mod roster;

use std::collections::BTreeMap;

use crate::character::{CharacterTemplate, CombatantId};
use crate::combat::{AffinityBook, ResolutionCtx, use_skill};
use crate::config::BattleConfig;
use crate::env::PcgRng;
use crate::error::BattleError;
use crate::events::{CombatEvent, SkipReason, ViewEvent};
use crate::skill::{Skill, SkillKind, TargetFlags};
use crate::timing::{BeatEvent, BeatScheduler, BeatWindow, MarkerEvent, QuickTimeWindow};

pub use roster::BattleRoster;

// ============================================================================
// Public types
// ============================================================================

/// Phase of the active combatant's turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TurnPhase {
    /// Between turns; the next combatant is selected on the next tick.
    Waiting,
    SelectingAction,
    SelectingSkill,
    SelectingItem,
    Targeting,
    /// Resolution scheduled; waiting on the beat and the quick-time prompt.
    Attacking,
    Victory,
    Defeat,
}

/// Terminal result of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleOutcome {
    Victory,
    Defeat,
}

/// Edge-triggered player input. Directional input also reports its release
/// through [`CombatEngine::release_select`] so held-cycling can stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    Submit,
    Cancel,
    /// Directional navigation: `x` cycles targets, `y` moves menu cursors.
    Select { x: i32, y: i32 },
    Attack,
    Skill,
    Item,
    Guard,
}

/// A consumable inventory entry that casts a skill when used.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventoryItem {
    pub name: String,
    pub skill_id: String,
    pub count: u32,
}

/// Everything needed to spawn one battle.
#[derive(Clone, Debug)]
pub struct BattleSetup {
    pub config: BattleConfig,
    pub party: Vec<CharacterTemplate>,
    pub enemies: Vec<CharacterTemplate>,
    pub skills: Vec<Skill>,
    pub inventory: Vec<InventoryItem>,
    /// Affinity knowledge carried in from previous battles.
    pub affinity: AffinityBook,
    /// Party acts first when ambushing.
    pub ambush: bool,
    pub battle_seed: u64,
    pub arena_index: usize,
    pub arena_count: usize,
}

// ============================================================================
// Internal state
// ============================================================================

/// Commands the beat scheduler hands back on their due beat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BattleCommand {
    BeginQte,
}

#[derive(Clone, Debug)]
struct PendingAttack {
    user: CombatantId,
    skill_id: String,
    targets: Vec<CombatantId>,
    /// AI attacks skip the quick-time prompt and resolve on the beat.
    auto: bool,
}

#[derive(Clone, Debug)]
struct TargetingState {
    eligible: Vec<CombatantId>,
    cursor: usize,
    all: bool,
    skill_id: String,
    item_slot: Option<usize>,
}

/// Timer-gated repeat while a cycling direction is held.
#[derive(Clone, Copy, Debug, Default)]
struct ScrollState {
    active: bool,
    dir: i32,
    since_step: f32,
}

impl ScrollState {
    fn start(&mut self, dir: i32) {
        self.active = true;
        self.dir = dir;
        self.since_step = 0.0;
    }

    fn stop(&mut self) {
        if self.active {
            self.active = false;
            self.since_step = 0.0;
        }
    }
}

// ============================================================================
// Combat Engine
// ============================================================================

/// One battle's turn state machine.
pub struct CombatEngine {
    config: BattleConfig,
    skills: BTreeMap<String, Skill>,
    roster: BattleRoster,
    affinity: AffinityBook,
    inventory: Vec<InventoryItem>,
    window: BeatWindow,
    scheduler: BeatScheduler<BattleCommand>,
    qte: QuickTimeWindow,
    phase: TurnPhase,
    events: Vec<CombatEvent>,
    rng: PcgRng,
    battle_seed: u64,
    nonce: u64,
    /// Affordable menu entries: (skill id, source inventory slot).
    menu: Vec<(String, Option<usize>)>,
    menu_cursor: usize,
    targeting: Option<TargetingState>,
    pending: Option<PendingAttack>,
    scroll: ScrollState,
    outcome: Option<BattleOutcome>,
}

impl CombatEngine {
    /// Spawn a battle. Arena and roster validation happens here; a failed
    /// spawn never starts ticking.
    pub fn new(setup: BattleSetup) -> Result<Self, BattleError> {
        if setup.arena_index >= setup.arena_count {
            tracing::error!(
                index = setup.arena_index,
                count = setup.arena_count,
                "battle spawn rejected"
            );
            return Err(BattleError::InvalidArena {
                index: setup.arena_index,
                count: setup.arena_count,
            });
        }

        let skills: BTreeMap<String, Skill> = setup
            .skills
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();
        for template in setup.party.iter().chain(setup.enemies.iter()) {
            if !skills.contains_key(&template.weapon_skill) {
                return Err(BattleError::UnknownSkill(template.weapon_skill.clone()));
            }
        }
        for item in &setup.inventory {
            if !skills.contains_key(&item.skill_id) {
                return Err(BattleError::UnknownSkill(item.skill_id.clone()));
            }
        }

        let roster = BattleRoster::new(&setup.party, &setup.enemies, setup.ambush)?;
        let window = BeatWindow::new(
            setup.config.perfect_threshold,
            setup.config.good_threshold,
            setup.config.cooldown_duration,
        );
        let qte = QuickTimeWindow::new(setup.config.input_window);

        Ok(Self {
            config: setup.config,
            skills,
            roster,
            affinity: setup.affinity,
            inventory: setup.inventory,
            window,
            scheduler: BeatScheduler::new(),
            qte,
            phase: TurnPhase::Waiting,
            events: Vec::new(),
            rng: PcgRng,
            battle_seed: setup.battle_seed,
            nonce: 0,
            menu: Vec::new(),
            menu_cursor: 0,
            targeting: None,
            pending: None,
            scroll: ScrollState::default(),
            outcome: None,
        })
    }

    // ===== clock callbacks =====

    /// Beat callback. `event` is an owned copy of the clock's data; nothing
    /// here keeps references into the audio engine.
    pub fn on_beat(&mut self, event: &BeatEvent, now: f32) {
        self.window.on_beat(event, now);
        for command in self.scheduler.on_beat(event) {
            match command {
                BattleCommand::BeginQte => self.begin_qte(event),
            }
        }
    }

    /// Timeline marker callback; currently only traced.
    pub fn on_marker(&mut self, marker: &MarkerEvent) {
        tracing::debug!(name = %marker.name, "timeline marker");
    }

    fn begin_qte(&mut self, event: &BeatEvent) {
        let auto = self.pending.as_ref().is_some_and(|p| p.auto);
        if auto {
            self.resolve_pending(false);
        } else if self.pending.is_some() {
            self.qte
                .start(self.config.qte_total_beats, event.beat_length());
        }
    }

    // ===== tick =====

    /// Advance one frame: expire cooldowns, run the quick-time prompt,
    /// repeat held target-cycling, and start the next turn when idle.
    pub fn tick(&mut self, now: f32, dt: f32) {
        if self.outcome.is_some() {
            return;
        }

        self.window.on_tick(now);
        self.qte.tick(dt);
        if let Some(result) = self.qte.take_result() {
            self.events.push(CombatEvent::BeatResult(result));
            self.resolve_pending(!result.is_success());
        }

        if self.phase == TurnPhase::Targeting && self.scroll.active {
            self.scroll.since_step += dt;
            while self.scroll.since_step >= self.config.scroll_delay {
                self.scroll.since_step -= self.config.scroll_delay;
                self.step_target(self.scroll.dir);
            }
        }

        if self.roster.living_players().is_empty() {
            self.finish(BattleOutcome::Defeat);
            return;
        }
        if self.roster.living_enemies().is_empty() {
            self.finish(BattleOutcome::Victory);
            return;
        }

        if self.phase == TurnPhase::Waiting && self.pending.is_none() {
            self.start_next_turn();
        }
    }

    fn start_next_turn(&mut self) {
        let Some(current) = self.roster.current() else {
            return;
        };
        let Some(combatant) = self.roster.combatant_mut(current) else {
            tracing::warn!(%current, "turn order entry has no combatant");
            self.roster.advance();
            return;
        };

        if !combatant.is_alive() {
            self.events.push(CombatEvent::TurnSkipped {
                combatant: current,
                reason: SkipReason::Dead,
            });
            self.roster.advance();
            return;
        }
        if combatant.is_guarding() {
            combatant.consume_guard_turn();
            self.events.push(CombatEvent::TurnSkipped {
                combatant: current,
                reason: SkipReason::Guarding,
            });
            self.roster.advance();
            return;
        }

        combatant.begin_turn();
        let is_player = combatant.is_player;
        self.events
            .push(CombatEvent::TurnStarted { combatant: current });

        if is_player {
            self.phase = TurnPhase::SelectingAction;
            return;
        }

        // enemy turn: decide now, resolve on the next beat
        self.nonce += 1;
        let decision = ai::decide(
            &self.roster,
            current,
            &self.skills,
            &self.affinity,
            &self.rng,
            self.battle_seed,
            self.nonce,
            self.config.ai_weakness_avoid_chance,
        );
        match decision {
            Some(decision) => {
                self.pending = Some(PendingAttack {
                    user: current,
                    skill_id: decision.skill_id,
                    targets: decision.targets,
                    auto: true,
                });
                self.scheduler.run_on_next_beat(BattleCommand::BeginQte);
                self.phase = TurnPhase::Attacking;
            }
            None => self.end_turn(),
        }
    }

    // ===== input =====

    /// Route one edge-triggered input. `now` timestamps quick-time inputs
    /// against the beat history.
    pub fn handle_input(&mut self, action: InputAction, now: f32) {
        match self.phase {
            TurnPhase::SelectingAction => self.input_selecting_action(action),
            TurnPhase::SelectingSkill | TurnPhase::SelectingItem => self.input_menu(action),
            TurnPhase::Targeting => self.input_targeting(action),
            TurnPhase::Attacking => {
                if action == InputAction::Submit && self.qte.is_active() {
                    self.qte.submit_input(&mut self.window, now);
                }
            }
            TurnPhase::Waiting | TurnPhase::Victory | TurnPhase::Defeat => {}
        }
    }

    /// Directional input released; held target-cycling stops.
    pub fn release_select(&mut self) {
        self.scroll.stop();
    }

    fn input_selecting_action(&mut self, action: InputAction) {
        let Some(current) = self.roster.current() else {
            return;
        };
        match action {
            InputAction::Attack => {
                let Some(weapon) = self
                    .roster
                    .combatant(current)
                    .map(|c| c.weapon_skill.clone())
                else {
                    return;
                };
                self.enter_targeting(weapon, None);
            }
            InputAction::Skill => {
                let Some(combatant) = self.roster.combatant(current) else {
                    return;
                };
                let menu: Vec<(String, Option<usize>)> = combatant
                    .skills
                    .iter()
                    .filter(|id| {
                        self.skills
                            .get(*id)
                            .is_some_and(|s| s.affordable_by(combatant))
                    })
                    .map(|id| (id.clone(), None))
                    .collect();
                if menu.is_empty() {
                    tracing::debug!(%current, "no affordable skills");
                    return;
                }
                let entries = menu
                    .iter()
                    .filter_map(|(id, _)| self.skills.get(id))
                    .map(|s| (s.id.clone(), s.display_name.clone()))
                    .collect();
                self.menu = menu;
                self.menu_cursor = 0;
                self.phase = TurnPhase::SelectingSkill;
                self.events
                    .push(CombatEvent::View(ViewEvent::PopulateSkillList { entries }));
            }
            InputAction::Item => {
                let Some(combatant) = self.roster.combatant(current) else {
                    return;
                };
                let menu: Vec<(String, Option<usize>)> = self
                    .inventory
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| {
                        item.count > 0
                            && self
                                .skills
                                .get(&item.skill_id)
                                .is_some_and(|s| s.affordable_by(combatant))
                    })
                    .map(|(slot, item)| (item.skill_id.clone(), Some(slot)))
                    .collect();
                if menu.is_empty() {
                    tracing::debug!(%current, "no usable items");
                    return;
                }
                let entries = menu
                    .iter()
                    .filter_map(|(_, slot)| slot.map(|s| &self.inventory[s]))
                    .map(|item| (item.name.clone(), item.count))
                    .collect();
                self.menu = menu;
                self.menu_cursor = 0;
                self.phase = TurnPhase::SelectingItem;
                self.events
                    .push(CombatEvent::View(ViewEvent::PopulateItemList { entries }));
            }
            InputAction::Guard => {
                if let Some(combatant) = self.roster.combatant_mut(current) {
                    combatant.guard(self.config.guard_turns);
                }
                self.events.push(CombatEvent::GuardRaised {
                    combatant: current,
                    turns: self.config.guard_turns,
                });
                self.end_turn();
            }
            _ => {}
        }
    }

    fn input_menu(&mut self, action: InputAction) {
        match action {
            InputAction::Select { y, .. } if y != 0 && !self.menu.is_empty() => {
                let len = self.menu.len() as i32;
                let cursor = self.menu_cursor as i32;
                self.menu_cursor = (cursor + y.signum()).rem_euclid(len) as usize;
            }
            InputAction::Submit => {
                let Some((skill_id, slot)) = self.menu.get(self.menu_cursor).cloned() else {
                    return;
                };
                self.enter_targeting(skill_id, slot);
            }
            InputAction::Cancel => {
                self.menu.clear();
                self.phase = TurnPhase::SelectingAction;
            }
            _ => {}
        }
    }

    fn input_targeting(&mut self, action: InputAction) {
        match action {
            InputAction::Select { x, .. } if x != 0 => {
                self.step_target(x.signum());
                self.scroll.start(x.signum());
            }
            InputAction::Submit => self.confirm_targets(),
            InputAction::Cancel => {
                self.scroll.stop();
                if let Some(state) = self.targeting.take() {
                    self.events.push(CombatEvent::View(ViewEvent::HideHealth {
                        target: state.eligible[state.cursor],
                    }));
                }
                self.phase = TurnPhase::SelectingAction;
            }
            _ => {}
        }
    }

    // ===== targeting =====

    fn enter_targeting(&mut self, skill_id: String, item_slot: Option<usize>) {
        let Some(current) = self.roster.current() else {
            return;
        };
        let Some(skill) = self.skills.get(&skill_id) else {
            tracing::warn!(skill = %skill_id, "selected skill not in book");
            return;
        };
        let eligible = self.eligible_targets(current, skill);
        if eligible.is_empty() {
            tracing::debug!(skill = %skill_id, "no eligible targets");
            return;
        }
        let all = skill.targets.contains(TargetFlags::TARGETS_ALL);

        let highlighted = if all {
            eligible.clone()
        } else {
            vec![eligible[0]]
        };
        self.events
            .push(CombatEvent::View(ViewEvent::HighlightTargets {
                targets: highlighted,
            }));
        if let Some(first) = self.roster.combatant(eligible[0]) {
            self.events.push(CombatEvent::View(ViewEvent::ShowHealth {
                target: eligible[0],
                hp: first.hp(),
            }));
        }

        self.targeting = Some(TargetingState {
            eligible,
            cursor: 0,
            all,
            skill_id,
            item_slot,
        });
        self.phase = TurnPhase::Targeting;
    }

    /// Eligible = capability flags intersected with the liveness constraint:
    /// Revive targets the dead subset, every other kind the living.
    fn eligible_targets(&self, user: CombatantId, skill: &Skill) -> Vec<CombatantId> {
        let Some(user_is_player) = self.roster.combatant(user).map(|c| c.is_player) else {
            return Vec::new();
        };
        let want_allies = skill.targets.contains(TargetFlags::ALLIES);
        let want_enemies = skill.targets.contains(TargetFlags::ENEMIES);

        let pool: Vec<CombatantId> = if skill.kind == SkillKind::Revive {
            self.roster.dead().to_vec()
        } else {
            self.roster.living().collect()
        };
        pool.into_iter()
            .filter(|&id| {
                self.roster.combatant(id).is_some_and(|c| {
                    let same_side = c.is_player == user_is_player;
                    (same_side && want_allies) || (!same_side && want_enemies)
                })
            })
            .collect()
    }

    fn step_target(&mut self, dir: i32) {
        let Some(state) = self.targeting.as_mut() else {
            return;
        };
        if state.all || state.eligible.is_empty() {
            return;
        }
        let previous = state.eligible[state.cursor];
        let len = state.eligible.len() as i32;
        state.cursor = (state.cursor as i32 + dir).rem_euclid(len) as usize;
        let shown = state.eligible[state.cursor];

        self.events
            .push(CombatEvent::View(ViewEvent::HideHealth { target: previous }));
        self.events
            .push(CombatEvent::View(ViewEvent::HighlightTargets {
                targets: vec![shown],
            }));
        if let Some(combatant) = self.roster.combatant(shown) {
            self.events.push(CombatEvent::View(ViewEvent::ShowHealth {
                target: shown,
                hp: combatant.hp(),
            }));
        }
    }

    fn confirm_targets(&mut self) {
        let Some(current) = self.roster.current() else {
            return;
        };
        let Some(state) = self.targeting.take() else {
            return;
        };
        self.scroll.stop();

        let shown = state.eligible[state.cursor];
        self.events
            .push(CombatEvent::View(ViewEvent::HideHealth { target: shown }));

        // items are consumed on commitment, like the cost of a missed skill
        if let Some(slot) = state.item_slot
            && let Some(item) = self.inventory.get_mut(slot)
        {
            item.count = item.count.saturating_sub(1);
        }

        let targets = if state.all {
            state.eligible
        } else {
            vec![shown]
        };
        self.pending = Some(PendingAttack {
            user: current,
            skill_id: state.skill_id,
            targets,
            auto: false,
        });
        self.scheduler.run_on_next_beat(BattleCommand::BeginQte);
        self.phase = TurnPhase::Attacking;
    }

    // ===== resolution =====

    fn resolve_pending(&mut self, suppressed: bool) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let Some(skill) = self.skills.get(&pending.skill_id).cloned() else {
            tracing::warn!(skill = %pending.skill_id, "pending skill vanished from book");
            self.end_turn();
            return;
        };

        self.nonce += 1;
        let mut ctx = ResolutionCtx::new(
            &mut self.roster,
            &mut self.affinity,
            &mut self.events,
            &self.rng,
            self.battle_seed,
            self.nonce,
            self.config.guard_damage_reduction,
        );
        if let Err(err) = use_skill(&mut ctx, pending.user, &skill, &pending.targets, suppressed) {
            tracing::warn!(user = %pending.user, skill = %skill.id, %err, "skill use failed");
        }
        self.end_turn();
    }

    fn end_turn(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        self.menu.clear();
        self.roster.advance();
        self.phase = TurnPhase::Waiting;
    }

    // ===== battle end =====

    fn finish(&mut self, outcome: BattleOutcome) {
        self.scroll.stop();
        self.pending = None;
        self.targeting = None;
        self.outcome = Some(outcome);
        self.phase = match outcome {
            BattleOutcome::Victory => TurnPhase::Victory,
            BattleOutcome::Defeat => TurnPhase::Defeat,
        };

        for combatant in self.roster.iter_mut() {
            combatant.clear_modifiers();
        }

        // every dead enemy drops XP on every surviving party member,
        // scaled by that member's VIT
        let drops: Vec<u32> = self
            .roster
            .dead()
            .iter()
            .filter_map(|&id| self.roster.combatant(id))
            .filter(|c| !c.is_player)
            .map(|c| c.stats().progression.xp_dropped_on_death)
            .collect();
        let total: u32 = drops.iter().sum();

        if total > 0 {
            let survivors = self.roster.living_players();
            for id in survivors {
                let Some(member) = self.roster.combatant_mut(id) else {
                    continue;
                };
                let mut levels = 0;
                for &amount in &drops {
                    levels += member.stats_mut().gain_xp(amount);
                }
                let character = member.template_id.clone();
                self.events.push(CombatEvent::XpAwarded {
                    character,
                    amount: total,
                    levels_gained: levels,
                });
            }
        }

        self.events.push(CombatEvent::BattleEnded { outcome });
    }

    // ===== access =====

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    pub fn roster(&self) -> &BattleRoster {
        &self.roster
    }

    pub fn affinity(&self) -> &AffinityBook {
        &self.affinity
    }

    pub fn inventory(&self) -> &[InventoryItem] {
        &self.inventory
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Hand buffered events to the caller, emptying the queue.
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }
}
