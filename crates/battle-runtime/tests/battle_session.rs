//! End-to-end session flow: scripted clock, real engine, in-memory save.

use std::collections::BTreeMap;
use std::sync::Arc;

use battle_core::{
    AffinityBook, BaseStats, BattleConfig, BattleOutcome, BattleSetup, CharacterTemplate,
    CombatEvent, Element, InputAction, Skill, TurnPhase,
};
use battle_runtime::events::{Event, EventBus, Topic};
use battle_runtime::repository::{InMemorySaveRepository, SaveData, SaveRepository};
use battle_runtime::session::BattleSession;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

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

fn duel_setup(hero_stats: BaseStats, enemy_stats: BaseStats) -> BattleSetup {
    BattleSetup {
        config: BattleConfig::default(),
        party: vec![template("hero", hero_stats, true)],
        enemies: vec![template("shadow", enemy_stats, false)],
        skills: vec![Skill::weapon("slash", "Slash", Element::Phys, 5, 5)],
        inventory: vec![],
        affinity: AffinityBook::new(),
        ambush: true,
        battle_seed: 42,
        arena_index: 0,
        arena_count: 1,
    }
}

/// Feed a beat at 120 bpm and pump the frame that observes it.
fn beat_and_pump(session: &mut BattleSession, beat: u32, position: f32, dt: f32) {
    session
        .clock_mut()
        .on_raw_beat(beat, beat / 4, 120.0, position, 4, 4);
    session.pump(position, dt).unwrap();
}

#[test]
fn victory_persists_stats_inventory_and_affinity() {
    init_tracing();
    let mut hero_stats = BaseStats::flat(100, 20);
    hero_stats.vit = 1.0;
    hero_stats.progression.xp_to_level_up = 10;
    hero_stats.progression.hp_per_level = 5;
    let mut enemy_stats = BaseStats::flat(5, 0);
    enemy_stats.progression.xp_dropped_on_death = 10;

    let repository = Arc::new(InMemorySaveRepository::new());
    let bus = EventBus::new();
    let mut combat_rx = bus.subscribe(Topic::Combat);

    let mut session = BattleSession::start(
        duel_setup(hero_stats, enemy_stats),
        repository.clone(),
        bus.clone(),
    )
    .unwrap();

    session.pump(0.0, 0.0).unwrap();
    assert_eq!(session.engine().phase(), TurnPhase::SelectingAction);
    session.handle_input(InputAction::Attack);
    session.handle_input(InputAction::Submit);
    assert_eq!(session.engine().phase(), TurnPhase::Attacking);

    // four half-second beats arm the prompt and open its input window
    beat_and_pump(&mut session, 1, 0.5, 0.5);
    beat_and_pump(&mut session, 2, 1.0, 0.5);
    beat_and_pump(&mut session, 3, 1.5, 0.5);
    beat_and_pump(&mut session, 4, 2.0, 0.4);

    // submit right on the fourth beat, then let the frame resolve it
    session.handle_input(InputAction::Submit);
    session.pump(2.0, 0.0).unwrap();

    assert_eq!(session.engine().outcome(), Some(BattleOutcome::Victory));
    assert!(session.is_finished());

    // the leveled-up snapshot reached the save record
    let record = repository.load().unwrap();
    let hero = &record.character_stats["hero"];
    assert_eq!(hero.progression.current_level, 2);
    assert_eq!(hero.max_hp, 105);

    let mut saw_end = false;
    while let Ok(event) = combat_rx.try_recv() {
        if matches!(
            event,
            Event::Combat(CombatEvent::BattleEnded {
                outcome: BattleOutcome::Victory,
            })
        ) {
            saw_end = true;
        }
    }
    assert!(saw_end);
}

#[test]
fn beat_timing_is_classified_on_the_pump_clock() {
    init_tracing();

    // The track timeline starts at zero, but the session's clock has been
    // running for a while before the battle spawns. An input landing on the
    // beat must still classify against the pump clock, not the timeline.
    let mut session = BattleSession::start(
        duel_setup(BaseStats::flat(100, 20), BaseStats::flat(50, 0)),
        Arc::new(InMemorySaveRepository::new()),
        EventBus::new(),
    )
    .unwrap();

    session.pump(100.0, 0.0).unwrap();
    session.handle_input(InputAction::Attack);
    session.handle_input(InputAction::Submit);

    session.clock_mut().on_raw_beat(1, 0, 120.0, 0.5, 4, 4);
    session.pump(100.5, 0.5).unwrap();
    session.clock_mut().on_raw_beat(2, 0, 120.0, 1.0, 4, 4);
    session.pump(101.0, 0.5).unwrap();
    session.clock_mut().on_raw_beat(3, 0, 120.0, 1.5, 4, 4);
    session.pump(101.5, 0.5).unwrap();
    session.clock_mut().on_raw_beat(4, 1, 120.0, 2.0, 4, 4);
    session.pump(102.0, 0.4).unwrap();

    session.handle_input(InputAction::Submit);
    session.pump(102.0, 0.0).unwrap();

    let roster = session.engine().roster();
    let enemy = roster.combatant(roster.living_enemies()[0]).unwrap();
    assert_eq!(enemy.hp(), 45);
}

#[test]
fn session_hydrates_party_stats_from_the_record() {
    init_tracing();
    let mut saved_hero = BaseStats::flat(150, 30);
    saved_hero.progression.current_level = 3;
    let mut character_stats = BTreeMap::new();
    character_stats.insert("hero".to_string(), saved_hero);

    let repository = Arc::new(InMemorySaveRepository::with_data(SaveData {
        character_stats,
        ..Default::default()
    }));

    let session = BattleSession::start(
        duel_setup(BaseStats::flat(100, 20), BaseStats::flat(50, 0)),
        repository,
        EventBus::new(),
    )
    .unwrap();

    let roster = session.engine().roster();
    let hero = roster.combatant(roster.living_players()[0]).unwrap();
    assert_eq!(hero.max_hp(), 150);
    assert_eq!(hero.stats().progression.current_level, 3);
}

#[test]
fn discovered_weakness_is_written_through_the_logger() {
    init_tracing();
    let mut enemy_stats = BaseStats::flat(100, 0);
    enemy_stats.weaknesses.insert(Element::Phys);
    enemy_stats.crit_multiplier = 2.0;

    let repository = Arc::new(InMemorySaveRepository::new());
    let mut session = BattleSession::start(
        duel_setup(BaseStats::flat(100, 20), enemy_stats),
        repository.clone(),
        EventBus::new(),
    )
    .unwrap();

    session.pump(0.0, 0.0).unwrap();
    session.handle_input(InputAction::Attack);
    session.handle_input(InputAction::Submit);
    beat_and_pump(&mut session, 1, 0.5, 0.5);
    beat_and_pump(&mut session, 2, 1.0, 0.5);
    beat_and_pump(&mut session, 3, 1.5, 0.5);
    beat_and_pump(&mut session, 4, 2.0, 0.4);
    session.handle_input(InputAction::Submit);
    session.pump(2.0, 0.0).unwrap();

    let record = repository.load().unwrap();
    assert!(record.affinity.is_weakness_known("shadow", Element::Phys));
}
