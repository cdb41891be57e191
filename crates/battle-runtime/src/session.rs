//! One battle from spawn to persistence.

use std::collections::BTreeMap;
use std::sync::Arc;

use battle_core::{BattleSetup, BeatClock, CombatEngine, CombatEvent, InputAction};

use crate::affinity::AffinityLogger;
use crate::audio::BeatClockBridge;
use crate::error::Result;
use crate::events::{Event, EventBus};
use crate::repository::SaveRepository;

/// Owns the engine, the clock bridge, and the collaborators one battle
/// needs.
///
/// `pump` is the single game-thread entry point: it drains queued clock
/// callbacks into the engine, advances the tick, publishes drained events
/// to the bus, feeds the affinity logger, and performs exit persistence
/// exactly once when the battle ends.
pub struct BattleSession {
    engine: CombatEngine,
    bridge: BeatClockBridge,
    bus: EventBus,
    repository: Arc<dyn SaveRepository>,
    affinity: AffinityLogger,
    now: f32,
    persisted: bool,
}

impl BattleSession {
    /// Spawn a battle, hydrating templates, inventory, and affinity
    /// knowledge from the save record.
    pub fn start(
        mut setup: BattleSetup,
        repository: Arc<dyn SaveRepository>,
        bus: EventBus,
    ) -> Result<Self> {
        let record = repository.load()?;

        for template in setup.party.iter_mut() {
            if let Some(saved) = record.character_stats.get(&template.id) {
                template.stats = saved.clone();
            }
        }
        if setup.inventory.is_empty() {
            setup.inventory = record.inventory.clone();
        }
        setup.affinity = record.affinity;

        let affinity = AffinityLogger::load(repository.clone())?;
        let engine = CombatEngine::new(setup)?;
        let mut bridge = BeatClockBridge::new();
        bridge.start();

        Ok(Self {
            engine,
            bridge,
            bus,
            repository,
            affinity,
            now: 0.0,
            persisted: false,
        })
    }

    /// Advance one frame of the battle. `now` is the session clock, and it
    /// stamps beats and inputs alike.
    pub fn pump(&mut self, now: f32, dt: f32) -> Result<()> {
        self.now = now;

        // Beats and inputs must share one clock: both are stamped with the
        // pump's `now`, never the track's timeline position, so timing
        // accuracy survives a wall-clock/timeline offset.
        for beat in self.bridge.drain_beats() {
            self.engine.on_beat(&beat, now);
        }
        for marker in self.bridge.drain_markers() {
            self.engine.on_marker(&marker);
        }
        self.engine.tick(now, dt);

        let mut ended = false;
        for event in self.engine.drain_events() {
            match &event {
                CombatEvent::AffinityObserved {
                    character,
                    element,
                    kind,
                } => {
                    self.affinity.observe(character, *element, *kind)?;
                }
                CombatEvent::BattleEnded { .. } => ended = true,
                _ => {}
            }
            self.bus.publish(Event::from(event));
        }

        if ended && !self.persisted {
            self.persist_exit()?;
        }
        Ok(())
    }

    /// Exit persistence: surviving party stats, the inventory, and the
    /// affinity log all reach durable storage before the session is done.
    fn persist_exit(&mut self) -> Result<()> {
        let mut stats = self.repository.load()?.character_stats;
        for combatant in self.engine.roster().iter().filter(|c| c.is_player) {
            stats.insert(combatant.template_id.clone(), combatant.stats().clone());
        }
        self.repository.save_character_stats(&stats)?;
        self.repository.save_inventory(self.engine.inventory())?;
        self.repository.save_affinity_log(self.affinity.book())?;
        self.repository.flush()?;

        self.bridge.stop();
        self.persisted = true;
        tracing::info!("battle record persisted");
        Ok(())
    }

    /// Forward one player input, timestamped at the last pumped frame.
    pub fn handle_input(&mut self, action: InputAction) {
        self.engine.handle_input(action, self.now);
    }

    /// Directional input released.
    pub fn release_select(&mut self) {
        self.engine.release_select();
    }

    pub fn engine(&self) -> &CombatEngine {
        &self.engine
    }

    /// The audio callback entry point for this battle.
    pub fn clock_mut(&mut self) -> &mut BeatClockBridge {
        &mut self.bridge
    }

    pub fn is_finished(&self) -> bool {
        self.persisted
    }
}
