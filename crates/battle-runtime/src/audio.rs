//! Bridge between raw audio-engine callbacks and the combat thread.

use std::collections::VecDeque;

use battle_core::{BeatClock, BeatEvent, MarkerEvent};

/// Receives beat/marker callbacks and queues owned copies for the session.
///
/// Audio callbacks can fire on a different execution context than game
/// logic; every field is copied into a plain [`BeatEvent`]/[`MarkerEvent`]
/// value here, so nothing downstream holds references into audio-engine
/// memory. The session drains the queues on its own thread each pump.
#[derive(Debug, Default)]
pub struct BeatClockBridge {
    playing: bool,
    paused: bool,
    beats: VecDeque<BeatEvent>,
    markers: VecDeque<MarkerEvent>,
}

impl BeatClockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw beat callback entry point; copies every field before queueing.
    #[allow(clippy::too_many_arguments)]
    pub fn on_raw_beat(
        &mut self,
        beat_number: u32,
        bar_number: u32,
        tempo_bpm: f32,
        timeline_position: f32,
        time_sig_upper: u32,
        time_sig_lower: u32,
    ) {
        if !self.playing || self.paused {
            return;
        }
        self.beats.push_back(BeatEvent {
            beat_number,
            bar_number,
            tempo_bpm,
            timeline_position,
            time_sig_upper,
            time_sig_lower,
        });
    }

    /// Raw marker callback entry point.
    pub fn on_raw_marker(&mut self, name: &str, position: f32) {
        if !self.playing || self.paused {
            return;
        }
        self.markers.push_back(MarkerEvent {
            name: name.to_string(),
            position,
        });
    }

    pub fn drain_beats(&mut self) -> Vec<BeatEvent> {
        self.beats.drain(..).collect()
    }

    pub fn drain_markers(&mut self) -> Vec<MarkerEvent> {
        self.markers.drain(..).collect()
    }
}

impl BeatClock for BeatClockBridge {
    fn is_playing(&self) -> bool {
        self.playing && !self.paused
    }

    fn start(&mut self) {
        self.playing = true;
        self.paused = false;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.beats.clear();
        self.markers.clear();
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}
