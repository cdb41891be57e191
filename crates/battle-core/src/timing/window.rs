//! Beat window classification and per-action-id cooldowns.

use super::clock::BeatEvent;

// ============================================================================
// Beat Result
// ============================================================================

/// Timing classification of one input relative to the nearest beat.
///
/// Ordered by desirability: `Perfect > Good > Mashed > Missed`. Only
/// `Good` and `Perfect` count as success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum BeatResult {
    /// Input landed outside every timing window.
    Missed,
    /// Input rejected because the action id is still on cooldown.
    Mashed,
    Good,
    Perfect,
}

impl BeatResult {
    pub fn is_success(self) -> bool {
        matches!(self, BeatResult::Good | BeatResult::Perfect)
    }
}

// ============================================================================
// Cooldown Entry
// ============================================================================

/// Live anti-mash cooldown for one action id.
#[derive(Clone, Debug, PartialEq)]
struct CooldownEntry {
    id: String,
    /// Wall-clock time the cooldown was registered.
    started_at: f32,
    /// Beat counter recorded at registration; the entry also expires once
    /// the music moves past this beat.
    beat: u32,
}

// ============================================================================
// Beat Window
// ============================================================================

/// Classifies input timing against the beat history and rejects mashing.
///
/// Each [`on_beat`](Self::on_beat) records two timestamps: the *predicted*
/// next-beat time (`last_beat_time + beat_length`) and the *actual* firing
/// time. Storing both models scheduler jitter; the classification scans for
/// the nearest of all stored times.
#[derive(Clone, Debug)]
pub struct BeatWindow {
    perfect_threshold: f32,
    good_threshold: f32,
    cooldown_duration: f32,
    beat_times: Vec<f32>,
    cooldowns: Vec<CooldownEntry>,
    last_beat: u32,
    last_beat_time: f32,
    next_beat_time: f32,
    last_beat_duration: f32,
}

impl BeatWindow {
    /// Stored beat timestamps are capped; older entries can never be the
    /// nearest beat to a live input.
    const MAX_HISTORY: usize = 64;

    pub fn new(perfect_threshold: f32, good_threshold: f32, cooldown_duration: f32) -> Self {
        Self {
            perfect_threshold,
            good_threshold,
            cooldown_duration,
            beat_times: Vec::new(),
            cooldowns: Vec::new(),
            last_beat: 0,
            last_beat_time: 0.0,
            next_beat_time: 0.0,
            last_beat_duration: 0.0,
        }
    }

    /// Record a beat: predicted next-beat time plus the actual firing time.
    pub fn on_beat(&mut self, event: &BeatEvent, now: f32) {
        let beat_length = event.beat_length();
        let predicted = self.last_beat_time + beat_length;
        self.beat_times.push(predicted);
        self.beat_times.push(now);
        if self.beat_times.len() > Self::MAX_HISTORY {
            let excess = self.beat_times.len() - Self::MAX_HISTORY;
            self.beat_times.drain(..excess);
        }
        self.last_beat_time = predicted;
        self.next_beat_time = predicted + beat_length;
        self.last_beat_duration = beat_length;
        self.last_beat = event.beat_number;
    }

    /// Expire cooldowns that aged out or whose beat has passed.
    pub fn on_tick(&mut self, now: f32) {
        let duration = self.cooldown_duration;
        let current_beat = self.last_beat;
        self.cooldowns
            .retain(|c| now - c.started_at < duration && current_beat <= c.beat);
    }

    /// Classify an input for `id`, registering an anti-mash cooldown.
    ///
    /// A live cooldown for the same id short-circuits to
    /// [`BeatResult::Mashed`] without classifying.
    pub fn result_for(&mut self, id: &str, now: f32) -> BeatResult {
        if self.cooldowns.iter().any(|c| c.id == id) {
            return BeatResult::Mashed;
        }
        self.cooldowns.push(CooldownEntry {
            id: id.to_string(),
            started_at: now,
            beat: self.last_beat,
        });
        self.classify_only(now)
    }

    /// Classification without cooldown registration or mash rejection.
    pub fn classify_only(&self, now: f32) -> BeatResult {
        let Some(nearest) = self.nearest_beat(now) else {
            return BeatResult::Missed;
        };
        self.classify((now - nearest).abs())
    }

    /// Predicted time of the next beat.
    pub fn next_beat_time(&self) -> f32 {
        self.next_beat_time
    }

    /// Seconds per beat observed on the last beat.
    pub fn last_beat_duration(&self) -> f32 {
        self.last_beat_duration
    }

    pub fn last_beat(&self) -> u32 {
        self.last_beat
    }

    fn nearest_beat(&self, now: f32) -> Option<f32> {
        self.beat_times
            .iter()
            .copied()
            .min_by(|a, b| {
                (now - a)
                    .abs()
                    .partial_cmp(&(now - b).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    fn classify(&self, accuracy: f32) -> BeatResult {
        if accuracy < self.perfect_threshold {
            BeatResult::Perfect
        } else if accuracy < self.good_threshold {
            BeatResult::Good
        } else {
            BeatResult::Missed
        }
    }
}
