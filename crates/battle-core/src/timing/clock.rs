//! Beat clock interface consumed from the audio subsystem.

// ============================================================================
// Beat Event
// ============================================================================

/// Plain-value snapshot of one audio beat callback.
///
/// Beat callbacks may originate on a different execution context than game
/// logic; every field is copied into this struct before it crosses into
/// combat state, so no references into engine-owned memory outlive the
/// callback.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeatEvent {
    /// Beat counter within the track (monotonic while playing).
    pub beat_number: u32,
    pub bar_number: u32,
    pub tempo_bpm: f32,
    /// Playback position in seconds.
    pub timeline_position: f32,
    /// Time signature numerator (beats per bar).
    pub time_sig_upper: u32,
    pub time_sig_lower: u32,
}

impl BeatEvent {
    /// Seconds per beat. Returns 0, not infinity, when tempo is unset.
    pub fn beat_length(&self) -> f32 {
        if self.tempo_bpm <= 0.0 {
            return 0.0;
        }
        60.0 / self.tempo_bpm
    }

    /// Beats remaining before the current bar completes.
    pub fn beats_left_in_bar(&self) -> u32 {
        if self.time_sig_upper == 0 {
            return 0;
        }
        self.time_sig_upper - self.beat_number % self.time_sig_upper
    }
}

/// A named timeline marker fired by the audio engine.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerEvent {
    pub name: String,
    pub position: f32,
}

// ============================================================================
// Beat Clock
// ============================================================================

/// Transport control over the backing track.
///
/// Implemented by the runtime's audio bridge and by test fakes; the core
/// only consumes it.
pub trait BeatClock {
    fn is_playing(&self) -> bool;
    fn start(&mut self);
    fn stop(&mut self);
    fn set_paused(&mut self, paused: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(beat_number: u32, tempo_bpm: f32) -> BeatEvent {
        BeatEvent {
            beat_number,
            bar_number: 0,
            tempo_bpm,
            timeline_position: 0.0,
            time_sig_upper: 4,
            time_sig_lower: 4,
        }
    }

    #[test]
    fn beat_length_from_tempo() {
        assert_eq!(event(0, 120.0).beat_length(), 0.5);
        assert_eq!(event(0, 60.0).beat_length(), 1.0);
    }

    #[test]
    fn zero_tempo_yields_zero_not_infinity() {
        assert_eq!(event(0, 0.0).beat_length(), 0.0);
        assert_eq!(event(0, -1.0).beat_length(), 0.0);
    }

    #[test]
    fn beats_left_wraps_with_time_signature() {
        assert_eq!(event(0, 120.0).beats_left_in_bar(), 4);
        assert_eq!(event(3, 120.0).beats_left_in_bar(), 1);
        assert_eq!(event(4, 120.0).beats_left_in_bar(), 4);
    }
}
