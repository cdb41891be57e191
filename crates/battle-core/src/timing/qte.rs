//! Quick-time input prompt spanning a fixed number of beats.

use super::window::{BeatResult, BeatWindow};

/// Action id quick-time inputs register in the beat window's cooldown table.
const QTE_ACTION_ID: &str = "qte";

/// Lifecycle of one prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QteState {
    Idle,
    /// Prompt visible, input rejected.
    Armed,
    /// Trailing input window open.
    InputEnabled,
    /// Result produced, waiting to be taken.
    Resolved,
}

/// A bounded input prompt spanning N beats.
///
/// The prompt is armed for `total_beats * beat_length - input_window`
/// seconds, then accepts a single input for the trailing `input_window`
/// seconds; the accepted input is classified by [`BeatWindow`]. No input by
/// the end of the full duration resolves `Missed`.
///
/// Waiting is expressed as elapsed-time fields advanced by
/// [`tick`](Self::tick); there is no blocking and no detached task.
///
/// Contract: every [`start`](Self::start) produces exactly one result
/// through [`take_result`](Self::take_result), never zero, never two.
#[derive(Clone, Debug)]
pub struct QuickTimeWindow {
    state: QteState,
    input_window: f32,
    elapsed: f32,
    arm_duration: f32,
    total_duration: f32,
    result: Option<BeatResult>,
}

impl QuickTimeWindow {
    pub fn new(input_window: f32) -> Self {
        Self {
            state: QteState::Idle,
            input_window,
            elapsed: 0.0,
            arm_duration: 0.0,
            total_duration: 0.0,
            result: None,
        }
    }

    /// Begin a prompt spanning `total_beats` beats of the given length.
    ///
    /// A pending unresolved prompt is superseded; its result would already
    /// have been surfaced before the engine starts another.
    pub fn start(&mut self, total_beats: u32, beat_length: f32) {
        self.total_duration = total_beats as f32 * beat_length;
        self.arm_duration = (self.total_duration - self.input_window).max(0.0);
        self.elapsed = 0.0;
        self.result = None;
        self.state = if self.arm_duration > 0.0 {
            QteState::Armed
        } else {
            QteState::InputEnabled
        };
    }

    /// Advance the prompt; times out to `Missed` when the full duration
    /// elapses without input.
    pub fn tick(&mut self, dt: f32) {
        if matches!(self.state, QteState::Idle | QteState::Resolved) {
            return;
        }
        self.elapsed += dt;

        if self.state == QteState::Armed && self.elapsed >= self.arm_duration {
            self.state = QteState::InputEnabled;
        }
        if self.state == QteState::InputEnabled && self.elapsed >= self.total_duration {
            self.result = Some(BeatResult::Missed);
            self.state = QteState::Resolved;
        }
    }

    /// Submit the player's input. Returns true if the input was accepted;
    /// input outside the enabled window is rejected without resolving.
    pub fn submit_input(&mut self, window: &mut BeatWindow, now: f32) -> bool {
        if self.state != QteState::InputEnabled {
            return false;
        }
        self.result = Some(window.result_for(QTE_ACTION_ID, now));
        self.state = QteState::Resolved;
        true
    }

    /// Take the resolution, returning to Idle. Yields a value exactly once
    /// per started prompt.
    pub fn take_result(&mut self) -> Option<BeatResult> {
        if self.state != QteState::Resolved {
            return None;
        }
        self.state = QteState::Idle;
        self.result.take()
    }

    pub fn state(&self) -> QteState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, QteState::Armed | QteState::InputEnabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::BeatEvent;

    fn beat_window_with_beat_at(time: f32) -> BeatWindow {
        let mut w = BeatWindow::new(0.05, 0.125, 0.4);
        let event = BeatEvent {
            beat_number: 1,
            bar_number: 0,
            tempo_bpm: 120.0,
            timeline_position: time,
            time_sig_upper: 4,
            time_sig_lower: 4,
        };
        w.on_beat(&event, time);
        w
    }

    #[test]
    fn input_rejected_while_armed() {
        let mut qte = QuickTimeWindow::new(0.5);
        let mut window = beat_window_with_beat_at(0.5);
        qte.start(4, 0.5); // 2.0s total, 1.5s armed

        qte.tick(1.0);
        assert_eq!(qte.state(), QteState::Armed);
        assert!(!qte.submit_input(&mut window, 1.0));
        assert!(qte.take_result().is_none());
    }

    #[test]
    fn accepted_input_resolves_with_window_classification() {
        let mut qte = QuickTimeWindow::new(0.5);
        // beat sits right at the moment we submit
        let mut window = beat_window_with_beat_at(1.6);
        qte.start(4, 0.5);

        qte.tick(1.6);
        assert_eq!(qte.state(), QteState::InputEnabled);
        assert!(qte.submit_input(&mut window, 1.6));
        assert_eq!(qte.take_result(), Some(BeatResult::Perfect));
        // exactly once
        assert!(qte.take_result().is_none());
    }

    #[test]
    fn timeout_resolves_missed_exactly_once() {
        let mut qte = QuickTimeWindow::new(0.5);
        qte.start(4, 0.5);

        qte.tick(2.5);
        assert_eq!(qte.take_result(), Some(BeatResult::Missed));
        assert!(qte.take_result().is_none());
        assert_eq!(qte.state(), QteState::Idle);
    }

    #[test]
    fn late_input_after_timeout_is_rejected() {
        let mut qte = QuickTimeWindow::new(0.5);
        let mut window = beat_window_with_beat_at(0.5);
        qte.start(4, 0.5);

        qte.tick(5.0);
        assert!(!qte.submit_input(&mut window, 5.0));
        assert_eq!(qte.take_result(), Some(BeatResult::Missed));
    }

    #[test]
    fn short_prompt_opens_input_immediately() {
        let mut qte = QuickTimeWindow::new(0.5);
        qte.start(1, 0.25); // total 0.25s < input window
        assert_eq!(qte.state(), QteState::InputEnabled);
    }
}
