//! Beat-quantized command scheduling.

use std::collections::VecDeque;

use super::clock::BeatEvent;

/// One queued command with its remaining-beats counter.
#[derive(Clone, Debug, PartialEq)]
struct ScheduledCommand<C> {
    command: C,
    remaining_beats: u32,
}

/// FIFO queue of commands fired after N beats elapse, independent of frame
/// rate.
///
/// Commands are plain values executed by the caller when
/// [`on_beat`](Self::on_beat) hands them back; queuing closures would invite
/// re-entrant mutation of combat state from inside the beat callback.
///
/// Drain order is strictly FIFO and head-blocking: on each beat the head's
/// counter is decremented and the command fires at zero; the scan continues
/// with the new head and stops at the first entry still above zero. Entries
/// behind a blocking head are not decremented that tick.
#[derive(Clone, Debug)]
pub struct BeatScheduler<C> {
    queue: VecDeque<ScheduledCommand<C>>,
    beats_left_in_bar: u32,
}

impl<C> Default for BeatScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> BeatScheduler<C> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            beats_left_in_bar: 0,
        }
    }

    /// Enqueue a command to fire after `beats` beats (minimum 1).
    pub fn schedule_after_beats(&mut self, command: C, beats: u32) {
        self.queue.push_back(ScheduledCommand {
            command,
            remaining_beats: beats.max(1),
        });
    }

    /// Enqueue a command for the next beat.
    pub fn run_on_next_beat(&mut self, command: C) {
        self.schedule_after_beats(command, 1);
    }

    /// Enqueue a command for the start of the next bar, plus `offset` beats.
    pub fn run_on_next_bar(&mut self, command: C, offset: u32) {
        self.schedule_after_beats(command, self.beats_left_in_bar + offset);
    }

    /// Advance the queue one beat, returning every command due this beat in
    /// queue order.
    pub fn on_beat(&mut self, event: &BeatEvent) -> Vec<C> {
        self.beats_left_in_bar = event.beats_left_in_bar();

        let mut fired = Vec::new();
        while let Some(head) = self.queue.front_mut() {
            head.remaining_beats -= 1;
            if head.remaining_beats == 0 {
                let entry = self.queue.pop_front().expect("head exists");
                fired.push(entry.command);
            } else {
                // head still waiting; later entries keep their counters
                break;
            }
        }
        fired
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
