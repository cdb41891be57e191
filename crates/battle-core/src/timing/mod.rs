//! Beat-timing substrate.
//!
//! Everything here is driven by plain-value [`BeatEvent`]s copied out of the
//! audio engine's callbacks and by the game tick; nothing blocks and nothing
//! holds references into engine-owned memory.

mod clock;
mod qte;
mod scheduler;
mod window;

pub use clock::{BeatClock, BeatEvent, MarkerEvent};
pub use qte::{QteState, QuickTimeWindow};
pub use scheduler::BeatScheduler;
pub use window::{BeatResult, BeatWindow};
