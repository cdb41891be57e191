//! Host-side plumbing around [`battle_core`]: the topic event bus, the save
//! repository, the audio-callback bridge, and the battle session that wires
//! them together. Rendering and audio playback stay outside; this crate
//! moves plain values between them and the deterministic core.

pub mod affinity;
pub mod audio;
pub mod error;
pub mod events;
pub mod repository;
pub mod session;

pub use affinity::AffinityLogger;
pub use audio::BeatClockBridge;
pub use error::{Result, RuntimeError};
pub use events::{Event, EventBus, Topic};
pub use repository::{FileSaveRepository, InMemorySaveRepository, SaveData, SaveRepository};
pub use session::BattleSession;
