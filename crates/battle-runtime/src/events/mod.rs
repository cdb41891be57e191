//! Event distribution toward observers.

mod bus;

pub use bus::{Event, EventBus, Topic};
