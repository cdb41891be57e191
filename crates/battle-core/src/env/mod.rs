//! Environment oracles consumed by the combat engine.
//!
//! The engine never reaches for process-wide state: randomness comes in
//! through the [`RngOracle`] trait so battles replay deterministically from
//! a seed.

pub mod rng;

pub use rng::{PcgRng, RngOracle, compute_seed};
