//! Lockstep simulation engine for skirmish.
//!
//! Owns the hecs-backed entity store, applies frame-stamped commands, runs
//! all systems at a fixed tick rate and hashes the resulting state so that
//! independent instances can be checked against each other.

pub mod engine;
pub mod factory;
pub mod handler;
pub mod lockstep;
pub mod queue;
#[cfg(debug_assertions)]
pub mod script;
pub mod spatial;
pub mod store;
pub mod systems;
pub mod world_setup;

pub use engine::{SimConfig, Simulation};
pub use lockstep::{Desync, TrailingPair};
pub use skirmish_core as core;

#[cfg(test)]
mod tests;
