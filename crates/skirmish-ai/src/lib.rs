//! AI behaviour evaluation for skirmish ships.
//!
//! Implements the patrol / attack / return-to-post state machine and the
//! per-behaviour steering that follows each transition.

pub mod fsm;
pub mod steering;

pub use skirmish_core as core;
