//! Core types and definitions for the skirmish lockstep simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! components, commands, the wire codec, state hashing, events and constants.
//! It has no dependency on the ECS or any runtime framework.

pub mod codec;
pub mod commands;
pub mod components;
pub mod constants;
pub mod enums;
pub mod events;
pub mod hash;
pub mod state;
pub mod types;
