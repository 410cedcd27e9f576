//! Per-tick systems that operate on the simulation store.
//!
//! Systems are free functions over `&mut Store` plus whatever tick inputs they
//! need. They own no state: everything lives in components. The engine calls
//! them in one fixed order every tick.

pub mod ai;
pub mod cleanup;
pub mod collision;
pub mod death;
pub mod loadout;
pub mod movement;
pub mod pickup;
pub mod regeneration;
pub mod respawn;
pub mod view;
pub mod weapons;
