//! Frame-stamped commands, the only way player and AI intent enters the simulation.
//!
//! Commands are immutable once built. They are enqueued, applied exactly once
//! at their target frame, then discarded.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::enums::ItemSource;
use crate::types::PlayerId;

/// A command together with the frame it applies at and the player it came from.
///
/// Field order is the wire order: variant tag and payload, then frame, then player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    pub frame: u64,
    pub player: PlayerId,
}

impl Command {
    pub fn new(frame: u64, player: PlayerId, kind: CommandKind) -> Self {
        Self {
            kind,
            frame,
            player,
        }
    }
}

/// All possible command payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandKind {
    // --- Ship control ---
    /// Set the acceleration direction. Longer vectors are normalized.
    Accelerate { direction: Vec2 },
    /// Set the rotation the ship turns toward (radians).
    Rotate { target: f32 },
    BeginShooting,
    StopShooting,

    // --- Inventory ---
    /// Equip the item at `inventory_index` into equipment `slot`, swapping out
    /// whatever was there.
    Equip { inventory_index: u16, slot: u16 },
    /// Swap two inventory slots.
    MoveItem { first: u16, second: u16 },
    /// Drop an item into the world.
    Drop { index: u16, source: ItemSource },
    /// Use a consumable from the inventory.
    Use { inventory_index: u16 },

    // --- Session ---
    /// Create the player's avatar. Allowed once per player per session.
    RestoreProfile { profile: Profile },

    // --- Debugging ---
    /// Debug console input. Ignored by release builds.
    Script { source: String },
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Accelerate { .. } => "accelerate",
            CommandKind::Rotate { .. } => "rotate",
            CommandKind::BeginShooting => "begin_shooting",
            CommandKind::StopShooting => "stop_shooting",
            CommandKind::Equip { .. } => "equip",
            CommandKind::MoveItem { .. } => "move_item",
            CommandKind::Drop { .. } => "drop",
            CommandKind::Use { .. } => "use",
            CommandKind::RestoreProfile { .. } => "restore_profile",
            CommandKind::Script { .. } => "script",
        }
    }
}

/// Persistent player data used to build an avatar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Ship template name.
    pub ship: String,
    pub position: Vec2,
    /// Item templates placed into the inventory, in order.
    pub inventory: Vec<String>,
    /// Item templates equipped into the first compatible free slot.
    pub equipment: Vec<String>,
}
