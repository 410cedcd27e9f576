//! Enumeration types used throughout the simulation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// Kind of standing order given to an AI-controlled ship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// Fly to a point.
    Move,
    /// Hold position around a point.
    #[default]
    Guard,
    /// Engage anything hostile near a point.
    Attack,
}

/// The active AI behaviour. Exactly one per AI-controlled entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Orbit the guard point and watch for enemies.
    #[default]
    Patrol,
    /// Pursue and fire at `target`. `start` is where the pursuit began.
    Attack { target: EntityId, start: Vec2 },
    /// Fly to `target` without engaging.
    MoveTo { target: Vec2 },
}

impl Behavior {
    /// Stable tag used by hashing and logs.
    pub fn tag(&self) -> u8 {
        match self {
            Behavior::Patrol => 0,
            Behavior::Attack { .. } => 1,
            Behavior::MoveTo { .. } => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Behavior::Patrol => "patrol",
            Behavior::Attack { .. } => "attack",
            Behavior::MoveTo { .. } => "move_to",
        }
    }
}

/// Equipment slot category. An item fits a slot of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotKind {
    Weapon,
    Armor,
    Thruster,
}

/// Container an item index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemSource {
    Inventory,
    Equipment,
}

/// Visual effect requested from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Ship destroyed.
    Explosion,
    /// Projectile impact.
    Impact,
    /// Avatar restored after death.
    Respawn,
}

/// Sound cue requested from the audio layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    WeaponFired,
    Hit,
    Explosion,
    ItemPickup,
    ItemUsed,
}
