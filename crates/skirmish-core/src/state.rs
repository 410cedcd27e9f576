//! Read-only state views handed to rendering and replay tooling after each tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::events::SimEvent;
use crate::types::EntityId;

/// Result of advancing one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// The frame that was simulated.
    pub frame: u64,
    /// State hash after the frame.
    pub hash: u64,
    pub events: Vec<SimEvent>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderView {
    pub frame: u64,
    /// Sorted by entity id.
    pub sprites: Vec<SpriteView>,
    pub avatars: Vec<AvatarView>,
}

/// One drawable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteView {
    pub entity: EntityId,
    pub position: Vec2,
    pub rotation: f32,
    pub texture: String,
}

/// HUD data for one player's avatar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarView {
    pub player: u8,
    pub entity: EntityId,
    pub health: f32,
    pub max_health: f32,
    pub energy: f32,
    pub max_energy: f32,
    /// `true` while waiting to respawn.
    pub dead: bool,
}
