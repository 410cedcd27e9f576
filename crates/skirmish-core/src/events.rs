//! Events emitted by the simulation for the visual and audio layers.
//!
//! Fire-and-forget: the simulation never reads them back.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// Spawn a visual effect at a world position.
    SpawnEffect { kind: EffectKind, position: Vec2 },
    /// Play a sound attached to an entity.
    PlaySound { cue: SoundCue, entity: EntityId },
}
