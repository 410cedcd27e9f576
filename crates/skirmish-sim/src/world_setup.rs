//! Entity spawn helpers for setting up the simulation world.
//!
//! Creates AI-controlled ships from factory templates with their standing
//! order attached.

use glam::Vec2;
use hecs::Entity;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use skirmish_ai::fsm::initial_behavior;
use skirmish_core::components::{Ai, Faction, Order, Transform};
use skirmish_core::constants::AI_DEFAULT_MAX_DISTANCE;
use skirmish_core::enums::OrderKind;

use crate::factory::{EntityFactory, TemplateKind};
use crate::store::Store;

/// An AI ship placed in the world when the simulation starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSpawn {
    pub template: String,
    pub position: Vec2,
    #[serde(default)]
    pub order: OrderKind,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    /// Overrides the template's faction mask.
    #[serde(default)]
    pub faction: Option<u32>,
}

fn default_max_distance() -> f32 {
    AI_DEFAULT_MAX_DISTANCE
}

impl AiSpawn {
    pub fn guard(template: &str, position: Vec2) -> Self {
        Self {
            template: template.to_string(),
            position,
            order: OrderKind::Guard,
            max_distance: AI_DEFAULT_MAX_DISTANCE,
            faction: None,
        }
    }
}

/// Spawn one AI ship. The order's target point is the spawn position.
pub fn spawn_ai_ship(
    store: &mut Store,
    factory: &dyn EntityFactory,
    rng: &mut ChaCha8Rng,
    spawn: &AiSpawn,
) -> Option<Entity> {
    let ship = factory.sample(TemplateKind::Ship, &spawn.template, store, rng)?;
    let order = Order {
        kind: spawn.order,
        target: spawn.position,
        max_distance: spawn.max_distance,
    };
    store.add_component(ship, Transform::at(spawn.position));
    store.add_component(
        ship,
        Ai {
            order,
            behavior: initial_behavior(&order),
        },
    );
    if let Some(mask) = spawn.faction {
        store.add_component(ship, Faction(mask));
    }
    Some(ship)
}
