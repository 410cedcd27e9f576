//! Kinematic integration system.
//!
//! Ships turn toward their target rotation at a bounded rate, accelerate along
//! their control direction (plus any equipped thruster bonus), are clamped to
//! their top speed and lose speed to drag while coasting. Everything else with
//! a velocity simply drifts. Position is always `position += velocity * DT`.

use std::collections::BTreeMap;

use glam::Vec2;

use skirmish_core::components::*;
use skirmish_core::constants::{DT, SHIP_DRAG};
use skirmish_core::types::{angle_delta, EntityId};

use crate::store::{entity_id, Store};
use crate::systems::loadout;

/// Run kinematic integration for all entities with Transform + Velocity.
pub fn run(store: &mut Store) {
    let bonuses: BTreeMap<EntityId, f32> = store
        .sorted_with::<Equipment>()
        .into_iter()
        .map(|ship| (entity_id(ship), loadout::thrust_bonus(store, ship)))
        .collect();

    for (entity, (transform, velocity, control, stats, health)) in store.world_mut().query_mut::<(
        &mut Transform,
        &mut Velocity,
        Option<&ShipControl>,
        Option<&ShipStats>,
        Option<&Health>,
    )>() {
        if health.is_some_and(|h| h.0.is_depleted()) {
            continue;
        }
        if let (Some(control), Some(stats)) = (control, stats) {
            let bonus = bonuses.get(&entity_id(entity)).copied().unwrap_or(0.0);
            steer(transform, velocity, control, stats, bonus);
        }
        transform.position += velocity.0 * DT;
    }
}

fn steer(
    transform: &mut Transform,
    velocity: &mut Velocity,
    control: &ShipControl,
    stats: &ShipStats,
    thrust_bonus: f32,
) {
    let turn = angle_delta(transform.rotation, control.target_rotation)
        .clamp(-stats.turn_rate, stats.turn_rate);
    transform.rotation = angle_delta(0.0, transform.rotation + turn);

    if control.acceleration == Vec2::ZERO {
        velocity.0 *= SHIP_DRAG;
    } else {
        velocity.0 += control.acceleration * (stats.acceleration + thrust_bonus) * DT;
    }
    velocity.0 = velocity.0.clamp_length_max(stats.max_speed);
}
