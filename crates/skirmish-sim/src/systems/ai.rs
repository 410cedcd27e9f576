//! AI system: evaluates every AI ship's behaviour each tick.
//!
//! Gathers plain data for the FSM in `skirmish-ai`, then writes the new
//! behaviour and steering intent back into the ship's components.

use glam::Vec2;
use hecs::Entity;
use tracing::debug;

use skirmish_ai::fsm::{evaluate, AiContext, TargetStatus};
use skirmish_core::components::*;
use skirmish_core::constants::{AI_DETECTION_RADIUS, GROUP_SHIPS};
use skirmish_core::enums::Behavior;
use skirmish_core::types::EntityId;

use crate::store::{entity_id, Store};

/// Nearest living entity hostile to `faction` around `position`.
pub fn nearest_enemy(
    store: &Store,
    me: Entity,
    position: Vec2,
    faction: Faction,
) -> Option<(EntityId, Vec2)> {
    store
        .query_nearby(position, AI_DETECTION_RADIUS, GROUP_SHIPS)
        .into_iter()
        .filter(|other| *other != me)
        .find_map(|other| {
            let alive = store.get::<Health>(other).is_some_and(|h| !h.0.is_depleted());
            let hostile = store
                .get::<Faction>(other)
                .is_some_and(|f| faction.is_hostile_to(&f));
            let position = store.get::<Transform>(other).map(|t| t.position)?;
            (alive && hostile).then_some((entity_id(other), position))
        })
}

fn target_status(store: &Store, target: EntityId) -> TargetStatus {
    let Some(entity) = store.resolve(target) else {
        return TargetStatus::Missing;
    };
    let Some(position) = store.get::<Transform>(entity).map(|t| t.position) else {
        return TargetStatus::Missing;
    };
    match store.get::<Health>(entity) {
        Some(health) if !health.0.is_depleted() => TargetStatus::Alive { position },
        _ => TargetStatus::Dead,
    }
}

/// Run the AI system: evaluate the FSM for each AI ship, apply updates.
pub fn run(store: &mut Store, frame: u64) {
    // Collect updates in a buffer to avoid borrow issues with hecs
    let mut updates: Vec<(Entity, Behavior, ShipControl)> = Vec::new();

    {
        let store_ref = &*store;
        let mut query = store_ref
            .world()
            .query::<(&Ai, &Transform, &Faction, Option<&Health>)>();
        for (entity, (ai, transform, faction, health)) in query.iter() {
            if health.is_some_and(|h| h.0.is_depleted()) {
                continue;
            }
            let target = match ai.behavior {
                Behavior::Attack { target, .. } => target_status(store_ref, target),
                _ => TargetStatus::Missing,
            };
            let ctx = AiContext {
                behavior: ai.behavior,
                position: transform.position,
                rotation: transform.rotation,
                order: ai.order,
                nearest_enemy: nearest_enemy(store_ref, entity, transform.position, *faction),
                target,
            };

            let update = evaluate(&ctx);
            if update.changed {
                debug!(
                    frame,
                    entity = %entity_id(entity),
                    from = ctx.behavior.name(),
                    to = update.behavior.name(),
                    "ai transition"
                );
            }
            updates.push((
                entity,
                update.behavior,
                ShipControl {
                    acceleration: update.steering.acceleration,
                    target_rotation: update.steering.target_rotation,
                    shooting: update.steering.shooting,
                },
            ));
        }
    }

    // Apply updates
    for (entity, behavior, control) in updates {
        if let Ok((ai, ship_control)) = store
            .world_mut()
            .query_one_mut::<(&mut Ai, &mut ShipControl)>(entity)
        {
            ai.behavior = behavior;
            *ship_control = control;
        }
    }
}
