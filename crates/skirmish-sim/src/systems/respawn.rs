//! Respawn system: counts down dead avatars and restores them.

use glam::Vec2;
use tracing::debug;

use skirmish_core::components::*;
use skirmish_core::enums::EffectKind;
use skirmish_core::events::SimEvent;

use crate::store::{entity_id, Store};

pub fn run(store: &mut Store, events: &mut Vec<SimEvent>) {
    // Collect restorations to avoid borrow issues with hecs
    let mut restored: Vec<(hecs::Entity, Vec2)> = Vec::new();

    for (entity, respawn) in store.world_mut().query_mut::<&mut Respawn>() {
        let Some(remaining) = respawn.remaining.as_mut() else {
            continue;
        };
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            respawn.remaining = None;
            restored.push((entity, respawn.position));
        }
    }
    restored.sort_by_key(|(entity, _)| entity.to_bits());

    for (entity, position) in restored {
        if let Ok((transform, velocity, control, health, energy)) =
            store.world_mut().query_one_mut::<(
                &mut Transform,
                &mut Velocity,
                &mut ShipControl,
                &mut Health,
                Option<&mut Energy>,
            )>(entity)
        {
            *transform = Transform::at(position);
            *velocity = Velocity::default();
            *control = ShipControl::default();
            health.0.fill();
            if let Some(energy) = energy {
                energy.0.fill();
            }
        }
        store.reindex_entity(entity);
        debug!(entity = %entity_id(entity), "respawned");
        events.push(SimEvent::SpawnEffect {
            kind: EffectKind::Respawn,
            position,
        });
    }
}
