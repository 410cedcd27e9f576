//! Death system: handles everything whose health reached zero.
//!
//! Avatars with a `Respawn` component start their respawn timer. Anything else
//! is removed together with the items it carries and replaced by a short-lived
//! explosion effect. Repeated observations of the same death in one tick do
//! nothing: removal is deferred and idempotent, and a pending respawn is not
//! restarted.

use glam::Vec2;
use hecs::Entity;
use tracing::debug;

use skirmish_core::components::*;
use skirmish_core::constants::EFFECT_LIFETIME_TICKS;
use skirmish_core::enums::{EffectKind, SoundCue};
use skirmish_core::events::SimEvent;

use crate::store::{entity_id, Store};

pub fn run(store: &mut Store, events: &mut Vec<SimEvent>) {
    for entity in store.sorted_with::<Health>() {
        let dead = store.get::<Health>(entity).is_some_and(|h| h.0.is_depleted());
        if dead {
            kill(store, events, entity);
        }
    }
}

/// Process one death. Safe to call more than once per tick.
pub fn kill(store: &mut Store, events: &mut Vec<SimEvent>, entity: Entity) {
    if store.is_removed(entity) {
        return;
    }
    let position = store
        .get::<Transform>(entity)
        .map(|t| t.position)
        .unwrap_or(Vec2::ZERO);

    let respawn_pending = store.get::<Respawn>(entity).map(|r| r.is_pending());
    match respawn_pending {
        Some(true) => return,
        Some(false) => {
            if let Some(mut respawn) = store.get_mut::<Respawn>(entity) {
                respawn.remaining = Some(respawn.delay_ticks);
            }
        }
        None => {
            remove_with_items(store, entity);
            spawn_effect(store, EffectKind::Explosion, position);
        }
    }

    if let Some(mut velocity) = store.get_mut::<Velocity>(entity) {
        velocity.0 = Vec2::ZERO;
    }
    if let Some(mut control) = store.get_mut::<ShipControl>(entity) {
        *control = ShipControl::default();
    }

    debug!(entity = %entity_id(entity), "destroyed");
    events.push(SimEvent::SpawnEffect {
        kind: EffectKind::Explosion,
        position,
    });
    events.push(SimEvent::PlaySound {
        cue: SoundCue::Explosion,
        entity: entity_id(entity),
    });
}

/// Schedule an entity and every item in its inventory and equipment for removal.
pub fn remove_with_items(store: &mut Store, entity: Entity) {
    let mut items: Vec<Entity> = Vec::new();
    if let Some(inventory) = store.get::<Inventory>(entity) {
        items.extend(inventory.items().filter_map(|id| store.resolve(id)));
    }
    if let Some(equipment) = store.get::<Equipment>(entity) {
        items.extend(equipment.items().filter_map(|id| store.resolve(id)));
    }
    for item in items {
        store.remove_entity(item);
    }
    store.remove_entity(entity);
}

/// Visual-only entity that expires on its own.
fn spawn_effect(store: &mut Store, kind: EffectKind, position: Vec2) -> Entity {
    let effect = store.create_entity();
    store.add_component(effect, Transform::at(position));
    store.add_component(effect, Effect { kind });
    store.add_component(
        effect,
        Lifetime {
            remaining_ticks: EFFECT_LIFETIME_TICKS,
        },
    );
    store.add_component(
        effect,
        Appearance {
            texture: "effects/explosion".to_string(),
        },
    );
    effect
}
