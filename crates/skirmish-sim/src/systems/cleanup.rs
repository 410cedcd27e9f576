//! Cleanup system: removes expired and out-of-bounds entities.

use skirmish_core::components::{Avatar, Lifetime, Transform};

use crate::store::Store;
use crate::systems::death;

/// Count down lifetimes and drop anything that left the world.
///
/// Avatars are never removed for leaving the bounds. Removal is deferred to
/// the end of the tick like every other removal.
pub fn run(store: &mut Store, world_radius: f32) {
    let mut expired = Vec::new();
    for (entity, lifetime) in store.world_mut().query_mut::<&mut Lifetime>() {
        lifetime.remaining_ticks = lifetime.remaining_ticks.saturating_sub(1);
        if lifetime.remaining_ticks == 0 {
            expired.push(entity);
        }
    }
    for entity in expired {
        store.remove_entity(entity);
    }

    let radius_sq = world_radius * world_radius;
    for entity in store.sorted_with::<Transform>() {
        if store.is_removed(entity) || store.has::<Avatar>(entity) {
            continue;
        }
        let outside = store
            .get::<Transform>(entity)
            .is_some_and(|t| t.position.length_squared() > radius_sq);
        if outside {
            death::remove_with_items(store, entity);
        }
    }
}
