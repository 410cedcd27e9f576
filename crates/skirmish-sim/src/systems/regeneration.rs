//! Regeneration system: ticks every regenerating resource.
//!
//! Runs before anything reads health or energy. A ship at zero health is dead
//! (or waiting to respawn) and does not heal.

use skirmish_core::components::{Energy, Health};

use crate::store::Store;

pub fn run(store: &mut Store) {
    for (_entity, health) in store.world_mut().query_mut::<&mut Health>() {
        if !health.0.is_depleted() {
            health.0.update();
        }
    }
    for (_entity, (energy, health)) in store
        .world_mut()
        .query_mut::<(&mut Energy, Option<&Health>)>()
    {
        if health.is_some_and(|h| h.0.is_depleted()) {
            continue;
        }
        energy.0.update();
    }
}
