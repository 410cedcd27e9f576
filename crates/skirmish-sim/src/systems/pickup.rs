//! Pickup system: avatars collect dropped items they fly over.

use skirmish_core::components::*;
use skirmish_core::constants::{GROUP_SHIPS, PICKUP_RADIUS};
use skirmish_core::enums::SoundCue;
use skirmish_core::events::SimEvent;

use crate::store::{entity_id, Store};

pub fn run(store: &mut Store, events: &mut Vec<SimEvent>) {
    for (_entity, dropped) in store.world_mut().query_mut::<&mut Dropped>() {
        dropped.pickup_delay = dropped.pickup_delay.saturating_sub(1);
    }

    for item in store.sorted_with::<Dropped>() {
        if store.is_removed(item) {
            continue;
        }
        let ready = store.get::<Dropped>(item).is_some_and(|d| d.pickup_delay == 0);
        let Some(position) = store.get::<Transform>(item).map(|t| t.position) else {
            continue;
        };
        if !ready {
            continue;
        }

        let collector = store
            .query_nearby(position, PICKUP_RADIUS, GROUP_SHIPS)
            .into_iter()
            .find(|ship| {
                store.has::<Avatar>(*ship)
                    && store.get::<Health>(*ship).is_some_and(|h| !h.0.is_depleted())
                    && store
                        .get::<Inventory>(*ship)
                        .is_some_and(|inv| inv.first_free().is_some())
            });
        let Some(collector) = collector else {
            continue;
        };

        if let Some(mut inventory) = store.get_mut::<Inventory>(collector) {
            inventory.insert(entity_id(item));
        }
        store.remove_component::<Dropped>(item);
        store.remove_component::<Lifetime>(item);
        store.remove_component::<Collider>(item);
        store.remove_component::<Transform>(item);
        events.push(SimEvent::PlaySound {
            cue: SoundCue::ItemPickup,
            entity: entity_id(collector),
        });
    }
}
