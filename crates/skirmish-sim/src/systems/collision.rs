//! Collision damage system.
//!
//! Each damage source checks the ships overlapping its collider. Hits are
//! gated per target by the source's cooldown map; a zero cooldown means the
//! source is spent on its first hit and removed. Armour on the target reduces
//! each hit by a flat amount.

use skirmish_core::components::*;
use skirmish_core::constants::GROUP_SHIPS;
use skirmish_core::enums::{EffectKind, SoundCue};
use skirmish_core::events::SimEvent;

use crate::store::{entity_id, Store};
use crate::systems::loadout;

pub fn run(store: &mut Store, events: &mut Vec<SimEvent>, frame: u64) {
    for source in store.sorted_with::<CollisionDamage>() {
        if store.is_removed(source) {
            continue;
        }
        let (Some(position), Some(radius)) = (
            store.get::<Transform>(source).map(|t| t.position),
            store.get::<Collider>(source).map(|c| c.radius),
        ) else {
            continue;
        };
        let Some(mut damage) = store.get::<CollisionDamage>(source).map(|d| (*d).clone()) else {
            continue;
        };
        let faction = store.get::<Faction>(source).map(|f| *f);
        damage.prune(frame);

        let mut spent = false;
        for target in store.query_nearby(position, radius, GROUP_SHIPS) {
            if target == source {
                continue;
            }
            let target_id = entity_id(target);
            if !damage.can_hit(target_id, frame) {
                continue;
            }
            let alive = store.get::<Health>(target).is_some_and(|h| !h.0.is_depleted());
            if !alive {
                continue;
            }
            if let (Some(mine), Some(theirs)) = (faction, store.get::<Faction>(target).map(|f| *f))
            {
                if !mine.is_hostile_to(&theirs) {
                    continue;
                }
            }

            let amount = (damage.damage - loadout::armor_reduction(store, target)).max(0.0);
            if let Some(mut health) = store.get_mut::<Health>(target) {
                health.0.reduce(amount);
            }
            damage.record_hit(target_id, frame);
            events.push(SimEvent::SpawnEffect {
                kind: EffectKind::Impact,
                position,
            });
            events.push(SimEvent::PlaySound {
                cue: SoundCue::Hit,
                entity: target_id,
            });

            if damage.is_one_shot() {
                spent = true;
                break;
            }
        }

        if spent {
            store.remove_entity(source);
        } else if let Some(mut stored) = store.get_mut::<CollisionDamage>(source) {
            *stored = damage;
        }
    }
}
