//! Weapons system: cooldowns and firing.
//!
//! Every equipped weapon cools down each tick. A ship whose control says
//! `shooting` fires each ready weapon it can pay energy for, spawning the
//! weapon's projectile template at the muzzle.

use hecs::Entity;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use skirmish_core::components::*;
use skirmish_core::constants::MUZZLE_OFFSET;
use skirmish_core::enums::SoundCue;
use skirmish_core::events::SimEvent;
use skirmish_core::types::facing;

use crate::factory::{EntityFactory, TemplateKind};
use crate::store::{entity_id, Store};
use crate::systems::loadout;

pub fn run(
    store: &mut Store,
    factory: &dyn EntityFactory,
    rng: &mut ChaCha8Rng,
    events: &mut Vec<SimEvent>,
) {
    for (_entity, weapon) in store.world_mut().query_mut::<&mut Weapon>() {
        weapon.cooldown_remaining = weapon.cooldown_remaining.saturating_sub(1);
    }

    for ship in store.sorted_with::<ShipControl>() {
        let shooting = store.get::<ShipControl>(ship).is_some_and(|c| c.shooting);
        let alive = store.get::<Health>(ship).is_some_and(|h| !h.0.is_depleted());
        if !shooting || !alive {
            continue;
        }
        for weapon in loadout::equipped(store, ship) {
            if store.has::<Weapon>(weapon) {
                fire(store, factory, rng, events, ship, weapon);
            }
        }
    }
}

fn fire(
    store: &mut Store,
    factory: &dyn EntityFactory,
    rng: &mut ChaCha8Rng,
    events: &mut Vec<SimEvent>,
    ship: Entity,
    weapon: Entity,
) {
    let Some(stats) = store.get::<Weapon>(weapon).map(|w| (*w).clone()) else {
        return;
    };
    if stats.cooldown_remaining > 0 {
        return;
    }
    {
        let Some(mut energy) = store.get_mut::<Energy>(ship) else {
            return;
        };
        if energy.0.value < stats.energy_cost {
            return;
        }
        energy.0.reduce(stats.energy_cost);
    }
    if let Some(mut w) = store.get_mut::<Weapon>(weapon) {
        w.cooldown_remaining = w.cooldown_ticks;
    }

    let Some(transform) = store.get::<Transform>(ship).map(|t| *t) else {
        return;
    };
    let ship_velocity = store.get::<Velocity>(ship).map(|v| v.0).unwrap_or_default();
    let faction = store.get::<Faction>(ship).map(|f| *f);

    let Some(projectile) =
        factory.sample(TemplateKind::Projectile, &stats.projectile, store, rng)
    else {
        warn!(projectile = %stats.projectile, "unknown projectile template");
        return;
    };
    let direction = facing(transform.rotation);
    store.add_component(
        projectile,
        Transform {
            position: transform.position + direction * MUZZLE_OFFSET,
            rotation: transform.rotation,
        },
    );
    store.add_component(
        projectile,
        Velocity(ship_velocity + direction * stats.projectile_speed),
    );
    if let Some(faction) = faction {
        store.add_component(projectile, faction);
    }
    if let Some(mut damage) = store.get_mut::<CollisionDamage>(projectile) {
        damage.damage = stats.damage;
    }

    events.push(SimEvent::PlaySound {
        cue: SoundCue::WeaponFired,
        entity: entity_id(ship),
    });
}
