//! Tests for the simulation stepper, command handling, systems and the
//! leading/trailing verifier.

use glam::Vec2;

use skirmish_core::commands::{Command, CommandKind, Profile};
use skirmish_core::components::*;
use skirmish_core::constants::*;
use skirmish_core::enums::*;
use skirmish_core::events::SimEvent;
use skirmish_core::types::PlayerId;

use crate::engine::{SimConfig, Simulation};
use crate::lockstep::TrailingPair;
use crate::queue::QueueError;
use crate::store::{entity_id, Store};
use crate::systems::{collision, death};
use crate::world_setup::AiSpawn;

fn profile(position: Vec2, inventory: &[&str]) -> Profile {
    Profile {
        ship: "player_ship".into(),
        position,
        inventory: inventory.iter().map(|s| s.to_string()).collect(),
        equipment: Vec::new(),
    }
}

/// Queue a command for the next frame and step once.
fn run_command(sim: &mut Simulation, player: PlayerId, kind: CommandKind) {
    let frame = sim.frame();
    sim.enqueue(Command::new(frame, player, kind)).unwrap();
    sim.tick();
}

fn restore(sim: &mut Simulation, player: PlayerId, profile: Profile) -> hecs::Entity {
    run_command(sim, player, CommandKind::RestoreProfile { profile });
    sim.avatar(player).expect("avatar restored")
}

fn health(sim: &Simulation, entity: hecs::Entity) -> RegeneratingValue {
    sim.store().get::<Health>(entity).unwrap().0
}

fn inventory_of(sim: &Simulation, entity: hecs::Entity) -> Inventory {
    (*sim.store().get::<Inventory>(entity).unwrap()).clone()
}

fn equipment_of(sim: &Simulation, entity: hecs::Entity) -> Equipment {
    (*sim.store().get::<Equipment>(entity).unwrap()).clone()
}

fn target_dummy(store: &mut Store, position: Vec2) -> hecs::Entity {
    let ship = store.create_entity();
    store.add_component(ship, Transform::at(position));
    store.add_component(
        ship,
        Collider {
            radius: 20.0,
            groups: GROUP_SHIPS,
        },
    );
    store.add_component(ship, Health(RegeneratingValue::new(100.0, 0.0, 0)));
    ship
}

fn damage_source(store: &mut Store, position: Vec2, damage: CollisionDamage) -> hecs::Entity {
    let source = store.create_entity();
    store.add_component(source, Transform::at(position));
    store.add_component(
        source,
        Collider {
            radius: 4.0,
            groups: GROUP_PROJECTILES,
        },
    );
    store.add_component(source, damage);
    source
}

fn raider_config(seed: u64, position: Vec2) -> SimConfig {
    SimConfig {
        seed,
        ai_ships: vec![AiSpawn::guard("raider", position)],
        ..Default::default()
    }
}

// ---- Determinism ----

#[test]
fn test_determinism_same_seed() {
    let mut a = Simulation::new(raider_config(12345, Vec2::ZERO));
    let mut b = Simulation::new(raider_config(12345, Vec2::ZERO));

    for sim in [&mut a, &mut b] {
        sim.enqueue(Command::new(
            0,
            0,
            CommandKind::RestoreProfile {
                profile: profile(Vec2::new(400.0, 0.0), &["repair_kit"]),
            },
        ))
        .unwrap();
        sim.enqueue(Command::new(10, 0, CommandKind::BeginShooting))
            .unwrap();
        sim.enqueue(Command::new(
            20,
            0,
            CommandKind::Accelerate {
                direction: Vec2::new(-1.0, 0.5),
            },
        ))
        .unwrap();
    }

    for _ in 0..300 {
        let ra = a.tick();
        let rb = b.tick();
        assert_eq!(ra.hash, rb.hash, "hash diverged at frame {}", ra.frame);
        assert_eq!(ra.events, rb.events);
    }
}

#[test]
fn test_different_seeds_diverge() {
    // Raider stats are sampled from ranges.
    let mut a = Simulation::new(raider_config(111, Vec2::ZERO));
    let mut b = Simulation::new(raider_config(222, Vec2::ZERO));
    assert_ne!(a.tick().hash, b.tick().hash);
}

#[test]
fn test_hash_ignores_frame_number() {
    let mut sim = Simulation::new(SimConfig::default());
    let first = sim.tick().hash;
    let second = sim.tick().hash;
    assert_eq!(first, second, "empty world must hash the same every frame");
}

// ---- Command queue ----

#[test]
fn test_stale_command_rejected() {
    let mut sim = Simulation::new(SimConfig::default());
    for _ in 0..3 {
        sim.tick();
    }
    let result = sim.enqueue(Command::new(1, 0, CommandKind::BeginShooting));
    assert_eq!(
        result,
        Err(QueueError::StaleFrame {
            frame: 1,
            drained: 2
        })
    );
    assert_eq!(sim.pending_commands(), 0);
}

#[test]
fn test_future_command_waits_for_its_frame() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
    sim.enqueue(Command::new(5, 0, CommandKind::BeginShooting))
        .unwrap();

    while sim.frame() < 5 {
        sim.tick();
        assert!(!sim.store().get::<ShipControl>(avatar).unwrap().shooting);
    }
    sim.tick();
    assert!(sim.store().get::<ShipControl>(avatar).unwrap().shooting);
}

#[test]
fn test_commands_without_avatar_are_ignored() {
    let mut sim = Simulation::new(SimConfig::default());
    let before = sim.state_hash();
    let frame = sim.frame();
    sim.enqueue(Command::new(
        frame,
        3,
        CommandKind::Accelerate { direction: Vec2::X },
    ))
    .unwrap();
    sim.enqueue(Command::new(frame, 3, CommandKind::Use { inventory_index: 0 }))
        .unwrap();
    sim.tick();
    assert_eq!(sim.state_hash(), before);
}

// ---- Profile restore ----

#[test]
fn test_profile_restore_at_most_once() {
    let mut sim = Simulation::new(SimConfig::default());
    let frame = sim.frame();
    for x in [0.0, 500.0] {
        sim.enqueue(Command::new(
            frame,
            0,
            CommandKind::RestoreProfile {
                profile: profile(Vec2::new(x, 0.0), &[]),
            },
        ))
        .unwrap();
    }
    sim.tick();

    let avatars = sim.store().sorted_with::<Avatar>();
    assert_eq!(avatars.len(), 1);
    let avatar = sim.avatar(0).unwrap();
    assert_eq!(avatars[0], avatar);
    assert_eq!(
        sim.store().get::<Transform>(avatar).unwrap().position,
        Vec2::ZERO
    );

    // A later attempt is rejected too.
    run_command(
        &mut sim,
        0,
        CommandKind::RestoreProfile {
            profile: profile(Vec2::new(900.0, 0.0), &[]),
        },
    );
    assert_eq!(sim.store().sorted_with::<Avatar>().len(), 1);
}

#[test]
fn test_profile_restore_per_player() {
    let mut sim = Simulation::new(SimConfig::default());
    let a = restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
    let b = restore(&mut sim, 1, profile(Vec2::new(100.0, 0.0), &[]));
    assert_ne!(a, b);
    assert_eq!(sim.store().get::<Avatar>(b).unwrap().player, 1);
}

#[test]
fn test_profile_restore_unknown_ship_allows_retry() {
    let mut sim = Simulation::new(SimConfig::default());
    let mut bad = profile(Vec2::ZERO, &[]);
    bad.ship = "nope".into();
    run_command(&mut sim, 0, CommandKind::RestoreProfile { profile: bad });
    assert!(sim.avatar(0).is_none());

    restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
}

#[test]
fn test_profile_restore_only_accepts_ship_templates() {
    let mut sim = Simulation::new(SimConfig::default());
    let before = sim.store().len();
    for name in ["laser_bolt", "repair_kit"] {
        let mut bad = profile(Vec2::ZERO, &[]);
        bad.ship = name.into();
        run_command(&mut sim, 0, CommandKind::RestoreProfile { profile: bad });
        assert!(sim.avatar(0).is_none(), "{name} is not a hull");
        assert_eq!(sim.store().len(), before);
    }

    // The player is not locked out by the bad attempts.
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
    assert!(sim.store().has::<ShipControl>(avatar));
    assert!(sim.store().has::<Health>(avatar));
    assert!(sim.store().has::<Inventory>(avatar));
}

#[test]
fn test_profile_skips_non_item_templates() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(
        &mut sim,
        0,
        profile(Vec2::ZERO, &["raider", "laser_bolt", "repair_kit"]),
    );

    let inventory = inventory_of(&sim, avatar);
    let items: Vec<_> = inventory.items().collect();
    assert_eq!(items.len(), 1);
    let kit = sim.store().resolve(items[0]).unwrap();
    assert!(sim.store().has::<Consumable>(kit));
    assert_eq!(sim.store().sorted_with::<ShipControl>(), vec![avatar]);
    assert!(sim.store().sorted_with::<Lifetime>().is_empty());
}

#[test]
fn test_profile_items_created() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &["repair_kit", "light_armor"]));

    let inventory = inventory_of(&sim, avatar);
    assert_eq!(inventory.items().count(), 2);
    // The hull's loadout weapon is equipped.
    let equipment = equipment_of(&sim, avatar);
    let weapon = sim.store().resolve(equipment.slots[0].item.unwrap()).unwrap();
    assert!(sim.store().has::<Weapon>(weapon));
}

// ---- Ship control ----

#[test]
fn test_accelerate_normalizes_and_moves() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
    run_command(
        &mut sim,
        0,
        CommandKind::Accelerate {
            direction: Vec2::new(3.0, 4.0),
        },
    );

    let control = *sim.store().get::<ShipControl>(avatar).unwrap();
    assert!((control.acceleration.length() - 1.0).abs() < 1e-5);
    let position = sim.store().get::<Transform>(avatar).unwrap().position;
    assert!(position.x > 0.0 && position.y > 0.0);
}

#[test]
fn test_non_finite_input_rejected() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
    run_command(
        &mut sim,
        0,
        CommandKind::Accelerate {
            direction: Vec2::new(f32::NAN, 0.0),
        },
    );
    assert_eq!(
        sim.store().get::<ShipControl>(avatar).unwrap().acceleration,
        Vec2::ZERO
    );
}

#[test]
fn test_shooting_spawns_projectile_same_tick() {
    let mut sim = Simulation::new(SimConfig::default());
    restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
    let frame = sim.frame();
    sim.enqueue(Command::new(frame, 0, CommandKind::BeginShooting))
        .unwrap();
    let report = sim.tick();

    assert!(report.events.contains(&SimEvent::PlaySound {
        cue: SoundCue::WeaponFired,
        entity: entity_id(sim.avatar(0).unwrap()),
    }));
    let projectiles = sim
        .store()
        .world()
        .query::<&CollisionDamage>()
        .iter()
        .count();
    assert_eq!(projectiles, 1);
}

// ---- Inventory ----

#[test]
fn test_equip_swap_is_atomic() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(
        &mut sim,
        0,
        profile(Vec2::ZERO, &["light_armor", "afterburner", "plasma_cannon"]),
    );
    let a = sim.store().get::<Inventory>(avatar).unwrap().get(2).unwrap();
    let b = sim.store().get::<Equipment>(avatar).unwrap().slots[0]
        .item
        .unwrap();
    let hash_before = sim.state_hash();

    run_command(
        &mut sim,
        0,
        CommandKind::Equip {
            inventory_index: 2,
            slot: 0,
        },
    );

    let inventory = inventory_of(&sim, avatar);
    let equipment = equipment_of(&sim, avatar);
    assert_eq!(equipment.slots[0].item, Some(a));
    assert_eq!(inventory.get(2), Some(b));
    assert!(!inventory.items().any(|id| id == a));
    assert_eq!(inventory.items().count(), 3);
    assert_ne!(sim.state_hash(), hash_before);
}

#[test]
fn test_equip_into_wrong_slot_rejected() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &["light_armor"]));
    let before = inventory_of(&sim, avatar);

    // Slot 0 is a weapon slot.
    run_command(
        &mut sim,
        0,
        CommandKind::Equip {
            inventory_index: 0,
            slot: 0,
        },
    );
    assert_eq!(*sim.store().get::<Inventory>(avatar).unwrap(), before);

    run_command(
        &mut sim,
        0,
        CommandKind::Equip {
            inventory_index: 0,
            slot: 1,
        },
    );
    let equipment = equipment_of(&sim, avatar);
    assert_eq!(equipment.slots[1].item, before.get(0));
}

#[test]
fn test_out_of_range_indices_never_panic() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &["repair_kit"]));
    let before = inventory_of(&sim, avatar);

    for kind in [
        CommandKind::Equip {
            inventory_index: 99,
            slot: 0,
        },
        CommandKind::Equip {
            inventory_index: 0,
            slot: 99,
        },
        CommandKind::MoveItem {
            first: 0,
            second: u16::MAX,
        },
        CommandKind::Drop {
            index: 42,
            source: ItemSource::Equipment,
        },
        CommandKind::Use {
            inventory_index: 7,
        },
    ] {
        run_command(&mut sim, 0, kind);
    }
    assert_eq!(*sim.store().get::<Inventory>(avatar).unwrap(), before);
}

#[test]
fn test_move_item_swaps_slots() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &["repair_kit"]));
    let item = sim.store().get::<Inventory>(avatar).unwrap().get(0);

    run_command(&mut sim, 0, CommandKind::MoveItem { first: 0, second: 5 });
    let inventory = inventory_of(&sim, avatar);
    assert_eq!(inventory.get(0), None);
    assert_eq!(inventory.get(5), item);
}

#[test]
fn test_use_consumable() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &["repair_kit"]));
    let kit = sim.store().get::<Inventory>(avatar).unwrap().get(0).unwrap();
    sim.store_mut()
        .get_mut::<Health>(avatar)
        .unwrap()
        .0
        .reduce(50.0);

    run_command(&mut sim, 0, CommandKind::Use { inventory_index: 0 });

    assert_eq!(health(&sim, avatar).value, 90.0);
    assert_eq!(sim.store().get::<Inventory>(avatar).unwrap().get(0), None);
    assert!(sim.store().resolve(kit).is_none(), "used item removed");
}

#[test]
fn test_use_non_consumable_rejected() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &["light_armor"]));
    run_command(&mut sim, 0, CommandKind::Use { inventory_index: 0 });
    assert!(sim.store().get::<Inventory>(avatar).unwrap().get(0).is_some());
}

#[test]
fn test_dead_avatar_cannot_act() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &["repair_kit"]));
    sim.store_mut()
        .get_mut::<Health>(avatar)
        .unwrap()
        .0
        .set(0.0);
    sim.tick();
    assert!(sim.store().get::<Respawn>(avatar).unwrap().is_pending());

    run_command(&mut sim, 0, CommandKind::Use { inventory_index: 0 });
    run_command(&mut sim, 0, CommandKind::Accelerate { direction: Vec2::X });
    run_command(
        &mut sim,
        0,
        CommandKind::Drop {
            index: 0,
            source: ItemSource::Inventory,
        },
    );

    assert!(health(&sim, avatar).is_depleted());
    assert!(sim.view().avatars[0].dead);
    assert!(inventory_of(&sim, avatar).get(0).is_some());
    assert_eq!(
        sim.store().get::<ShipControl>(avatar).unwrap().acceleration,
        Vec2::ZERO
    );
}

#[test]
fn test_drop_and_pick_up_again() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::new(50.0, 50.0), &["repair_kit"]));
    let kit_id = sim.store().get::<Inventory>(avatar).unwrap().get(0).unwrap();

    run_command(
        &mut sim,
        0,
        CommandKind::Drop {
            index: 0,
            source: ItemSource::Inventory,
        },
    );
    let kit = sim.store().resolve(kit_id).unwrap();
    assert_eq!(sim.store().get::<Inventory>(avatar).unwrap().get(0), None);
    assert_eq!(
        sim.store().get::<Transform>(kit).unwrap().position,
        Vec2::new(50.0, 50.0)
    );
    assert!(sim.store().has::<Dropped>(kit));

    // Not collected while the pickup delay runs.
    sim.tick();
    assert!(sim.store().has::<Dropped>(kit));

    for _ in 0..PICKUP_DELAY_TICKS {
        sim.tick();
    }
    assert!(!sim.store().has::<Dropped>(kit));
    assert!(!sim.store().has::<Transform>(kit));
    assert_eq!(
        sim.store().get::<Inventory>(avatar).unwrap().get(0),
        Some(kit_id)
    );
}

#[test]
fn test_drop_of_stale_slot_leaves_it_untouched() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
    let gone = sim.store_mut().create_entity();
    sim.store_mut().remove_entity(gone);
    sim.store_mut().flush_removals();
    let stale = entity_id(gone);
    sim.store_mut()
        .get_mut::<Inventory>(avatar)
        .unwrap()
        .insert(stale);

    run_command(
        &mut sim,
        0,
        CommandKind::Drop {
            index: 0,
            source: ItemSource::Inventory,
        },
    );

    assert_eq!(inventory_of(&sim, avatar).get(0), Some(stale));
    assert!(sim.store().sorted_with::<Dropped>().is_empty());
}

// ---- Regeneration ----

#[test]
fn test_regen_suppressed_after_damage() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
    let cooldown = health(&sim, avatar).cooldown_ticks;
    sim.store_mut()
        .get_mut::<Health>(avatar)
        .unwrap()
        .0
        .reduce(10.0);

    for _ in 0..cooldown {
        sim.tick();
        assert_eq!(health(&sim, avatar).value, 90.0);
    }
    sim.tick();
    assert!(health(&sim, avatar).value > 90.0);
}

// ---- Collision damage ----

#[test]
fn test_one_shot_source_applies_once_and_is_removed() {
    let mut store = Store::new();
    let mut events = Vec::new();
    let target = target_dummy(&mut store, Vec2::ZERO);
    let bolt = damage_source(&mut store, Vec2::ZERO, CollisionDamage::new(10.0, 0));

    collision::run(&mut store, &mut events, 0);
    assert_eq!(store.get::<Health>(target).unwrap().0.value, 90.0);
    assert!(store.is_removed(bolt));

    collision::run(&mut store, &mut events, 1);
    assert_eq!(store.get::<Health>(target).unwrap().0.value, 90.0);
    assert_eq!(store.flush_removals(), 1);
    assert!(!store.contains(bolt));
}

#[test]
fn test_cooldown_source_rehits_after_k_ticks() {
    const K: u32 = 30;
    let mut store = Store::new();
    let mut events = Vec::new();
    let target = target_dummy(&mut store, Vec2::ZERO);
    let cloud = damage_source(&mut store, Vec2::ZERO, CollisionDamage::new(5.0, K));

    for frame in 0..u64::from(K) {
        collision::run(&mut store, &mut events, frame);
        assert_eq!(
            store.get::<Health>(target).unwrap().0.value,
            95.0,
            "frame {frame}"
        );
    }
    collision::run(&mut store, &mut events, u64::from(K));
    assert_eq!(store.get::<Health>(target).unwrap().0.value, 90.0);
    assert!(!store.is_removed(cloud));
}

#[test]
fn test_friendly_sources_do_not_damage() {
    let mut store = Store::new();
    let mut events = Vec::new();
    let target = target_dummy(&mut store, Vec2::ZERO);
    store.add_component(target, Faction(FACTION_PLAYERS));
    let bolt = damage_source(&mut store, Vec2::ZERO, CollisionDamage::new(10.0, 0));
    store.add_component(bolt, Faction(FACTION_PLAYERS));

    collision::run(&mut store, &mut events, 0);
    assert_eq!(store.get::<Health>(target).unwrap().0.value, 100.0);
    assert!(!store.is_removed(bolt));
    assert!(events.is_empty());
}

#[test]
fn test_armor_reduces_damage() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &["light_armor"]));
    run_command(
        &mut sim,
        0,
        CommandKind::Equip {
            inventory_index: 0,
            slot: 1,
        },
    );
    let store = sim.store_mut();
    let bolt = damage_source(store, Vec2::ZERO, CollisionDamage::new(10.0, 0));
    store.add_component(bolt, Faction(FACTION_NPC_A));
    sim.tick();

    let value = health(&sim, avatar).value;
    assert!(value > 90.0 && value < 100.0, "armor absorbed part: {value}");
}

// ---- Death ----

#[test]
fn test_death_is_idempotent() {
    let mut store = Store::new();
    let mut events = Vec::new();
    let ship = target_dummy(&mut store, Vec2::new(10.0, 0.0));
    store.get_mut::<Health>(ship).unwrap().0.set(0.0);

    death::kill(&mut store, &mut events, ship);
    death::kill(&mut store, &mut events, ship);
    death::run(&mut store, &mut events);

    let effects = store.world().query::<&Effect>().iter().count();
    assert_eq!(effects, 1);
    assert_eq!(events.len(), 2);
    assert_eq!(store.flush_removals(), 1);
}

#[test]
fn test_dead_ship_drops_its_items_with_it() {
    let mut sim = Simulation::new(raider_config(7, Vec2::ZERO));
    let raider = sim.store().sorted_with::<Ai>()[0];
    let weapon = sim.store().get::<Equipment>(raider).unwrap().slots[0]
        .item
        .unwrap();
    sim.store_mut()
        .get_mut::<Health>(raider)
        .unwrap()
        .0
        .set(0.0);

    let report = sim.tick();
    assert!(!sim.store().contains(raider));
    assert!(sim.store().resolve(weapon).is_none());
    assert!(report.events.contains(&SimEvent::SpawnEffect {
        kind: EffectKind::Explosion,
        position: Vec2::ZERO,
    }));
}

#[test]
fn test_avatar_respawns_after_delay() {
    let mut sim = Simulation::new(SimConfig::default());
    let spawn = Vec2::new(-200.0, 0.0);
    let avatar = restore(&mut sim, 0, profile(spawn, &[]));
    run_command(&mut sim, 0, CommandKind::Accelerate { direction: Vec2::Y });
    sim.store_mut()
        .get_mut::<Health>(avatar)
        .unwrap()
        .0
        .set(0.0);

    sim.tick();
    assert!(sim.store().contains(avatar), "avatars are kept while dead");
    assert!(sim.store().get::<Respawn>(avatar).unwrap().is_pending());
    assert!(sim.view().avatars[0].dead);

    for _ in 0..RESPAWN_DELAY_TICKS {
        sim.tick();
    }
    assert_eq!(health(&sim, avatar).value, health(&sim, avatar).max);
    assert_eq!(
        sim.store().get::<Transform>(avatar).unwrap().position,
        spawn
    );
    assert!(!sim.store().get::<Respawn>(avatar).unwrap().is_pending());
}

// ---- AI ----

#[test]
fn test_ai_ships_start_in_patrol() {
    let sim = Simulation::new(raider_config(1, Vec2::ZERO));
    let raider = sim.store().sorted_with::<Ai>()[0];
    let ai = *sim.store().get::<Ai>(raider).unwrap();
    assert_eq!(ai.order.kind, OrderKind::Guard);
    assert_eq!(ai.behavior, Behavior::Patrol);
}

#[test]
fn test_ai_attacks_then_disengages_when_target_dies() {
    let mut sim = Simulation::new(raider_config(3, Vec2::ZERO));
    let raider = sim.store().sorted_with::<Ai>()[0];
    let avatar = restore(&mut sim, 0, profile(Vec2::new(5_000.0, 0.0), &[]));
    sim.tick();
    assert_eq!(sim.store().get::<Ai>(raider).unwrap().behavior, Behavior::Patrol);

    // Tick T: an enemy appears inside detection range.
    let store = sim.store_mut();
    store.add_component(avatar, Transform::at(Vec2::new(300.0, 0.0)));
    sim.tick();
    match sim.store().get::<Ai>(raider).unwrap().behavior {
        Behavior::Attack { target, .. } => assert_eq!(target, entity_id(avatar)),
        other => panic!("expected attack, got {other:?}"),
    }

    for _ in 0..4 {
        sim.tick();
    }
    // Tick T+5: the target is killed.
    sim.store_mut()
        .get_mut::<Health>(avatar)
        .unwrap()
        .0
        .set(0.0);
    sim.tick();
    let behavior = sim.store().get::<Ai>(raider).unwrap().behavior;
    assert!(
        !matches!(behavior, Behavior::Attack { .. }),
        "still attacking: {behavior:?}"
    );
}

#[test]
fn test_ai_ignores_friendly_ships() {
    let mut config = raider_config(5, Vec2::ZERO);
    config
        .ai_ships
        .push(AiSpawn::guard("raider", Vec2::new(100.0, 0.0)));
    let mut sim = Simulation::new(config);
    for _ in 0..10 {
        sim.tick();
    }
    for raider in sim.store().sorted_with::<Ai>() {
        assert_eq!(sim.store().get::<Ai>(raider).unwrap().behavior, Behavior::Patrol);
    }
}

// ---- Debug console ----

#[cfg(debug_assertions)]
#[test]
fn test_script_goto_and_stats() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
    run_command(
        &mut sim,
        0,
        CommandKind::Script {
            source: "goto 100 200; set_stat energy 5\n# comment".into(),
        },
    );
    assert_eq!(
        sim.store().get::<Transform>(avatar).unwrap().position,
        Vec2::new(100.0, 200.0)
    );
    assert!(sim.store().get::<Energy>(avatar).unwrap().0.value < 10.0);
}

#[cfg(debug_assertions)]
#[test]
fn test_script_add_ai_and_factions() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
    run_command(
        &mut sim,
        0,
        CommandKind::Script {
            source: "set_factions\nadd_ai raider 2000 0".into(),
        },
    );
    assert_eq!(
        sim.store().get::<Faction>(avatar).unwrap().0,
        FACTION_PLAYERS | FACTION_NPC_A | FACTION_NPC_B
    );
    assert_eq!(sim.store().sorted_with::<Ai>().len(), 1);
}

#[cfg(debug_assertions)]
#[test]
fn test_script_failure_is_absorbed() {
    let mut sim = Simulation::new(SimConfig::default());
    let avatar = restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
    run_command(
        &mut sim,
        0,
        CommandKind::Script {
            source: "frobnicate 1 2".into(),
        },
    );
    assert_eq!(
        sim.store().get::<Transform>(avatar).unwrap().position,
        Vec2::ZERO
    );
    // The next frame runs normally.
    sim.tick();
}

// ---- View ----

#[test]
fn test_view_sorted_by_entity() {
    let mut sim = Simulation::new(raider_config(9, Vec2::new(3_000.0, 3_000.0)));
    restore(&mut sim, 0, profile(Vec2::ZERO, &[]));
    let view = sim.view();
    assert_eq!(view.frame, sim.frame());
    assert_eq!(view.sprites.len(), 2);
    assert!(view.sprites[0].entity < view.sprites[1].entity);
    assert_eq!(view.avatars.len(), 1);
}

// ---- Lockstep ----

#[test]
fn test_trailing_pair_stays_in_sync() {
    let mut pair = TrailingPair::new(raider_config(77, Vec2::ZERO), 8);
    pair.enqueue(Command::new(
        0,
        0,
        CommandKind::RestoreProfile {
            profile: profile(Vec2::new(350.0, 0.0), &["repair_kit"]),
        },
    ))
    .unwrap();
    pair.enqueue(Command::new(3, 0, CommandKind::BeginShooting))
        .unwrap();

    for _ in 0..200 {
        pair.step().unwrap();
    }
    pair.finish().unwrap();
    assert_eq!(pair.leading().frame(), pair.trailing().frame());
    assert_eq!(pair.leading().state_hash(), pair.trailing().state_hash());
}

#[test]
fn test_trailing_pair_detects_desync() {
    let mut pair = TrailingPair::new(SimConfig::default(), 4);
    // Only the trailing instance sees this command.
    pair.trailing_mut()
        .enqueue(Command::new(
            1,
            0,
            CommandKind::RestoreProfile {
                profile: profile(Vec2::ZERO, &[]),
            },
        ))
        .unwrap();

    let mut desync = None;
    for _ in 0..10 {
        if let Err(e) = pair.step() {
            desync = Some(e);
            break;
        }
    }
    let desync = desync.expect("desync reported");
    assert_eq!(desync.frame, 1);
    assert_ne!(desync.leading, desync.trailing);
}
