//! Command handler: the deterministic state transition for one command.
//!
//! Every command is validated against the current store before anything is
//! written. A rejected command leaves the store untouched and comes back as a
//! [`Rejection`]; the stepper logs it and moves on. Nothing here panics on
//! command input.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use hecs::Entity;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, warn};

use skirmish_core::commands::{Command, CommandKind, Profile};
use skirmish_core::components::*;
use skirmish_core::constants::*;
use skirmish_core::enums::{EffectKind, ItemSource, SoundCue};
use skirmish_core::events::SimEvent;
use skirmish_core::types::{EntityId, PlayerId};

use crate::factory::{give_item, EntityFactory, TemplateKind};
use crate::store::{entity_id, Store};

/// Why a command was not applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("player {0} has no avatar")]
    NoAvatar(PlayerId),

    #[error("player {0} avatar is awaiting respawn")]
    AvatarDead(PlayerId),

    #[error("non-finite input")]
    InvalidVector,

    #[error("{container} index {index} out of range")]
    IndexOutOfRange {
        container: &'static str,
        index: u16,
    },

    #[error("{container} slot {index} is empty")]
    EmptySlot {
        container: &'static str,
        index: u16,
    },

    #[error("item does not fit equipment slot {slot}")]
    SlotMismatch { slot: u16 },

    #[error("item is not consumable")]
    NotConsumable,

    #[error("player {0} already restored a profile")]
    DuplicateProfile(PlayerId),

    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("inventory is full")]
    InventoryFull,

    #[error("script failed: {0}")]
    ScriptFailed(String),
}

/// Everything a command may touch.
pub struct HandlerContext<'a> {
    pub store: &'a mut Store,
    pub avatars: &'a mut BTreeMap<PlayerId, Entity>,
    pub restored: &'a mut BTreeSet<PlayerId>,
    pub factory: &'a dyn EntityFactory,
    pub rng: &'a mut ChaCha8Rng,
    pub events: &'a mut Vec<SimEvent>,
    pub frame: u64,
}

impl HandlerContext<'_> {
    /// The player's avatar entity, if it has one.
    pub fn avatar(&self, player: PlayerId) -> Result<Entity, Rejection> {
        self.avatars
            .get(&player)
            .copied()
            .filter(|e| self.store.contains(*e))
            .ok_or(Rejection::NoAvatar(player))
    }

    /// The player's avatar, if it exists and is not waiting to respawn.
    pub fn live_avatar(&self, player: PlayerId) -> Result<Entity, Rejection> {
        let avatar = self.avatar(player)?;
        let pending = self
            .store
            .get::<Respawn>(avatar)
            .is_some_and(|r| r.is_pending());
        let depleted = self
            .store
            .get::<Health>(avatar)
            .is_some_and(|h| h.0.is_depleted());
        if pending || depleted {
            return Err(Rejection::AvatarDead(player));
        }
        Ok(avatar)
    }
}

/// Apply one command.
pub fn apply(command: &Command, ctx: &mut HandlerContext) -> Result<(), Rejection> {
    let player = command.player;
    match &command.kind {
        CommandKind::Accelerate { direction } => {
            if !direction.is_finite() {
                return Err(Rejection::InvalidVector);
            }
            let direction = if direction.length_squared() > 1.0 {
                direction.normalize()
            } else {
                *direction
            };
            with_control(ctx, player, |control| control.acceleration = direction)
        }
        CommandKind::Rotate { target } => {
            if !target.is_finite() {
                return Err(Rejection::InvalidVector);
            }
            let target = *target;
            with_control(ctx, player, |control| control.target_rotation = target)
        }
        CommandKind::BeginShooting => with_control(ctx, player, |control| control.shooting = true),
        CommandKind::StopShooting => with_control(ctx, player, |control| control.shooting = false),
        CommandKind::Equip {
            inventory_index,
            slot,
        } => {
            ctx.live_avatar(player)?;
            equip(ctx, player, *inventory_index, *slot)
        }
        CommandKind::MoveItem { first, second } => move_item(ctx, player, *first, *second),
        CommandKind::Drop { index, source } => drop_item(ctx, player, *index, *source),
        CommandKind::Use { inventory_index } => use_item(ctx, player, *inventory_index),
        CommandKind::RestoreProfile { profile } => restore_profile(ctx, player, profile),
        CommandKind::Script { source } => run_script(ctx, player, source),
    }
}

fn with_control(
    ctx: &mut HandlerContext,
    player: PlayerId,
    f: impl FnOnce(&mut ShipControl),
) -> Result<(), Rejection> {
    let avatar = ctx.live_avatar(player)?;
    let mut control = ctx
        .store
        .get_mut::<ShipControl>(avatar)
        .ok_or(Rejection::NoAvatar(player))?;
    f(&mut *control);
    Ok(())
}

fn inventory_item(
    store: &Store,
    avatar: Entity,
    index: u16,
) -> Result<EntityId, Rejection> {
    slot_item(store, avatar, index, ItemSource::Inventory)
}

/// The item id held in one of the avatar's containers, without removing it.
fn slot_item(
    store: &Store,
    avatar: Entity,
    index: u16,
    source: ItemSource,
) -> Result<EntityId, Rejection> {
    let container = container_name(source);
    let out_of_range = Rejection::IndexOutOfRange { container, index };
    let slot = usize::from(index);
    let entry = match source {
        ItemSource::Inventory => {
            let inventory = store.get::<Inventory>(avatar).ok_or(out_of_range.clone())?;
            if slot >= inventory.capacity() {
                return Err(out_of_range);
            }
            inventory.get(slot)
        }
        ItemSource::Equipment => {
            let equipment = store.get::<Equipment>(avatar).ok_or(out_of_range.clone())?;
            let entry = equipment.slots.get(slot).ok_or(out_of_range)?;
            entry.item
        }
    };
    entry.ok_or(Rejection::EmptySlot { container, index })
}

/// Equip an inventory item, swapping any previously equipped item into the
/// inventory slot it came from.
pub(crate) fn equip(
    ctx: &mut HandlerContext,
    player: PlayerId,
    inventory_index: u16,
    slot: u16,
) -> Result<(), Rejection> {
    let avatar = ctx.avatar(player)?;
    let item_id = inventory_item(ctx.store, avatar, inventory_index)?;
    let item_kind = ctx
        .store
        .resolve(item_id)
        .and_then(|item| ctx.store.get::<Item>(item).and_then(|i| i.slot))
        .ok_or(Rejection::SlotMismatch { slot })?;

    let (inventory, equipment) = ctx
        .store
        .world_mut()
        .query_one_mut::<(&mut Inventory, &mut Equipment)>(avatar)
        .map_err(|_| Rejection::IndexOutOfRange {
            container: "equipment",
            index: slot,
        })?;
    let target = equipment
        .slots
        .get_mut(usize::from(slot))
        .ok_or(Rejection::IndexOutOfRange {
            container: "equipment",
            index: slot,
        })?;
    if target.kind != item_kind {
        return Err(Rejection::SlotMismatch { slot });
    }

    let previous = target.item.replace(item_id);
    inventory.slots[usize::from(inventory_index)] = previous;
    Ok(())
}

fn move_item(
    ctx: &mut HandlerContext,
    player: PlayerId,
    first: u16,
    second: u16,
) -> Result<(), Rejection> {
    let avatar = ctx.live_avatar(player)?;
    let mut inventory = ctx
        .store
        .get_mut::<Inventory>(avatar)
        .ok_or(Rejection::NoAvatar(player))?;
    for index in [first, second] {
        if usize::from(index) >= inventory.capacity() {
            return Err(Rejection::IndexOutOfRange {
                container: "inventory",
                index,
            });
        }
    }
    inventory.slots.swap(usize::from(first), usize::from(second));
    Ok(())
}

fn drop_item(
    ctx: &mut HandlerContext,
    player: PlayerId,
    index: u16,
    source: ItemSource,
) -> Result<(), Rejection> {
    let avatar = ctx.live_avatar(player)?;
    let position = ctx
        .store
        .get::<Transform>(avatar)
        .map(|t| t.position)
        .ok_or(Rejection::NoAvatar(player))?;

    let item_id = slot_item(ctx.store, avatar, index, source)?;
    let item = ctx.store.resolve(item_id).ok_or(Rejection::EmptySlot {
        container: container_name(source),
        index,
    })?;
    take_item(ctx.store, avatar, index, source)?;
    place_in_world(ctx.store, item, position);
    Ok(())
}

fn container_name(source: ItemSource) -> &'static str {
    match source {
        ItemSource::Inventory => "inventory",
        ItemSource::Equipment => "equipment",
    }
}

/// Remove an item id from one of the avatar's containers.
pub(crate) fn take_item(
    store: &mut Store,
    avatar: Entity,
    index: u16,
    source: ItemSource,
) -> Result<EntityId, Rejection> {
    let container = container_name(source);
    let out_of_range = Rejection::IndexOutOfRange { container, index };
    let empty = Rejection::EmptySlot { container, index };
    let slot = usize::from(index);
    match source {
        ItemSource::Inventory => {
            let mut inventory = store.get_mut::<Inventory>(avatar).ok_or(out_of_range.clone())?;
            let entry = inventory.slots.get_mut(slot).ok_or(out_of_range)?;
            entry.take().ok_or(empty)
        }
        ItemSource::Equipment => {
            let mut equipment = store.get_mut::<Equipment>(avatar).ok_or(out_of_range.clone())?;
            let entry = equipment.slots.get_mut(slot).ok_or(out_of_range)?;
            entry.item.take().ok_or(empty)
        }
    }
}

/// Turn an item into a world pickup at `position`.
pub(crate) fn place_in_world(store: &mut Store, item: Entity, position: Vec2) {
    store.add_component(item, Transform::at(position));
    store.add_component(
        item,
        Dropped {
            pickup_delay: PICKUP_DELAY_TICKS,
        },
    );
    store.add_component(
        item,
        Lifetime {
            remaining_ticks: DROPPED_ITEM_LIFETIME_TICKS,
        },
    );
    store.add_component(
        item,
        Collider {
            radius: PICKUP_RADIUS * 0.25,
            groups: GROUP_ITEMS,
        },
    );
}

fn use_item(ctx: &mut HandlerContext, player: PlayerId, index: u16) -> Result<(), Rejection> {
    let avatar = ctx.live_avatar(player)?;
    let item_id = inventory_item(ctx.store, avatar, index)?;
    let item = ctx.store.resolve(item_id).ok_or(Rejection::EmptySlot {
        container: "inventory",
        index,
    })?;
    let effect = ctx
        .store
        .get::<Consumable>(item)
        .map(|c| c.effect)
        .ok_or(Rejection::NotConsumable)?;

    match effect {
        ConsumableEffect::Repair(amount) => {
            if let Some(mut health) = ctx.store.get_mut::<Health>(avatar) {
                health.0.restore(amount);
            }
        }
        ConsumableEffect::Recharge(amount) => {
            if let Some(mut energy) = ctx.store.get_mut::<Energy>(avatar) {
                energy.0.restore(amount);
            }
        }
    }

    take_item(ctx.store, avatar, index, ItemSource::Inventory)?;
    ctx.store.remove_entity(item);
    ctx.events.push(SimEvent::PlaySound {
        cue: SoundCue::ItemUsed,
        entity: entity_id(avatar),
    });
    Ok(())
}

/// Create the player's avatar from a saved profile. At most once per player.
fn restore_profile(
    ctx: &mut HandlerContext,
    player: PlayerId,
    profile: &Profile,
) -> Result<(), Rejection> {
    if ctx.restored.contains(&player) {
        return Err(Rejection::DuplicateProfile(player));
    }
    if !profile.position.is_finite() {
        return Err(Rejection::InvalidVector);
    }

    let avatar = ctx
        .factory
        .sample(TemplateKind::Ship, &profile.ship, ctx.store, ctx.rng)
        .ok_or_else(|| Rejection::UnknownTemplate(profile.ship.clone()))?;
    ctx.store.add_component(avatar, Transform::at(profile.position));
    ctx.store.add_component(avatar, Avatar { player });
    ctx.store.add_component(avatar, Faction(FACTION_PLAYERS));
    ctx.store.add_component(
        avatar,
        Respawn {
            delay_ticks: RESPAWN_DELAY_TICKS,
            position: profile.position,
            remaining: None,
        },
    );

    for name in &profile.inventory {
        add_profile_item(ctx, avatar, name, false);
    }
    for name in &profile.equipment {
        add_profile_item(ctx, avatar, name, true);
    }

    ctx.restored.insert(player);
    ctx.avatars.insert(player, avatar);
    ctx.events.push(SimEvent::SpawnEffect {
        kind: EffectKind::Respawn,
        position: profile.position,
    });
    debug!(player, avatar = %entity_id(avatar), frame = ctx.frame, "avatar restored");
    Ok(())
}

fn add_profile_item(ctx: &mut HandlerContext, avatar: Entity, name: &str, equip: bool) {
    let Some(item) = ctx
        .factory
        .sample(TemplateKind::Item, name, ctx.store, ctx.rng)
    else {
        warn!(item = %name, kind = ?ctx.factory.kind_of(name), "not an item template");
        return;
    };
    let stored = if equip {
        give_item(ctx.store, avatar, item)
    } else {
        ctx.store
            .get_mut::<Inventory>(avatar)
            .and_then(|mut inventory| inventory.insert(entity_id(item)))
            .is_some()
    };
    if !stored {
        warn!(item = %name, "no room for profile item");
        ctx.store.remove_entity(item);
    }
}

#[cfg(debug_assertions)]
fn run_script(ctx: &mut HandlerContext, player: PlayerId, source: &str) -> Result<(), Rejection> {
    let mut session = crate::script::DebugSession::open(ctx, player);
    let result = session.run(source);
    for line in session.output() {
        debug!(player, "{line}");
    }
    result.map_err(|e| Rejection::ScriptFailed(e.to_string()))
}

#[cfg(not(debug_assertions))]
fn run_script(_ctx: &mut HandlerContext, player: PlayerId, _source: &str) -> Result<(), Rejection> {
    debug!(player, "script command ignored in release build");
    Ok(())
}
