//! ECS components for hecs entities.
//!
//! Components are plain data. Game logic lives in systems and the command
//! handler; the small helpers here only keep a component's own invariants
//! (clamping, cooldown bookkeeping). Every component contributes to the
//! per-tick state hash through [`StateHash`].

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::hash::{StateHash, StateHasher};
use crate::types::{EntityId, PlayerId};

/// World placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    /// Radians, 0 = +X, counter-clockwise.
    pub rotation: f32,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
        }
    }
}

/// Linear velocity in world units per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec2);

/// Control intent written by commands and the AI. Never position or velocity:
/// those belong to the movement system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipControl {
    /// Desired acceleration direction, length in `[0, 1]`.
    pub acceleration: Vec2,
    /// Rotation the ship turns toward.
    pub target_rotation: f32,
    pub shooting: bool,
}

/// Base handling characteristics of a ship hull.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipStats {
    /// World units per second squared at full thrust.
    pub acceleration: f32,
    /// World units per second.
    pub max_speed: f32,
    /// Radians per tick.
    pub turn_rate: f32,
}

/// A resource clamped to `[0, max]` that regenerates over time.
///
/// Any reduction suspends regeneration for `cooldown_ticks` updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegeneratingValue {
    pub value: f32,
    pub max: f32,
    /// Amount restored per tick while not suppressed.
    pub regen_per_tick: f32,
    /// Ticks regeneration stays suppressed after a reduction.
    pub cooldown_ticks: u32,
    /// Remaining suppressed ticks.
    pub delay_remaining: u32,
}

impl RegeneratingValue {
    /// A full value.
    pub fn new(max: f32, regen_per_tick: f32, cooldown_ticks: u32) -> Self {
        Self {
            value: max,
            max,
            regen_per_tick,
            cooldown_ticks,
            delay_remaining: 0,
        }
    }

    /// Reduce by `amount` and restart the regeneration cooldown. Returns the
    /// amount actually removed.
    pub fn reduce(&mut self, amount: f32) -> f32 {
        if !(amount > 0.0) {
            return 0.0;
        }
        let before = self.value;
        self.value = (self.value - amount).max(0.0);
        self.delay_remaining = self.cooldown_ticks;
        before - self.value
    }

    /// Increase by `amount` without touching the cooldown.
    pub fn restore(&mut self, amount: f32) {
        if amount > 0.0 {
            self.value = (self.value + amount).min(self.max);
        }
    }

    /// Set directly, clamped to `[0, max]`.
    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(0.0, self.max);
    }

    pub fn fill(&mut self) {
        self.value = self.max;
        self.delay_remaining = 0;
    }

    /// One tick of regeneration.
    pub fn update(&mut self) {
        if self.delay_remaining > 0 {
            self.delay_remaining -= 1;
        } else if self.value < self.max {
            self.value = (self.value + self.regen_per_tick).min(self.max);
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.value <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health(pub RegeneratingValue);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Energy(pub RegeneratingValue);

/// Friend/foe bitmask. Two factions are hostile when they share no bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction(pub u32);

impl Faction {
    pub fn is_hostile_to(&self, other: &Faction) -> bool {
        self.0 & other.0 == 0
    }
}

/// Spatial footprint. Entities with a `Transform` and a `Collider` are indexed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub radius: f32,
    /// Spatial group bits (see `constants::GROUP_*`).
    pub groups: u32,
}

/// Marks the ship controlled by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub player: PlayerId,
}

/// Fixed-capacity item storage. Empty slots are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub slots: Vec<Option<EntityId>>,
}

impl Inventory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Item at `index`, or `None` if empty or out of range.
    pub fn get(&self, index: usize) -> Option<EntityId> {
        self.slots.get(index).copied().flatten()
    }

    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Put `item` into the first free slot.
    pub fn insert(&mut self, item: EntityId) -> Option<usize> {
        let index = self.first_free()?;
        self.slots[index] = Some(item);
        Some(index)
    }

    pub fn items(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().filter_map(|s| *s)
    }
}

/// One equipment slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSlot {
    pub kind: SlotKind,
    pub item: Option<EntityId>,
}

/// Equipped items, in hull-defined slot order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub slots: Vec<EquipmentSlot>,
}

impl Equipment {
    pub fn from_kinds(kinds: &[SlotKind]) -> Self {
        Self {
            slots: kinds
                .iter()
                .map(|&kind| EquipmentSlot { kind, item: None })
                .collect(),
        }
    }

    pub fn items(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().filter_map(|s| s.item)
    }

    pub fn first_free(&self, kind: SlotKind) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.kind == kind && s.item.is_none())
    }
}

/// Common item data. `slot` is `None` for items that can't be equipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub slot: Option<SlotKind>,
}

/// Weapon item state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub damage: f32,
    pub cooldown_ticks: u32,
    pub cooldown_remaining: u32,
    pub energy_cost: f32,
    /// World units per second.
    pub projectile_speed: f32,
    /// Catalogue template used for the projectile.
    pub projectile: String,
}

/// Flat damage reduction while equipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Armor {
    pub reduction: f32,
}

/// Additional acceleration while equipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thruster {
    pub acceleration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConsumableEffect {
    Repair(f32),
    Recharge(f32),
}

/// Single-use item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Consumable {
    pub effect: ConsumableEffect,
}

/// Damage dealt on contact, gated per target.
///
/// `cooldown_ticks == 0` means one-shot: the effect applies once and the
/// owning entity is removed. A positive cooldown re-arms per distinct target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionDamage {
    pub damage: f32,
    pub cooldown_ticks: u32,
    /// Frame at which each target may be hit again.
    pub ready_at: BTreeMap<EntityId, u64>,
}

impl CollisionDamage {
    pub fn new(damage: f32, cooldown_ticks: u32) -> Self {
        Self {
            damage,
            cooldown_ticks,
            ready_at: BTreeMap::new(),
        }
    }

    pub fn is_one_shot(&self) -> bool {
        self.cooldown_ticks == 0
    }

    pub fn can_hit(&self, target: EntityId, frame: u64) -> bool {
        self.ready_at.get(&target).is_none_or(|&ready| frame >= ready)
    }

    pub fn record_hit(&mut self, target: EntityId, frame: u64) {
        if self.cooldown_ticks > 0 {
            self.ready_at
                .insert(target, frame + u64::from(self.cooldown_ticks));
        }
    }

    /// Forget targets whose cooldown has elapsed.
    pub fn prune(&mut self, frame: u64) {
        self.ready_at.retain(|_, ready| *ready > frame);
    }
}

/// Removes the entity once it counts down to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifetime {
    pub remaining_ticks: u32,
}

/// Entity is restored after death instead of being removed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Respawn {
    pub delay_ticks: u32,
    pub position: Vec2,
    /// Ticks until restoration while dead; `None` while alive.
    pub remaining: Option<u32>,
}

impl Respawn {
    pub fn is_pending(&self) -> bool {
        self.remaining.is_some()
    }
}

/// A standing order for an AI ship.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub kind: OrderKind,
    /// Guard point or destination.
    pub target: Vec2,
    /// Maximum distance an attack may pull the ship from where it began.
    pub max_distance: f32,
}

/// AI state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ai {
    pub order: Order,
    pub behavior: Behavior,
}

/// Visual-only entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
}

/// Texture key consumed by renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    pub texture: String,
}

/// Item floating in the world, waiting to be picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dropped {
    /// Ticks until it may be picked up.
    pub pickup_delay: u32,
}

// --- Hash contributions ---

impl StateHash for Transform {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_vec2(self.position);
        h.write_f32(self.rotation);
    }
}

impl StateHash for Velocity {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_vec2(self.0);
    }
}

impl StateHash for ShipControl {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_vec2(self.acceleration);
        h.write_f32(self.target_rotation);
        h.write_bool(self.shooting);
    }
}

impl StateHash for ShipStats {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_f32(self.acceleration);
        h.write_f32(self.max_speed);
        h.write_f32(self.turn_rate);
    }
}

impl StateHash for RegeneratingValue {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_f32(self.value);
        h.write_f32(self.max);
        h.write_f32(self.regen_per_tick);
        h.write_u32(self.cooldown_ticks);
        h.write_u32(self.delay_remaining);
    }
}

impl StateHash for Health {
    fn hash_state(&self, h: &mut StateHasher) {
        self.0.hash_state(h);
    }
}

impl StateHash for Energy {
    fn hash_state(&self, h: &mut StateHasher) {
        self.0.hash_state(h);
    }
}

impl StateHash for Faction {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_u32(self.0);
    }
}

impl StateHash for Collider {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_f32(self.radius);
        h.write_u32(self.groups);
    }
}

impl StateHash for Avatar {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_u8(self.player);
    }
}

impl StateHash for Inventory {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_u64(self.slots.len() as u64);
        for slot in &self.slots {
            h.write_opt_id(*slot);
        }
    }
}

impl StateHash for Equipment {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_u64(self.slots.len() as u64);
        for slot in &self.slots {
            h.write_u8(slot.kind as u8);
            h.write_opt_id(slot.item);
        }
    }
}

impl StateHash for Item {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_str(&self.name);
        match self.slot {
            Some(kind) => h.write_u8(kind as u8 + 1),
            None => h.write_u8(0),
        }
    }
}

impl StateHash for Weapon {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_f32(self.damage);
        h.write_u32(self.cooldown_ticks);
        h.write_u32(self.cooldown_remaining);
        h.write_f32(self.energy_cost);
        h.write_f32(self.projectile_speed);
        h.write_str(&self.projectile);
    }
}

impl StateHash for Armor {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_f32(self.reduction);
    }
}

impl StateHash for Thruster {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_f32(self.acceleration);
    }
}

impl StateHash for Consumable {
    fn hash_state(&self, h: &mut StateHasher) {
        match self.effect {
            ConsumableEffect::Repair(amount) => {
                h.write_u8(0);
                h.write_f32(amount);
            }
            ConsumableEffect::Recharge(amount) => {
                h.write_u8(1);
                h.write_f32(amount);
            }
        }
    }
}

impl StateHash for CollisionDamage {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_f32(self.damage);
        h.write_u32(self.cooldown_ticks);
        h.write_u64(self.ready_at.len() as u64);
        for (target, ready) in &self.ready_at {
            h.write_id(*target);
            h.write_u64(*ready);
        }
    }
}

impl StateHash for Lifetime {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_u32(self.remaining_ticks);
    }
}

impl StateHash for Respawn {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_u32(self.delay_ticks);
        h.write_vec2(self.position);
        match self.remaining {
            Some(ticks) => {
                h.write_u8(1);
                h.write_u32(ticks);
            }
            None => h.write_u8(0),
        }
    }
}

impl StateHash for Ai {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_u8(self.order.kind as u8);
        h.write_vec2(self.order.target);
        h.write_f32(self.order.max_distance);
        h.write_u8(self.behavior.tag());
        match self.behavior {
            Behavior::Patrol => {}
            Behavior::Attack { target, start } => {
                h.write_id(target);
                h.write_vec2(start);
            }
            Behavior::MoveTo { target } => h.write_vec2(target),
        }
    }
}

impl StateHash for Effect {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_u8(self.kind as u8);
    }
}

impl StateHash for Appearance {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_str(&self.texture);
    }
}

impl StateHash for Dropped {
    fn hash_state(&self, h: &mut StateHasher) {
        h.write_u32(self.pickup_delay);
    }
}
