//! Simulation stepper, the core of the game.
//!
//! `Simulation` owns the store, the command queue and every piece of
//! per-instance state (RNG, avatar registry, content catalogue). It applies
//! due commands, runs all systems in one fixed order and hashes the result.
//! Completely headless, and nothing is shared between instances, so any
//! number of them can run side by side in one process.

use std::collections::{BTreeMap, BTreeSet};

use hecs::{Component, Entity};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use skirmish_core::commands::Command;
use skirmish_core::components::*;
use skirmish_core::constants::WORLD_RADIUS;
use skirmish_core::events::SimEvent;
use skirmish_core::hash::{StateHash, StateHasher};
use skirmish_core::state::{RenderView, TickReport};
use skirmish_core::types::{PlayerId, SimTime};

use crate::factory::Catalog;
use crate::handler::{self, HandlerContext};
use crate::queue::{CommandQueue, QueueError};
use crate::store::{entity_id, Store};
use crate::systems;
use crate::world_setup::{self, AiSpawn};

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Non-avatar entities further than this from the origin are removed.
    pub world_radius: f32,
    pub catalog: Catalog,
    /// AI ships placed before the first tick.
    pub ai_ships: Vec<AiSpawn>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            world_radius: WORLD_RADIUS,
            catalog: Catalog::default(),
            ai_ships: Vec::new(),
        }
    }
}

/// One independent simulation instance.
pub struct Simulation {
    store: Store,
    queue: CommandQueue,
    time: SimTime,
    rng: ChaCha8Rng,
    avatars: BTreeMap<PlayerId, Entity>,
    restored: BTreeSet<PlayerId>,
    catalog: Catalog,
    world_radius: f32,
    events: Vec<SimEvent>,
}

impl Simulation {
    /// Create a new simulation with the given config.
    pub fn new(config: SimConfig) -> Self {
        let mut sim = Self {
            store: Store::new(),
            queue: CommandQueue::new(),
            time: SimTime::default(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            avatars: BTreeMap::new(),
            restored: BTreeSet::new(),
            catalog: config.catalog,
            world_radius: config.world_radius,
            events: Vec::new(),
        };
        for spawn in &config.ai_ships {
            if world_setup::spawn_ai_ship(&mut sim.store, &sim.catalog, &mut sim.rng, spawn)
                .is_none()
            {
                warn!(template = %spawn.template, "unknown AI ship template");
            }
        }
        sim
    }

    /// Queue a command for the frame it names.
    pub fn enqueue(&mut self, command: Command) -> Result<(), QueueError> {
        self.queue.enqueue(command).inspect_err(|e| {
            warn!(error = %e, "stale command dropped");
        })
    }

    /// Queue multiple commands. Stale ones are logged and dropped.
    pub fn enqueue_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            let _ = self.enqueue(command);
        }
    }

    /// Advance the simulation by one frame.
    pub fn tick(&mut self) -> TickReport {
        let frame = self.time.frame;

        let commands = self.queue.drain_up_to(frame);
        if !commands.is_empty() {
            debug!(frame, count = commands.len(), "applying commands");
        }
        for command in &commands {
            self.apply(command, frame);
        }

        self.run_systems(frame);
        self.store.flush_removals();

        let hash = self.state_hash();
        trace!(frame, hash = format_args!("{hash:016x}"), "tick");
        self.time.advance();

        TickReport {
            frame,
            hash,
            events: std::mem::take(&mut self.events),
        }
    }

    fn apply(&mut self, command: &Command, frame: u64) {
        let mut ctx = HandlerContext {
            store: &mut self.store,
            avatars: &mut self.avatars,
            restored: &mut self.restored,
            factory: &self.catalog,
            rng: &mut self.rng,
            events: &mut self.events,
            frame,
        };
        if let Err(reason) = handler::apply(command, &mut ctx) {
            warn!(
                frame,
                player = command.player,
                command = command.kind.name(),
                %reason,
                "command rejected"
            );
        }
    }

    /// Run all systems in order.
    fn run_systems(&mut self, frame: u64) {
        // 1. Health/energy regeneration, before anything reads them
        systems::regeneration::run(&mut self.store);
        // 2. Respawn timers
        systems::respawn::run(&mut self.store, &mut self.events);
        // 3. AI decisions
        systems::ai::run(&mut self.store, frame);
        // 4. Steering + integration
        systems::movement::run(&mut self.store);
        // 5. Spatial index catches up with movement
        self.store.reindex();
        // 6. Firing
        systems::weapons::run(
            &mut self.store,
            &self.catalog,
            &mut self.rng,
            &mut self.events,
        );
        // 7. Contact damage
        systems::collision::run(&mut self.store, &mut self.events, frame);
        // 8. Item pickup
        systems::pickup::run(&mut self.store, &mut self.events);
        // 9. Deaths
        systems::death::run(&mut self.store, &mut self.events);
        // 10. Lifetimes and bounds
        systems::cleanup::run(&mut self.store, self.world_radius);
    }

    /// Hash of everything that influences future frames.
    ///
    /// Entities are visited in id order and components in a fixed order, so
    /// two instances fed the same commands agree bit for bit. The frame number
    /// itself is left out.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHasher::new();
        let entities = self.store.entities_sorted();
        h.write_u64(entities.len() as u64);
        for entity in entities {
            h.write_id(entity_id(entity));
            hash_component::<Transform>(&self.store, entity, 1, &mut h);
            hash_component::<Velocity>(&self.store, entity, 2, &mut h);
            hash_component::<ShipControl>(&self.store, entity, 3, &mut h);
            hash_component::<ShipStats>(&self.store, entity, 4, &mut h);
            hash_component::<Health>(&self.store, entity, 5, &mut h);
            hash_component::<Energy>(&self.store, entity, 6, &mut h);
            hash_component::<Faction>(&self.store, entity, 7, &mut h);
            hash_component::<Collider>(&self.store, entity, 8, &mut h);
            hash_component::<Avatar>(&self.store, entity, 9, &mut h);
            hash_component::<Inventory>(&self.store, entity, 10, &mut h);
            hash_component::<Equipment>(&self.store, entity, 11, &mut h);
            hash_component::<Item>(&self.store, entity, 12, &mut h);
            hash_component::<Weapon>(&self.store, entity, 13, &mut h);
            hash_component::<Armor>(&self.store, entity, 14, &mut h);
            hash_component::<Thruster>(&self.store, entity, 15, &mut h);
            hash_component::<Consumable>(&self.store, entity, 16, &mut h);
            hash_component::<CollisionDamage>(&self.store, entity, 17, &mut h);
            hash_component::<Lifetime>(&self.store, entity, 18, &mut h);
            hash_component::<Respawn>(&self.store, entity, 19, &mut h);
            hash_component::<Ai>(&self.store, entity, 20, &mut h);
            hash_component::<Effect>(&self.store, entity, 21, &mut h);
            hash_component::<Appearance>(&self.store, entity, 22, &mut h);
            hash_component::<Dropped>(&self.store, entity, 23, &mut h);
        }

        h.write_u64(self.avatars.len() as u64);
        for (&player, &avatar) in &self.avatars {
            h.write_u8(player);
            h.write_id(entity_id(avatar));
        }
        h.write_u64(self.restored.len() as u64);
        for &player in &self.restored {
            h.write_u8(player);
        }
        let word_pos = self.rng.get_word_pos();
        h.write_u64(word_pos as u64);
        h.write_u64((word_pos >> 64) as u64);
        h.finish()
    }

    /// The player's avatar, if restored and still present.
    pub fn avatar(&self, player: PlayerId) -> Option<Entity> {
        self.avatars
            .get(&player)
            .copied()
            .filter(|&e| self.store.contains(e))
    }

    /// Frame that the next call to `tick` will simulate.
    pub fn frame(&self) -> u64 {
        self.time.frame
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Read-only access to the store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Mutable store access for tests that stage scenarios directly.
    #[cfg(test)]
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Commands waiting for a later frame.
    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// Read-only view for renderers.
    pub fn view(&self) -> RenderView {
        systems::view::build_view(&self.store, self.time.frame, &self.avatars)
    }
}

fn hash_component<T: Component + StateHash>(
    store: &Store,
    entity: Entity,
    tag: u8,
    h: &mut StateHasher,
) {
    if let Some(component) = store.get::<T>(entity) {
        h.write_u8(tag);
        component.hash_state(h);
    }
}
