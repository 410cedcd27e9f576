//! Entity-component store.
//!
//! A thin layer over a hecs `World` that adds the pieces the simulation
//! needs on top of plain component storage: deferred, idempotent removal
//! (safe while systems iterate), a spatial index kept in step with
//! `Transform` + `Collider`, and conversion between hecs entities and the
//! `EntityId`s stored inside components and commands.

use std::collections::BTreeSet;

use glam::Vec2;
use hecs::{Component, Entity, Ref, RefMut, World};
use tracing::error;

use skirmish_core::components::{Collider, Transform};
use skirmish_core::constants::SPATIAL_CELL_SIZE;
use skirmish_core::types::EntityId;

use crate::spatial::SpatialGrid;

/// Stable id for a hecs entity.
pub fn entity_id(entity: Entity) -> EntityId {
    EntityId(entity.to_bits().get())
}

pub struct Store {
    world: World,
    grid: SpatialGrid,
    pending: BTreeSet<EntityId>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            grid: SpatialGrid::new(SPATIAL_CELL_SIZE),
            pending: BTreeSet::new(),
        }
    }

    /// Allocate a fresh entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        self.world.spawn(())
    }

    /// Attach (or replace) a component. Attaching to a missing entity is a
    /// logic error: it asserts in debug builds and is logged and ignored
    /// otherwise.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) {
        if self.world.insert_one(entity, component).is_err() {
            error!(
                entity = %entity_id(entity),
                component = std::any::type_name::<T>(),
                "add_component on missing entity"
            );
            debug_assert!(false, "add_component on missing entity {entity:?}");
            return;
        }
        self.reindex_entity(entity);
    }

    /// Detach a component, returning it if present.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let removed = self.world.remove_one::<T>(entity).ok();
        self.reindex_entity(entity);
        removed
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<Ref<'_, T>> {
        self.world.get::<&T>(entity).ok()
    }

    pub fn get_mut<T: Component>(&self, entity: Entity) -> Option<RefMut<'_, T>> {
        self.world.get::<&mut T>(entity).ok()
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.world
            .entity(entity)
            .map(|e| e.has::<T>())
            .unwrap_or(false)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    /// Schedule an entity for removal at the end of the tick. Calling it again
    /// for the same entity is a no-op.
    pub fn remove_entity(&mut self, entity: Entity) {
        if !self.world.contains(entity) {
            error!(entity = %entity_id(entity), "remove_entity on missing entity");
            debug_assert!(false, "remove_entity on missing entity {entity:?}");
            return;
        }
        let id = entity_id(entity);
        if self.pending.insert(id) {
            self.grid.remove(id);
        }
    }

    pub fn is_removed(&self, entity: Entity) -> bool {
        self.pending.contains(&entity_id(entity))
    }

    /// Despawn everything scheduled by `remove_entity`. Returns how many
    /// entities were removed.
    pub fn flush_removals(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let mut removed = 0;
        for id in pending {
            let Some(entity) = Entity::from_bits(id.0) else {
                continue;
            };
            self.grid.remove(id);
            if self.world.despawn(entity).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Resolve an id stored in a component or command. `None` if the entity no
    /// longer exists or is scheduled for removal.
    pub fn resolve(&self, id: EntityId) -> Option<Entity> {
        let entity = Entity::from_bits(id.0)?;
        if self.world.contains(entity) && !self.pending.contains(&id) {
            Some(entity)
        } else {
            None
        }
    }

    /// Entities whose collider overlaps the circle, nearest first, ties by id.
    pub fn query_nearby(&self, position: Vec2, radius: f32, groups: u32) -> Vec<Entity> {
        self.grid
            .query(position, radius, groups)
            .into_iter()
            .filter_map(|id| self.resolve(id))
            .collect()
    }

    /// Rebuild the spatial index from current transforms.
    pub fn reindex(&mut self) {
        self.grid.clear();
        for (entity, (transform, collider)) in self.world.query::<(&Transform, &Collider)>().iter()
        {
            let id = entity_id(entity);
            if self.pending.contains(&id) {
                continue;
            }
            self.grid
                .insert(id, transform.position, collider.radius, collider.groups);
        }
    }

    /// Bring one entity's index entry in line with its components.
    pub fn reindex_entity(&mut self, entity: Entity) {
        let id = entity_id(entity);
        let placed = match (
            self.world.get::<&Transform>(entity),
            self.world.get::<&Collider>(entity),
        ) {
            (Ok(t), Ok(c)) => Some((t.position, c.radius, c.groups)),
            _ => None,
        };
        match placed {
            Some((position, radius, groups)) if !self.pending.contains(&id) => {
                self.grid.insert(id, position, radius, groups)
            }
            _ => self.grid.remove(id),
        }
    }

    /// All live entities in ascending id order.
    pub fn entities_sorted(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self.world.iter().map(|e| e.entity()).collect();
        entities.sort_by_key(|e| e.to_bits());
        entities
    }

    /// Entities with component `T`, in ascending id order.
    pub fn sorted_with<T: Component>(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self
            .world
            .query::<&T>()
            .iter()
            .map(|(entity, _)| entity)
            .collect();
        entities.sort_by_key(|e| e.to_bits());
        entities
    }

    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
