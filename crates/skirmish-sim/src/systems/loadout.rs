//! Stat contributions from equipped items.

use hecs::Entity;

use skirmish_core::components::{Armor, Equipment, Thruster};

use crate::store::Store;

/// Live entities equipped by `ship`, in slot order.
pub fn equipped(store: &Store, ship: Entity) -> Vec<Entity> {
    store
        .get::<Equipment>(ship)
        .map(|eq| eq.items().collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|id| store.resolve(id))
        .collect()
}

/// Extra acceleration from equipped thrusters.
pub fn thrust_bonus(store: &Store, ship: Entity) -> f32 {
    equipped(store, ship)
        .into_iter()
        .filter_map(|item| store.get::<Thruster>(item).map(|t| t.acceleration))
        .sum()
}

/// Flat damage reduction from equipped armour.
pub fn armor_reduction(store: &Store, ship: Entity) -> f32 {
    equipped(store, ship)
        .into_iter()
        .filter_map(|item| store.get::<Armor>(item).map(|a| a.reduction))
        .sum()
}
