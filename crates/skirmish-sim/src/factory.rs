//! Data-driven content factory.
//!
//! Ships, items and projectiles are spawned from named templates held in a
//! [`Catalog`]. Numeric stats may be given as ranges; each spawn samples them
//! from the simulation's own RNG, so two instances with the same seed produce
//! the same stats.

use std::collections::BTreeMap;
use std::path::Path;

use hecs::Entity;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use skirmish_core::components::*;
use skirmish_core::constants::*;
use skirmish_core::enums::SlotKind;

use crate::store::Store;

/// The family a template belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Ship,
    Item,
    Projectile,
}

/// Spawns entities from template names.
pub trait EntityFactory {
    /// Which family `template` names, if any.
    fn kind_of(&self, template: &str) -> Option<TemplateKind>;

    /// Create an entity from `template` if it names a template of `kind`.
    /// Ships are placed at the origin and items have no transform; the caller
    /// positions the result. Nothing is written when the kind does not match.
    fn sample(
        &self,
        kind: TemplateKind,
        template: &str,
        store: &mut Store,
        rng: &mut ChaCha8Rng,
    ) -> Option<Entity>;
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalogue: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid catalogue JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template '{template}' refers to unknown {kind} '{reference}'")]
    UnknownReference {
        template: String,
        kind: &'static str,
        reference: String,
    },
}

/// Inclusive numeric range. A single number deserializes as a fixed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Stat {
    Fixed(f32),
    Range { min: f32, max: f32 },
}

impl Stat {
    pub fn sample(&self, rng: &mut ChaCha8Rng) -> f32 {
        match *self {
            Stat::Fixed(v) => v,
            Stat::Range { min, max } if min < max => rng.gen_range(min..=max),
            Stat::Range { min, .. } => min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipTemplate {
    pub texture: String,
    pub radius: f32,
    pub health: Stat,
    pub health_regen: f32,
    pub health_cooldown_ticks: u32,
    pub energy: Stat,
    pub energy_regen: f32,
    pub energy_cooldown_ticks: u32,
    pub acceleration: Stat,
    pub max_speed: Stat,
    pub turn_rate: f32,
    pub faction: u32,
    pub inventory_slots: usize,
    pub equipment: Vec<SlotKind>,
    /// Items created and equipped on spawn.
    #[serde(default)]
    pub loadout: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    Weapon {
        damage: Stat,
        cooldown_ticks: u32,
        energy_cost: f32,
        projectile_speed: f32,
        projectile: String,
    },
    Armor {
        reduction: Stat,
    },
    Thruster {
        acceleration: Stat,
    },
    Repair {
        amount: Stat,
    },
    Recharge {
        amount: Stat,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub texture: String,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileTemplate {
    pub texture: String,
    pub radius: f32,
    pub lifetime_ticks: u32,
    /// 0 = removed on first hit.
    #[serde(default)]
    pub hit_cooldown_ticks: u32,
}

/// Named templates for everything the simulation can spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub ships: BTreeMap<String, ShipTemplate>,
    pub items: BTreeMap<String, ItemTemplate>,
    pub projectiles: BTreeMap<String, ProjectileTemplate>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check that every template reference resolves.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (name, ship) in &self.ships {
            for item in &ship.loadout {
                if !self.items.contains_key(item) {
                    return Err(CatalogError::UnknownReference {
                        template: name.clone(),
                        kind: "item",
                        reference: item.clone(),
                    });
                }
            }
        }
        for (name, item) in &self.items {
            if let ItemKind::Weapon { projectile, .. } = &item.kind {
                if !self.projectiles.contains_key(projectile) {
                    return Err(CatalogError::UnknownReference {
                        template: name.clone(),
                        kind: "projectile",
                        reference: projectile.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn projectile(&self, name: &str) -> Option<&ProjectileTemplate> {
        self.projectiles.get(name)
    }

    fn spawn_ship(
        &self,
        template: &ShipTemplate,
        store: &mut Store,
        rng: &mut ChaCha8Rng,
    ) -> Entity {
        let entity = store.create_entity();
        let health = template.health.sample(rng);
        let energy = template.energy.sample(rng);
        let stats = ShipStats {
            acceleration: template.acceleration.sample(rng),
            max_speed: template.max_speed.sample(rng),
            turn_rate: template.turn_rate,
        };

        store.add_component(entity, Transform::default());
        store.add_component(entity, Velocity::default());
        store.add_component(entity, ShipControl::default());
        store.add_component(entity, stats);
        store.add_component(
            entity,
            Health(RegeneratingValue::new(
                health,
                template.health_regen,
                template.health_cooldown_ticks,
            )),
        );
        store.add_component(
            entity,
            Energy(RegeneratingValue::new(
                energy,
                template.energy_regen,
                template.energy_cooldown_ticks,
            )),
        );
        store.add_component(entity, Faction(template.faction));
        store.add_component(
            entity,
            Collider {
                radius: template.radius,
                groups: GROUP_SHIPS,
            },
        );
        store.add_component(entity, Inventory::with_capacity(template.inventory_slots));
        store.add_component(entity, Equipment::from_kinds(&template.equipment));
        store.add_component(
            entity,
            Appearance {
                texture: template.texture.clone(),
            },
        );

        for name in &template.loadout {
            let Some(item) = self.sample(TemplateKind::Item, name, store, rng) else {
                warn!(item = %name, "loadout item could not be created");
                continue;
            };
            give_item(store, entity, item);
        }
        entity
    }

    fn spawn_item(
        &self,
        name: &str,
        template: &ItemTemplate,
        store: &mut Store,
        rng: &mut ChaCha8Rng,
    ) -> Entity {
        let entity = store.create_entity();
        let slot = match &template.kind {
            ItemKind::Weapon {
                damage,
                cooldown_ticks,
                energy_cost,
                projectile_speed,
                projectile,
            } => {
                store.add_component(
                    entity,
                    Weapon {
                        damage: damage.sample(rng),
                        cooldown_ticks: *cooldown_ticks,
                        cooldown_remaining: 0,
                        energy_cost: *energy_cost,
                        projectile_speed: *projectile_speed,
                        projectile: projectile.clone(),
                    },
                );
                Some(SlotKind::Weapon)
            }
            ItemKind::Armor { reduction } => {
                store.add_component(
                    entity,
                    Armor {
                        reduction: reduction.sample(rng),
                    },
                );
                Some(SlotKind::Armor)
            }
            ItemKind::Thruster { acceleration } => {
                store.add_component(
                    entity,
                    Thruster {
                        acceleration: acceleration.sample(rng),
                    },
                );
                Some(SlotKind::Thruster)
            }
            ItemKind::Repair { amount } => {
                store.add_component(
                    entity,
                    Consumable {
                        effect: ConsumableEffect::Repair(amount.sample(rng)),
                    },
                );
                None
            }
            ItemKind::Recharge { amount } => {
                store.add_component(
                    entity,
                    Consumable {
                        effect: ConsumableEffect::Recharge(amount.sample(rng)),
                    },
                );
                None
            }
        };
        store.add_component(
            entity,
            Item {
                name: name.to_string(),
                slot,
            },
        );
        store.add_component(
            entity,
            Appearance {
                texture: template.texture.clone(),
            },
        );
        entity
    }

    fn spawn_projectile(&self, template: &ProjectileTemplate, store: &mut Store) -> Entity {
        let entity = store.create_entity();
        store.add_component(entity, Transform::default());
        store.add_component(entity, Velocity::default());
        store.add_component(
            entity,
            Collider {
                radius: template.radius,
                groups: GROUP_PROJECTILES,
            },
        );
        store.add_component(
            entity,
            Lifetime {
                remaining_ticks: template.lifetime_ticks,
            },
        );
        // Damage comes from the firing weapon.
        store.add_component(
            entity,
            CollisionDamage::new(0.0, template.hit_cooldown_ticks),
        );
        store.add_component(
            entity,
            Appearance {
                texture: template.texture.clone(),
            },
        );
        entity
    }
}

impl EntityFactory for Catalog {
    fn kind_of(&self, template: &str) -> Option<TemplateKind> {
        if self.ships.contains_key(template) {
            Some(TemplateKind::Ship)
        } else if self.items.contains_key(template) {
            Some(TemplateKind::Item)
        } else if self.projectiles.contains_key(template) {
            Some(TemplateKind::Projectile)
        } else {
            None
        }
    }

    fn sample(
        &self,
        kind: TemplateKind,
        template: &str,
        store: &mut Store,
        rng: &mut ChaCha8Rng,
    ) -> Option<Entity> {
        match kind {
            TemplateKind::Ship => {
                let ship = self.ships.get(template)?;
                Some(self.spawn_ship(ship, store, rng))
            }
            TemplateKind::Item => {
                let item = self.items.get(template)?;
                Some(self.spawn_item(template, item, store, rng))
            }
            TemplateKind::Projectile => {
                let projectile = self.projectiles.get(template)?;
                Some(self.spawn_projectile(projectile, store))
            }
        }
    }
}

/// Equip `item` into the first free compatible slot of `ship`, otherwise put
/// it in the inventory. Returns `false` if there was no room at all.
pub fn give_item(store: &mut Store, ship: Entity, item: Entity) -> bool {
    let kind = store.get::<Item>(item).and_then(|i| i.slot);
    let item_id = crate::store::entity_id(item);

    if let Some(kind) = kind {
        if let Some(mut equipment) = store.get_mut::<Equipment>(ship) {
            if let Some(index) = equipment.first_free(kind) {
                equipment.slots[index].item = Some(item_id);
                return true;
            }
        }
    }
    store
        .get_mut::<Inventory>(ship)
        .and_then(|mut inventory| inventory.insert(item_id))
        .is_some()
}

impl Default for Catalog {
    fn default() -> Self {
        let mut ships = BTreeMap::new();
        ships.insert(
            "player_ship".to_string(),
            ShipTemplate {
                texture: "ships/interceptor".into(),
                radius: 20.0,
                health: Stat::Fixed(100.0),
                health_regen: 0.1,
                health_cooldown_ticks: 180,
                energy: Stat::Fixed(100.0),
                energy_regen: 0.5,
                energy_cooldown_ticks: 60,
                acceleration: Stat::Fixed(300.0),
                max_speed: Stat::Fixed(400.0),
                turn_rate: 0.08,
                faction: FACTION_PLAYERS,
                inventory_slots: 8,
                equipment: vec![SlotKind::Weapon, SlotKind::Armor, SlotKind::Thruster],
                loadout: vec!["pulse_laser".into()],
            },
        );
        ships.insert(
            "raider".to_string(),
            ShipTemplate {
                texture: "ships/raider".into(),
                radius: 18.0,
                health: Stat::Range {
                    min: 50.0,
                    max: 70.0,
                },
                health_regen: 0.05,
                health_cooldown_ticks: 240,
                energy: Stat::Fixed(80.0),
                energy_regen: 0.4,
                energy_cooldown_ticks: 60,
                acceleration: Stat::Range {
                    min: 220.0,
                    max: 260.0,
                },
                max_speed: Stat::Range {
                    min: 300.0,
                    max: 340.0,
                },
                turn_rate: 0.06,
                faction: FACTION_NPC_A,
                inventory_slots: 2,
                equipment: vec![SlotKind::Weapon],
                loadout: vec!["pulse_laser".into()],
            },
        );

        let mut items = BTreeMap::new();
        items.insert(
            "pulse_laser".to_string(),
            ItemTemplate {
                texture: "items/pulse_laser".into(),
                kind: ItemKind::Weapon {
                    damage: Stat::Range {
                        min: 8.0,
                        max: 12.0,
                    },
                    cooldown_ticks: 12,
                    energy_cost: 5.0,
                    projectile_speed: 900.0,
                    projectile: "laser_bolt".into(),
                },
            },
        );
        items.insert(
            "plasma_cannon".to_string(),
            ItemTemplate {
                texture: "items/plasma_cannon".into(),
                kind: ItemKind::Weapon {
                    damage: Stat::Range {
                        min: 20.0,
                        max: 28.0,
                    },
                    cooldown_ticks: 40,
                    energy_cost: 15.0,
                    projectile_speed: 600.0,
                    projectile: "plasma_cloud".into(),
                },
            },
        );
        items.insert(
            "light_armor".to_string(),
            ItemTemplate {
                texture: "items/light_armor".into(),
                kind: ItemKind::Armor {
                    reduction: Stat::Range { min: 1.0, max: 3.0 },
                },
            },
        );
        items.insert(
            "afterburner".to_string(),
            ItemTemplate {
                texture: "items/afterburner".into(),
                kind: ItemKind::Thruster {
                    acceleration: Stat::Range {
                        min: 60.0,
                        max: 90.0,
                    },
                },
            },
        );
        items.insert(
            "repair_kit".to_string(),
            ItemTemplate {
                texture: "items/repair_kit".into(),
                kind: ItemKind::Repair {
                    amount: Stat::Fixed(40.0),
                },
            },
        );
        items.insert(
            "energy_cell".to_string(),
            ItemTemplate {
                texture: "items/energy_cell".into(),
                kind: ItemKind::Recharge {
                    amount: Stat::Fixed(50.0),
                },
            },
        );

        let mut projectiles = BTreeMap::new();
        projectiles.insert(
            "laser_bolt".to_string(),
            ProjectileTemplate {
                texture: "projectiles/laser_bolt".into(),
                radius: 4.0,
                lifetime_ticks: 90,
                hit_cooldown_ticks: 0,
            },
        );
        projectiles.insert(
            "plasma_cloud".to_string(),
            ProjectileTemplate {
                texture: "projectiles/plasma_cloud".into(),
                radius: 24.0,
                lifetime_ticks: 120,
                hit_cooldown_ticks: 30,
            },
        );

        Self {
            ships,
            items,
            projectiles,
        }
    }
}
