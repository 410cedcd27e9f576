//! Debug console for development builds.
//!
//! A [`DebugSession`] lives for exactly one `Script` command. It binds the
//! executing player's avatar when it opens and releases the binding when it is
//! dropped, whichever way the command ends. Scripts are line based; `;` also
//! separates statements. Execution stops at the first failing statement.
//!
//! ```text
//! goto <x> <y>                 teleport the avatar
//! set_stat health|energy <v>   set a resource value
//! equip <inventory index>      equip into the first free compatible slot
//! unequip <equipment slot>     move an equipped item back to the inventory
//! set_factions [mask]          set the faction mask (default: join both NPC factions)
//! add_ai <template> <x> <y>    spawn an AI ship guarding that point
//! list_inventory
//! list_equipment
//! ```

use std::str::FromStr;

use glam::Vec2;
use hecs::Entity;
use thiserror::Error;
use tracing::trace;

use skirmish_core::components::*;
use skirmish_core::constants::*;
use skirmish_core::enums::ItemSource;
use skirmish_core::types::PlayerId;

use crate::handler::{self, HandlerContext, Rejection};
use crate::store::entity_id;
use crate::world_setup::{spawn_ai_ship, AiSpawn};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("player {0} has no avatar")]
    NoAvatar(PlayerId),

    #[error("no compatible free slot for inventory item {0}")]
    NoFreeSlot(u16),

    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    #[error(transparent)]
    Rejected(#[from] Rejection),
}

struct Bindings {
    avatar: Entity,
}

/// One console invocation on behalf of one player.
pub struct DebugSession<'s, 'a> {
    ctx: &'s mut HandlerContext<'a>,
    player: PlayerId,
    bindings: Option<Bindings>,
    output: Vec<String>,
}

impl<'s, 'a> DebugSession<'s, 'a> {
    pub fn open(ctx: &'s mut HandlerContext<'a>, player: PlayerId) -> Self {
        let bindings = ctx.avatar(player).ok().map(|avatar| Bindings { avatar });
        trace!(player, bound = bindings.is_some(), "debug session opened");
        Self {
            ctx,
            player,
            bindings,
            output: Vec::new(),
        }
    }

    /// Lines printed by listing commands.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn run(&mut self, source: &str) -> Result<(), ScriptError> {
        for statement in source
            .split(['\n', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.starts_with('#'))
        {
            self.execute(statement)?;
        }
        Ok(())
    }

    fn avatar(&self) -> Result<Entity, ScriptError> {
        self.bindings
            .as_ref()
            .map(|b| b.avatar)
            .ok_or(ScriptError::NoAvatar(self.player))
    }

    fn execute(&mut self, statement: &str) -> Result<(), ScriptError> {
        let mut words = statement.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(());
        };
        let args: Vec<&str> = words.collect();

        match command {
            "goto" => {
                const USAGE: &str = "goto <x> <y>";
                let x: f32 = arg(&args, 0, USAGE)?;
                let y: f32 = arg(&args, 1, USAGE)?;
                let avatar = self.avatar()?;
                self.ctx
                    .store
                    .add_component(avatar, Transform::at(Vec2::new(x, y)));
                self.ctx.store.add_component(avatar, Velocity::default());
                Ok(())
            }
            "set_stat" => {
                const USAGE: &str = "set_stat health|energy <value>";
                let value: f32 = arg(&args, 1, USAGE)?;
                let avatar = self.avatar()?;
                match args.first().copied() {
                    Some("health") => {
                        if let Some(mut health) = self.ctx.store.get_mut::<Health>(avatar) {
                            health.0.set(value);
                        }
                    }
                    Some("energy") => {
                        if let Some(mut energy) = self.ctx.store.get_mut::<Energy>(avatar) {
                            energy.0.set(value);
                        }
                    }
                    _ => return Err(ScriptError::Usage(USAGE)),
                }
                Ok(())
            }
            "equip" => {
                let index: u16 = arg(&args, 0, "equip <inventory index>")?;
                self.equip(index)
            }
            "unequip" => {
                let slot: u16 = arg(&args, 0, "unequip <equipment slot>")?;
                self.unequip(slot)
            }
            "set_factions" => {
                let avatar = self.avatar()?;
                let explicit: Option<u32> = match args.first() {
                    Some(_) => Some(arg(&args, 0, "set_factions [mask]")?),
                    None => None,
                };
                if let Some(mut faction) = self.ctx.store.get_mut::<Faction>(avatar) {
                    faction.0 = explicit.unwrap_or(faction.0 | FACTION_NPC_A | FACTION_NPC_B);
                }
                Ok(())
            }
            "add_ai" => {
                const USAGE: &str = "add_ai <template> <x> <y>";
                let template = *args.first().ok_or(ScriptError::Usage(USAGE))?;
                let x: f32 = arg(&args, 1, USAGE)?;
                let y: f32 = arg(&args, 2, USAGE)?;
                self.add_ai(template, Vec2::new(x, y))
            }
            "list_inventory" => {
                self.list_inventory()?;
                Ok(())
            }
            "list_equipment" => {
                self.list_equipment()?;
                Ok(())
            }
            other => Err(ScriptError::UnknownCommand(other.to_string())),
        }
    }

    fn equip(&mut self, index: u16) -> Result<(), ScriptError> {
        let avatar = self.avatar()?;
        let store = &*self.ctx.store;
        let kind = store
            .get::<Inventory>(avatar)
            .and_then(|inv| inv.get(usize::from(index)))
            .and_then(|id| store.resolve(id))
            .and_then(|item| store.get::<Item>(item).and_then(|i| i.slot))
            .ok_or(ScriptError::NoFreeSlot(index))?;
        let slot = store
            .get::<Equipment>(avatar)
            .and_then(|eq| eq.first_free(kind))
            .ok_or(ScriptError::NoFreeSlot(index))?;
        handler::equip(self.ctx, self.player, index, slot as u16)?;
        Ok(())
    }

    fn unequip(&mut self, slot: u16) -> Result<(), ScriptError> {
        let avatar = self.avatar()?;
        let has_room = self
            .ctx
            .store
            .get::<Inventory>(avatar)
            .is_some_and(|inv| inv.first_free().is_some());
        if !has_room {
            return Err(Rejection::InventoryFull.into());
        }
        let item = handler::take_item(self.ctx.store, avatar, slot, ItemSource::Equipment)?;
        if let Some(mut inventory) = self.ctx.store.get_mut::<Inventory>(avatar) {
            inventory.insert(item);
        }
        Ok(())
    }

    fn add_ai(&mut self, template: &str, position: Vec2) -> Result<(), ScriptError> {
        let ship = spawn_ai_ship(
            self.ctx.store,
            self.ctx.factory,
            self.ctx.rng,
            &AiSpawn::guard(template, position),
        )
        .ok_or_else(|| ScriptError::UnknownTemplate(template.to_string()))?;
        self.output
            .push(format!("spawned {template} as {}", entity_id(ship)));
        Ok(())
    }

    fn item_name(&self, id: skirmish_core::types::EntityId) -> String {
        self.ctx
            .store
            .resolve(id)
            .and_then(|item| self.ctx.store.get::<Item>(item).map(|i| i.name.clone()))
            .unwrap_or_else(|| "<missing>".to_string())
    }

    fn list_inventory(&mut self) -> Result<(), ScriptError> {
        let avatar = self.avatar()?;
        let slots = self
            .ctx
            .store
            .get::<Inventory>(avatar)
            .map(|inv| inv.slots.clone())
            .unwrap_or_default();
        for (index, slot) in slots.into_iter().enumerate() {
            if let Some(id) = slot {
                let line = format!("{index}: {} (entity {id})", self.item_name(id));
                self.output.push(line);
            }
        }
        Ok(())
    }

    fn list_equipment(&mut self) -> Result<(), ScriptError> {
        let avatar = self.avatar()?;
        let slots = self
            .ctx
            .store
            .get::<Equipment>(avatar)
            .map(|eq| eq.slots.clone())
            .unwrap_or_default();
        for (index, slot) in slots.into_iter().enumerate() {
            let line = match slot.item {
                Some(id) => format!(
                    "slot {index} [{:?}] = {} (entity {id})",
                    slot.kind,
                    self.item_name(id)
                ),
                None => format!("slot {index} [{:?}] = empty", slot.kind),
            };
            self.output.push(line);
        }
        Ok(())
    }
}

impl Drop for DebugSession<'_, '_> {
    fn drop(&mut self) {
        self.bindings = None;
        trace!(player = self.player, "debug session closed");
    }
}

fn arg<T: FromStr>(args: &[&str], index: usize, usage: &'static str) -> Result<T, ScriptError> {
    args.get(index)
        .and_then(|s| s.parse().ok())
        .ok_or(ScriptError::Usage(usage))
}
