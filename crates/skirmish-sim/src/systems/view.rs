//! View system: queries the store and builds a `RenderView`.
//!
//! Read-only. Never modifies the store.

use std::collections::BTreeMap;

use hecs::Entity;

use skirmish_core::components::*;
use skirmish_core::state::*;
use skirmish_core::types::PlayerId;

use crate::store::{entity_id, Store};

/// Build the renderer's view of the current frame.
pub fn build_view(store: &Store, frame: u64, avatars: &BTreeMap<PlayerId, Entity>) -> RenderView {
    RenderView {
        frame,
        sprites: build_sprites(store),
        avatars: avatars
            .iter()
            .filter_map(|(&player, &entity)| build_avatar(store, player, entity))
            .collect(),
    }
}

fn build_sprites(store: &Store) -> Vec<SpriteView> {
    store
        .sorted_with::<Appearance>()
        .into_iter()
        .filter(|&entity| !store.is_removed(entity))
        .filter_map(|entity| {
            let transform = store.get::<Transform>(entity)?;
            let appearance = store.get::<Appearance>(entity)?;
            Some(SpriteView {
                entity: entity_id(entity),
                position: transform.position,
                rotation: transform.rotation,
                texture: appearance.texture.clone(),
            })
        })
        .collect()
}

fn build_avatar(store: &Store, player: PlayerId, entity: Entity) -> Option<AvatarView> {
    let health = store.get::<Health>(entity).map(|h| h.0)?;
    let energy = store.get::<Energy>(entity).map(|e| e.0)?;
    Some(AvatarView {
        player,
        entity: entity_id(entity),
        health: health.value,
        max_health: health.max,
        energy: energy.value,
        max_energy: energy.max,
        dead: health.is_depleted(),
    })
}
