//! AI behaviour finite state machine.
//!
//! Pure functions that compute behaviour transitions for one AI-controlled
//! ship from plain data gathered by the simulation. No ECS dependency: the
//! caller resolves the enemy query and the current target beforehand.

use glam::Vec2;
use skirmish_core::components::Order;
use skirmish_core::constants::*;
use skirmish_core::enums::{Behavior, OrderKind};
use skirmish_core::types::EntityId;

use crate::steering::{steer, Steering};

/// What the store knows about the entity an `Attack` behaviour is chasing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetStatus {
    /// No such entity, or it has no transform.
    Missing,
    /// Exists but has no health left.
    Dead,
    Alive { position: Vec2 },
}

/// Input to the FSM for a single AI ship.
#[derive(Debug, Clone, Copy)]
pub struct AiContext {
    pub behavior: Behavior,
    pub position: Vec2,
    pub rotation: f32,
    pub order: Order,
    /// Nearest living hostile within `AI_DETECTION_RADIUS`, if any.
    pub nearest_enemy: Option<(EntityId, Vec2)>,
    /// Status of the current `Attack` target. `Missing` for other behaviours.
    pub target: TargetStatus,
}

/// Output from the FSM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiUpdate {
    pub behavior: Behavior,
    pub changed: bool,
    pub steering: Steering,
}

/// Behaviour an AI ship starts with for a given order.
///
/// Every order currently starts in `Patrol`; `Move` and `Attack` orders have no
/// distinct opening behaviour.
pub fn initial_behavior(order: &Order) -> Behavior {
    match order.kind {
        OrderKind::Guard => Behavior::Patrol,
        _ => Behavior::Patrol,
    }
}

/// Evaluate one tick: transition first, then steer for the resulting behaviour.
pub fn evaluate(ctx: &AiContext) -> AiUpdate {
    let behavior = transition(ctx);
    let target_position = match behavior {
        Behavior::Attack { target, .. } => target_position(ctx, target),
        _ => None,
    };
    AiUpdate {
        behavior,
        changed: behavior != ctx.behavior,
        steering: steer(&behavior, ctx, target_position),
    }
}

/// Compute the next behaviour without steering.
pub fn transition(ctx: &AiContext) -> Behavior {
    match ctx.behavior {
        Behavior::Patrol => match ctx.nearest_enemy {
            Some((enemy, _)) => Behavior::Attack {
                target: enemy,
                start: ctx.position,
            },
            None => Behavior::Patrol,
        },
        Behavior::Attack { target, start } => evaluate_attack(ctx, target, start),
        Behavior::MoveTo { target } => {
            if ctx.position.distance(target) < AI_ARRIVAL_TOLERANCE {
                Behavior::Patrol
            } else {
                Behavior::MoveTo { target }
            }
        }
    }
}

fn evaluate_attack(ctx: &AiContext, target: EntityId, start: Vec2) -> Behavior {
    // Strayed too far from where the pursuit began: go back, no re-acquire.
    if ctx.position.distance(start) > ctx.order.max_distance {
        return Behavior::MoveTo { target: start };
    }

    let lost = match ctx.target {
        TargetStatus::Missing | TargetStatus::Dead => true,
        TargetStatus::Alive { position } => {
            position.distance(ctx.position) > AI_MAX_ENGAGEMENT_RANGE
        }
    };
    if !lost {
        return ctx.behavior;
    }

    match ctx.nearest_enemy {
        Some((enemy, _)) if enemy != target => Behavior::Attack {
            target: enemy,
            start,
        },
        _ => Behavior::MoveTo { target: start },
    }
}

fn target_position(ctx: &AiContext, target: EntityId) -> Option<Vec2> {
    match ctx.nearest_enemy {
        Some((enemy, position)) if enemy == target => Some(position),
        _ => match ctx.target {
            TargetStatus::Alive { position } => Some(position),
            _ => None,
        },
    }
}
