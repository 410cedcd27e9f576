//! Per-behaviour steering intent.
//!
//! Each behaviour's per-tick action reduces to a `Steering` value that the
//! simulation copies into the ship's control component.

use glam::Vec2;
use skirmish_core::constants::*;
use skirmish_core::enums::Behavior;
use skirmish_core::types::rotation_towards;

use crate::fsm::AiContext;

/// Control intent produced for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    /// Acceleration direction, length in `[0, 1]`.
    pub acceleration: Vec2,
    pub target_rotation: f32,
    pub shooting: bool,
}

impl Steering {
    fn idle(rotation: f32) -> Self {
        Self {
            acceleration: Vec2::ZERO,
            target_rotation: rotation,
            shooting: false,
        }
    }

    fn towards(position: Vec2, point: Vec2, rotation: f32) -> Self {
        Self {
            acceleration: (point - position).normalize_or_zero(),
            target_rotation: rotation_towards(position, point).unwrap_or(rotation),
            shooting: false,
        }
    }
}

/// Steering for `behavior`. `target_position` is the attack target's position
/// when the behaviour is `Attack` and the target could be resolved.
pub fn steer(behavior: &Behavior, ctx: &AiContext, target_position: Option<Vec2>) -> Steering {
    match *behavior {
        Behavior::Patrol => patrol(ctx),
        Behavior::Attack { .. } => match target_position {
            Some(target) => attack(ctx, target),
            None => Steering::idle(ctx.rotation),
        },
        Behavior::MoveTo { target } => Steering::towards(ctx.position, target, ctx.rotation),
    }
}

/// Orbit the guard point counter-clockwise at `AI_PATROL_RADIUS`.
fn patrol(ctx: &AiContext) -> Steering {
    let center = ctx.order.target;
    let offset = ctx.position - center;
    let distance = offset.length();

    if distance > AI_PATROL_RADIUS * 1.5 {
        return Steering::towards(ctx.position, center, ctx.rotation);
    }

    let radial = if distance > f32::EPSILON {
        offset / distance
    } else {
        Vec2::X
    };
    // Tangent plus a pull back onto the ring.
    let correction = (AI_PATROL_RADIUS - distance) / AI_PATROL_RADIUS;
    let direction = (radial.perp() + radial * correction).normalize_or_zero();

    Steering {
        acceleration: direction * 0.5,
        target_rotation: rotation_towards(Vec2::ZERO, direction).unwrap_or(ctx.rotation),
        shooting: false,
    }
}

/// Close to half weapon range, always facing the target, firing once in range.
fn attack(ctx: &AiContext, target: Vec2) -> Steering {
    let distance = ctx.position.distance(target);
    let acceleration = if distance > AI_WEAPON_RANGE * 0.5 {
        (target - ctx.position).normalize_or_zero()
    } else {
        Vec2::ZERO
    };
    Steering {
        acceleration,
        target_rotation: rotation_towards(ctx.position, target).unwrap_or(ctx.rotation),
        shooting: distance <= AI_WEAPON_RANGE,
    }
}
