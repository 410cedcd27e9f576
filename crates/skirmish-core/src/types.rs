//! Fundamental identifiers and simulation time types.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Index of a player in the session. Used to resolve avatars and authorize commands.
pub type PlayerId = u8;

/// Opaque entity identifier as stored inside components and commands.
///
/// Holding an id is not ownership: the referent may be removed between two
/// lookups, so every use resolves it through the store again.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The id that never refers to a live entity.
    pub const NONE: EntityId = EntityId(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Simulation time tracking. All timing in the core is counted in frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimTime {
    /// Frame that the next call to `tick` will simulate.
    pub frame: u64,
}

impl SimTime {
    /// Seconds per frame. Always the fixed simulated delta, never wall-clock.
    pub fn dt(&self) -> f32 {
        crate::constants::DT
    }

    /// Advance by one frame.
    pub fn advance(&mut self) {
        self.frame += 1;
    }

    /// Elapsed simulated seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.frame as f64 / crate::constants::TICK_RATE as f64
    }
}

/// Shortest signed angular difference `to - from`, in `(-PI, PI]`.
pub fn angle_delta(from: f32, to: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let d = (to - from).rem_euclid(TAU);
    if d > PI {
        d - TAU
    } else {
        d
    }
}

/// Unit vector pointing along `rotation` (radians, 0 = +X, counter-clockwise).
pub fn facing(rotation: f32) -> Vec2 {
    let (sin, cos) = rotation.sin_cos();
    Vec2::new(cos, sin)
}

/// Rotation (radians) that faces from `from` toward `to`. Returns `None` when the
/// points coincide.
pub fn rotation_towards(from: Vec2, to: Vec2) -> Option<f32> {
    let d = to - from;
    if d.length_squared() <= f32::EPSILON {
        None
    } else {
        Some(d.y.atan2(d.x))
    }
}
