//! Simulation constants and tuning parameters.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per tick.
pub const DT: f32 = 1.0 / TICK_RATE as f32;

// --- World bounds ---

/// Entities (other than avatars) further than this from the origin are removed.
pub const WORLD_RADIUS: f32 = 20_000.0;

// --- Spatial index ---

/// Edge length of one spatial grid cell (world units).
pub const SPATIAL_CELL_SIZE: f32 = 256.0;

/// Spatial group bit for ships.
pub const GROUP_SHIPS: u32 = 1 << 0;

/// Spatial group bit for projectiles.
pub const GROUP_PROJECTILES: u32 = 1 << 1;

/// Spatial group bit for items floating in the world.
pub const GROUP_ITEMS: u32 = 1 << 2;

/// Matches every spatial group.
pub const GROUP_ALL: u32 = u32::MAX;

// --- Factions ---

/// Faction bit shared by all players.
pub const FACTION_PLAYERS: u32 = 1 << 0;

/// First NPC faction.
pub const FACTION_NPC_A: u32 = 1 << 1;

/// Second NPC faction.
pub const FACTION_NPC_B: u32 = 1 << 2;

// --- Movement ---

/// Fraction of velocity retained each tick when not accelerating.
pub const SHIP_DRAG: f32 = 0.985;

// --- AI ---

/// Radius within which a patrolling AI acquires enemies.
pub const AI_DETECTION_RADIUS: f32 = 600.0;

/// Attack is abandoned once the target is further away than this.
pub const AI_MAX_ENGAGEMENT_RANGE: f32 = 900.0;

/// A MoveTo behaviour completes once closer than this to its destination.
pub const AI_ARRIVAL_TOLERANCE: f32 = 32.0;

/// Radius of the orbit flown around the guard point while patrolling.
pub const AI_PATROL_RADIUS: f32 = 200.0;

/// AI only opens fire when its target is within this range.
pub const AI_WEAPON_RANGE: f32 = 450.0;

/// Default roam distance for orders that don't specify one.
pub const AI_DEFAULT_MAX_DISTANCE: f32 = 1_500.0;

// --- Combat / lifecycle ---

/// Ticks a death effect stays in the world.
pub const EFFECT_LIFETIME_TICKS: u32 = 45;

/// Default ticks before a dead avatar is restored.
pub const RESPAWN_DELAY_TICKS: u32 = 180;

/// Ticks a dropped item floats in the world before it is removed.
pub const DROPPED_ITEM_LIFETIME_TICKS: u32 = 1_800;

/// Avatars pick up dropped items within this distance.
pub const PICKUP_RADIUS: f32 = 48.0;

/// Distance in front of a ship at which projectiles are spawned.
pub const MUZZLE_OFFSET: f32 = 24.0;

/// Dropped items can't be picked up again for this many ticks.
pub const PICKUP_DELAY_TICKS: u32 = 60;
