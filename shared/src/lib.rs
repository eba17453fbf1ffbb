//! # Shared Game Core
//!
//! Everything both the relay server and the game clients agree on lives here:
//! the entity model, the NPC strategy engine, the per-room simulation tick,
//! the world (rooms, doors, scheduled respawns) and the fixed-width wire
//! protocol spoken over the relay.
//!
//! ## Module Organization
//!
//! - `geometry`: points, bounding boxes, cardinal directions and the facing rule
//! - `item`, `grid`, `door`: tile catalogue, room grids and two-sided doors
//! - `weapon`, `projectile`: fire-rate gated weapons and the shots they spawn
//! - `character`, `npc`, `strategy`: players, non-players and their behaviors
//! - `room`, `world`, `clock`: the simulation proper
//! - `protocol`: action codes and their fixed-width encoding
//! - `save`: the persistence document
//!
//! ## Simulation Units
//!
//! Positions are pixels. A tile is `SQUARE_SIZE` pixels wide, so the pixel
//! coordinate of a tile index is `index * SQUARE_SIZE`. Speeds are pixels per
//! tick and the logical tick rate is `FRAME_RATE` ticks per second.

pub mod character;
pub mod clock;
pub mod config;
pub mod door;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod item;
pub mod npc;
pub mod projectile;
pub mod protocol;
pub mod room;
pub mod save;
pub mod strategy;
pub mod weapon;
pub mod world;

pub use character::{Character, Inventory, MoveOutcome, PlayerType};
pub use clock::{GameClock, Respawnable, ScheduledRespawn};
pub use config::GameConfig;
pub use door::{Door, DoorId, DoorRegistry, DoorSide};
pub use error::{ProtocolError, WorldError};
pub use geometry::{Direction, Point, Rect};
pub use grid::Grid;
pub use item::{Facing, Item, Tile};
pub use npc::NonPlayer;
pub use projectile::Projectile;
pub use protocol::{Action, Handshake, RelayedAction};
pub use room::{Room, TickContext, TickSummary};
pub use save::SaveDocument;
pub use strategy::{Event, Strategy};
pub use weapon::{Weapon, WeaponType};
pub use world::World;

/// Identity of a character. Players use their relay UID.
pub type EntityId = u32;

/// Index of a room inside its world.
pub type RoomId = usize;

pub const SQUARE_SIZE: i32 = 24;
pub const FRAME_RATE: u32 = 60;
pub const HEALTH_MAX: i32 = 100;
pub const RESPAWN_TIME_MS: u64 = 5000;
pub const INVENTORY_SIZE: usize = 3;
pub const CHARACTER_SIZE: i32 = 16;
pub const MOVE_SPEED: i32 = 2;
pub const BASE_PROJECTILE_SPEED: f64 = 4.0;
pub const PROJECTILE_HIT_BOX: f64 = 2.0;
pub const POINTS_PER_KILL: i32 = 10;
pub const MAX_CLIENTS: usize = 4;
pub const ANIMATION_FRAMES: u8 = 3;

/// Largest UID the relay can put on the wire (a non-negative i32).
pub const MAX_RELAY_UID: EntityId = i32::MAX as EntityId;

/// First id handed out to non-player characters. NPC ids count down from
/// here and never reach the relay UID range.
pub const NPC_ID_BASE: EntityId = EntityId::MAX;

/// What a renderer needs to pick a sprite: the entity's sprite family, the
/// direction it is seen from and the animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteKey {
    pub name: &'static str,
    pub view: Direction,
    pub frame: u8,
}

/// Converts a tile index to the pixel coordinate of the tile's top-left corner.
pub fn tile_to_pixel(index: usize) -> i32 {
    index as i32 * SQUARE_SIZE
}
