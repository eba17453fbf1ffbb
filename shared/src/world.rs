use crate::character::{Character, MoveOutcome, PlayerType};
use crate::clock::{GameClock, Respawnable, ScheduledRespawn};
use crate::config::GameConfig;
use crate::door::{DoorId, DoorRegistry};
use crate::geometry::Direction;
use crate::grid::Grid;
use crate::npc::NonPlayer;
use crate::room::{Room, TickContext, TickSummary};
use crate::strategy::Strategy;
use crate::{EntityId, RoomId, WorldError, HEALTH_MAX, MAX_RELAY_UID, NPC_ID_BASE};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::io;
use std::path::Path;

pub const ROOM_INDEX_FILE: &str = "RoomIndex.txt";
pub const ROOMS_DIR: &str = "Rooms";

/// Every room, the doors between them, simulation time and the random
/// source. The world is the single owner of simulation state.
#[derive(Debug)]
pub struct World {
    config: GameConfig,
    rooms: Vec<Room>,
    doors: DoorRegistry,
    clock: GameClock,
    rng: StdRng,
    default_strategy: Strategy,
    next_npc_id: EntityId,
}

impl World {
    pub fn new(config: GameConfig, default_strategy: Strategy) -> Self {
        Self {
            clock: GameClock::new(config.tick_length()),
            rng: StdRng::seed_from_u64(config.rng_seed),
            config,
            rooms: Vec::new(),
            doors: DoorRegistry::new(),
            default_strategy,
            next_npc_id: NPC_ID_BASE,
        }
    }

    /// Loads `RoomIndex.txt` and each `Rooms/<name>.txt` it lists from `dir`.
    /// Missing room files are skipped with a warning; malformed ones fail the load.
    pub fn load(
        dir: &Path,
        config: GameConfig,
        default_strategy: Strategy,
    ) -> Result<Self, WorldError> {
        let index = fs::read_to_string(dir.join(ROOM_INDEX_FILE))?;
        let mut world = Self::new(config, default_strategy);

        for name in index.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let path = dir.join(ROOMS_DIR).join(format!("{}.txt", name));
            match fs::read_to_string(&path) {
                Ok(text) => {
                    world.add_room_from_text(name, &text)?;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!("Room file {} is missing, skipping room {}", path.display(), name);
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            "Loaded {} rooms and {} doors from {}",
            world.rooms.len(),
            world.doors.len(),
            dir.display()
        );
        Ok(world)
    }

    pub fn add_room_from_text(&mut self, name: &str, text: &str) -> Result<RoomId, WorldError> {
        let id = self.rooms.len();
        let room = Room::parse(id, name, text, &mut self.doors, self.default_strategy.clone())?;
        self.rooms.push(room);
        Ok(id)
    }

    pub fn add_room(&mut self, name: &str, description: &str, grid: Grid) -> RoomId {
        let id = self.rooms.len();
        self.rooms
            .push(Room::new(id, name, description, grid, self.default_strategy.clone()));
        id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn doors(&self) -> &DoorRegistry {
        &self.doors
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    pub fn room_by_name(&self, name: &str) -> Option<RoomId> {
        self.rooms.iter().position(|room| room.name() == name)
    }

    /// Room currently holding player `id`.
    pub fn locate(&self, id: EntityId) -> Option<RoomId> {
        self.rooms.iter().position(|room| room.player(id).is_some())
    }

    pub fn player(&self, id: EntityId) -> Option<&Character> {
        self.rooms.iter().find_map(|room| room.player(id))
    }

    pub fn player_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.rooms.iter_mut().find_map(|room| room.player_mut(id))
    }

    pub fn npc(&self, id: EntityId) -> Option<&NonPlayer> {
        self.rooms.iter().find_map(|room| room.npc(id))
    }

    pub fn npc_mut(&mut self, id: EntityId) -> Option<&mut NonPlayer> {
        self.rooms.iter_mut().find_map(|room| room.npc_mut(id))
    }

    /// Adds a fresh player. Fails if `id` is already in a room or waiting to
    /// respawn.
    pub fn spawn_player(
        &mut self,
        id: EntityId,
        player_type: PlayerType,
        room: RoomId,
        x: i32,
        y: i32,
    ) -> Result<(), WorldError> {
        if self.locate(id).is_some() || self.npc(id).is_some() || self.clock.is_scheduled(id) {
            return Err(WorldError::DuplicateCharacter(id));
        }
        let target = self
            .rooms
            .get_mut(room)
            .ok_or_else(|| WorldError::UnknownRoom(room.to_string()))?;
        target.add_player(Character::new(id, player_type, room, x, y));
        Ok(())
    }

    /// Adds an NPC running `initial` and returns its id. NPC ids count down
    /// from `NPC_ID_BASE`.
    pub fn spawn_npc(
        &mut self,
        room: RoomId,
        x: i32,
        y: i32,
        initial: Strategy,
    ) -> Result<EntityId, WorldError> {
        let id = self.next_npc_id;
        if id <= MAX_RELAY_UID {
            return Err(WorldError::NpcIdsExhausted);
        }
        let target = self
            .rooms
            .get_mut(room)
            .ok_or_else(|| WorldError::UnknownRoom(room.to_string()))?;
        target.spawn_npc(id, x, y, initial);
        self.next_npc_id -= 1;
        Ok(id)
    }

    /// Removes a player wherever it is, including a pending respawn.
    pub fn remove_player(&mut self, id: EntityId) -> Option<Character> {
        if let Some(room) = self.locate(id) {
            return self.rooms[room].remove_player(id);
        }
        match self.clock.cancel_for(id)?.entity {
            Respawnable::Player(player) => {
                debug!("Cancelled pending respawn of player {}", id);
                Some(player)
            }
            Respawnable::NonPlayer(_) => None,
        }
    }

    /// Moves a player one step, crossing to the far side of a door when the
    /// step enters one.
    pub fn move_player(&mut self, id: EntityId, direction: Direction) -> Option<MoveOutcome> {
        let room = self.locate(id)?;
        let outcome = self.rooms[room].move_player(id, direction)?;

        if let MoveOutcome::EnteredDoor(door) = outcome {
            if !self.traverse_door(id, room, door) {
                return Some(MoveOutcome::Blocked);
            }
        }
        Some(outcome)
    }

    fn traverse_door(&mut self, id: EntityId, from: RoomId, door: DoorId) -> bool {
        let Some(side) = self.doors.get(door).and_then(|d| d.other_side(from)) else {
            debug!("Door {} in room {} leads nowhere", door, from);
            return false;
        };
        if side.room >= self.rooms.len() {
            return false;
        }
        let Some(mut player) = self.rooms[from].remove_player(id) else {
            return false;
        };

        let (x, y) = Grid::tile_center(side.col, side.row);
        player.x = x;
        player.y = y;
        info!(
            "Player {} walks from {} to {}",
            id,
            self.rooms[from].name(),
            self.rooms[side.room].name()
        );
        self.rooms[side.room].add_player(player);
        true
    }

    /// Puts a player at an exact position, switching rooms when needed.
    pub fn place_player(
        &mut self,
        id: EntityId,
        room: RoomId,
        x: i32,
        y: i32,
        facing: Direction,
    ) -> Result<(), WorldError> {
        if room >= self.rooms.len() {
            return Err(WorldError::UnknownRoom(room.to_string()));
        }
        let current = self.locate(id).ok_or(WorldError::UnknownCharacter(id))?;
        if current != room {
            if let Some(player) = self.rooms[current].remove_player(id) {
                self.rooms[room].add_player(player);
            }
        }

        let player = self.rooms[room]
            .player_mut(id)
            .ok_or(WorldError::UnknownCharacter(id))?;
        player.x = x;
        player.y = y;
        player.facing = facing;
        Ok(())
    }

    /// Fires a player's weapon along `theta`. Returns the projectile count.
    pub fn shoot(&mut self, id: EntityId, theta: f64) -> usize {
        match self.locate(id) {
            Some(room) => self.rooms[room].shoot(id, theta, &mut self.rng),
            None => 0,
        }
    }

    pub fn interact_with_npc(&mut self, player: EntityId, npc: EntityId) -> bool {
        match self.locate(player) {
            Some(room) => self.rooms[room].interact_with_npc(player, npc),
            None => false,
        }
    }

    pub fn drop_item(&mut self, id: EntityId, index: usize) -> bool {
        match self.locate(id) {
            Some(room) => self.rooms[room].drop_item(id, index),
            None => false,
        }
    }

    pub fn pick_up(&mut self, id: EntityId) -> usize {
        match self.locate(id) {
            Some(room) => self.rooms[room].pick_up(id),
            None => 0,
        }
    }

    /// Advances simulation time by one tick: due respawns first, then every room.
    pub fn tick(&mut self) -> TickSummary {
        self.clock.advance();
        for event in self.clock.drain_due() {
            self.respawn(event);
        }

        let mut summary = TickSummary::default();
        let mut ctx = TickContext {
            clock: &mut self.clock,
            rng: &mut self.rng,
            respawn_delay: self.config.respawn_delay,
        };
        for room in &mut self.rooms {
            summary.merge(room.tick(&mut ctx));
        }

        if self.clock.ticks() % u64::from(self.config.tick_rate.max(1)) == 0 {
            debug!(
                "Tick {}: {} players, {} npcs, {} projectiles, {} pending respawns",
                self.clock.ticks(),
                self.rooms.iter().map(|r| r.players().len()).sum::<usize>(),
                self.rooms.iter().map(|r| r.npcs().len()).sum::<usize>(),
                self.rooms.iter().map(|r| r.projectiles().len()).sum::<usize>(),
                self.clock.pending().len()
            );
        }
        summary
    }

    fn respawn(&mut self, event: ScheduledRespawn) {
        let Some(room) = self.rooms.get_mut(event.room) else {
            warn!("Dropping respawn into unknown room {}", event.room);
            return;
        };

        match event.entity {
            Respawnable::Player(mut player) => {
                player.health = HEALTH_MAX;
                player.x = event.x;
                player.y = event.y;
                info!("Player {} respawns in {}", player.id, room.name());
                room.add_player(player);
            }
            Respawnable::NonPlayer(mut npc) => {
                npc.revive();
                npc.body.x = event.x;
                npc.body.y = event.y;
                info!("NPC {} respawns in {}", npc.id(), room.name());
                room.add_npc(*npc);
            }
        }
    }

    pub(crate) fn rooms_mut(&mut self) -> &mut [Room] {
        &mut self.rooms
    }

    pub(crate) fn clock_mut(&mut self) -> &mut GameClock {
        &mut self.clock
    }
}
