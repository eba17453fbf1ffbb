//! A single area of the world and its fixed-step simulation.
//!
//! The room owns its grid (and every item placed in it), the players and NPCs
//! currently inside it and every projectile fired into it. `tick` is the only
//! place where simulation state changes in bulk; structural changes during a
//! tick are always applied after iterating over a snapshot of ids.

use crate::character::{Character, MoveOutcome, PlayerType};
use crate::clock::{GameClock, Respawnable};
use crate::door::{DoorId, DoorRegistry};
use crate::geometry::Direction;
use crate::grid::Grid;
use crate::item::Tile;
use crate::npc::NonPlayer;
use crate::projectile::Projectile;
use crate::strategy::{NpcContext, Strategy};
use crate::{EntityId, RoomId, WorldError, POINTS_PER_KILL};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Largest grid a room file may declare.
pub const MAX_ROOM_CELLS: usize = 1 << 20;

static OUTSIDE: Tile = Tile::Wall;

/// World-owned state a room needs while it ticks.
pub struct TickContext<'a> {
    pub clock: &'a mut GameClock,
    pub rng: &'a mut StdRng,
    pub respawn_delay: Duration,
}

/// What happened during one or more ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub hits: usize,
    pub kills: usize,
    pub projectiles_removed: usize,
    pub deaths: Vec<EntityId>,
}

impl TickSummary {
    pub fn merge(&mut self, other: TickSummary) {
        self.hits += other.hits;
        self.kills += other.kills;
        self.projectiles_removed += other.projectiles_removed;
        self.deaths.extend(other.deaths);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Struck {
    Player(EntityId),
    Npc(EntityId),
}

#[derive(Debug)]
pub struct Room {
    id: RoomId,
    name: String,
    description: String,
    grid: Grid,
    players: BTreeMap<EntityId, Character>,
    npcs: BTreeMap<EntityId, NonPlayer>,
    projectiles: Vec<Projectile>,
    doors: BTreeSet<DoorId>,
    default_strategy: Strategy,
}

impl Room {
    pub fn new(
        id: RoomId,
        name: &str,
        description: &str,
        grid: Grid,
        default_strategy: Strategy,
    ) -> Self {
        let doors = grid
            .cells()
            .filter_map(|(_, _, tile)| match tile {
                Tile::Door(door) => Some(*door),
                _ => None,
            })
            .collect();

        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            grid,
            players: BTreeMap::new(),
            npcs: BTreeMap::new(),
            projectiles: Vec::new(),
            doors,
            default_strategy,
        }
    }

    /// Parses a room file: a description line, the column count, the row
    /// count, then one line per row of two-character tile codes. Numeric
    /// codes are doors and are registered with `doors`.
    pub fn parse(
        id: RoomId,
        name: &str,
        text: &str,
        doors: &mut DoorRegistry,
        default_strategy: Strategy,
    ) -> Result<Room, WorldError> {
        let mut lines = text.lines().map(|line| line.trim_end_matches('\r'));

        let description = lines
            .next()
            .ok_or_else(|| WorldError::malformed(name, 1, "missing description"))?
            .trim();
        let cols = Self::parse_dimension(lines.next(), name, 2, "column count")?;
        let rows = Self::parse_dimension(lines.next(), name, 3, "row count")?;

        let area = cols
            .checked_mul(rows)
            .filter(|area| *area <= MAX_ROOM_CELLS)
            .ok_or_else(|| {
                WorldError::malformed(
                    name,
                    3,
                    format!("{} x {} tiles exceeds {} cells", cols, rows, MAX_ROOM_CELLS),
                )
            })?;

        let mut cells = Vec::with_capacity(area);
        for row in 0..rows {
            let line_number = row + 4;
            let line = lines
                .next()
                .ok_or_else(|| WorldError::malformed(name, line_number, "missing tile row"))?;
            let codes: Vec<char> = line.chars().collect();
            if codes.len() < cols * 2 {
                return Err(WorldError::malformed(
                    name,
                    line_number,
                    format!("expected {} tile codes, found {}", cols, codes.len() / 2),
                ));
            }

            for col in 0..cols {
                let code: String = codes[col * 2..col * 2 + 2].iter().collect();
                cells.push(Self::parse_tile(&code, id, name, col, row, doors));
            }
        }

        Ok(Room::new(id, name, description, Grid::new(cols, rows, cells), default_strategy))
    }

    fn parse_dimension(
        line: Option<&str>,
        name: &str,
        line_number: usize,
        what: &str,
    ) -> Result<usize, WorldError> {
        let text = line.ok_or_else(|| WorldError::malformed(name, line_number, format!("missing {}", what)))?;
        match text.trim().parse::<usize>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(WorldError::malformed(
                name,
                line_number,
                format!("{} {:?} is not a positive number", what, text.trim()),
            )),
        }
    }

    fn parse_tile(
        code: &str,
        room: RoomId,
        name: &str,
        col: usize,
        row: usize,
        doors: &mut DoorRegistry,
    ) -> Tile {
        if code.chars().all(|c| c.is_ascii_digit()) {
            return Tile::Door(doors.resolve(code, room, col, row));
        }
        Tile::from_code(code).unwrap_or_else(|| {
            warn!(
                "Unknown tile code {:?} in room {} at ({}, {}), using floor",
                code, name, col, row
            );
            Tile::Floor(None)
        })
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn doors(&self) -> &BTreeSet<DoorId> {
        &self.doors
    }

    /// Tile under a pixel; anything outside the grid is a wall.
    pub fn item_at(&self, x: f64, y: f64) -> &Tile {
        self.grid.tile_at(x, y).unwrap_or(&OUTSIDE)
    }

    pub fn players(&self) -> &BTreeMap<EntityId, Character> {
        &self.players
    }

    pub fn player(&self, id: EntityId) -> Option<&Character> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.players.get_mut(&id)
    }

    pub fn npcs(&self) -> &BTreeMap<EntityId, NonPlayer> {
        &self.npcs
    }

    pub fn npc(&self, id: EntityId) -> Option<&NonPlayer> {
        self.npcs.get(&id)
    }

    pub fn npc_mut(&mut self, id: EntityId) -> Option<&mut NonPlayer> {
        self.npcs.get_mut(&id)
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.players.contains_key(&id) || self.npcs.contains_key(&id)
    }

    pub fn add_player(&mut self, mut player: Character) {
        player.room = self.id;
        self.players.insert(player.id, player);
    }

    /// Removes a player. The last player leaving clears every projectile.
    pub fn remove_player(&mut self, id: EntityId) -> Option<Character> {
        let removed = self.players.remove(&id);
        if self.players.is_empty() {
            self.projectiles.clear();
        }
        removed
    }

    pub fn add_npc(&mut self, mut npc: NonPlayer) {
        npc.body.room = self.id;
        self.npcs.insert(npc.id(), npc);
    }

    pub fn remove_npc(&mut self, id: EntityId) -> Option<NonPlayer> {
        self.npcs.remove(&id)
    }

    /// Creates an NPC running `initial`, with this room's injected default
    /// as its last-resort strategy.
    pub fn spawn_npc(&mut self, id: EntityId, x: i32, y: i32, initial: Strategy) -> &mut NonPlayer {
        let body = Character::new(id, PlayerType::Dave, self.id, x, y);
        let npc = NonPlayer::new(body, initial, self.default_strategy.clone());
        self.npcs.remove(&id);
        self.npcs.entry(id).or_insert(npc)
    }

    /// Accepts a projectile only when its owner is in this room.
    pub fn add_projectile(&mut self, projectile: Projectile) -> bool {
        if !self.contains(projectile.owner) {
            return false;
        }
        self.projectiles.push(projectile);
        true
    }

    pub fn move_player(&mut self, id: EntityId, direction: Direction) -> Option<MoveOutcome> {
        let player = self.players.get_mut(&id)?;
        Some(player.try_move(direction, &self.grid))
    }

    /// Fires a player's weapon. Returns how many projectiles were added.
    pub fn shoot(&mut self, id: EntityId, theta: f64, rng: &mut StdRng) -> usize {
        let shots = match self.players.get_mut(&id) {
            Some(player) => player.shoot(theta, rng),
            None => return 0,
        };
        let count = shots.len();
        self.projectiles.extend(shots);
        count
    }

    pub fn drop_item(&mut self, id: EntityId, index: usize) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => player.drop_item(index, &mut self.grid),
            None => false,
        }
    }

    pub fn pick_up(&mut self, id: EntityId) -> usize {
        match self.players.get_mut(&id) {
            Some(player) => player.interact(&mut self.grid),
            None => 0,
        }
    }

    pub fn interact_with_npc(&mut self, player: EntityId, npc: EntityId) -> bool {
        match (self.players.get(&player), self.npcs.get_mut(&npc)) {
            (Some(player), Some(npc)) => {
                npc.interact(player);
                true
            }
            _ => false,
        }
    }

    /// Advances the room by one fixed step.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> TickSummary {
        let mut summary = TickSummary::default();

        if self.players.is_empty() {
            self.projectiles.clear();
        }

        for projectile in self.projectiles.iter_mut().filter(|p| p.active) {
            projectile.advance();
        }

        self.resolve_hits(&mut summary);

        for projectile in self.projectiles.iter_mut().filter(|p| p.active) {
            if !self.grid.is_walkable(projectile.x, projectile.y) {
                projectile.active = false;
            }
        }

        let before = self.projectiles.len();
        self.projectiles.retain(|p| p.active);
        summary.projectiles_removed = before - self.projectiles.len();

        self.remove_dead_players(ctx, &mut summary);
        self.update_npcs(ctx, &mut summary);

        for player in self.players.values_mut() {
            player.weapon.recharge();
        }
        for npc in self.npcs.values_mut() {
            npc.body.weapon.recharge();
        }

        summary
    }

    fn resolve_hits(&mut self, summary: &mut TickSummary) {
        for index in 0..self.projectiles.len() {
            let projectile = &self.projectiles[index];
            if !projectile.active {
                continue;
            }
            let (owner, damage) = (projectile.owner, projectile.damage);
            let Some(struck) = self.struck_by(projectile) else {
                continue;
            };

            let killed = match struck {
                Struck::Player(id) => self
                    .players
                    .get_mut(&id)
                    .map_or(false, |player| player.modify_health(damage)),
                Struck::Npc(id) => self
                    .npcs
                    .get_mut(&id)
                    .map_or(false, |npc| npc.modify_health(damage)),
            };
            self.projectiles[index].active = false;
            summary.hits += 1;

            if killed {
                summary.kills += 1;
                self.award_kill(owner);
            }
        }
    }

    /// First living character, other than the owner, whose box fully contains
    /// the projectile. Players are tested before NPCs.
    fn struck_by(&self, projectile: &Projectile) -> Option<Struck> {
        let bounds = projectile.bounding_box();
        let hit = |c: &Character| {
            c.id != projectile.owner && !c.is_dead() && c.bounding_box().contains(&bounds)
        };

        if let Some(player) = self.players.values().find(|p| hit(*p)) {
            return Some(Struck::Player(player.id));
        }
        self.npcs
            .values()
            .find(|npc| hit(&npc.body))
            .map(|npc| Struck::Npc(npc.id()))
    }

    fn award_kill(&mut self, owner: EntityId) {
        if let Some(player) = self.players.get_mut(&owner) {
            player.points += POINTS_PER_KILL;
        } else if let Some(npc) = self.npcs.get_mut(&owner) {
            npc.body.points += POINTS_PER_KILL;
        }
    }

    fn remove_dead_players(&mut self, ctx: &mut TickContext<'_>, summary: &mut TickSummary) {
        let dead: Vec<EntityId> = self
            .players
            .values()
            .filter(|p| p.is_dead())
            .map(|p| p.id)
            .collect();

        for id in dead {
            if let Some(player) = self.remove_player(id) {
                info!(
                    "Player {} died in room {} at ({}, {})",
                    id, self.name, player.x, player.y
                );
                let (x, y) = (player.x, player.y);
                ctx.clock
                    .schedule(Respawnable::Player(player), self.id, x, y, ctx.respawn_delay);
                summary.deaths.push(id);
            }
        }
    }

    fn update_npcs(&mut self, ctx: &mut TickContext<'_>, summary: &mut TickSummary) {
        let mut npcs = std::mem::take(&mut self.npcs);
        {
            let mut npc_ctx = NpcContext {
                players: &mut self.players,
                projectiles: &mut self.projectiles,
                grid: &self.grid,
                rng: &mut *ctx.rng,
            };
            for npc in npcs.values_mut() {
                npc.update(&mut npc_ctx);
            }
        }

        let dead: Vec<EntityId> = npcs
            .values()
            .filter(|npc| npc.is_dead())
            .map(NonPlayer::id)
            .collect();

        for id in dead {
            let Some(mut npc) = npcs.remove(&id) else {
                continue;
            };
            summary.deaths.push(id);
            let (x, y) = (npc.body.x, npc.body.y);
            match npc.take_respawn_request() {
                Some(delay) => {
                    debug!("NPC {} will respawn in {:?}", id, delay);
                    ctx.clock
                        .schedule(Respawnable::NonPlayer(Box::new(npc)), self.id, x, y, delay);
                }
                None => info!("NPC {} destroyed in room {}", id, self.name),
            }
        }

        self.npcs = npcs;
    }
}
