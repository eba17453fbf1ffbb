use crate::input::{Command, FrameInput, InputManager};
use log::{debug, info, warn};
use shared::{
    Action, Character, Direction, EntityId, Event, Handshake, PlayerType, RelayedAction,
    Respawnable, RoomId, Strategy, TickSummary, WeaponType, World, WorldError, HEALTH_MAX,
    SQUARE_SIZE,
};
use std::time::{Duration, Instant};

/// Where the single-player NPC stands, in tiles.
const NPC_SPAWN_TILE: (i32, i32) = (5, 7);

/// Player type a UID plays as. Every client derives it the same way.
pub fn player_type_for(uid: EntityId) -> PlayerType {
    if uid % 2 == 0 {
        PlayerType::Dave
    } else {
        PlayerType::Pondy
    }
}

/// Spawn point of the `index`-th player of a multiplayer game.
pub fn spawn_point(index: usize) -> (i32, i32) {
    ((index as i32 + 2) * SQUARE_SIZE, 2 * SQUARE_SIZE)
}

/// Last values of the local player that were announced to the others.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Reported {
    x: i32,
    y: i32,
    room: RoomId,
    facing: Direction,
    weapon: WeaponType,
    health: i32,
    points: i32,
}

impl Reported {
    fn capture(player: &Character) -> Self {
        Self {
            x: player.x,
            y: player.y,
            room: player.room,
            facing: player.facing,
            weapon: player.weapon.kind(),
            health: player.health,
            points: player.points,
        }
    }
}

/// Owns the local world mirror and turns input into simulation calls
///
/// Each tick applies buffered input to the local player, advances the whole
/// world, then records what changed about the local player as outbound
/// actions. Remote actions are applied between ticks by the caller.
pub struct Controller {
    world: World,
    uid: EntityId,
    input: InputManager,
    outbound: Vec<Action>,
    reported: Option<Reported>,
}

impl Controller {
    /// Offline game: one player in the first room, plus a wandering NPC that
    /// comes back after dying.
    pub fn single_player(mut world: World, player_type: PlayerType) -> Result<Self, WorldError> {
        let (x, y) = spawn_point(0);
        world.spawn_player(0, player_type, 0, x, y)?;

        let (npc_x, npc_y) = (NPC_SPAWN_TILE.0 * SQUARE_SIZE, NPC_SPAWN_TILE.1 * SQUARE_SIZE);
        let walkable = world
            .room(0)
            .map(|room| room.grid().is_walkable(npc_x as f64, npc_y as f64))
            .unwrap_or(false);
        if walkable {
            let wander = Strategy::wander_every(world.config().wander_interval);
            let npc = world.spawn_npc(0, npc_x, npc_y, wander)?;
            let respawn_delay = world.config().respawn_delay;
            if let Some(npc) = world.npc_mut(npc) {
                npc.set_strategy(Event::Death, Strategy::respawn(respawn_delay));
            }
        }

        Ok(Self::with_world(world, 0))
    }

    /// Networked game: every UID in the handshake gets a player in the first
    /// room, lined up along the second row.
    pub fn multiplayer(mut world: World, handshake: &Handshake) -> Result<Self, WorldError> {
        for (index, uid) in handshake.uids.iter().enumerate() {
            let (x, y) = spawn_point(index);
            world.spawn_player(*uid, player_type_for(*uid), 0, x, y)?;
        }
        if world.player(handshake.uid).is_none() {
            let (x, y) = spawn_point(handshake.uids.len());
            world.spawn_player(handshake.uid, player_type_for(handshake.uid), 0, x, y)?;
        }

        info!(
            "Joined as player {} alongside {} others",
            handshake.uid,
            handshake.player_count().saturating_sub(1)
        );
        Ok(Self::with_world(world, handshake.uid))
    }

    fn with_world(world: World, uid: EntityId) -> Self {
        let mut controller = Self {
            world,
            uid,
            input: InputManager::new(),
            outbound: Vec::new(),
            reported: None,
        };
        controller.reported = controller.local_character().map(Reported::capture);
        controller
    }

    pub fn uid(&self) -> EntityId {
        self.uid
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn input_mut(&mut self) -> &mut InputManager {
        &mut self.input
    }

    /// The local player while it is alive in a room.
    pub fn local_player(&self) -> Option<&Character> {
        self.world.player(self.uid)
    }

    /// Camera direction of the local player.
    pub fn view(&self) -> Direction {
        self.local_player()
            .map(|player| player.view_direction)
            .unwrap_or(Direction::North)
    }

    /// The local player, alive or waiting to respawn.
    fn local_character(&self) -> Option<&Character> {
        self.world.player(self.uid).or_else(|| {
            self.world
                .clock()
                .pending()
                .iter()
                .find_map(|event| match &event.entity {
                    Respawnable::Player(player) if player.id == self.uid => Some(player),
                    _ => None,
                })
        })
    }

    /// One fixed step: input, simulation, outbound deltas.
    pub fn update(&mut self) -> TickSummary {
        let frame = self.input.take_frame();
        self.apply_input(frame);

        let summary = self.world.tick();
        self.collect_deltas();
        summary
    }

    fn apply_input(&mut self, frame: FrameInput) {
        let uid = self.uid;
        let Some(player) = self.world.player_mut(uid) else {
            return;
        };
        let view = player.view_direction;
        player.speed_multiplier = if frame.sprint { 2 } else { 1 };

        for direction in frame.moves {
            self.world.move_player(uid, direction.relative_to(view));
        }

        if let Some((x, y)) = frame.aim {
            let theta = match self.world.player(uid) {
                Some(player) => player.angle_to(x, y),
                None => return,
            };
            if self.world.shoot(uid, theta) > 0 {
                self.outbound.push(Action::Shoot { theta });
            }
        }

        for command in frame.commands {
            self.apply_command(command);
        }
    }

    fn apply_command(&mut self, command: Command) {
        let uid = self.uid;
        match command {
            Command::RotateLeft => {
                if let Some(player) = self.world.player_mut(uid) {
                    player.rotate_view_left();
                }
            }
            Command::RotateRight => {
                if let Some(player) = self.world.player_mut(uid) {
                    player.rotate_view_right();
                }
            }
            Command::UseItem(index) => {
                if let Some(player) = self.world.player_mut(uid) {
                    player.use_item(index);
                }
            }
            Command::DropItem(index) => {
                self.world.drop_item(uid, index);
            }
            Command::Interact => {
                let collected = self.world.pick_up(uid);
                if collected > 0 {
                    debug!("Picked up {} items", collected);
                }
            }
        }
    }

    fn collect_deltas(&mut self) {
        let Some(current) = self.local_character().map(Reported::capture) else {
            return;
        };
        let Some(previous) = self.reported.replace(current) else {
            return;
        };

        if (current.x, current.y, current.room, current.facing)
            != (previous.x, previous.y, previous.room, previous.facing)
        {
            self.outbound.push(Action::Move {
                x: current.x,
                y: current.y,
                direction: current.facing.index(),
                room: current.room as i32,
            });
        }
        if current.weapon != previous.weapon {
            self.outbound.push(Action::WeaponChange(current.weapon));
        }
        if current.health != previous.health {
            self.outbound.push(Action::HealthUpdate(current.health));
        }
        if current.points != previous.points {
            self.outbound.push(Action::ScoreUpdate(current.points));
        }
    }

    /// Actions produced since the last call, oldest first.
    pub fn take_outbound(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.outbound)
    }

    /// Applies what another client announced. Fields are last-writer-wins.
    pub fn apply_remote(&mut self, relayed: RelayedAction) {
        let uid = relayed.uid;
        if uid == self.uid {
            warn!("Ignoring relayed action carrying our own uid {}", uid);
            return;
        }

        match relayed.action {
            Action::Move {
                x,
                y,
                direction,
                room,
            } => self.apply_remote_move(uid, x, y, direction, room),
            Action::Shoot { theta } => {
                self.world.shoot(uid, theta);
            }
            Action::Disconnect => {
                if self.world.remove_player(uid).is_some() {
                    info!("Player {} left the game", uid);
                }
            }
            Action::WeaponChange(weapon) => {
                if let Some(player) = self.world.player_mut(uid) {
                    player.equip(weapon);
                }
            }
            Action::HealthUpdate(health) => {
                if let Some(player) = self.world.player_mut(uid) {
                    player.health = health;
                }
            }
            Action::ScoreUpdate(points) => {
                if let Some(player) = self.world.player_mut(uid) {
                    player.points = points;
                }
            }
        }
    }

    fn apply_remote_move(&mut self, uid: EntityId, x: i32, y: i32, direction: i32, room: i32) {
        let room = match usize::try_from(room) {
            Ok(room) if room < self.world.rooms().len() => room,
            _ => {
                warn!("Player {} moved to unknown room {}", uid, room);
                return;
            }
        };

        if self.world.player(uid).is_none() {
            // Unknown here, or still waiting to respawn locally.
            match self.world.remove_player(uid) {
                Some(mut player) => {
                    if player.is_dead() {
                        player.health = HEALTH_MAX;
                    }
                    if let Some(target) = self.world.room_mut(room) {
                        target.add_player(player);
                    }
                }
                None => {
                    debug!("First sight of player {}", uid);
                    if let Err(e) = self.world.spawn_player(uid, player_type_for(uid), room, x, y) {
                        warn!("Could not add player {}: {}", uid, e);
                        return;
                    }
                }
            }
        }

        let facing = Direction::from_index(direction)
            .or_else(|| self.world.player(uid).map(|player| player.facing))
            .unwrap_or(Direction::South);
        if let Err(e) = self.world.place_player(uid, room, x, y, facing) {
            warn!("Could not move player {}: {}", uid, e);
        }
    }
}

/// Outcome of polling the fixed-step scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Run one update; draw afterwards only if `render` is set.
    Tick { render: bool },
    /// Nothing is due yet.
    Sleep(Duration),
}

/// Fixed-timestep scheduler
///
/// The next deadline advances by exactly one frame per tick, so a loop that
/// falls behind runs several updates back to back and skips drawing until it
/// has caught up.
#[derive(Debug, Clone)]
pub struct FixedStep {
    frame: Duration,
    next: Instant,
}

impl FixedStep {
    pub fn new(frame: Duration, start: Instant) -> Self {
        Self { frame, next: start }
    }

    pub fn frame(&self) -> Duration {
        self.frame
    }

    pub fn poll(&mut self, now: Instant) -> Step {
        if now >= self.next {
            self.next += self.frame;
            Step::Tick {
                render: now < self.next,
            }
        } else {
            // Coarse: whole milliseconds only.
            let slack = self.next - now;
            Step::Sleep(Duration::from_millis(slack.as_millis() as u64))
        }
    }
}
