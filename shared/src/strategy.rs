//! NPC behaviors.
//!
//! Every non-player holds a map from `Event` to `Strategy` and exactly one
//! active strategy. Strategies are a closed set of variants; the ghost keeps
//! its fallback behavior by composition. Strategies never hold references to
//! characters, only `EntityId` handles, and reach the room through an
//! `NpcContext` built fresh for every update.

use crate::character::{Character, MoveOutcome};
use crate::geometry::Direction;
use crate::grid::Grid;
use crate::projectile::Projectile;
use crate::{EntityId, MOVE_SPEED};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeMap;
use std::time::Duration;

/// Ticks between direction changes of a wandering NPC.
pub const WANDER_INTERVAL: u32 = 30;

/// Health removed per tick while a ghost overlaps its target.
pub const GHOST_DAMAGE: i32 = 1;

/// Situations an NPC can be told to respond to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Event {
    Combat,
    Death,
    Default,
}

/// The parts of a room an NPC may touch while it updates.
pub struct NpcContext<'a> {
    pub players: &'a mut BTreeMap<EntityId, Character>,
    pub projectiles: &'a mut Vec<Projectile>,
    pub grid: &'a Grid,
    pub rng: &'a mut StdRng,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wander {
    interval: u32,
    ticks_left: u32,
    heading: Option<Direction>,
    npc: Option<EntityId>,
}

impl Wander {
    fn update(&mut self, npc: &mut Character, ctx: &mut NpcContext<'_>) {
        if self.ticks_left == 0 {
            self.reroll(ctx.rng);
        }
        self.ticks_left -= 1;

        if let Some(direction) = self.heading {
            if npc.try_move(direction, ctx.grid) != MoveOutcome::Moved {
                self.reroll(ctx.rng);
            }
        }
    }

    /// Picks one of the four directions or standing still.
    fn reroll(&mut self, rng: &mut StdRng) {
        self.heading = Direction::from_index(rng.gen_range(0..5));
        self.ticks_left = self.interval.max(1);
    }

    pub fn heading(&self) -> Option<Direction> {
        self.heading
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentryCombat {
    range: f64,
    npc: Option<EntityId>,
}

impl SentryCombat {
    fn update(&mut self, npc: &mut Character, ctx: &mut NpcContext<'_>) {
        if npc.is_dead() {
            return;
        }
        let Some((id, distance)) = nearest_player(npc, ctx.players) else {
            return;
        };
        let Some(target) = ctx.players.get(&id).map(Character::position) else {
            return;
        };

        npc.facing = Direction::facing_towards(npc.position(), target);
        if distance < self.range {
            let shots = npc.shoot_at(target.x, target.y, ctx.rng);
            if !shots.is_empty() {
                debug!("Sentry {} fires at player {} ({:.1}px)", npc.id, id, distance);
            }
            ctx.projectiles.extend(shots);
        }
    }

    pub fn range(&self) -> f64 {
        self.range
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ghost {
    range: f64,
    damage: i32,
    target: Option<EntityId>,
    alternate: Box<Strategy>,
    npc: Option<EntityId>,
}

impl Ghost {
    fn update(&mut self, npc: &mut Character, ctx: &mut NpcContext<'_>) {
        if npc.is_dead() {
            return;
        }

        // Aggro is sticky: only death or leaving the room releases it.
        if let Some(id) = self.target {
            let present = ctx.players.get(&id).map_or(false, |p| !p.is_dead());
            if !present {
                debug!("Ghost {} lost target {}", npc.id, id);
                self.target = None;
            }
        }

        if self.target.is_none() {
            if let Some((id, distance)) = nearest_player(npc, ctx.players) {
                if distance <= self.range {
                    debug!("Ghost {} locks onto player {}", npc.id, id);
                    self.target = Some(id);
                }
            }
        }

        let Some(id) = self.target else {
            self.alternate.update(npc, ctx);
            return;
        };
        let Some((tx, ty)) = ctx.players.get(&id).map(|p| (p.x, p.y)) else {
            return;
        };

        let dx = i64::from(tx) - i64::from(npc.x);
        let dy = i64::from(ty) - i64::from(npc.y);
        let step = i64::from(MOVE_SPEED);
        if dx.abs() >= step {
            let direction = if dx > 0 { Direction::East } else { Direction::West };
            npc.try_move(direction, ctx.grid);
        }
        if dy.abs() >= step {
            let direction = if dy > 0 { Direction::South } else { Direction::North };
            npc.try_move(direction, ctx.grid);
        }

        if let Some(target) = ctx.players.get_mut(&id) {
            npc.facing = Direction::facing_towards(npc.position(), target.position());
            if npc.bounding_box().intersects(&target.bounding_box()) {
                target.modify_health(-self.damage);
            }
        }
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn alternate(&self) -> &Strategy {
        &self.alternate
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Respawn {
    delay: Duration,
    armed: bool,
    npc: Option<EntityId>,
}

impl Respawn {
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

/// A pluggable NPC behavior.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Wait,
    Wander(Wander),
    SentryCombat(SentryCombat),
    Ghost(Ghost),
    Respawn(Respawn),
}

impl Strategy {
    pub fn wait() -> Self {
        Strategy::Wait
    }

    pub fn wander() -> Self {
        Self::wander_every(WANDER_INTERVAL)
    }

    pub fn wander_every(interval: u32) -> Self {
        Strategy::Wander(Wander {
            interval,
            ticks_left: 0,
            heading: None,
            npc: None,
        })
    }

    pub fn sentry(range: f64) -> Self {
        Strategy::SentryCombat(SentryCombat { range, npc: None })
    }

    /// A ghost that wanders while it has no target. The fallback wander
    /// re-rolls every `WANDER_INTERVAL` ticks regardless of `GameConfig`;
    /// use `ghost_with` to choose another alternate.
    pub fn ghost(range: f64) -> Self {
        Self::ghost_with(range, GHOST_DAMAGE, Strategy::wander())
    }

    pub fn ghost_with(range: f64, damage: i32, alternate: Strategy) -> Self {
        Strategy::Ghost(Ghost {
            range,
            damage,
            target: None,
            alternate: Box::new(alternate),
            npc: None,
        })
    }

    pub fn respawn(delay: Duration) -> Self {
        Strategy::Respawn(Respawn {
            delay,
            armed: false,
            npc: None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Wait => "wait",
            Strategy::Wander(_) => "wander",
            Strategy::SentryCombat(_) => "sentry",
            Strategy::Ghost(_) => "ghost",
            Strategy::Respawn(_) => "respawn",
        }
    }

    /// Runs one tick of behavior for `npc`.
    pub fn update(&mut self, npc: &mut Character, ctx: &mut NpcContext<'_>) {
        match self {
            Strategy::Wait | Strategy::Respawn(_) => {}
            Strategy::Wander(wander) => wander.update(npc, ctx),
            Strategy::SentryCombat(sentry) => sentry.update(npc, ctx),
            Strategy::Ghost(ghost) => ghost.update(npc, ctx),
        }
    }

    /// Called whenever this strategy becomes the active one.
    pub fn initialize(&mut self) {
        match self {
            Strategy::Wander(wander) => {
                wander.ticks_left = 0;
                wander.heading = None;
            }
            Strategy::Ghost(ghost) => ghost.alternate.initialize(),
            Strategy::Respawn(respawn) => respawn.armed = true,
            Strategy::Wait | Strategy::SentryCombat(_) => {}
        }
    }

    /// A player interacted with the NPC running this strategy.
    pub fn interact(&mut self, player: &Character, npc: &Character) {
        if let Strategy::Ghost(ghost) = self {
            debug!("Ghost {} provoked by player {}", npc.id, player.id);
            ghost.target = Some(player.id);
        }
    }

    pub fn set_npc_reference(&mut self, npc: EntityId) {
        match self {
            Strategy::Wait => {}
            Strategy::Wander(wander) => wander.npc = Some(npc),
            Strategy::SentryCombat(sentry) => sentry.npc = Some(npc),
            Strategy::Ghost(ghost) => {
                ghost.npc = Some(npc);
                ghost.alternate.set_npc_reference(npc);
            }
            Strategy::Respawn(respawn) => respawn.npc = Some(npc),
        }
    }

    pub fn npc_reference(&self) -> Option<EntityId> {
        match self {
            Strategy::Wait => None,
            Strategy::Wander(wander) => wander.npc,
            Strategy::SentryCombat(sentry) => sentry.npc,
            Strategy::Ghost(ghost) => ghost.npc,
            Strategy::Respawn(respawn) => respawn.npc,
        }
    }

    /// Consumes the pending respawn armed by `initialize`, if any. Yields at
    /// most once per arming.
    pub fn take_respawn_request(&mut self) -> Option<Duration> {
        match self {
            Strategy::Respawn(respawn) if respawn.armed => {
                respawn.armed = false;
                Some(respawn.delay)
            }
            _ => None,
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Wait
    }
}

/// Nearest living player by Euclidean distance; ties keep the first found.
fn nearest_player(
    npc: &Character,
    players: &BTreeMap<EntityId, Character>,
) -> Option<(EntityId, f64)> {
    let origin = npc.position();
    let mut nearest: Option<(EntityId, f64)> = None;

    for (id, player) in players.iter().filter(|(_, p)| !p.is_dead()) {
        let distance = origin.distance(&player.position());
        if nearest.map_or(true, |(_, best)| distance < best) {
            nearest = Some((*id, distance));
        }
    }
    nearest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::PlayerType;
    use crate::item::Tile;
    use rand::SeedableRng;

    struct Scene {
        players: BTreeMap<EntityId, Character>,
        projectiles: Vec<Projectile>,
        grid: Grid,
        rng: StdRng,
    }

    impl Scene {
        fn new() -> Self {
            Self {
                players: BTreeMap::new(),
                projectiles: Vec::new(),
                grid: Grid::filled(20, 20, Tile::Floor(None)),
                rng: StdRng::seed_from_u64(11),
            }
        }

        fn add_player(&mut self, id: EntityId, x: i32, y: i32) {
            self.players
                .insert(id, Character::new(id, PlayerType::Dave, 0, x, y));
        }

        fn run(&mut self, strategy: &mut Strategy, npc: &mut Character) {
            let mut ctx = NpcContext {
                players: &mut self.players,
                projectiles: &mut self.projectiles,
                grid: &self.grid,
                rng: &mut self.rng,
            };
            strategy.update(npc, &mut ctx);
        }
    }

    fn npc_at(x: i32, y: i32) -> Character {
        Character::new(500, PlayerType::Dave, 0, x, y)
    }

    #[test]
    fn test_sentry_faces_and_fires_at_nearest() {
        let mut scene = Scene::new();
        scene.add_player(1, 200, 100);
        scene.add_player(2, 100, 160);
        let mut npc = npc_at(100, 100);
        let mut sentry = Strategy::sentry(100.0);

        scene.run(&mut sentry, &mut npc);

        assert_eq!(npc.facing, Direction::South);
        assert_eq!(scene.projectiles.len(), 1);
        assert_eq!(scene.projectiles[0].owner, 500);
    }

    #[test]
    fn test_sentry_holds_fire_out_of_range() {
        let mut scene = Scene::new();
        scene.add_player(1, 300, 100);
        let mut npc = npc_at(100, 100);
        let mut sentry = Strategy::sentry(100.0);

        scene.run(&mut sentry, &mut npc);

        assert_eq!(npc.facing, Direction::East);
        assert!(scene.projectiles.is_empty());
    }

    #[test]
    fn test_sentry_ties_keep_first_player() {
        let mut scene = Scene::new();
        scene.add_player(1, 100, 150);
        scene.add_player(2, 150, 100);
        let npc = npc_at(100, 100);
        let nearest = nearest_player(&npc, &scene.players);
        assert_eq!(nearest.map(|(id, _)| id), Some(1));
    }

    #[test]
    fn test_ghost_acquires_chases_and_damages() {
        let mut scene = Scene::new();
        scene.add_player(1, 110, 100);
        let mut npc = npc_at(100, 100);
        let mut ghost = Strategy::ghost(50.0);

        scene.run(&mut ghost, &mut npc);
        match &ghost {
            Strategy::Ghost(g) => assert_eq!(g.target(), Some(1)),
            other => panic!("unexpected strategy {:?}", other),
        }
        assert_eq!(npc.x, 102);
        assert!(scene.players[&1].health < crate::HEALTH_MAX);
    }

    #[test]
    fn test_ghost_aggro_is_sticky_beyond_range() {
        let mut scene = Scene::new();
        scene.add_player(1, 140, 100);
        let mut npc = npc_at(100, 100);
        let mut ghost = Strategy::ghost(50.0);

        scene.run(&mut ghost, &mut npc);
        scene.players.get_mut(&1).unwrap().x = 400;
        scene.run(&mut ghost, &mut npc);

        match &ghost {
            Strategy::Ghost(g) => assert_eq!(g.target(), Some(1)),
            other => panic!("unexpected strategy {:?}", other),
        }
    }

    #[test]
    fn test_ghost_chases_target_at_extreme_coordinates() {
        let mut scene = Scene::new();
        scene.add_player(1, 140, 100);
        let mut npc = npc_at(100, 100);
        let mut ghost = Strategy::ghost(50.0);
        scene.run(&mut ghost, &mut npc);

        let start = npc.x;
        scene.players.get_mut(&1).unwrap().x = i32::MIN;
        scene.players.get_mut(&1).unwrap().y = i32::MAX;
        scene.run(&mut ghost, &mut npc);

        match &ghost {
            Strategy::Ghost(g) => assert_eq!(g.target(), Some(1)),
            other => panic!("unexpected strategy {:?}", other),
        }
        assert!(npc.x <= start);
    }

    #[test]
    fn test_ghost_falls_back_to_default_wander() {
        match Strategy::ghost(10.0) {
            Strategy::Ghost(g) => assert_eq!(g.alternate(), &Strategy::wander()),
            other => panic!("unexpected strategy {:?}", other),
        }
    }

    #[test]
    fn test_ghost_releases_when_target_leaves() {
        let mut scene = Scene::new();
        scene.add_player(1, 140, 100);
        let mut npc = npc_at(100, 100);
        let mut ghost = Strategy::ghost_with(50.0, GHOST_DAMAGE, Strategy::wait());

        scene.run(&mut ghost, &mut npc);
        scene.players.remove(&1);
        scene.run(&mut ghost, &mut npc);

        match &ghost {
            Strategy::Ghost(g) => assert_eq!(g.target(), None),
            other => panic!("unexpected strategy {:?}", other),
        }
    }

    #[test]
    fn test_ghost_interact_forces_target() {
        let player = Character::new(3, PlayerType::Pondy, 0, 0, 0);
        let npc = npc_at(100, 100);
        let mut ghost = Strategy::ghost(10.0);
        ghost.interact(&player, &npc);
        match &ghost {
            Strategy::Ghost(g) => assert_eq!(g.target(), Some(3)),
            other => panic!("unexpected strategy {:?}", other),
        }
    }

    #[test]
    fn test_wander_stays_on_walkable_tiles() {
        let mut scene = Scene::new();
        scene.grid = Grid::filled(5, 5, Tile::Wall);
        scene.grid.set(2, 2, Tile::Floor(None));
        let mut npc = npc_at(60, 60);
        let mut wander = Strategy::wander_every(3);

        for _ in 0..200 {
            scene.run(&mut wander, &mut npc);
            assert!(scene.grid.is_walkable(npc.x as f64, npc.y as f64));
        }
    }

    #[test]
    fn test_wander_eventually_moves() {
        let mut scene = Scene::new();
        let mut npc = npc_at(240, 240);
        let mut wander = Strategy::wander();

        let mut moved = false;
        for _ in 0..300 {
            scene.run(&mut wander, &mut npc);
            moved |= npc.x != 240 || npc.y != 240;
        }
        assert!(moved);
    }

    #[test]
    fn test_respawn_arms_exactly_once() {
        let mut respawn = Strategy::respawn(Duration::from_millis(50));
        assert_eq!(respawn.take_respawn_request(), None);

        respawn.initialize();
        assert_eq!(respawn.take_respawn_request(), Some(Duration::from_millis(50)));
        assert_eq!(respawn.take_respawn_request(), None);
    }

    #[test]
    fn test_npc_reference_reaches_ghost_alternate() {
        let mut ghost = Strategy::ghost(10.0);
        ghost.set_npc_reference(42);
        assert_eq!(ghost.npc_reference(), Some(42));
        match &ghost {
            Strategy::Ghost(g) => assert_eq!(g.alternate().npc_reference(), Some(42)),
            other => panic!("unexpected strategy {:?}", other),
        }
    }
}
