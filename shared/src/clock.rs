use crate::character::Character;
use crate::npc::NonPlayer;
use crate::{EntityId, RoomId};
use std::time::Duration;

/// A dead entity waiting to be put back into a room.
#[derive(Debug, Clone)]
pub enum Respawnable {
    Player(Character),
    NonPlayer(Box<NonPlayer>),
}

impl Respawnable {
    pub fn id(&self) -> EntityId {
        match self {
            Respawnable::Player(player) => player.id,
            Respawnable::NonPlayer(npc) => npc.id(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledRespawn {
    pub id: u64,
    pub due: Duration,
    pub room: RoomId,
    pub x: i32,
    pub y: i32,
    pub entity: Respawnable,
}

/// Simulation time plus one-shot respawn events. Time only moves when the
/// owner calls `advance`, so tests drive it tick by tick.
#[derive(Debug)]
pub struct GameClock {
    now: Duration,
    tick_length: Duration,
    ticks: u64,
    next_event: u64,
    pending: Vec<ScheduledRespawn>,
}

impl GameClock {
    pub fn new(tick_length: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            tick_length,
            ticks: 0,
            next_event: 0,
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick_length(&self) -> Duration {
        self.tick_length
    }

    pub fn advance(&mut self) {
        self.now += self.tick_length;
        self.ticks += 1;
    }

    /// Takes ownership of `entity` until `delay` has elapsed.
    pub fn schedule(
        &mut self,
        entity: Respawnable,
        room: RoomId,
        x: i32,
        y: i32,
        delay: Duration,
    ) -> u64 {
        let id = self.next_event;
        self.next_event += 1;
        self.pending.push(ScheduledRespawn {
            id,
            due: self.now + delay,
            room,
            x,
            y,
            entity,
        });
        id
    }

    pub fn cancel(&mut self, event: u64) -> Option<ScheduledRespawn> {
        let index = self.pending.iter().position(|e| e.id == event)?;
        Some(self.pending.remove(index))
    }

    /// Cancels whatever respawn is pending for `entity`.
    pub fn cancel_for(&mut self, entity: EntityId) -> Option<ScheduledRespawn> {
        let index = self.pending.iter().position(|e| e.entity.id() == entity)?;
        Some(self.pending.remove(index))
    }

    /// Drops every pending player respawn. Returns how many were dropped.
    pub fn cancel_players(&mut self) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|e| !matches!(e.entity, Respawnable::Player(_)));
        before - self.pending.len()
    }

    pub fn is_scheduled(&self, entity: EntityId) -> bool {
        self.pending.iter().any(|e| e.entity.id() == entity)
    }

    pub fn pending(&self) -> &[ScheduledRespawn] {
        &self.pending
    }

    /// Removes and returns every event that is due, earliest first.
    pub fn drain_due(&mut self) -> Vec<ScheduledRespawn> {
        let now = self.now;
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|e| e.due <= now);
        self.pending = waiting;
        due.sort_by_key(|e| (e.due, e.id));
        due
    }
}
