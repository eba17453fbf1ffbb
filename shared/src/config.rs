use crate::strategy::WANDER_INTERVAL;
use crate::{FRAME_RATE, RESPAWN_TIME_MS};
use std::time::Duration;

/// Runtime-tunable simulation parameters, injected into a `World`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Logical ticks per second.
    pub tick_rate: u32,
    /// Delay before a dead player reappears where they fell.
    pub respawn_delay: Duration,
    /// Ticks between direction changes of a wandering NPC.
    pub wander_interval: u32,
    /// Seed for the world's random number generator (spread, wandering).
    pub rng_seed: u64,
}

impl GameConfig {
    pub const DEFAULT_RNG_SEED: u64 = 0x5EED_CAFE;

    pub fn new() -> Self {
        Self {
            tick_rate: FRAME_RATE,
            respawn_delay: Duration::from_millis(RESPAWN_TIME_MS),
            wander_interval: WANDER_INTERVAL,
            rng_seed: Self::DEFAULT_RNG_SEED,
        }
    }

    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate.max(1);
        self
    }

    pub fn with_respawn_delay(mut self, respawn_delay: Duration) -> Self {
        self.respawn_delay = respawn_delay;
        self
    }

    pub fn with_seed(mut self, rng_seed: u64) -> Self {
        self.rng_seed = rng_seed;
        self
    }

    /// Length of one simulation tick.
    pub fn tick_length(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.tick_rate.max(1) as u64)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
