use crate::geometry::Point;
use crate::projectile::Projectile;
use crate::{EntityId, BASE_PROJECTILE_SPEED};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Weapon families. The discriminant is the id used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponType {
    Paintball = 0,
    Special = 1,
    Pistol = 2,
    Scatter = 3,
}

impl WeaponType {
    pub fn wire_id(self) -> i32 {
        self as i32
    }

    pub fn from_wire_id(id: i32) -> Option<WeaponType> {
        match id {
            0 => Some(WeaponType::Paintball),
            1 => Some(WeaponType::Special),
            2 => Some(WeaponType::Pistol),
            3 => Some(WeaponType::Scatter),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WeaponType::Paintball => "paintball gun",
            WeaponType::Special => "special gun",
            WeaponType::Pistol => "pistol",
            WeaponType::Scatter => "scatter gun",
        }
    }
}

/// A fire-rate gated projectile factory.
#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    kind: WeaponType,
    /// Ticks between shots.
    fire_delay: u32,
    /// Ticks left until the weapon can fire again.
    cooldown: u32,
    /// Total random spread applied to the main shot, in radians.
    spread: f64,
    /// Upper bound on extra pellets per shot (scatter only).
    max_pellets: u32,
    /// Arc the extra pellets are spread over, in radians.
    pellet_spread: f64,
    prototype: Projectile,
}

impl Weapon {
    pub fn new(kind: WeaponType) -> Self {
        let (fire_delay, spread, max_pellets, pellet_spread, speed, damage) = match kind {
            WeaponType::Paintball => (4, 10f64.to_radians(), 0, 0.0, BASE_PROJECTILE_SPEED, -10),
            WeaponType::Special => (30, 0.0, 0, 0.0, BASE_PROJECTILE_SPEED * 2.0, -35),
            WeaponType::Pistol => (8, 0.0, 0, 0.0, BASE_PROJECTILE_SPEED * 3.0, -61),
            WeaponType::Scatter => (10, 0.0, 5, 30f64.to_radians(), BASE_PROJECTILE_SPEED, -10),
        };

        Self {
            kind,
            fire_delay,
            cooldown: 0,
            spread,
            max_pellets,
            pellet_spread,
            prototype: Projectile::prototype(speed, damage),
        }
    }

    pub fn kind(&self) -> WeaponType {
        self.kind
    }

    pub fn can_fire(&self) -> bool {
        self.cooldown == 0
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Counts one tick off the cooldown.
    pub fn recharge(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    pub fn prototype(&self) -> &Projectile {
        &self.prototype
    }

    /// Fires at `theta` if the weapon is ready. Returns the projectiles
    /// spawned, which is empty while the weapon is cooling down.
    pub fn fire<R: Rng + ?Sized>(
        &mut self,
        owner: EntityId,
        origin: Point,
        theta: f64,
        rng: &mut R,
    ) -> Vec<Projectile> {
        if !self.can_fire() {
            return Vec::new();
        }
        self.cooldown = self.fire_delay;

        let mut shots = vec![self.prototype.new_instance(
            owner,
            origin,
            theta + Self::jitter(self.spread, rng),
        )];

        if self.max_pellets > 0 {
            let pellets = rng.gen_range(1..=self.max_pellets);
            for _ in 0..pellets {
                let angle = theta + Self::jitter(self.pellet_spread, rng);
                shots.push(self.prototype.new_instance(owner, origin, angle));
            }
        }

        shots
    }

    fn jitter<R: Rng + ?Sized>(spread: f64, rng: &mut R) -> f64 {
        if spread <= 0.0 {
            return 0.0;
        }
        rng.gen_range(-spread / 2.0..=spread / 2.0)
    }
}

impl Default for Weapon {
    fn default() -> Self {
        Weapon::new(WeaponType::Paintball)
    }
}
