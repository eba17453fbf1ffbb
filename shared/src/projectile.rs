use crate::geometry::{Point, Rect};
use crate::{EntityId, SpriteKey, Direction, PROJECTILE_HIT_BOX};

/// A shot in flight. Weapons keep an inactive prototype and stamp out live
/// copies with `new_instance`.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// Character that fired the shot. A handle, not ownership.
    pub owner: EntityId,
    pub x: f64,
    pub y: f64,
    /// Heading in radians; 0 is east and positive angles turn south.
    pub theta: f64,
    /// Pixels travelled per tick.
    pub speed: f64,
    /// Health delta applied on a hit (negative hurts).
    pub damage: i32,
    /// Half-side of the square bounding box.
    pub hit_box: f64,
    pub active: bool,
}

impl Projectile {
    pub fn prototype(speed: f64, damage: i32) -> Self {
        Self {
            owner: 0,
            x: 0.0,
            y: 0.0,
            theta: 0.0,
            speed,
            damage,
            hit_box: PROJECTILE_HIT_BOX,
            active: false,
        }
    }

    /// Copies this projectile's speed, damage and hit box into a live shot.
    pub fn new_instance(&self, owner: EntityId, origin: Point, theta: f64) -> Self {
        Self {
            owner,
            x: origin.x,
            y: origin.y,
            theta,
            active: true,
            ..self.clone()
        }
    }

    pub fn advance(&mut self) {
        self.x += self.theta.cos() * self.speed;
        self.y += self.theta.sin() * self.speed;
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::centered(self.position(), self.hit_box)
    }

    pub fn sprite_key(&self, view: Direction) -> SpriteKey {
        SpriteKey {
            name: "projectile",
            view,
            frame: 0,
        }
    }
}
