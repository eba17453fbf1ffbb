use crate::game::Controller;
use log::{debug, trace};
use shared::{tile_to_pixel, Direction, Item, Room, SpriteKey, Tile, WeaponType};

/// Draw order, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Tile,
    Item,
    Character,
    Projectile,
}

/// One thing to draw, positioned in room pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub key: SpriteKey,
    pub x: i32,
    pub y: i32,
    pub layer: Layer,
}

/// Local player status shown next to the room.
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub health: i32,
    pub points: i32,
    pub weapon: WeaponType,
    pub inventory: Vec<Option<Item>>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub room_name: String,
    pub view: Direction,
    pub sprites: Vec<Sprite>,
    /// None while the local player waits to respawn.
    pub hud: Option<Hud>,
}

impl Scene {
    /// Builds the scene around the local player's room.
    pub fn capture(controller: &Controller) -> Self {
        let world = controller.world();
        let view = controller.view();
        let room = world
            .locate(controller.uid())
            .and_then(|id| world.room(id))
            .or_else(|| world.rooms().first());

        let hud = controller.local_player().map(|player| Hud {
            health: player.health,
            points: player.points,
            weapon: player.weapon.kind(),
            inventory: player.inventory.slots().to_vec(),
        });

        Self {
            room_name: room.map(|r| r.name().to_string()).unwrap_or_default(),
            view,
            sprites: room.map(|r| collect_sprites(r, view)).unwrap_or_default(),
            hud,
        }
    }
}

/// Lists every sprite of `room` as seen from `view`, sorted by layer.
pub fn collect_sprites(room: &Room, view: Direction) -> Vec<Sprite> {
    let mut sprites = Vec::new();

    for (col, row, tile) in room.grid().cells() {
        let (x, y) = (tile_to_pixel(col), tile_to_pixel(row));
        sprites.push(Sprite {
            key: tile.sprite_key(view),
            x,
            y,
            layer: Layer::Tile,
        });
        if let Tile::Floor(Some(item)) = tile {
            sprites.push(Sprite {
                key: item.sprite_key(view),
                x,
                y,
                layer: Layer::Item,
            });
        }
    }

    let bodies = room
        .players()
        .values()
        .chain(room.npcs().values().map(|npc| &npc.body));
    for body in bodies {
        sprites.push(Sprite {
            key: body.sprite_key(view),
            x: body.x,
            y: body.y,
            layer: Layer::Character,
        });
    }

    for projectile in room.projectiles().iter().filter(|p| p.active) {
        sprites.push(Sprite {
            key: projectile.sprite_key(view),
            x: projectile.x.round() as i32,
            y: projectile.y.round() as i32,
            layer: Layer::Projectile,
        });
    }

    sprites.sort_by_key(|sprite| sprite.layer);
    sprites
}

/// Seam between the game loop and whatever puts pixels on screen.
pub trait Renderer {
    fn draw(&mut self, scene: &Scene);

    /// The loop stops once this returns false.
    fn is_open(&self) -> bool {
        true
    }
}

/// Renderer without a window. Counts frames and logs a summary now and then.
#[derive(Debug)]
pub struct HeadlessRenderer {
    frames: u64,
    max_frames: Option<u64>,
    report_every: u64,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            frames: 0,
            max_frames: None,
            report_every: u64::from(shared::FRAME_RATE),
        }
    }

    /// Closes itself after `frames` frames.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HeadlessRenderer {
    fn draw(&mut self, scene: &Scene) {
        self.frames += 1;
        trace!("Frame {}: {} sprites", self.frames, scene.sprites.len());

        if self.frames % self.report_every.max(1) == 0 {
            match &scene.hud {
                Some(hud) => debug!(
                    "{} (view {:?}): health {}, points {}, {}",
                    scene.room_name,
                    scene.view,
                    hud.health,
                    hud.points,
                    hud.weapon.name()
                ),
                None => debug!("{}: waiting to respawn", scene.room_name),
            }
        }
    }

    fn is_open(&self) -> bool {
        self.max_frames.map_or(true, |max| self.frames < max)
    }
}
