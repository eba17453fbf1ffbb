use crate::door::DoorId;
use crate::geometry::Direction;
use crate::weapon::WeaponType;
use crate::SpriteKey;
use serde::{Deserialize, Serialize};

/// Portable items. They sit on floor tiles, in chests or in inventories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    KeyCard,
    Torch,
    PillBottle,
    Weapon(WeaponType),
}

impl Item {
    pub fn name(&self) -> &'static str {
        match self {
            Item::KeyCard => "key card",
            Item::Torch => "torch",
            Item::PillBottle => "pill bottle",
            Item::Weapon(kind) => kind.name(),
        }
    }

    pub fn sprite_key(&self, view: Direction) -> SpriteKey {
        let name = match self {
            Item::KeyCard => "keycard",
            Item::Torch => "torch",
            Item::PillBottle => "pillbottle",
            Item::Weapon(kind) => kind.name(),
        };
        SpriteKey {
            name,
            view,
            frame: 0,
        }
    }
}

/// Orientation of a furniture piece as written in room files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Front,
    Back,
    Left,
    Right,
}

impl Facing {
    pub fn from_code(code: char) -> Option<Facing> {
        match code {
            'F' => Some(Facing::Front),
            'B' => Some(Facing::Back),
            'L' => Some(Facing::Left),
            'R' => Some(Facing::Right),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Facing::Front => 'F',
            Facing::Back => 'B',
            Facing::Left => 'L',
            Facing::Right => 'R',
        }
    }

    /// World direction the furniture faces; the front looks south at an unrotated view.
    pub fn direction(self) -> Direction {
        match self {
            Facing::Front => Direction::South,
            Facing::Back => Direction::North,
            Facing::Left => Direction::West,
            Facing::Right => Direction::East,
        }
    }
}

/// One grid cell. Only floors and doors can be walked on.
#[derive(Debug, Clone, PartialEq)]
pub enum Tile {
    Floor(Option<Item>),
    Wall,
    Pillar,
    Desk { horizontal: bool },
    Photocopier(Facing),
    Chest { facing: Facing, contents: Vec<Item> },
    Door(DoorId),
}

impl Tile {
    /// Looks up an alphabetic two-character room file code. Door codes are
    /// numeric and resolved by the room parser, not here.
    pub fn from_code(code: &str) -> Option<Tile> {
        let tile = match code {
            "__" => Tile::Floor(None),
            "_k" => Tile::Floor(Some(Item::KeyCard)),
            "_t" => Tile::Floor(Some(Item::Torch)),
            "_p" => Tile::Floor(Some(Item::PillBottle)),
            "##" => Tile::Wall,
            "PP" => Tile::Pillar,
            "Dh" => Tile::Desk { horizontal: true },
            "Dv" => Tile::Desk { horizontal: false },
            _ => {
                let mut chars = code.chars();
                let (kind, facing) = (chars.next()?, chars.next().and_then(Facing::from_code)?);
                match kind {
                    'P' => Tile::Photocopier(facing),
                    'c' => Tile::Chest {
                        facing,
                        contents: Vec::new(),
                    },
                    _ => return None,
                }
            }
        };
        Some(tile)
    }

    pub fn can_walk(&self) -> bool {
        matches!(self, Tile::Floor(_) | Tile::Door(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Tile::Chest { .. })
    }

    /// The item lying on a floor tile, if any.
    pub fn floor_item(&self) -> Option<Item> {
        match self {
            Tile::Floor(item) => *item,
            _ => None,
        }
    }

    pub fn sprite_key(&self, view: Direction) -> SpriteKey {
        let (name, facing) = match self {
            Tile::Floor(_) => ("floor", None),
            Tile::Wall => ("wall", None),
            Tile::Pillar => ("pillar", None),
            Tile::Desk { horizontal: true } => ("desk_h", None),
            Tile::Desk { horizontal: false } => ("desk_v", None),
            Tile::Photocopier(facing) => ("photocopier", Some(*facing)),
            Tile::Chest { facing, .. } => ("chest", Some(*facing)),
            Tile::Door(_) => ("door", None),
        };
        SpriteKey {
            name,
            view: facing
                .map(|f| f.direction().seen_from(view))
                .unwrap_or(view),
            frame: 0,
        }
    }
}
