use crate::character::{Character, PlayerType};
use crate::item::{Item, Tile};
use crate::weapon::WeaponType;
use crate::world::World;
use crate::{EntityId, WorldError, INVENTORY_SIZE};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Serializable snapshot of every room's players and grid contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDocument {
    pub rooms: Vec<RoomRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Room name as listed in the room index.
    pub name: String,
    pub players: Vec<PlayerRecord>,
    pub cells: Vec<CellRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub uid: EntityId,
    pub player_type: PlayerType,
    pub x: i32,
    pub y: i32,
    pub health: i32,
    pub points: i32,
    pub weapon: WeaponType,
    pub inventory: Vec<Option<Item>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub col: usize,
    pub row: usize,
    pub contents: CellContents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellContents {
    Item { item: Item },
    Container { items: Vec<Item> },
}

impl SaveDocument {
    pub fn to_json(&self) -> Result<String, WorldError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, WorldError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), WorldError> {
        fs::write(path, self.to_json()?)?;
        info!("Saved {} rooms to {}", self.rooms.len(), path.display());
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, WorldError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

impl PlayerRecord {
    fn capture(player: &Character) -> Self {
        Self {
            uid: player.id,
            player_type: player.player_type,
            x: player.x,
            y: player.y,
            health: player.health,
            points: player.points,
            weapon: player.weapon.kind(),
            inventory: player.inventory.slots().to_vec(),
        }
    }

    fn rebuild(&self, room: usize) -> Character {
        let mut player = Character::new(self.uid, self.player_type, room, self.x, self.y);
        player.health = self.health;
        player.points = self.points;
        player.equip(self.weapon);
        for (index, item) in self.inventory.iter().take(INVENTORY_SIZE).enumerate() {
            player.inventory.set(index, *item);
        }
        player
    }
}

impl World {
    /// Captures player membership and every item lying in or stored on the grid.
    pub fn snapshot(&self) -> SaveDocument {
        let rooms = self
            .rooms()
            .iter()
            .map(|room| RoomRecord {
                name: room.name().to_string(),
                players: room.players().values().map(PlayerRecord::capture).collect(),
                cells: room
                    .grid()
                    .cells()
                    .filter_map(|(col, row, tile)| {
                        let contents = match tile {
                            Tile::Floor(Some(item)) => CellContents::Item { item: *item },
                            Tile::Chest { contents, .. } => CellContents::Container {
                                items: contents.clone(),
                            },
                            _ => return None,
                        };
                        Some(CellRecord { col, row, contents })
                    })
                    .collect(),
            })
            .collect();

        SaveDocument { rooms }
    }

    /// Replaces player membership and grid contents with the document's.
    /// The document is validated against the loaded rooms before anything
    /// changes.
    pub fn restore(&mut self, document: &SaveDocument) -> Result<(), WorldError> {
        let mut targets = Vec::with_capacity(document.rooms.len());
        let mut uids = HashSet::new();
        for record in &document.rooms {
            let room = self
                .room_by_name(&record.name)
                .ok_or_else(|| WorldError::UnknownRoom(record.name.clone()))?;
            for player in &record.players {
                if !uids.insert(player.uid) {
                    return Err(WorldError::DuplicateCharacter(player.uid));
                }
            }
            let grid = self.rooms()[room].grid();
            for cell in &record.cells {
                let fits = match (&cell.contents, grid.get(cell.col, cell.row)) {
                    (CellContents::Item { .. }, Some(Tile::Floor(_))) => true,
                    (CellContents::Container { .. }, Some(Tile::Chest { .. })) => true,
                    _ => false,
                };
                if !fits {
                    return Err(WorldError::malformed(
                        "save document",
                        0,
                        format!(
                            "cell ({}, {}) of room {} cannot hold {:?}",
                            cell.col, cell.row, record.name, cell.contents
                        ),
                    ));
                }
            }
            targets.push(room);
        }

        let cancelled = self.clock_mut().cancel_players();
        if cancelled > 0 {
            info!("Discarded {} pending player respawns", cancelled);
        }

        for room in self.rooms_mut() {
            let ids: Vec<EntityId> = room.players().keys().copied().collect();
            for id in ids {
                room.remove_player(id);
            }
            for tile in room.grid_mut().cells_mut() {
                match tile {
                    Tile::Floor(item) => *item = None,
                    Tile::Chest { contents, .. } => contents.clear(),
                    _ => {}
                }
            }
        }

        for (record, room) in document.rooms.iter().zip(targets) {
            let target = &mut self.rooms_mut()[room];
            for cell in &record.cells {
                match (&cell.contents, target.grid_mut().get_mut(cell.col, cell.row)) {
                    (CellContents::Item { item }, Some(Tile::Floor(slot))) => *slot = Some(*item),
                    (CellContents::Container { items }, Some(Tile::Chest { contents, .. })) => {
                        *contents = items.clone()
                    }
                    _ => {}
                }
            }
            for player in &record.players {
                target.add_player(player.rebuild(room));
            }
        }

        info!("Restored {} rooms from save document", document.rooms.len());
        Ok(())
    }
}
