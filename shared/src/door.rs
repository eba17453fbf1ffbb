use crate::RoomId;
use log::warn;
use std::collections::HashMap;

pub type DoorId = usize;

/// Where a door sits in one of the rooms it joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorSide {
    pub room: RoomId,
    pub col: usize,
    pub row: usize,
}

/// A two-sided connector. The first side is recorded when the first room
/// containing the door code is parsed; the second when another room uses the
/// same code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Door {
    pub id: DoorId,
    pub code: String,
    pub first: DoorSide,
    pub second: Option<DoorSide>,
}

impl Door {
    pub fn is_linked(&self) -> bool {
        self.second.is_some()
    }

    pub fn side_in(&self, room: RoomId) -> Option<DoorSide> {
        if self.first.room == room {
            Some(self.first)
        } else {
            self.second.filter(|side| side.room == room)
        }
    }

    /// The far side as seen from `room`, if the door is linked and touches `room`.
    pub fn other_side(&self, room: RoomId) -> Option<DoorSide> {
        let second = self.second?;
        if self.first.room == room {
            Some(second)
        } else if second.room == room {
            Some(self.first)
        } else {
            None
        }
    }
}

/// All doors of a world, keyed by their parse code.
#[derive(Debug, Default, Clone)]
pub struct DoorRegistry {
    doors: Vec<Door>,
    by_code: HashMap<String, DoorId>,
}

impl DoorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the door for `code`, creating it on first sight and completing
    /// its second side when a different room references the same code.
    pub fn resolve(&mut self, code: &str, room: RoomId, col: usize, row: usize) -> DoorId {
        let side = DoorSide { room, col, row };

        if let Some(&id) = self.by_code.get(code) {
            let door = &mut self.doors[id];
            if door.side_in(room).is_none() {
                if door.second.is_none() {
                    door.second = Some(side);
                } else {
                    warn!(
                        "Door {} already joins rooms {} and {}; ignoring reference from room {}",
                        code,
                        door.first.room,
                        door.second.map(|s| s.room).unwrap_or(door.first.room),
                        room
                    );
                }
            }
            return id;
        }

        let id = self.doors.len();
        self.doors.push(Door {
            id,
            code: code.to_string(),
            first: side,
            second: None,
        });
        self.by_code.insert(code.to_string(), id);
        id
    }

    pub fn get(&self, id: DoorId) -> Option<&Door> {
        self.doors.get(id)
    }

    pub fn by_code(&self, code: &str) -> Option<&Door> {
        self.by_code.get(code).and_then(|&id| self.doors.get(id))
    }

    pub fn len(&self) -> usize {
        self.doors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Door> {
        self.doors.iter()
    }
}
