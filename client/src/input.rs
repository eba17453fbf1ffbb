//! Buffered player input
//!
//! Window events arrive whenever the platform delivers them; the game loop
//! reads them once per tick. Held keys are sampled, while one-shot commands
//! (view rotation, item use and drop, interaction) fire when their key is
//! released and queue until the next frame takes them.

use shared::Direction;
use std::collections::HashSet;

/// Logical keys the controller understands. Platform key codes are mapped
/// onto these by whatever owns the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Sprint,
    RotateLeft,
    RotateRight,
    /// Inventory slot hotkey, zero-based.
    Slot(usize),
    Interact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    RotateLeft,
    RotateRight,
    UseItem(usize),
    DropItem(usize),
    Interact,
}

/// Everything the controller needs from one tick of input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Held movement keys in screen space, in the order they are applied.
    pub moves: Vec<Direction>,
    pub sprint: bool,
    /// Where the primary button is held, in room pixels.
    pub aim: Option<(f64, f64)>,
    pub commands: Vec<Command>,
}

/// Collects input events between ticks
#[derive(Debug, Default)]
pub struct InputManager {
    held: HashSet<Key>,
    aim: Option<(f64, f64)>,
    pending: Vec<Command>,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);

        let command = match key {
            Key::RotateLeft => Command::RotateLeft,
            Key::RotateRight => Command::RotateRight,
            Key::Slot(index) => Command::UseItem(index),
            Key::Interact => Command::Interact,
            _ => return,
        };
        self.pending.push(command);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Primary button pressed or dragged at `(x, y)`.
    pub fn aim_at(&mut self, x: f64, y: f64) {
        self.aim = Some((x, y));
    }

    pub fn release_aim(&mut self) {
        self.aim = None;
    }

    /// Secondary click on an inventory slot.
    pub fn drop_slot(&mut self, index: usize) {
        self.pending.push(Command::DropItem(index));
    }

    /// Samples held state and drains queued commands.
    pub fn take_frame(&mut self) -> FrameInput {
        let mut moves = Vec::new();
        for (key, direction) in [
            (Key::Right, Direction::East),
            (Key::Left, Direction::West),
            (Key::Up, Direction::North),
            (Key::Down, Direction::South),
        ] {
            if self.held.contains(&key) {
                moves.push(direction);
            }
        }

        FrameInput {
            moves,
            sprint: self.held.contains(&Key::Sprint),
            aim: self.aim,
            commands: std::mem::take(&mut self.pending),
        }
    }
}
