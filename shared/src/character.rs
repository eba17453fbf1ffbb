use crate::door::DoorId;
use crate::geometry::{Direction, Point, Rect};
use crate::grid::Grid;
use crate::item::{Item, Tile};
use crate::projectile::Projectile;
use crate::weapon::{Weapon, WeaponType};
use crate::{
    EntityId, RoomId, SpriteKey, ANIMATION_FRAMES, CHARACTER_SIZE, HEALTH_MAX, INVENTORY_SIZE,
    MOVE_SPEED,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Which sprite family a character is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerType {
    Dave,
    Pondy,
}

impl PlayerType {
    pub fn sprite_name(self) -> &'static str {
        match self {
            PlayerType::Dave => "dave",
            PlayerType::Pondy => "pondy",
        }
    }
}

/// Fixed-capacity ordered inventory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    slots: [Option<Item>; INVENTORY_SIZE],
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<Item> {
        self.slots.get(index).copied().flatten()
    }

    /// Puts `item` in the first free slot. Returns false when full.
    pub fn add(&mut self, item: Item) -> bool {
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(item);
                true
            }
            None => false,
        }
    }

    pub fn take(&mut self, index: usize) -> Option<Item> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    pub fn set(&mut self, index: usize, item: Option<Item>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = item;
        }
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn slots(&self) -> &[Option<Item>] {
        &self.slots
    }
}

/// Result of a single movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Blocked,
    /// The step would enter a door tile; the caller decides whether to cross.
    EnteredDoor(DoorId),
}

/// State shared by players and non-players.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub id: EntityId,
    pub player_type: PlayerType,
    /// Pixel position of the character's center.
    pub x: i32,
    pub y: i32,
    pub facing: Direction,
    /// Direction the owning client's camera is rotated to.
    pub view_direction: Direction,
    /// Negative means dead.
    pub health: i32,
    pub weapon: Weapon,
    pub inventory: Inventory,
    /// Room the character currently belongs to.
    pub room: RoomId,
    pub speed_multiplier: i32,
    pub points: i32,
    pub anim_frame: u8,
}

impl Character {
    pub fn new(id: EntityId, player_type: PlayerType, room: RoomId, x: i32, y: i32) -> Self {
        Self {
            id,
            player_type,
            x,
            y,
            facing: Direction::South,
            view_direction: Direction::North,
            health: HEALTH_MAX,
            weapon: Weapon::default(),
            inventory: Inventory::new(),
            room,
            speed_multiplier: 1,
            points: 0,
            anim_frame: 0,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::centered(self.position(), CHARACTER_SIZE as f64 / 2.0)
    }

    pub fn is_dead(&self) -> bool {
        self.health < 0
    }

    /// Applies a health delta, capped at `HEALTH_MAX`. Returns true when this
    /// delta is the one that killed the character.
    pub fn modify_health(&mut self, amount: i32) -> bool {
        let was_alive = !self.is_dead();
        self.health = (self.health + amount).min(HEALTH_MAX);
        was_alive && self.is_dead()
    }

    /// Takes one step in `direction`, turning to face it even when blocked.
    /// Stepping within the door tile already stood on is ordinary movement.
    pub fn try_move(&mut self, direction: Direction, grid: &Grid) -> MoveOutcome {
        self.facing = direction;
        self.anim_frame = (self.anim_frame + 1) % ANIMATION_FRAMES;

        let (dx, dy) = direction.offset();
        let step = MOVE_SPEED * self.speed_multiplier;
        let (nx, ny) = (self.x + dx * step, self.y + dy * step);

        match grid.tile_at(nx as f64, ny as f64) {
            Some(Tile::Door(id)) if grid.door_at(self.x as f64, self.y as f64) != Some(*id) => {
                MoveOutcome::EnteredDoor(*id)
            }
            Some(tile) if tile.can_walk() => {
                self.x = nx;
                self.y = ny;
                MoveOutcome::Moved
            }
            _ => MoveOutcome::Blocked,
        }
    }

    pub fn angle_to(&self, x: f64, y: f64) -> f64 {
        self.position().angle_to(&Point::new(x, y))
    }

    /// Fires the current weapon along `theta` from the character's center.
    pub fn shoot<R: Rng + ?Sized>(&mut self, theta: f64, rng: &mut R) -> Vec<Projectile> {
        if self.is_dead() {
            return Vec::new();
        }
        let origin = self.position();
        self.weapon.fire(self.id, origin, theta, rng)
    }

    pub fn shoot_at<R: Rng + ?Sized>(&mut self, x: f64, y: f64, rng: &mut R) -> Vec<Projectile> {
        let theta = self.angle_to(x, y);
        self.shoot(theta, rng)
    }

    pub fn equip(&mut self, kind: WeaponType) {
        self.weapon = Weapon::new(kind);
    }

    pub fn rotate_view_left(&mut self) {
        self.view_direction = self.view_direction.rotate_left();
    }

    pub fn rotate_view_right(&mut self) {
        self.view_direction = self.view_direction.rotate_right();
    }

    pub fn inventory_item(&self, index: usize) -> Option<Item> {
        self.inventory.get(index)
    }

    /// Uses the item in `index`. Pill bottles heal to full and are consumed;
    /// weapons are swapped with the one in hand. Returns false if nothing happened.
    pub fn use_item(&mut self, index: usize) -> bool {
        match self.inventory.get(index) {
            Some(Item::PillBottle) => {
                self.inventory.take(index);
                self.modify_health(HEALTH_MAX);
                true
            }
            Some(Item::Weapon(kind)) => {
                let previous = self.weapon.kind();
                self.equip(kind);
                self.inventory.set(index, Some(Item::Weapon(previous)));
                true
            }
            Some(Item::KeyCard) | Some(Item::Torch) | None => false,
        }
    }

    /// Drops the item in `index` onto the empty floor tile underfoot.
    pub fn drop_item(&mut self, index: usize, grid: &mut Grid) -> bool {
        let (col, row) = self.tile(grid);
        match (self.inventory.get(index), grid.get_mut(col, row)) {
            (Some(item), Some(cell @ Tile::Floor(None))) => {
                *cell = Tile::Floor(Some(item));
                self.inventory.take(index);
                true
            }
            _ => false,
        }
    }

    /// Picks up the item underfoot, or failing that empties the chest or floor
    /// tile directly ahead into free inventory slots. Returns the number of
    /// items collected.
    pub fn interact(&mut self, grid: &mut Grid) -> usize {
        let (col, row) = self.tile(grid);
        let collected = self.collect_from(grid, col, row);
        if collected > 0 {
            return collected;
        }

        let (dx, dy) = self.facing.offset();
        let (ahead_col, ahead_row) = (col as i64 + dx as i64, row as i64 + dy as i64);
        if ahead_col < 0 || ahead_row < 0 {
            return 0;
        }
        self.collect_from(grid, ahead_col as usize, ahead_row as usize)
    }

    fn collect_from(&mut self, grid: &mut Grid, col: usize, row: usize) -> usize {
        match grid.get_mut(col, row) {
            Some(Tile::Floor(slot)) => match *slot {
                Some(item) if self.inventory.add(item) => {
                    *slot = None;
                    1
                }
                _ => 0,
            },
            Some(Tile::Chest { contents, .. }) => {
                let mut collected = 0;
                while let Some(&item) = contents.first() {
                    if !self.inventory.add(item) {
                        break;
                    }
                    contents.remove(0);
                    collected += 1;
                }
                collected
            }
            _ => 0,
        }
    }

    fn tile(&self, grid: &Grid) -> (usize, usize) {
        (grid.col_from_x(self.x as f64), grid.row_from_y(self.y as f64))
    }

    /// Sprite for this character as seen from a camera rotated to `view`.
    pub fn sprite_key(&self, view: Direction) -> SpriteKey {
        SpriteKey {
            name: self.player_type.sprite_name(),
            view: self.facing.seen_from(view),
            frame: self.anim_frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn open_grid() -> Grid {
        let mut grid = Grid::filled(6, 6, Tile::Floor(None));
        for i in 0..6 {
            grid.set(i, 0, Tile::Wall);
            grid.set(i, 5, Tile::Wall);
            grid.set(0, i, Tile::Wall);
            grid.set(5, i, Tile::Wall);
        }
        grid
    }

    #[test]
    fn test_inventory_slots() {
        let mut inventory = Inventory::new();
        assert!(inventory.add(Item::Torch));
        assert!(inventory.add(Item::KeyCard));
        assert!(inventory.add(Item::PillBottle));
        assert!(inventory.is_full());
        assert!(!inventory.add(Item::Torch));

        assert_eq!(inventory.take(1), Some(Item::KeyCard));
        assert!(inventory.add(Item::Weapon(WeaponType::Pistol)));
        assert_eq!(inventory.get(1), Some(Item::Weapon(WeaponType::Pistol)));
        assert_eq!(inventory.get(7), None);
    }

    #[test]
    fn test_modify_health_reports_the_killing_blow() {
        let mut character = Character::new(1, PlayerType::Dave, 0, 36, 36);
        assert!(!character.modify_health(-100));
        assert_eq!(character.health, 0);
        assert!(!character.is_dead());

        assert!(character.modify_health(-1));
        assert!(character.is_dead());
        assert!(!character.modify_health(-1));
    }

    #[test]
    fn test_health_is_capped() {
        let mut character = Character::new(1, PlayerType::Dave, 0, 36, 36);
        character.modify_health(50);
        assert_eq!(character.health, HEALTH_MAX);
    }

    #[test]
    fn test_move_is_blocked_by_walls() {
        let grid = open_grid();
        let mut character = Character::new(1, PlayerType::Pondy, 0, 36, 26);

        assert_eq!(character.try_move(Direction::North, &grid), MoveOutcome::Moved);
        assert_eq!(character.y, 24);
        assert_eq!(character.try_move(Direction::North, &grid), MoveOutcome::Blocked);
        assert_eq!(character.y, 24);
        assert_eq!(character.facing, Direction::North);
    }

    #[test]
    fn test_entering_a_door_tile_is_reported_once() {
        let mut grid = open_grid();
        grid.set(2, 2, Tile::Door(4));
        let mut character = Character::new(1, PlayerType::Dave, 0, 47, 60);

        assert_eq!(character.try_move(Direction::East, &grid), MoveOutcome::EnteredDoor(4));
        assert_eq!(character.x, 47);

        // Standing on the door, moving within it is plain movement.
        character.x = 50;
        assert_eq!(character.try_move(Direction::East, &grid), MoveOutcome::Moved);
    }

    #[test]
    fn test_pill_bottle_is_consumed() {
        let mut character = Character::new(1, PlayerType::Dave, 0, 36, 36);
        character.inventory.add(Item::PillBottle);
        character.modify_health(-60);

        assert!(character.use_item(0));
        assert_eq!(character.health, HEALTH_MAX);
        assert_eq!(character.inventory_item(0), None);
        assert!(!character.use_item(0));
    }

    #[test]
    fn test_weapon_item_is_swapped_into_hand() {
        let mut character = Character::new(1, PlayerType::Dave, 0, 36, 36);
        character.inventory.add(Item::Weapon(WeaponType::Scatter));

        assert!(character.use_item(0));
        assert_eq!(character.weapon.kind(), WeaponType::Scatter);
        assert_eq!(character.inventory_item(0), Some(Item::Weapon(WeaponType::Paintball)));
    }

    #[test]
    fn test_drop_and_pick_up() {
        let mut grid = open_grid();
        let mut character = Character::new(1, PlayerType::Dave, 0, 36, 36);
        character.inventory.add(Item::Torch);

        assert!(character.drop_item(0, &mut grid));
        assert_eq!(grid.get(1, 1), Some(&Tile::Floor(Some(Item::Torch))));
        assert!(!character.drop_item(0, &mut grid));

        assert_eq!(character.interact(&mut grid), 1);
        assert_eq!(character.inventory_item(0), Some(Item::Torch));
        assert_eq!(grid.get(1, 1), Some(&Tile::Floor(None)));
    }

    #[test]
    fn test_chest_ahead_is_emptied_into_free_slots() {
        let mut grid = open_grid();
        grid.set(
            2,
            1,
            Tile::Chest {
                facing: crate::item::Facing::Front,
                contents: vec![Item::KeyCard, Item::Torch, Item::PillBottle, Item::KeyCard],
            },
        );
        let mut character = Character::new(1, PlayerType::Dave, 0, 36, 36);
        character.facing = Direction::East;

        assert_eq!(character.interact(&mut grid), 3);
        assert!(character.inventory.is_full());
        match grid.get(2, 1) {
            Some(Tile::Chest { contents, .. }) => assert_eq!(contents, &vec![Item::KeyCard]),
            other => panic!("expected chest, got {:?}", other),
        }
    }

    #[test]
    fn test_dead_characters_cannot_shoot() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut character = Character::new(1, PlayerType::Dave, 0, 36, 36);
        character.health = -1;
        assert!(character.shoot(0.0, &mut rng).is_empty());
    }

    #[test]
    fn test_sprite_key_is_relative_to_view() {
        let mut character = Character::new(1, PlayerType::Pondy, 0, 36, 36);
        character.facing = Direction::East;
        let key = character.sprite_key(Direction::East);
        assert_eq!(key.name, "pondy");
        assert_eq!(key.view, Direction::North);
    }
}
