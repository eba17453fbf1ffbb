use crate::door::DoorId;
use crate::item::Tile;
use crate::SQUARE_SIZE;

/// Row-major tile grid of a room, addressed by tile index or by pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cols: usize,
    rows: usize,
    cells: Vec<Tile>,
}

impl Grid {
    /// Builds a grid from row-major cells. Missing cells are padded with walls.
    pub fn new(cols: usize, rows: usize, mut cells: Vec<Tile>) -> Self {
        cells.resize(cols * rows, Tile::Wall);
        Self { cols, rows, cells }
    }

    pub fn filled(cols: usize, rows: usize, tile: Tile) -> Self {
        Self::new(cols, rows, vec![tile; cols * rows])
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> f64 {
        (self.cols as i32 * SQUARE_SIZE) as f64
    }

    pub fn height(&self) -> f64 {
        (self.rows as i32 * SQUARE_SIZE) as f64
    }

    pub fn get(&self, col: usize, row: usize) -> Option<&Tile> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }

    pub fn get_mut(&mut self, col: usize, row: usize) -> Option<&mut Tile> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells.get_mut(row * self.cols + col)
    }

    pub fn set(&mut self, col: usize, row: usize, tile: Tile) -> bool {
        match self.get_mut(col, row) {
            Some(cell) => {
                *cell = tile;
                true
            }
            None => false,
        }
    }

    /// Tile column under pixel `x`, clamped into the grid.
    pub fn col_from_x(&self, x: f64) -> usize {
        Self::clamp_index(x, self.cols)
    }

    /// Tile row under pixel `y`, clamped into the grid.
    pub fn row_from_y(&self, y: f64) -> usize {
        Self::clamp_index(y, self.rows)
    }

    fn clamp_index(pixel: f64, count: usize) -> usize {
        let index = (pixel / SQUARE_SIZE as f64).floor();
        if index <= 0.0 {
            0
        } else {
            (index as usize).min(count.saturating_sub(1))
        }
    }

    pub fn in_bounds(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width() && y < self.height()
    }

    /// Tile under a pixel, or `None` outside the room.
    pub fn tile_at(&self, x: f64, y: f64) -> Option<&Tile> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.get(self.col_from_x(x), self.row_from_y(y))
    }

    /// Outside the room counts as not walkable.
    pub fn is_walkable(&self, x: f64, y: f64) -> bool {
        self.tile_at(x, y).map(Tile::can_walk).unwrap_or(false)
    }

    pub fn door_at(&self, x: f64, y: f64) -> Option<DoorId> {
        match self.tile_at(x, y) {
            Some(Tile::Door(id)) => Some(*id),
            _ => None,
        }
    }

    /// Pixel center of a tile.
    pub fn tile_center(col: usize, row: usize) -> (i32, i32) {
        (
            col as i32 * SQUARE_SIZE + SQUARE_SIZE / 2,
            row as i32 * SQUARE_SIZE + SQUARE_SIZE / 2,
        )
    }

    /// Every cell with its column and row, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Tile)> {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, tile)| (i % cols, i / cols, tile))
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.cells.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;

    fn walled(cols: usize, rows: usize) -> Grid {
        let mut grid = Grid::filled(cols, rows, Tile::Floor(None));
        for col in 0..cols {
            grid.set(col, 0, Tile::Wall);
            grid.set(col, rows - 1, Tile::Wall);
        }
        grid
    }

    #[test]
    fn test_pixel_lookup() {
        let mut grid = walled(4, 4);
        grid.set(2, 1, Tile::Floor(Some(Item::Torch)));

        assert_eq!(grid.tile_at(50.0, 30.0), Some(&Tile::Floor(Some(Item::Torch))));
        assert_eq!(grid.tile_at(10.0, 10.0), Some(&Tile::Wall));
        assert!(grid.is_walkable(30.0, 30.0));
        assert!(!grid.is_walkable(30.0, 5.0));
    }

    #[test]
    fn test_outside_is_not_walkable() {
        let grid = Grid::filled(3, 3, Tile::Floor(None));
        assert!(!grid.is_walkable(-1.0, 10.0));
        assert!(!grid.is_walkable(10.0, -0.5));
        assert!(!grid.is_walkable(72.0, 10.0));
        assert!(grid.is_walkable(71.9, 71.9));
        assert_eq!(grid.tile_at(-1.0, 10.0), None);
    }

    #[test]
    fn test_index_clamping() {
        let grid = Grid::filled(3, 2, Tile::Floor(None));
        assert_eq!(grid.col_from_x(-30.0), 0);
        assert_eq!(grid.col_from_x(500.0), 2);
        assert_eq!(grid.row_from_y(25.0), 1);
        assert_eq!(grid.row_from_y(1000.0), 1);
    }

    #[test]
    fn test_short_cell_list_is_padded_with_walls() {
        let grid = Grid::new(2, 2, vec![Tile::Floor(None)]);
        assert_eq!(grid.get(1, 1), Some(&Tile::Wall));
        assert_eq!(grid.cells().count(), 4);
    }

    #[test]
    fn test_tile_center() {
        assert_eq!(Grid::tile_center(0, 0), (12, 12));
        assert_eq!(Grid::tile_center(2, 1), (60, 36));
    }
}
