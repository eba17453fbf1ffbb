use serde::{Deserialize, Serialize};

/// One of the four cardinal directions. The discriminant is the wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn index(self) -> i32 {
        self as i32
    }

    /// Maps a wire value back to a direction; anything outside 0..=3 is rejected.
    pub fn from_index(index: i32) -> Option<Direction> {
        match index {
            0 => Some(Direction::North),
            1 => Some(Direction::East),
            2 => Some(Direction::South),
            3 => Some(Direction::West),
            _ => None,
        }
    }

    fn wrapping(index: i32) -> Direction {
        Self::ALL[index.rem_euclid(4) as usize]
    }

    /// Pixel step for one unit of movement in screen space (y grows south).
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn rotate_left(self) -> Direction {
        Self::wrapping(self.index() - 1)
    }

    pub fn rotate_right(self) -> Direction {
        Self::wrapping(self.index() + 1)
    }

    /// Interprets `self`, given relative to a rotated view, as a world direction.
    pub fn relative_to(self, view: Direction) -> Direction {
        Self::wrapping(self.index() + view.index())
    }

    /// The inverse of `relative_to`: how a world direction looks from `view`.
    pub fn seen_from(self, view: Direction) -> Direction {
        Self::wrapping(self.index() - view.index())
    }

    /// Axis-dominance facing rule: the larger of |dx| and |dy| wins, ties go
    /// to the vertical axis.
    pub fn facing_towards(from: Point, to: Point) -> Direction {
        let dx = to.x - from.x;
        let dy = to.y - from.y;

        if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Direction::East
            } else {
                Direction::West
            }
        } else if dy > 0.0 {
            Direction::South
        } else {
            Direction::North
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Angle in radians from `self` to `other`; 0 points east, positive turns south.
    pub fn angle_to(&self, other: &Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }
}

/// Axis-aligned bounding box anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A square of side `2 * half_extent` centered on `center`.
    pub fn centered(center: Point, half_extent: f64) -> Self {
        Self::new(
            center.x - half_extent,
            center.y - half_extent,
            half_extent * 2.0,
            half_extent * 2.0,
        )
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when `other` lies entirely inside `self` (edges may touch).
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// True when the interiors overlap; boxes that only share an edge do not.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_facing_prefers_dominant_axis() {
        let origin = Point::new(0.0, 0.0);
        assert_eq!(Direction::facing_towards(origin, Point::new(10.0, 3.0)), Direction::East);
        assert_eq!(Direction::facing_towards(origin, Point::new(-10.0, 3.0)), Direction::West);
        assert_eq!(Direction::facing_towards(origin, Point::new(2.0, 9.0)), Direction::South);
        assert_eq!(Direction::facing_towards(origin, Point::new(2.0, -9.0)), Direction::North);
    }

    #[test]
    fn test_facing_ties_go_vertical() {
        let origin = Point::new(0.0, 0.0);
        assert_eq!(Direction::facing_towards(origin, Point::new(5.0, 5.0)), Direction::South);
        assert_eq!(Direction::facing_towards(origin, Point::new(5.0, -5.0)), Direction::North);
    }

    #[test]
    fn test_rotation_wraps() {
        assert_eq!(Direction::North.rotate_left(), Direction::West);
        assert_eq!(Direction::West.rotate_right(), Direction::North);
        assert_eq!(Direction::North.relative_to(Direction::East), Direction::East);
        assert_eq!(Direction::West.relative_to(Direction::South), Direction::East);
        assert_eq!(Direction::East.seen_from(Direction::East), Direction::North);
    }

    #[test]
    fn test_wire_values() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_index(direction.index()), Some(direction));
        }
        assert_eq!(Direction::from_index(4), None);
        assert_eq!(Direction::from_index(-1), None);
    }

    #[test]
    fn test_distance_and_angle() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_approx_eq!(a.distance(&b), 5.0);
        assert_approx_eq!(a.angle_to(&Point::new(0.0, 10.0)), std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn test_containment_and_overlap() {
        let outer = Rect::centered(Point::new(48.0, 24.0), 8.0);
        let inside = Rect::centered(Point::new(44.0, 24.0), 2.0);
        let straddling = Rect::centered(Point::new(40.0, 24.0), 2.0);

        assert!(outer.contains(&inside));
        assert!(!outer.contains(&straddling));
        assert!(outer.intersects(&straddling));

        let touching = Rect::new(56.0, 16.0, 4.0, 4.0);
        assert!(!outer.intersects(&touching));
    }
}
