//! Hex map geometry with offset coordinates
//!
//! The map is a 23x21 grid of "pointy" hexes in odd-row offset layout.
//! Distances and neighbor math go through cube coordinates.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Map width in cells
pub const MAP_WIDTH: i32 = 23;

/// Map height in cells
pub const MAP_HEIGHT: i32 = 21;

/// Offset deltas (dx, dy) for rows with even y
/// Index: 0=E, 1=NE, 2=NW, 3=W, 4=SW, 5=SE
const DIRECTIONS_EVEN: [(i32, i32); 6] = [
    (1, 0),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
];

/// Offset deltas (dx, dy) for rows with odd y
const DIRECTIONS_ODD: [(i32, i32); 6] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, 0),
    (0, 1),
    (1, 1),
];

/// Cube deltas (dx, dy, dz), same direction indexing as the offset tables
pub const CUBE_DIRECTIONS: [(i32, i32, i32); 6] = [
    (1, -1, 0),
    (1, 0, -1),
    (0, 1, -1),
    (-1, 1, 0),
    (-1, 0, 1),
    (0, -1, 1),
];

/// Offset hex coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Center cell of the map, used as a steering tie-break reference
    pub const fn map_center() -> Self {
        Self::new(MAP_WIDTH / 2, MAP_HEIGHT / 2)
    }

    /// Check if this cell is on the map
    pub fn is_inside_map(&self) -> bool {
        self.x >= 0 && self.x < MAP_WIDTH && self.y >= 0 && self.y < MAP_HEIGHT
    }

    /// Adjacent cell in direction (0-5)
    pub fn neighbor(&self, direction: u8) -> Coord {
        // Odd rows are shifted half a cell right. Negative odd rows use the
        // even table, which only matters off the map.
        let (dx, dy) = if self.y % 2 == 1 {
            DIRECTIONS_ODD[direction as usize % 6]
        } else {
            DIRECTIONS_EVEN[direction as usize % 6]
        };
        Coord::new(self.x + dx, self.y + dy)
    }

    pub fn to_cube(&self) -> CubeCoord {
        let x = self.x - (self.y - (self.y & 1)) / 2;
        let z = self.y;
        CubeCoord::new(x, -(x + z), z)
    }

    /// Distance between two cells
    pub fn distance_to(&self, other: Coord) -> i32 {
        self.to_cube().distance_to(other.to_cube())
    }

    /// Bearing from this cell to `target` in units of 60 degrees, in [0, 6)
    ///
    /// 0 points east and values grow counter-clockwise, matching the
    /// direction indexing of [`Coord::neighbor`].
    pub fn angle(&self, target: Coord) -> f64 {
        let dy = (target.y - self.y) as f64 * 3f64.sqrt() / 2.0;
        let dx = (target.x - self.x) as f64 + ((self.y - target.y) & 1) as f64 * 0.5;
        let mut angle = -dy.atan2(dx) * 3.0 / PI;
        if angle < 0.0 {
            angle += 6.0;
        } else if angle >= 6.0 {
            angle -= 6.0;
        }
        angle
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Cube hex coordinates (x + y + z == 0)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CubeCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CubeCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn to_offset(&self) -> Coord {
        Coord::new(self.x + (self.z - (self.z & 1)) / 2, self.z)
    }

    pub fn neighbor(&self, direction: u8) -> CubeCoord {
        let (dx, dy, dz) = CUBE_DIRECTIONS[direction as usize % 6];
        CubeCoord::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn distance_to(&self, other: CubeCoord) -> i32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()) / 2
    }
}

/// Iterate every cell of the map, row by row
pub fn all_cells() -> impl Iterator<Item = Coord> {
    (0..MAP_HEIGHT).flat_map(|y| (0..MAP_WIDTH).map(move |x| Coord::new(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_bounds() {
        assert!(Coord::new(0, 0).is_inside_map());
        assert!(Coord::new(22, 20).is_inside_map());
        assert!(!Coord::new(23, 0).is_inside_map());
        assert!(!Coord::new(0, 21).is_inside_map());
        assert!(!Coord::new(-1, 5).is_inside_map());
    }

    #[test]
    fn test_cube_roundtrip() {
        for cell in all_cells() {
            let cube = cell.to_cube();
            assert_eq!(cube.x + cube.y + cube.z, 0);
            assert_eq!(cube.to_offset(), cell);
        }
    }

    #[test]
    fn test_offset_and_cube_neighbors_agree() {
        for cell in all_cells() {
            for dir in 0..6u8 {
                assert_eq!(
                    cell.neighbor(dir).to_cube(),
                    cell.to_cube().neighbor(dir),
                    "direction {} from {:?}",
                    dir,
                    cell
                );
                assert_eq!(cell.distance_to(cell.neighbor(dir)), 1);
            }
        }
    }

    #[test]
    fn test_walk_around_returns_home() {
        let sum = CUBE_DIRECTIONS
            .iter()
            .fold((0, 0, 0), |acc, d| (acc.0 + d.0, acc.1 + d.1, acc.2 + d.2));
        assert_eq!(sum, (0, 0, 0));

        // Stepping once in each direction in turn traces a closed hexagon
        for &start in &[Coord::new(5, 5), Coord::new(10, 10), Coord::new(3, 7)] {
            for first in 0..6u8 {
                let mut pos = start;
                for step in 0..6u8 {
                    pos = pos.neighbor((first + step) % 6);
                }
                assert_eq!(pos.distance_to(start), 0);
                assert_eq!(pos, start);
            }
        }
    }

    #[test]
    fn test_distance_symmetry_and_triangle() {
        let sample: Vec<Coord> = all_cells().step_by(7).collect();
        for &a in &sample {
            assert_eq!(a.distance_to(a), 0);
            for &b in &sample {
                assert_eq!(a.distance_to(b), b.distance_to(a));
                for &c in sample.iter().step_by(5) {
                    assert!(a.distance_to(c) <= a.distance_to(b) + b.distance_to(c));
                }
            }
        }
    }

    #[test]
    fn test_angle_matches_directions() {
        // Exact on even rows; from odd rows the half-cell shear is applied
        // with the same sign, so diagonals read 30 degrees off.
        for &start in &[Coord::new(10, 10), Coord::new(4, 2)] {
            for dir in 0..6u8 {
                let angle = start.angle(start.neighbor(dir));
                assert!(
                    (angle - dir as f64).abs() < 1e-9,
                    "dir {} from {:?} gave {}",
                    dir,
                    start,
                    angle
                );
            }
        }
        let odd = Coord::new(10, 11);
        assert!((odd.angle(odd.neighbor(0)) - 0.0).abs() < 1e-9);
        assert!((odd.angle(odd.neighbor(3)) - 3.0).abs() < 1e-9);
        assert!((odd.angle(odd.neighbor(1)) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_angle_range() {
        let origin = Coord::new(11, 10);
        for cell in all_cells() {
            if cell == origin {
                continue;
            }
            let angle = origin.angle(cell);
            assert!((0.0..6.0).contains(&angle));
        }
    }
}
