//! Fixed-point math utilities for deterministic simulation.
//!
//! All squad AI decisions use fixed-point arithmetic to ensure
//! deterministic behavior across platforms. Floating-point
//! operations can produce different results on different CPUs.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// World units per map cell.
///
/// Positions are expressed in fine-grained world units; coarse tactical
/// queries (scan radii, regroup distances) are expressed in cells.
pub const CELL_WORLD_UNITS: i32 = 1024;

/// Convert a radius in cells to world units.
#[must_use]
pub fn dist_from_cells(cells: i32) -> Fixed {
    Fixed::from_num(cells) * Fixed::from_num(CELL_WORLD_UNITS)
}

/// Square a radius into the scale [`WorldPos::distance_squared`] uses.
#[must_use]
pub fn radius_squared(radius: Fixed) -> i128 {
    let bits = i128::from(radius.to_bits());
    bits * bits
}

/// Fixed-point position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WorldPos {
    /// X coordinate in world units.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate in world units.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl WorldPos {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a position from integer world coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self {
            x: Fixed::from_num(x),
            y: Fixed::from_num(y),
        }
    }

    /// Origin position.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Computed exactly on the raw fixed-point bits in `i128`: squaring
    /// in `Fixed` would saturate beyond ~45 cells of separation and make
    /// every distant candidate compare equal. Compare against values
    /// from [`radius_squared`].
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i128 {
        let dx = i128::from(self.x.to_bits()) - i128::from(other.x.to_bits());
        let dy = i128::from(self.y.to_bits()) - i128::from(other.y.to_bits());
        dx * dx + dy * dy
    }

    /// The cell containing this position.
    #[must_use]
    pub fn to_cell(self) -> CellPos {
        let cell = Fixed::from_num(CELL_WORLD_UNITS);
        CellPos {
            x: (self.x / cell).int().to_num(),
            y: (self.y / cell).int().to_num(),
        }
    }

    /// Average of a set of positions; `ZERO` for an empty set.
    #[must_use]
    pub fn average(positions: &[Self]) -> Self {
        if positions.is_empty() {
            return Self::ZERO;
        }

        let mut sum_x = Fixed::ZERO;
        let mut sum_y = Fixed::ZERO;
        for p in positions {
            sum_x += p.x;
            sum_y += p.y;
        }

        let count = Fixed::from_num(positions.len() as i64);
        Self {
            x: sum_x / count,
            y: sum_y / count,
        }
    }
}

/// Coarse map cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellPos {
    /// Cell column.
    pub x: i32,
    /// Cell row.
    pub y: i32,
}

impl CellPos {
    /// Create a new cell position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World position of this cell's center.
    #[must_use]
    pub fn center(self) -> WorldPos {
        let half = CELL_WORLD_UNITS / 2;
        WorldPos::from_ints(
            self.x * CELL_WORLD_UNITS + half,
            self.y * CELL_WORLD_UNITS + half,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_squared() {
        let a = WorldPos::from_ints(3, 0);
        let b = WorldPos::from_ints(0, 4);
        assert_eq!(a.distance_squared(b), radius_squared(Fixed::from_num(5)));
    }

    #[test]
    fn test_distance_squared_orders_far_positions() {
        // Separations past ~45 cells used to saturate and compare equal.
        let origin = WorldPos::ZERO;
        let near = WorldPos::from_ints(48_000, 0);
        let far = WorldPos::from_ints(50_000, 0);
        assert!(origin.distance_squared(near) < origin.distance_squared(far));
        assert_eq!(
            origin.distance_squared(far),
            radius_squared(Fixed::from_num(50_000))
        );
    }

    #[test]
    fn test_cell_round_trip() {
        let cell = CellPos::new(7, 3);
        assert_eq!(cell.center().to_cell(), cell);
    }

    #[test]
    fn test_average_of_positions() {
        let positions = [WorldPos::from_ints(0, 0), WorldPos::from_ints(10, 20)];
        let mid = WorldPos::average(&positions);
        assert_eq!(mid, WorldPos::from_ints(5, 10));
    }

    #[test]
    fn test_average_empty_is_zero() {
        assert_eq!(WorldPos::average(&[]), WorldPos::ZERO);
    }

    #[test]
    fn test_dist_from_cells() {
        assert_eq!(dist_from_cells(2), Fixed::from_num(2 * CELL_WORLD_UNITS));
    }
}
