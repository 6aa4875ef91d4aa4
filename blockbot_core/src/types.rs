// Core spatial and material types.
//
// Defines `BlockPos` (a voxel coordinate), `Idm` (a block-type/variant
// pair), `Direction` (the six axis-aligned unit steps an agent can take),
// and `MobKind` (spawnable entity kinds). All types derive `Serialize` and
// `Deserialize` so task state can be persisted and resumed.
//
// The coordinate system is the usual voxel convention:
// - X: east (positive) / west (negative)
// - Y: up (positive) / down (negative)
// - Z: south (positive) / north (negative)
//
// **Critical constraint: determinism.** `BlockPos` and `Idm` carry a total
// order so they can key `BTreeMap`/`BTreeSet` with deterministic iteration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the 3D voxel world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Manhattan distance between two positions.
    pub fn manhattan_distance(self, other: Self) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }

    /// Component-wise offset.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The cell directly above (the agent's head cell when standing here).
    pub fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Component-wise minimum of two positions.
    pub fn min_corner(self, other: Self) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A (block-type, variant) pair — identifies a material and its
/// sub-variant/orientation. `meta` carries orientation for stairs, mob kind
/// for spawn eggs, and so on.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Idm {
    pub id: u16,
    pub meta: u8,
}

impl Idm {
    pub const AIR: Idm = Idm::new(0, 0);

    pub const fn new(id: u16, meta: u8) -> Self {
        Self { id, meta }
    }

    pub fn is_air(self) -> bool {
        self.id == 0
    }
}

impl fmt::Display for Idm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.id, self.meta)
    }
}

/// The six axis-aligned unit directions. Each variant maps to exactly one
/// movement primitive on the agent (`Agent::step`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Direction {
    /// All six directions, in the fixed order used when scanning for a
    /// fallback step (±x, ±y, ±z).
    pub const ALL: [Direction; 6] = [
        Direction::PosX,
        Direction::NegX,
        Direction::PosY,
        Direction::NegY,
        Direction::PosZ,
        Direction::NegZ,
    ];

    /// The unit displacement vector for this direction.
    pub const fn unit(self) -> (i32, i32, i32) {
        match self {
            Direction::PosX => (1, 0, 0),
            Direction::NegX => (-1, 0, 0),
            Direction::PosY => (0, 1, 0),
            Direction::NegY => (0, -1, 0),
            Direction::PosZ => (0, 0, 1),
            Direction::NegZ => (0, 0, -1),
        }
    }

    /// Map a unit displacement back to its direction. Returns `None` for
    /// anything that is not one of the six axis-aligned unit vectors.
    pub fn from_delta(dx: i32, dy: i32, dz: i32) -> Option<Direction> {
        match (dx, dy, dz) {
            (1, 0, 0) => Some(Direction::PosX),
            (-1, 0, 0) => Some(Direction::NegX),
            (0, 1, 0) => Some(Direction::PosY),
            (0, -1, 0) => Some(Direction::NegY),
            (0, 0, 1) => Some(Direction::PosZ),
            (0, 0, -1) => Some(Direction::NegZ),
            _ => None,
        }
    }

    /// Apply this direction's unit vector to a position.
    pub fn step_from(self, pos: BlockPos) -> BlockPos {
        let (dx, dy, dz) = self.unit();
        pos.offset(dx, dy, dz)
    }
}

/// Kinds of mobs a spawn egg can produce. The egg's `meta` selects the kind
/// (see `block_data::mob_kind_for_meta`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MobKind {
    Chicken,
    Cow,
    Pig,
    Sheep,
    Rabbit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_is_symmetric() {
        let a = BlockPos::new(0, 64, 0);
        let b = BlockPos::new(3, 60, 5);
        assert_eq!(a.manhattan_distance(b), 12);
        assert_eq!(b.manhattan_distance(a), 12);
    }

    #[test]
    fn direction_roundtrip_through_delta() {
        for dir in Direction::ALL {
            let (dx, dy, dz) = dir.unit();
            assert_eq!(Direction::from_delta(dx, dy, dz), Some(dir));
        }
        assert_eq!(Direction::from_delta(1, 1, 0), None);
        assert_eq!(Direction::from_delta(0, 0, 0), None);
        assert_eq!(Direction::from_delta(2, 0, 0), None);
    }

    #[test]
    fn step_from_applies_unit_vector() {
        let p = BlockPos::new(5, 64, -2);
        assert_eq!(Direction::PosY.step_from(p), BlockPos::new(5, 65, -2));
        assert_eq!(Direction::NegZ.step_from(p), BlockPos::new(5, 64, -3));
    }

    #[test]
    fn default_position_is_the_origin() {
        assert_eq!(BlockPos::default(), BlockPos::new(0, 0, 0));
    }

    #[test]
    fn block_pos_has_total_order() {
        // Needed for BTreeSet keys (replace sets, remaining-cell sets).
        let a = BlockPos::new(0, 0, 0);
        let b = BlockPos::new(0, 0, 1);
        assert!(a < b);
    }

    #[test]
    fn idm_air_check() {
        assert!(Idm::AIR.is_air());
        assert!(Idm::new(0, 3).is_air());
        assert!(!Idm::new(1, 0).is_air());
    }

    #[test]
    fn serialization_roundtrip() {
        let p = BlockPos::new(-4, 70, 12);
        let json = serde_json::to_string(&p).unwrap();
        let restored: BlockPos = serde_json::from_str(&json).unwrap();
        assert_eq!(p, restored);

        let idm = Idm::new(383, 93);
        let bytes = bincode::serialize(&idm).unwrap();
        let restored: Idm = bincode::deserialize(&bytes).unwrap();
        assert_eq!(idm, restored);
    }
}
