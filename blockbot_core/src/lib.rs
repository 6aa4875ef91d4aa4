// blockbot_core — leaf crate: spatial types and voxel data structures.
//
// This crate has no knowledge of tasks, agents, or memory. It defines the
// vocabulary everything else speaks: block positions, (block-type, variant)
// pairs, the block palette (passability, substitution, interchangeability),
// dense 3D grids, schematic/blocks-list conversions, and the dense
// `VoxelWorld` the headless agent runs on.
//
// Module overview:
// - `types.rs`:     BlockPos, Idm, Direction (the six unit steps), MobKind.
// - `block_data.rs`: palette constants — passable blocks, the build-time
//                    substitution map, ignore set, interchangeable pairs.
// - `grid.rs`:      BlockGrid — dense (y, z, x)-indexed grid of Idm.
// - `schematic.rs`: sparse blocks-list ⇄ dense grid conversions with exact
//                   round-trip fidelity; origin normalization.
// - `world.rs`:     VoxelWorld — dense grid with a world-space offset,
//                   region reads, out-of-bounds reads return Air.
//
// **Critical constraint: determinism.** All types here have a total order
// where they are used as map/set keys, and all conversions iterate in a
// fixed (y, z, x) axis order. No HashMap, no system time, no OS entropy.

pub mod block_data;
pub mod grid;
pub mod schematic;
pub mod types;
pub mod world;

pub use grid::BlockGrid;
pub use types::{BlockPos, Direction, Idm, MobKind};
pub use world::VoxelWorld;
