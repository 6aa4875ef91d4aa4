// Dense voxel world with a world-space offset.
//
// Backing store for the headless agent: a flat `Vec<Idm>` covering a
// rectangular region anchored at `min` (so worlds can live at realistic
// coordinates like y = 64 without index gymnastics). Out-of-bounds reads
// return air; out-of-bounds writes are no-ops.
//
// `read_region` extracts an inclusive bounding box as a (y, z, x)-indexed
// `BlockGrid` — the shape every task computes its diff over.
//
// See also: `grid.rs` for `BlockGrid`, `blockbot_tasks::sim_agent` for the
// agent that owns one of these.
//
// **Critical constraint: determinism.** All mutation goes through
// deterministic task logic; there is no concurrent access.

use crate::grid::BlockGrid;
use crate::types::{BlockPos, Idm};
use serde::{Deserialize, Serialize};

/// Dense 3D voxel region anchored at a world-space minimum corner.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VoxelWorld {
    voxels: Vec<Idm>,
    min: BlockPos,
    size_x: u32,
    size_y: u32,
    size_z: u32,
}

impl VoxelWorld {
    /// Create a world of the given size anchored at `min`, filled with air.
    pub fn new(min: BlockPos, size_x: u32, size_y: u32, size_z: u32) -> Self {
        let total = size_x as usize * size_y as usize * size_z as usize;
        Self {
            voxels: vec![Idm::AIR; total],
            min,
            size_x,
            size_y,
            size_z,
        }
    }

    pub fn in_bounds(&self, pos: BlockPos) -> bool {
        let (dx, dy, dz) = (pos.x - self.min.x, pos.y - self.min.y, pos.z - self.min.z);
        dx >= 0
            && dy >= 0
            && dz >= 0
            && (dx as u32) < self.size_x
            && (dy as u32) < self.size_y
            && (dz as u32) < self.size_z
    }

    fn index(&self, pos: BlockPos) -> Option<usize> {
        if self.in_bounds(pos) {
            let x = (pos.x - self.min.x) as usize;
            let y = (pos.y - self.min.y) as usize;
            let z = (pos.z - self.min.z) as usize;
            let sx = self.size_x as usize;
            let sz = self.size_z as usize;
            Some(x + z * sx + y * sx * sz)
        } else {
            None
        }
    }

    /// Read a voxel. Returns air for out-of-bounds positions.
    pub fn get(&self, pos: BlockPos) -> Idm {
        self.index(pos).map(|i| self.voxels[i]).unwrap_or(Idm::AIR)
    }

    /// Write a voxel. No-op for out-of-bounds positions.
    pub fn set(&mut self, pos: BlockPos, idm: Idm) {
        if let Some(i) = self.index(pos) {
            self.voxels[i] = idm;
        }
    }

    /// Read the inclusive box [min, max] into a (y, z, x)-indexed grid.
    /// Cells outside the world read as air.
    pub fn read_region(&self, min: BlockPos, max: BlockPos) -> BlockGrid {
        let sy = (max.y - min.y + 1).max(0) as usize;
        let sz = (max.z - min.z + 1).max(0) as usize;
        let sx = (max.x - min.x + 1).max(0) as usize;
        let mut grid = BlockGrid::filled_air(sy, sz, sx);
        for y in 0..sy {
            for z in 0..sz {
                for x in 0..sx {
                    let pos = BlockPos::new(min.x + x as i32, min.y + y as i32, min.z + z as i32);
                    grid.set(y, z, x, self.get(pos));
                }
            }
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_world_set_and_get() {
        let mut world = VoxelWorld::new(BlockPos::new(-8, 60, -8), 16, 16, 16);
        let pos = BlockPos::new(-3, 64, 5);
        world.set(pos, Idm::new(1, 0));
        assert_eq!(world.get(pos), Idm::new(1, 0));
        assert_eq!(world.get(pos.above()), Idm::AIR);
    }

    #[test]
    fn out_of_bounds_read_is_air_write_is_noop() {
        let mut world = VoxelWorld::new(BlockPos::new(0, 0, 0), 4, 4, 4);
        assert_eq!(world.get(BlockPos::new(-1, 0, 0)), Idm::AIR);
        assert_eq!(world.get(BlockPos::new(0, 4, 0)), Idm::AIR);
        world.set(BlockPos::new(100, 0, 0), Idm::new(1, 0)); // must not panic
        assert_eq!(world.get(BlockPos::new(100, 0, 0)), Idm::AIR);
    }

    #[test]
    fn read_region_extracts_inclusive_box() {
        let mut world = VoxelWorld::new(BlockPos::new(0, 60, 0), 8, 8, 8);
        world.set(BlockPos::new(2, 62, 3), Idm::new(5, 0));
        let grid = world.read_region(BlockPos::new(1, 61, 2), BlockPos::new(3, 63, 4));
        assert_eq!(grid.shape(), (3, 3, 3));
        // (y, z, x) relative to the region min.
        assert_eq!(grid.get(1, 1, 1), Idm::new(5, 0));
        assert_eq!(grid.get(0, 0, 0), Idm::AIR);
    }

    #[test]
    fn read_region_clips_to_air_outside_world() {
        let world = VoxelWorld::new(BlockPos::new(0, 0, 0), 2, 2, 2);
        let grid = world.read_region(BlockPos::new(-2, -2, -2), BlockPos::new(3, 3, 3));
        assert_eq!(grid.shape(), (6, 6, 6));
        assert!(grid.all_ids_in(&[0]));
    }
}
