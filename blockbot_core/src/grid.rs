// BlockGrid — dense 3D grid of Idm values, indexed (y, z, x).
//
// This is the in-memory shape shared by schematics, region reads, and the
// Build task's per-cell bookkeeping (the attempts grid mirrors this shape).
// The (y, z, x) axis order is a fixed convention; `schematic.rs` depends on
// it for exact round-trip fidelity between sparse blocks-lists and grids.
//
// Storage is a flat `Vec<Idm>` with index = x + z * sx + (y * sz) * sx.
//
// **Critical constraint: determinism.** `cells()` iterates y-major, then z,
// then x — every consumer that turns a grid into a list relies on that
// fixed order.

use crate::types::Idm;
use serde::{Deserialize, Serialize};

/// Dense (y, z, x)-indexed grid of block values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockGrid {
    data: Vec<Idm>,
    size_y: usize,
    size_z: usize,
    size_x: usize,
}

impl BlockGrid {
    /// Create a grid of the given shape filled with air.
    pub fn filled_air(size_y: usize, size_z: usize, size_x: usize) -> Self {
        Self {
            data: vec![Idm::AIR; size_y * size_z * size_x],
            size_y,
            size_z,
            size_x,
        }
    }

    /// Grid shape as (size_y, size_z, size_x).
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.size_y, self.size_z, self.size_x)
    }

    pub fn cell_count(&self) -> usize {
        self.data.len()
    }

    fn index(&self, y: usize, z: usize, x: usize) -> Option<usize> {
        if y < self.size_y && z < self.size_z && x < self.size_x {
            Some(x + z * self.size_x + y * self.size_z * self.size_x)
        } else {
            None
        }
    }

    /// Read a cell. Returns air for out-of-range indices.
    pub fn get(&self, y: usize, z: usize, x: usize) -> Idm {
        self.index(y, z, x)
            .map(|i| self.data[i])
            .unwrap_or(Idm::AIR)
    }

    /// Write a cell. No-op for out-of-range indices.
    pub fn set(&mut self, y: usize, z: usize, x: usize, idm: Idm) {
        if let Some(i) = self.index(y, z, x) {
            self.data[i] = idm;
        }
    }

    /// Iterate every cell in fixed (y, z, x) order.
    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize, usize), Idm)> + '_ {
        let (sy, sz, sx) = self.shape();
        (0..sy).flat_map(move |y| {
            (0..sz).flat_map(move |z| (0..sx).map(move |x| ((y, z, x), self.get(y, z, x))))
        })
    }

    /// True if every cell's block id is in `ids`.
    pub fn all_ids_in(&self, ids: &[u16]) -> bool {
        self.data.iter().all(|idm| ids.contains(&idm.id))
    }
}

/// Per-cell counter array sharing a `BlockGrid`'s shape. Used by Build for
/// the retry budget; values only ever decrease, floored at zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCounters {
    data: Vec<u8>,
    size_y: usize,
    size_z: usize,
    size_x: usize,
}

impl CellCounters {
    /// Create counters matching `grid`'s shape, all initialized to `value`.
    pub fn matching(grid: &BlockGrid, value: u8) -> Self {
        let (size_y, size_z, size_x) = grid.shape();
        Self {
            data: vec![value; size_y * size_z * size_x],
            size_y,
            size_z,
            size_x,
        }
    }

    fn index(&self, y: usize, z: usize, x: usize) -> usize {
        debug_assert!(y < self.size_y && z < self.size_z && x < self.size_x);
        x + z * self.size_x + y * self.size_z * self.size_x
    }

    pub fn get(&self, y: usize, z: usize, x: usize) -> u8 {
        self.data[self.index(y, z, x)]
    }

    /// Decrement a counter, saturating at zero. Returns the new value.
    pub fn decrement(&mut self, y: usize, z: usize, x: usize) -> u8 {
        let i = self.index(y, z, x);
        self.data[i] = self.data[i].saturating_sub(1);
        self.data[i]
    }
}
