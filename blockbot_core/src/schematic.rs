// Sparse blocks-list ⇄ dense grid conversions.
//
// A blocks-list is the interchange format for structures: an ordered list of
// `(BlockPos, Idm)` pairs. A dense `BlockGrid` plus a world-space origin is
// the working representation tasks compute over. Conversions here must be
// exact inverses (modulo air cells, which a blocks-list never carries).
//
// `blocks_list_to_grid` normalizes by the component-wise minimum corner and
// returns that corner; `grid_to_blocks_list` emits non-air cells in the
// grid's fixed (y, z, x) order. `to_relative_pos` is the same normalization
// without densifying, used by Destroy's undo to rebuild a schematic.
//
// See also: `grid.rs` for the (y, z, x) axis convention these conversions
// preserve in both directions.

use crate::grid::BlockGrid;
use crate::types::{BlockPos, Idm};

/// Densify a blocks-list into a grid plus the minimum-corner offset that
/// was subtracted from every position. Returns an empty 0×0×0 grid for an
/// empty list.
pub fn blocks_list_to_grid(blocks: &[(BlockPos, Idm)]) -> (BlockGrid, BlockPos) {
    let Some(&(first, _)) = blocks.first() else {
        return (BlockGrid::default(), BlockPos::new(0, 0, 0));
    };
    let origin = blocks
        .iter()
        .fold(first, |acc, &(pos, _)| acc.min_corner(pos));
    let (mut my, mut mz, mut mx) = (0usize, 0usize, 0usize);
    for &(pos, _) in blocks {
        my = my.max((pos.y - origin.y) as usize + 1);
        mz = mz.max((pos.z - origin.z) as usize + 1);
        mx = mx.max((pos.x - origin.x) as usize + 1);
    }
    let mut grid = BlockGrid::filled_air(my, mz, mx);
    for &(pos, idm) in blocks {
        grid.set(
            (pos.y - origin.y) as usize,
            (pos.z - origin.z) as usize,
            (pos.x - origin.x) as usize,
            idm,
        );
    }
    (grid, origin)
}

/// Sparsify a grid into a blocks-list of its non-air cells, positions
/// offset by `origin`. Emission order is the grid's (y, z, x) order.
pub fn grid_to_blocks_list(grid: &BlockGrid, origin: BlockPos) -> Vec<(BlockPos, Idm)> {
    grid.cells()
        .filter(|(_, idm)| !idm.is_air())
        .map(|((y, z, x), idm)| {
            (
                BlockPos::new(origin.x + x as i32, origin.y + y as i32, origin.z + z as i32),
                idm,
            )
        })
        .collect()
}

/// Normalize a blocks-list so its minimum corner sits at the origin.
/// Returns the relative list and the subtracted corner.
pub fn to_relative_pos(blocks: &[(BlockPos, Idm)]) -> (Vec<(BlockPos, Idm)>, BlockPos) {
    let Some(&(first, _)) = blocks.first() else {
        return (Vec::new(), BlockPos::new(0, 0, 0));
    };
    let origin = blocks
        .iter()
        .fold(first, |acc, &(pos, _)| acc.min_corner(pos));
    let relative = blocks
        .iter()
        .map(|&(pos, idm)| {
            (
                BlockPos::new(pos.x - origin.x, pos.y - origin.y, pos.z - origin.z),
                idm,
            )
        })
        .collect();
    (relative, origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_blocks_exactly() {
        let blocks = vec![
            (BlockPos::new(2, 64, -1), Idm::new(1, 0)),
            (BlockPos::new(3, 64, -1), Idm::new(4, 2)),
            (BlockPos::new(2, 66, 1), Idm::new(17, 1)),
        ];
        let (grid, origin) = blocks_list_to_grid(&blocks);
        assert_eq!(origin, BlockPos::new(2, 64, -1));
        assert_eq!(grid.shape(), (3, 3, 2));

        let mut restored = grid_to_blocks_list(&grid, origin);
        let mut expected = blocks.clone();
        restored.sort();
        expected.sort();
        assert_eq!(restored, expected);
    }

    #[test]
    fn grid_lookup_uses_yzx_axes() {
        let blocks = vec![
            (BlockPos::new(10, 5, 20), Idm::new(1, 0)),
            (BlockPos::new(11, 6, 22), Idm::new(2, 0)),
        ];
        let (grid, origin) = blocks_list_to_grid(&blocks);
        assert_eq!(origin, BlockPos::new(10, 5, 20));
        // (y, z, x) indexing relative to origin.
        assert_eq!(grid.get(0, 0, 0), Idm::new(1, 0));
        assert_eq!(grid.get(1, 2, 1), Idm::new(2, 0));
        assert_eq!(grid.get(1, 0, 0), Idm::AIR);
    }

    #[test]
    fn empty_list_gives_empty_grid() {
        let (grid, origin) = blocks_list_to_grid(&[]);
        assert_eq!(grid.cell_count(), 0);
        assert_eq!(origin, BlockPos::new(0, 0, 0));
        assert!(grid_to_blocks_list(&grid, origin).is_empty());
    }

    #[test]
    fn to_relative_pos_normalizes_min_corner() {
        let blocks = vec![
            (BlockPos::new(5, 70, -3), Idm::new(1, 0)),
            (BlockPos::new(4, 72, -2), Idm::new(1, 0)),
        ];
        let (relative, origin) = to_relative_pos(&blocks);
        assert_eq!(origin, BlockPos::new(4, 70, -3));
        assert_eq!(relative[0].0, BlockPos::new(1, 0, 0));
        assert_eq!(relative[1].0, BlockPos::new(0, 2, 1));
    }

    #[test]
    fn air_cells_are_not_emitted() {
        // A sparse structure densifies with air gaps; sparsifying drops them.
        let blocks = vec![
            (BlockPos::new(0, 0, 0), Idm::new(1, 0)),
            (BlockPos::new(4, 0, 0), Idm::new(1, 0)),
        ];
        let (grid, origin) = blocks_list_to_grid(&blocks);
        assert_eq!(grid.shape(), (1, 1, 5));
        assert_eq!(grid_to_blocks_list(&grid, origin).len(), 2);
    }
}
