// The agent capability surface.
//
// Every task mutates the world exclusively through this trait: current
// position, rectangular region reads, dig, place-held-item, held-item
// selection, the six unit-direction movement primitives (one method
// dispatched on `Direction` — each axis-aligned unit vector maps to exactly
// one variant), and user-visible chat. `visible_mobs` is the perception
// read `AgentMemory::update` pulls from; `await_world_settle` is the single
// permitted blocking point (used by Spawn, no-op in the headless agent).
//
// There are no process-wide singletons: the agent is passed explicitly into
// every task step via `TaskContext`.
//
// See also: `sim_agent.rs` for the headless implementation, `task.rs` for
// `TaskContext`.

use blockbot_core::block_data::is_passable;
use blockbot_core::{BlockGrid, BlockPos, Direction, Idm, MobKind};

/// A mob the agent can currently perceive in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MobSighting {
    pub pos: BlockPos,
    pub kind: MobKind,
}

/// The low-level capabilities tasks are written against.
pub trait Agent {
    /// The agent's current (foot) position.
    fn pos(&self) -> BlockPos;

    /// Read the inclusive box [min, max] as a (y, z, x)-indexed grid.
    fn read_blocks(&self, min: BlockPos, max: BlockPos) -> BlockGrid;

    /// Remove the block at `pos`. Returns whether anything was removed.
    fn dig(&mut self, pos: BlockPos) -> bool;

    /// Place the currently held item at `pos`. Returns reported success;
    /// callers that care verify by re-reading the cell.
    fn place_block(&mut self, pos: BlockPos) -> bool;

    /// Select the item subsequent `place_block` calls will place.
    fn set_held_item(&mut self, idm: Idm);

    /// Take one unit step in the given axis direction.
    fn step(&mut self, dir: Direction);

    /// Send a user-visible chat message.
    fn send_chat(&mut self, msg: &str);

    /// Mobs currently visible to the agent, in stable first-seen order.
    fn visible_mobs(&self) -> Vec<MobSighting>;

    /// Brief pause for world state to settle after a placement. The only
    /// blocking call in the system; headless agents leave it a no-op.
    fn await_world_settle(&mut self) {}
}

/// Read a single block.
pub fn read_block(agent: &dyn Agent, pos: BlockPos) -> Idm {
    agent.read_blocks(pos, pos).get(0, 0, 0)
}

/// Can the agent stand at `pos`? Both the foot and head cells must be
/// passable.
pub fn is_walkable(agent: &dyn Agent, pos: BlockPos) -> bool {
    let column = agent.read_blocks(pos, pos.above());
    is_passable(column.get(0, 0, 0).id) && is_passable(column.get(1, 0, 0).id)
}

/// Pair each position with the block the world currently holds there.
pub fn fill_idmeta(agent: &dyn Agent, positions: &[BlockPos]) -> Vec<(BlockPos, Idm)> {
    positions
        .iter()
        .map(|&pos| (pos, read_block(agent, pos)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim_agent::SimAgent;
    use blockbot_core::VoxelWorld;

    fn flat_world_agent() -> SimAgent {
        let mut world = VoxelWorld::new(BlockPos::new(-8, 60, -8), 16, 8, 16);
        for x in -8..8 {
            for z in -8..8 {
                world.set(BlockPos::new(x, 62, z), Idm::new(2, 0));
            }
        }
        SimAgent::new(world, BlockPos::new(0, 63, 0))
    }

    #[test]
    fn walkable_requires_foot_and_head_clear() {
        let mut agent = flat_world_agent();
        assert!(is_walkable(&agent, BlockPos::new(1, 63, 0)));
        // Solid foot cell.
        assert!(!is_walkable(&agent, BlockPos::new(1, 62, 0)));
        // Clear foot, solid head.
        agent.world.set(BlockPos::new(2, 64, 0), Idm::new(1, 0));
        assert!(!is_walkable(&agent, BlockPos::new(2, 63, 0)));
    }

    #[test]
    fn fill_idmeta_reads_current_world() {
        let agent = flat_world_agent();
        let pairs = fill_idmeta(
            &agent,
            &[BlockPos::new(0, 62, 0), BlockPos::new(0, 63, 0)],
        );
        assert_eq!(pairs[0].1, Idm::new(2, 0));
        assert_eq!(pairs[1].1, Idm::AIR);
    }
}
