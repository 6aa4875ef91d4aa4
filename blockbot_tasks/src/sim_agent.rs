// Headless in-memory agent over a dense voxel world.
//
// The reference `Agent` implementation the integration tests drive: free
// six-direction stepping gated on foot-and-head passability (no gravity),
// placement that refuses occupied cells and the agent's own body, spawn-egg
// placement that produces a mob instead of a block, and a chat log instead
// of a wire protocol.
//
// See also: `agent.rs` for the capability trait, `blockbot_core::world`
// for the backing grid.

use crate::agent::{Agent, MobSighting};
use blockbot_core::block_data::{SPAWN_EGG_ID, is_passable, mob_kind_for_meta};
use blockbot_core::{BlockGrid, BlockPos, Direction, Idm, VoxelWorld};

/// Simulated agent: a position, a held item, and a dense world.
#[derive(Clone, Debug)]
pub struct SimAgent {
    pub world: VoxelWorld,
    pos: BlockPos,
    held: Idm,
    pub chat_log: Vec<String>,
    mobs: Vec<MobSighting>,
}

impl SimAgent {
    pub fn new(world: VoxelWorld, pos: BlockPos) -> Self {
        Self {
            world,
            pos,
            held: Idm::AIR,
            chat_log: Vec::new(),
            mobs: Vec::new(),
        }
    }

    pub fn held_item(&self) -> Idm {
        self.held
    }

    /// Is `pos` one of the two cells the agent's body occupies?
    fn occupies(&self, pos: BlockPos) -> bool {
        pos == self.pos || pos == self.pos.above()
    }
}

impl Agent for SimAgent {
    fn pos(&self) -> BlockPos {
        self.pos
    }

    fn read_blocks(&self, min: BlockPos, max: BlockPos) -> BlockGrid {
        self.world.read_region(min, max)
    }

    fn dig(&mut self, pos: BlockPos) -> bool {
        if self.world.get(pos).is_air() {
            false
        } else {
            self.world.set(pos, Idm::AIR);
            true
        }
    }

    fn place_block(&mut self, pos: BlockPos) -> bool {
        if self.held.is_air() {
            return false;
        }
        if self.held.id == SPAWN_EGG_ID {
            // Using an egg spawns a mob; no block appears.
            return match mob_kind_for_meta(self.held.meta) {
                Some(kind) => {
                    self.mobs.push(MobSighting { pos, kind });
                    true
                }
                None => false,
            };
        }
        if self.occupies(pos) || !self.world.in_bounds(pos) || !self.world.get(pos).is_air() {
            return false;
        }
        self.world.set(pos, self.held);
        true
    }

    fn set_held_item(&mut self, idm: Idm) {
        self.held = idm;
    }

    fn step(&mut self, dir: Direction) {
        let target = dir.step_from(self.pos);
        let foot = self.world.get(target);
        let head = self.world.get(target.above());
        // A blocked step is a no-op; callers detect it by re-reading pos.
        if is_passable(foot.id) && is_passable(head.id) {
            self.pos = target;
        }
    }

    fn send_chat(&mut self, msg: &str) {
        self.chat_log.push(msg.to_string());
    }

    fn visible_mobs(&self) -> Vec<MobSighting> {
        self.mobs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockbot_core::MobKind;

    fn small_world() -> VoxelWorld {
        let mut world = VoxelWorld::new(BlockPos::new(0, 0, 0), 8, 8, 8);
        for x in 0..8 {
            for z in 0..8 {
                world.set(BlockPos::new(x, 0, z), Idm::new(2, 0));
            }
        }
        world
    }

    #[test]
    fn step_moves_only_into_walkable_cells() {
        let mut agent = SimAgent::new(small_world(), BlockPos::new(3, 1, 3));
        agent.step(Direction::PosX);
        assert_eq!(agent.pos(), BlockPos::new(4, 1, 3));
        // Into the floor: no-op.
        agent.step(Direction::NegY);
        assert_eq!(agent.pos(), BlockPos::new(4, 1, 3));
    }

    #[test]
    fn place_refuses_own_body_and_occupied_cells() {
        let mut agent = SimAgent::new(small_world(), BlockPos::new(3, 1, 3));
        agent.set_held_item(Idm::new(1, 0));
        assert!(!agent.place_block(BlockPos::new(3, 1, 3)));
        assert!(!agent.place_block(BlockPos::new(3, 2, 3)));
        assert!(agent.place_block(BlockPos::new(4, 1, 3)));
        // Cell now occupied by a block.
        assert!(!agent.place_block(BlockPos::new(4, 1, 3)));
    }

    #[test]
    fn place_with_nothing_held_fails() {
        let mut agent = SimAgent::new(small_world(), BlockPos::new(3, 1, 3));
        assert!(!agent.place_block(BlockPos::new(4, 1, 3)));
    }

    #[test]
    fn dig_reports_whether_anything_was_removed() {
        let mut agent = SimAgent::new(small_world(), BlockPos::new(3, 1, 3));
        assert!(agent.dig(BlockPos::new(4, 0, 3)));
        assert!(!agent.dig(BlockPos::new(4, 0, 3)));
        assert_eq!(agent.world.get(BlockPos::new(4, 0, 3)), Idm::AIR);
    }

    #[test]
    fn spawn_egg_produces_a_mob_not_a_block() {
        let mut agent = SimAgent::new(small_world(), BlockPos::new(3, 1, 3));
        agent.set_held_item(Idm::new(SPAWN_EGG_ID, 93));
        assert!(agent.place_block(BlockPos::new(5, 2, 3)));
        assert_eq!(agent.world.get(BlockPos::new(5, 2, 3)), Idm::AIR);
        let mobs = agent.visible_mobs();
        assert_eq!(mobs.len(), 1);
        assert_eq!(mobs[0].kind, MobKind::Chicken);
        assert_eq!(mobs[0].pos, BlockPos::new(5, 2, 3));
    }
}
