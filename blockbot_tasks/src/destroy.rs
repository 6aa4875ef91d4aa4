// Destroy — remove a recorded set of blocks, one dig per step.
//
// The work set is re-validated against the world every step: cells someone
// else already cleared simply drop out. Target selection walks the
// remaining cells nearest-first and keeps the first one the pathfinder can
// actually reach; when no remaining cell is reachable the task gives up
// with a chat notice rather than erroring.
//
// If the doomed blocks exactly cover a known composite object, its naming
// triples are captured at construction so an undo can re-assert them on
// the rebuilt structure, and the object record itself is retired when the
// last block falls.
//
// See also: `build.rs` (whose undo pushes a Destroy, and which a Destroy
// undo pushes in turn), `memory.rs` for the object registry.

use crate::agent::read_block;
use crate::build::{BuildParams, BuildTask};
use crate::memory::{AgentMemory, MemId, TripleValue};
use crate::movement::MoveTask;
use crate::task::{Task, TaskBase, TaskContext, TaskError};
use blockbot_core::schematic::to_relative_pos;
use blockbot_core::{BlockPos, Idm};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

const TAG_PREDICATES: &[&str] = &["has_tag", "has_name", "has_colour"];

/// Remove a set of blocks from the world.
#[derive(Debug, Serialize, Deserialize)]
pub struct DestroyTask {
    pub base: TaskBase,
    /// The doomed blocks as recorded at construction; undo rebuilds these.
    schematic: Vec<(BlockPos, Idm)>,
    remaining: BTreeSet<BlockPos>,
    /// Announce completion with the dig wording (set by Dig's delegation).
    dig_message: bool,
    /// Composite object exactly covered by the doomed blocks, if any;
    /// retired once the last block falls.
    doomed_object_memid: Option<MemId>,
    /// Naming triples captured from the doomed object, re-asserted by undo.
    captured_tags: Vec<(String, String)>,
}

impl DestroyTask {
    pub fn new(
        memory: &AgentMemory,
        schematic: Vec<(BlockPos, Idm)>,
        dig_message: bool,
    ) -> Self {
        let remaining: BTreeSet<BlockPos> = schematic.iter().map(|&(pos, _)| pos).collect();

        let mut doomed_object_memid = None;
        let mut captured_tags = Vec::new();
        if let Some(&(first, _)) = schematic.first() {
            if let Some(obj) = memory.block_object_at(first) {
                // Only a full cover counts: destroying part of an object
                // neither retires it nor claims its name.
                if obj.blocks.keys().all(|pos| remaining.contains(pos)) {
                    doomed_object_memid = Some(obj.memid);
                    for triple in memory.get_triples(Some(obj.memid), None, None) {
                        if let TripleValue::Text(value) = &triple.obj {
                            if TAG_PREDICATES.contains(&triple.pred.as_str()) {
                                captured_tags.push((triple.pred.clone(), value.clone()));
                            }
                        }
                    }
                }
            }
        }

        Self {
            base: TaskBase::default(),
            schematic,
            remaining,
            dig_message,
            doomed_object_memid,
            captured_tags,
        }
    }

    pub fn remaining(&self) -> &BTreeSet<BlockPos> {
        &self.remaining
    }

    pub fn captured_tags(&self) -> &[(String, String)] {
        &self.captured_tags
    }

    pub fn step(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        self.base.interrupted = false;

        // Cells already cleared (by anyone) drop out of the work set.
        let gone: Vec<BlockPos> = self
            .remaining
            .iter()
            .copied()
            .filter(|&pos| read_block(&*cx.agent, pos).is_air())
            .collect();
        for pos in gone {
            self.remaining.remove(&pos);
        }

        if self.remaining.is_empty() {
            if let Some(memid) = self.doomed_object_memid {
                cx.memory.remove_block_object(memid);
            }
            self.base.finished = true;
            if self.dig_message {
                cx.agent.send_chat("I finished digging this.");
            }
            return Ok(());
        }

        // Nearest remaining cell the pathfinder can actually reach.
        let agent_pos = cx.agent.pos();
        let mut candidates: Vec<BlockPos> = self.remaining.iter().copied().collect();
        candidates.sort_by_key(|pos| agent_pos.manhattan_distance(*pos));
        let pathfinder = cx.pathfinder;
        let mut wasted = 0usize;
        let mut target = None;
        for pos in candidates {
            if pathfinder.find_path(&*cx.agent, pos, 2).is_some() {
                target = Some(pos);
                break;
            }
            wasted += 1;
        }
        if wasted > 0 {
            debug!(wasted, "destroy: unreachable cells skipped during targeting");
        }
        let Some(target) = target else {
            info!("destroy: no remaining cell is reachable, giving up");
            cx.agent.send_chat("There's no path, so I'm giving up");
            self.base.finished = true;
            return Ok(());
        };

        if agent_pos.manhattan_distance(target) <= cx.config.dig_reach {
            cx.agent.dig(target);
            self.remaining.remove(&target);
        } else {
            let mut mv = MoveTask::new(target, cx.config.dig_reach);
            mv.base.featurizer = self.base.featurizer;
            cx.memory.task_stack_push(Task::Move(mv), self.base.memid);
        }
        Ok(())
    }

    /// Reverse the destruction: rebuild the recorded blocks in place,
    /// re-asserting any captured naming triples on the new object.
    pub fn undo(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        cx.agent.send_chat("ok I will build it back.");
        if self.schematic.is_empty() {
            return Ok(());
        }
        let (_, origin) = to_relative_pos(&self.schematic);
        let rebuild = BuildTask::new(
            &*cx.agent,
            BuildParams {
                blocks_list: self.schematic.clone(),
                origin,
                force: true,
                verbose: false,
                schematic_tags: self.captured_tags.clone(),
                ..BuildParams::default()
            },
            cx.config,
        );
        cx.memory
            .task_stack_push(Task::Build(rebuild), self.base.memid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskConfig;
    use crate::pathfind::AstarPathfinder;
    use crate::sim_agent::SimAgent;
    use blockbot_core::VoxelWorld;
    use std::collections::BTreeMap;

    fn flat_world() -> VoxelWorld {
        let mut world = VoxelWorld::new(BlockPos::new(-16, 48, -16), 32, 32, 32);
        for x in -16..16 {
            for z in -16..16 {
                world.set(BlockPos::new(x, 62, z), Idm::new(1, 0));
            }
        }
        world
    }

    struct Fixture {
        agent: SimAgent,
        memory: AgentMemory,
        pathfinder: AstarPathfinder,
        config: TaskConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                agent: SimAgent::new(flat_world(), BlockPos::new(0, 63, 0)),
                memory: AgentMemory::new(),
                pathfinder: AstarPathfinder::default(),
                config: TaskConfig::default(),
            }
        }

        fn cx(&mut self) -> TaskContext<'_> {
            TaskContext {
                agent: &mut self.agent,
                memory: &mut self.memory,
                pathfinder: &self.pathfinder,
                config: &self.config,
            }
        }
    }

    #[test]
    fn digs_every_block_then_finishes() {
        let mut fx = Fixture::new();
        let a = BlockPos::new(2, 63, 0);
        let b = BlockPos::new(2, 63, 1);
        fx.agent.world.set(a, Idm::new(4, 0));
        fx.agent.world.set(b, Idm::new(4, 0));
        let mut task =
            DestroyTask::new(&fx.memory, vec![(a, Idm::new(4, 0)), (b, Idm::new(4, 0))], false);

        task.step(&mut fx.cx()).unwrap();
        task.step(&mut fx.cx()).unwrap();
        assert_eq!(fx.agent.world.get(a), Idm::AIR);
        assert_eq!(fx.agent.world.get(b), Idm::AIR);
        assert!(!task.base.finished);
        task.step(&mut fx.cx()).unwrap();
        assert!(task.base.finished);
        assert!(fx.agent.chat_log.is_empty());
    }

    #[test]
    fn dig_message_announces_completion() {
        let mut fx = Fixture::new();
        let a = BlockPos::new(2, 63, 0);
        fx.agent.world.set(a, Idm::new(4, 0));
        let mut task = DestroyTask::new(&fx.memory, vec![(a, Idm::new(4, 0))], true);
        task.step(&mut fx.cx()).unwrap();
        task.step(&mut fx.cx()).unwrap();
        assert!(task.base.finished);
        assert_eq!(fx.agent.chat_log, vec!["I finished digging this."]);
    }

    #[test]
    fn externally_cleared_cells_drop_out() {
        let mut fx = Fixture::new();
        let a = BlockPos::new(2, 63, 0);
        // Recorded in the schematic but never present in the world.
        let mut task = DestroyTask::new(&fx.memory, vec![(a, Idm::new(4, 0))], false);
        task.step(&mut fx.cx()).unwrap();
        assert!(task.base.finished);
    }

    #[test]
    fn unreachable_blocks_give_up_with_notice() {
        let mut fx = Fixture::new();
        // Seal the agent in so nothing is reachable.
        for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            fx.agent.world.set(BlockPos::new(dx, 63, dz), Idm::new(1, 0));
            fx.agent.world.set(BlockPos::new(dx, 64, dz), Idm::new(1, 0));
        }
        fx.agent.world.set(BlockPos::new(0, 65, 0), Idm::new(1, 0));
        let far = BlockPos::new(10, 63, 10);
        fx.agent.world.set(far, Idm::new(4, 0));
        let mut task = DestroyTask::new(&fx.memory, vec![(far, Idm::new(4, 0))], false);
        task.step(&mut fx.cx()).unwrap();
        assert!(task.base.finished);
        assert_eq!(fx.agent.chat_log, vec!["There's no path, so I'm giving up"]);
        // The block itself survives.
        assert_eq!(fx.agent.world.get(far), Idm::new(4, 0));
    }

    #[test]
    fn full_cover_captures_tags_and_retires_object() {
        let mut fx = Fixture::new();
        let a = BlockPos::new(2, 63, 0);
        fx.agent.world.set(a, Idm::new(4, 0));
        let mut blocks = BTreeMap::new();
        blocks.insert(a, Idm::new(4, 0));
        let obj_memid = fx.memory.add_block_object(blocks);
        fx.memory.add_triple(
            obj_memid,
            "has_name",
            TripleValue::Text("pillar".to_string()),
        );

        let mut task = DestroyTask::new(&fx.memory, vec![(a, Idm::new(4, 0))], false);
        assert_eq!(
            task.captured_tags(),
            &[("has_name".to_string(), "pillar".to_string())]
        );
        task.step(&mut fx.cx()).unwrap();
        task.step(&mut fx.cx()).unwrap();
        assert!(task.base.finished);
        assert!(fx.memory.block_object_at(a).is_none());
        assert!(fx.memory.get_triples(Some(obj_memid), None, None).is_empty());
    }

    #[test]
    fn partial_cover_leaves_the_object_alone() {
        let mut fx = Fixture::new();
        let a = BlockPos::new(2, 63, 0);
        let b = BlockPos::new(3, 63, 0);
        fx.agent.world.set(a, Idm::new(4, 0));
        fx.agent.world.set(b, Idm::new(4, 0));
        let mut blocks = BTreeMap::new();
        blocks.insert(a, Idm::new(4, 0));
        blocks.insert(b, Idm::new(4, 0));
        let obj_memid = fx.memory.add_block_object(blocks);

        let mut task = DestroyTask::new(&fx.memory, vec![(a, Idm::new(4, 0))], false);
        assert!(task.captured_tags().is_empty());
        task.step(&mut fx.cx()).unwrap();
        task.step(&mut fx.cx()).unwrap();
        assert!(task.base.finished);
        assert!(fx.memory.block_object(obj_memid).is_some());
    }

    #[test]
    fn undo_pushes_a_forced_rebuild_with_tags() {
        let mut fx = Fixture::new();
        let a = BlockPos::new(2, 63, 0);
        fx.agent.world.set(a, Idm::new(4, 0));
        let mut blocks = BTreeMap::new();
        blocks.insert(a, Idm::new(4, 0));
        let obj_memid = fx.memory.add_block_object(blocks);
        fx.memory.tag(obj_memid, "red");

        let mut task = DestroyTask::new(&fx.memory, vec![(a, Idm::new(4, 0))], false);
        task.undo(&mut fx.cx()).unwrap();
        assert_eq!(fx.agent.chat_log, vec!["ok I will build it back."]);
        assert_eq!(fx.memory.task_stack_len(), 1);
        assert_eq!(fx.memory.task_stack_pop().unwrap().kind_name(), "build");
    }
}
