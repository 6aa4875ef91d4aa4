// Spawn — use a spawn egg and link the mob that appears.
//
// Placement is best-effort: the egg goes one above the target cell, the
// agent side-steps first if it is standing on the target, and the task
// finishes this step whether or not a mob can be confirmed. Confirmation
// is a memory query, not an entity handle: after the world settles,
// perception is pulled into memory and the newest matching mob within the
// query box and spawn window is credited to this task.
//
// See also: `memory.rs` for `update`/`get_mobs`,
// `blockbot_core::block_data` for the egg id and meta-to-kind table.

use crate::memory::TripleValue;
use crate::movement::MoveTask;
use crate::task::{Task, TaskBase, TaskContext, TaskError};
use blockbot_core::block_data::mob_kind_for_meta;
use blockbot_core::{BlockPos, Direction, Idm};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Use a spawn egg at a target cell.
#[derive(Debug, Serialize, Deserialize)]
pub struct SpawnTask {
    pub base: TaskBase,
    /// The egg: id selects the egg item, meta selects the mob kind.
    object_idm: Idm,
    pos: BlockPos,
}

impl SpawnTask {
    pub fn new(object_idm: Idm, pos: BlockPos) -> Self {
        Self {
            base: TaskBase::default(),
            object_idm,
            pos,
        }
    }

    pub fn step(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        self.base.interrupted = false;

        if cx.agent.pos().manhattan_distance(self.pos) > cx.config.place_reach {
            let mut mv = MoveTask::new(self.pos, cx.config.place_reach);
            mv.base.featurizer = self.base.featurizer;
            cx.memory.task_stack_push(Task::Move(mv), self.base.memid);
            return Ok(());
        }

        cx.agent.set_held_item(self.object_idm);
        if cx.agent.pos() == self.pos {
            cx.agent.step(Direction::NegZ);
        }
        cx.agent.place_block(self.pos.above());
        cx.agent.await_world_settle();
        cx.memory.update(&*cx.agent);

        // Credit the newest matching mob near the target, if one appeared.
        let kind = mob_kind_for_meta(self.object_idm.meta);
        if kind.is_none() {
            warn!(meta = self.object_idm.meta, "spawn: unknown egg meta");
        }
        let r = cx.config.mob_query_range as i32;
        let min = BlockPos::new(self.pos.x - r, self.pos.y - r, self.pos.z - r);
        let max = BlockPos::new(self.pos.x + r, self.pos.y + r, self.pos.z + r);
        let since = cx
            .memory
            .tick
            .saturating_sub(cx.config.mob_spawn_window_ticks);
        // `get_mobs` returns in MemId order; the last entry is the newest.
        let mob_memid = cx
            .memory
            .get_mobs(min, max, since, kind)
            .last()
            .map(|m| m.memid);
        if let Some(mob_memid) = mob_memid {
            cx.memory.update_recent_entities(&[mob_memid]);
            if let Some(task_memid) = self.base.memid {
                cx.memory
                    .add_triple(task_memid, "task_effect_", TripleValue::Mem(mob_memid));
                let chat_triples = cx.memory.get_triples(
                    None,
                    Some("chat_effect_"),
                    Some(&TripleValue::Mem(task_memid)),
                );
                if let Some(chat) = chat_triples.first() {
                    cx.memory
                        .add_triple(chat.subj, "chat_effect_", TripleValue::Mem(mob_memid));
                }
            }
        }
        self.base.finished = true;
        Ok(())
    }
}
