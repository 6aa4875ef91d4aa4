// Dig — excavate a rectangular hole, delegating to Destroy.
//
// The hole is an origin-anchored box: `width` along x, `length` along z,
// `depth` downward along y from the origin layer. If the origin layer is
// already passable throughout (someone dug the surface away), the box
// shifts one layer down so the requested depth is still excavated. The
// box's current contents are snapshotted and handed to a Destroy child
// with the dig completion wording; undo delegates to that child.
//
// See also: `destroy.rs` for the delegate, `fill.rs` for the mirror-image
// task over Build.

use crate::agent::fill_idmeta;
use crate::destroy::DestroyTask;
use crate::memory::MemId;
use crate::task::{Task, TaskBase, TaskContext, TaskError};
use blockbot_core::BlockPos;
use serde::{Deserialize, Serialize};

/// Excavate a width × depth × length box below and including the origin
/// layer.
#[derive(Debug, Serialize, Deserialize)]
pub struct DigTask {
    pub base: TaskBase,
    origin: BlockPos,
    length: u32,
    width: u32,
    depth: u32,
    /// Identity of the delegated Destroy child; undo resolves it.
    destroy_memid: Option<MemId>,
}

impl DigTask {
    pub fn new(origin: BlockPos, length: u32, width: u32, depth: u32) -> Self {
        Self {
            base: TaskBase::default(),
            origin,
            length,
            width,
            depth,
            destroy_memid: None,
        }
    }

    pub fn step(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        self.base.interrupted = false;
        if self.length == 0 || self.width == 0 || self.depth == 0 {
            self.base.finished = true;
            return Ok(());
        }

        let mx = self.origin.x;
        let big_x = mx + self.width as i32 - 1;
        let big_y = self.origin.y;
        let mut my = big_y - (self.depth as i32 - 1);
        let mut top_y = big_y;
        let mz = self.origin.z;
        let big_z = mz + self.length as i32 - 1;

        // Surface already gone: shift the box down a layer so the full
        // requested depth still comes out.
        let region = cx
            .agent
            .read_blocks(BlockPos::new(mx, my, mz), BlockPos::new(big_x, top_y, big_z));
        let (sy, sz, sx) = region.shape();
        let top_all_passable = (0..sz).all(|z| {
            (0..sx).all(|x| {
                blockbot_core::block_data::is_passable(region.get(sy - 1, z, x).id)
            })
        });
        if top_all_passable {
            my -= 1;
            top_y -= 1;
        }

        let mut poss = Vec::new();
        for x in mx..=big_x {
            for y in my..=top_y {
                for z in mz..=big_z {
                    poss.push(BlockPos::new(x, y, z));
                }
            }
        }
        let schematic = fill_idmeta(&*cx.agent, &poss);
        let child = DestroyTask::new(&*cx.memory, schematic, true);
        let memid = cx
            .memory
            .task_stack_push(Task::Destroy(child), self.base.memid);
        self.destroy_memid = Some(memid);
        self.base.finished = true;
        Ok(())
    }

    /// Delegated undo: the Destroy child recorded what came out.
    pub fn undo(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        let Some(memid) = self.destroy_memid else {
            return Ok(());
        };
        let mut child = cx
            .memory
            .take_task(memid)
            .ok_or(TaskError::UnknownTask(memid))?;
        let result = child.undo(cx);
        cx.memory.return_task(child);
        result
    }
}
