// Fill — solidify a coordinate set with one block type.
//
// A thin front over Build: the coordinates become a single-type schematic,
// pushed as an embedded, forced Build child (embed so surrounding air is
// never cleared, force so the ground snap cannot move it). The parent
// finishes immediately; undo delegates to the child resolved by identity
// from the retired-task registry.
//
// See also: `build.rs` for the delegate, `dig.rs` for the mirror-image
// task over Destroy.

use crate::build::{BuildParams, BuildTask};
use crate::memory::MemId;
use crate::task::{Task, TaskBase, TaskContext, TaskError};
use blockbot_core::{BlockPos, Idm};
use serde::{Deserialize, Serialize};

/// Fill every listed coordinate with one block type.
#[derive(Debug, Serialize, Deserialize)]
pub struct FillTask {
    pub base: TaskBase,
    coords: Vec<BlockPos>,
    block_idm: Idm,
    /// Identity of the delegated Build child; undo resolves it.
    build_memid: Option<MemId>,
}

impl FillTask {
    pub fn new(coords: Vec<BlockPos>, block_idm: Idm) -> Self {
        Self {
            base: TaskBase::default(),
            coords,
            block_idm,
            build_memid: None,
        }
    }

    pub fn step(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        self.base.interrupted = false;
        let blocks_list: Vec<(BlockPos, Idm)> = self
            .coords
            .iter()
            .map(|&pos| (pos, self.block_idm))
            .collect();
        if let Some(&(first, _)) = blocks_list.first() {
            let origin = blocks_list
                .iter()
                .fold(first, |acc, &(pos, _)| acc.min_corner(pos));
            let child = BuildTask::new(
                &*cx.agent,
                BuildParams {
                    blocks_list,
                    origin,
                    embed: true,
                    force: true,
                    verbose: false,
                    fill_message: true,
                    ..BuildParams::default()
                },
                cx.config,
            );
            let memid = cx
                .memory
                .task_stack_push(Task::Build(child), self.base.memid);
            self.build_memid = Some(memid);
        }
        self.base.finished = true;
        Ok(())
    }

    /// Delegated undo: the Build child recorded what the fill displaced.
    pub fn undo(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        let Some(memid) = self.build_memid else {
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
