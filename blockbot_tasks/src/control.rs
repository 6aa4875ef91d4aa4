// Control tasks: Loop (repeat until a condition holds) and Undo (reverse a
// task by identity).
//
// Loop carries two injected behaviors — a stop condition and a task
// factory — as boxed trait objects with blanket closure impls, so callers
// can hand in plain closures. Each step either finishes (condition holds)
// or pushes a fresh generation of children; the loop itself is revisited
// only after they all finish. A condition that never holds loops forever;
// that is the contract, not a bug.
//
// Undo resolves a task by identity from memory (retired registry first,
// then the live stack), runs its reversal, and hands it back. The
// reversal itself usually just pushes compensating children.
//
// See also: `memory.rs` for take/return and the retired registry,
// `task.rs` for the per-kind undo dispatch.

use crate::agent::Agent;
use crate::memory::{AgentMemory, MemId};
use crate::task::{Task, TaskBase, TaskContext, TaskError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Injected loop-termination predicate.
pub trait StopCondition {
    fn check(&self, agent: &dyn Agent, memory: &AgentMemory) -> bool;
}

impl<F> StopCondition for F
where
    F: Fn(&dyn Agent, &AgentMemory) -> bool,
{
    fn check(&self, agent: &dyn Agent, memory: &AgentMemory) -> bool {
        self(agent, memory)
    }
}

/// Injected generator for each loop iteration's child tasks.
pub trait TaskFactory {
    fn new_tasks(&mut self, agent: &dyn Agent, memory: &AgentMemory) -> Vec<Task>;
}

impl<F> TaskFactory for F
where
    F: FnMut(&dyn Agent, &AgentMemory) -> Vec<Task>,
{
    fn new_tasks(&mut self, agent: &dyn Agent, memory: &AgentMemory) -> Vec<Task> {
        self(agent, memory)
    }
}

/// Repeat generated child tasks until the stop condition holds.
pub struct LoopTask {
    pub base: TaskBase,
    stop_condition: Box<dyn StopCondition>,
    new_tasks_fn: Box<dyn TaskFactory>,
}

impl fmt::Debug for LoopTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopTask")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl LoopTask {
    pub fn new(
        stop_condition: impl StopCondition + 'static,
        new_tasks_fn: impl TaskFactory + 'static,
    ) -> Self {
        Self {
            base: TaskBase::default(),
            stop_condition: Box::new(stop_condition),
            new_tasks_fn: Box::new(new_tasks_fn),
        }
    }

    pub fn step(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        self.base.interrupted = false;
        if self.stop_condition.check(&*cx.agent, &*cx.memory) {
            self.base.finished = true;
            return Ok(());
        }
        let tasks = self.new_tasks_fn.new_tasks(&*cx.agent, &*cx.memory);
        for task in tasks {
            cx.memory.task_stack_push(task, self.base.memid);
        }
        Ok(())
    }
}

/// Reverse a previously executed task, resolved by identity.
#[derive(Debug, Serialize, Deserialize)]
pub struct UndoTask {
    pub base: TaskBase,
    to_undo_memid: MemId,
}

impl UndoTask {
    pub fn new(to_undo_memid: MemId) -> Self {
        Self {
            base: TaskBase::default(),
            to_undo_memid,
        }
    }

    pub fn step(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        self.base.interrupted = false;
        let memid = self.to_undo_memid;
        let mut task = cx
            .memory
            .take_task(memid)
            .ok_or(TaskError::UnknownTask(memid))?;
        let result = task.undo(cx);
        cx.memory.return_task(task);
        result?;
        self.base.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskConfig;
    use crate::memory::AgentMemory;
    use crate::movement::MoveTask;
    use crate::pathfind::AstarPathfinder;
    use crate::sim_agent::SimAgent;
    use blockbot_core::{BlockPos, Idm, VoxelWorld};

    fn fixture() -> (SimAgent, AgentMemory, AstarPathfinder, TaskConfig) {
        let mut world = VoxelWorld::new(BlockPos::new(-8, 56, -8), 16, 16, 16);
        for x in -8..8 {
            for z in -8..8 {
                world.set(BlockPos::new(x, 62, z), Idm::new(1, 0));
            }
        }
        (
            SimAgent::new(world, BlockPos::new(0, 63, 0)),
            AgentMemory::new(),
            AstarPathfinder::default(),
            TaskConfig::default(),
        )
    }

    #[test]
    fn loop_finishes_when_the_condition_holds() {
        let (mut agent, mut memory, pathfinder, config) = fixture();
        let mut task = LoopTask::new(
            |_: &dyn Agent, _: &AgentMemory| true,
            |_: &dyn Agent, _: &AgentMemory| Vec::new(),
        );
        let mut cx = TaskContext {
            agent: &mut agent,
            memory: &mut memory,
            pathfinder: &pathfinder,
            config: &config,
        };
        task.step(&mut cx).unwrap();
        assert!(task.base.finished);
        assert!(memory.task_stack_is_empty());
    }

    #[test]
    fn loop_pushes_a_generation_of_children_each_step() {
        let (mut agent, mut memory, pathfinder, config) = fixture();
        let mut task = LoopTask::new(
            |_: &dyn Agent, _: &AgentMemory| false,
            |_: &dyn Agent, _: &AgentMemory| {
                vec![Task::Move(MoveTask::new(BlockPos::new(1, 63, 0), 1))]
            },
        );
        for _ in 0..3 {
            let mut cx = TaskContext {
                agent: &mut agent,
                memory: &mut memory,
                pathfinder: &pathfinder,
                config: &config,
            };
            task.step(&mut cx).unwrap();
        }
        // Never finishes, and every generation landed on the stack.
        assert!(!task.base.finished);
        assert_eq!(memory.task_stack_len(), 3);
    }

    #[test]
    fn loop_children_are_linked_to_the_loop() {
        let (mut agent, mut memory, pathfinder, config) = fixture();
        let memid = memory.task_stack_push(
            Task::Loop(LoopTask::new(
                |_: &dyn Agent, _: &AgentMemory| false,
                |_: &dyn Agent, _: &AgentMemory| {
                    vec![Task::Move(MoveTask::new(BlockPos::new(1, 63, 0), 1))]
                },
            )),
            None,
        );
        let Some(Task::Loop(mut task)) = memory.task_stack_pop() else {
            panic!("expected loop task");
        };
        let mut cx = TaskContext {
            agent: &mut agent,
            memory: &mut memory,
            pathfinder: &pathfinder,
            config: &config,
        };
        task.step(&mut cx).unwrap();
        let child = memory.task_stack_pop().unwrap();
        let child_memid = child.base().memid.unwrap();
        assert_eq!(memory.task_node(child_memid).unwrap().parent, Some(memid));
    }

    #[test]
    fn undo_serde_round_trip_preserves_the_target() {
        let task = UndoTask::new(MemId(7));
        let json = serde_json::to_string(&task).unwrap();
        let restored: UndoTask = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.to_undo_memid, MemId(7));
    }

    #[test]
    fn undo_of_an_unknown_identity_errors() {
        let (mut agent, mut memory, pathfinder, config) = fixture();
        let mut task = UndoTask::new(MemId(999));
        let mut cx = TaskContext {
            agent: &mut agent,
            memory: &mut memory,
            pathfinder: &pathfinder,
            config: &config,
        };
        assert!(matches!(
            task.step(&mut cx),
            Err(TaskError::UnknownTask(MemId(999)))
        ));
        assert!(!task.base.finished);
    }

    #[test]
    fn undo_resolves_a_retired_task_and_runs_its_reversal() {
        let (mut agent, mut memory, pathfinder, config) = fixture();
        let a = BlockPos::new(2, 63, 0);
        agent.world.set(a, Idm::new(4, 0));
        let destroy = crate::destroy::DestroyTask::new(&memory, vec![(a, Idm::new(4, 0))], false);
        let memid = memory.retire_task(Task::Destroy(destroy));

        let mut task = UndoTask::new(memid);
        let mut cx = TaskContext {
            agent: &mut agent,
            memory: &mut memory,
            pathfinder: &pathfinder,
            config: &config,
        };
        task.step(&mut cx).unwrap();
        assert!(task.base.finished);
        // The reversal pushed a rebuild, and the task went back to the
        // registry.
        assert_eq!(memory.task_stack_len(), 1);
        assert_eq!(memory.task_stack_pop().unwrap().kind_name(), "build");
        assert!(memory.take_task(memid).is_some());
    }
}
