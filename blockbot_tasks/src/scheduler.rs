// Cooperative scheduler: step the top of the shared task stack.
//
// One call, one bounded unit of work. The top task is removed, stepped,
// and — unless it finished — re-inserted at its original depth, so any
// children it pushed during the step sit above it and run to completion
// before it is revisited. Finished tasks move to the retired registry
// (they stay resolvable by identity for Undo). The logical clock advances
// by one per successful step.
//
// A task error leaves the task in place at its original depth; the caller
// decides whether to retry, interrupt, or drop it.
//
// See also: `task.rs` for the per-step contract, `memory.rs` for the
// stack and the retired registry.

use crate::agent::Agent;
use crate::config::TaskConfig;
use crate::memory::AgentMemory;
use crate::pathfind::Pathfinder;
use crate::task::{TaskContext, TaskError};
use tracing::debug;

/// Step the task at the top of the stack once. Returns whether there was
/// anything to step.
pub fn step_top(
    agent: &mut dyn Agent,
    memory: &mut AgentMemory,
    pathfinder: &dyn Pathfinder,
    config: &TaskConfig,
) -> Result<bool, TaskError> {
    let Some(mut task) = memory.task_stack_pop() else {
        return Ok(false);
    };
    // Children pushed during the step land above this depth.
    let slot = memory.task_stack_len();
    debug!(kind = task.kind_name(), depth = slot, "stepping task");

    let mut cx = TaskContext {
        agent: &mut *agent,
        memory: &mut *memory,
        pathfinder,
        config,
    };
    if let Err(err) = task.step(&mut cx) {
        memory.task_stack_insert(slot, task);
        return Err(err);
    }

    if task.check_finished(memory) {
        debug!(kind = task.kind_name(), "task finished");
        memory.retire_task(task);
    } else {
        memory.task_stack_insert(slot, task);
    }
    memory.advance_tick(1);
    Ok(true)
}

/// Step until the stack drains or `max_steps` is hit. Returns the number
/// of steps taken.
pub fn run_until_idle(
    agent: &mut dyn Agent,
    memory: &mut AgentMemory,
    pathfinder: &dyn Pathfinder,
    config: &TaskConfig,
    max_steps: usize,
) -> Result<usize, TaskError> {
    let mut steps = 0;
    while steps < max_steps {
        if !step_top(agent, memory, pathfinder, config)? {
            break;
        }
        steps += 1;
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildParams, BuildTask};
    use crate::movement::MoveTask;
    use crate::pathfind::AstarPathfinder;
    use crate::sim_agent::SimAgent;
    use crate::task::Task;
    use blockbot_core::{BlockPos, Idm, VoxelWorld};

    fn flat_world() -> VoxelWorld {
        let mut world = VoxelWorld::new(BlockPos::new(-16, 48, -16), 32, 32, 32);
        for x in -16..16 {
            for z in -16..16 {
                world.set(BlockPos::new(x, 62, z), Idm::new(1, 0));
            }
        }
        world
    }

    #[test]
    fn empty_stack_reports_nothing_to_do() {
        let mut agent = SimAgent::new(flat_world(), BlockPos::new(0, 63, 0));
        let mut memory = AgentMemory::new();
        let pathfinder = AstarPathfinder::default();
        let config = TaskConfig::default();
        assert!(!step_top(&mut agent, &mut memory, &pathfinder, &config).unwrap());
        assert_eq!(memory.tick, 0);
    }

    #[test]
    fn finished_tasks_retire_and_stay_resolvable() {
        let mut agent = SimAgent::new(flat_world(), BlockPos::new(0, 63, 0));
        let mut memory = AgentMemory::new();
        let pathfinder = AstarPathfinder::default();
        let config = TaskConfig::default();
        let memid = memory.task_stack_push(
            Task::Move(MoveTask::new(BlockPos::new(1, 63, 0), 1)),
            None,
        );
        assert!(step_top(&mut agent, &mut memory, &pathfinder, &config).unwrap());
        assert!(memory.task_stack_is_empty());
        assert_eq!(memory.tick, 1);
        assert!(memory.take_task(memid).is_some());
        assert_eq!(memory.task_node(memid).unwrap().end_tick, Some(0));
    }

    #[test]
    fn children_run_above_their_suspended_parent() {
        let mut agent = SimAgent::new(flat_world(), BlockPos::new(0, 63, 0));
        let mut memory = AgentMemory::new();
        let pathfinder = AstarPathfinder::default();
        let config = TaskConfig::default();
        // Out of reach: the first build step pushes a move child.
        let target = BlockPos::new(9, 63, 0);
        let build = BuildTask::new(
            &agent,
            BuildParams {
                blocks_list: vec![(target, Idm::new(4, 0))],
                origin: target,
                ..BuildParams::default()
            },
            &config,
        );
        memory.task_stack_push(Task::Build(build), None);

        assert!(step_top(&mut agent, &mut memory, &pathfinder, &config).unwrap());
        assert_eq!(memory.task_stack_len(), 2);
        // The parent sits below the child it pushed.
        let start = agent.pos();
        assert!(step_top(&mut agent, &mut memory, &pathfinder, &config).unwrap());
        assert_ne!(agent.pos(), start);
        assert_eq!(memory.task_stack_len(), 2);
    }

    #[test]
    fn run_until_idle_drains_a_nested_build() {
        let mut agent = SimAgent::new(flat_world(), BlockPos::new(0, 63, 0));
        let mut memory = AgentMemory::new();
        let pathfinder = AstarPathfinder::default();
        let config = TaskConfig::default();
        let target = BlockPos::new(9, 63, 0);
        let build = BuildTask::new(
            &agent,
            BuildParams {
                blocks_list: vec![(target, Idm::new(4, 0))],
                origin: target,
                ..BuildParams::default()
            },
            &config,
        );
        memory.task_stack_push(Task::Build(build), None);

        let steps =
            run_until_idle(&mut agent, &mut memory, &pathfinder, &config, 256).unwrap();
        assert!(steps < 256);
        assert!(memory.task_stack_is_empty());
        assert_eq!(agent.world.get(target), Idm::new(4, 0));
        assert_eq!(memory.tick, steps as u64);
    }
}
