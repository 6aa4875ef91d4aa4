// The task contract: TaskBase, the closed Task enum, TaskContext, TaskError.
//
// Every behavior implements the same uniform operation set — step,
// interrupt, check_finished, featurize, undo — dispatched over a closed
// tagged enum (one case per concrete behavior). The contract, not the
// dispatch mechanism, is load-bearing:
//
// - `step` does one bounded unit of work and returns; it never blocks and
//   never pre-empts. Multi-tick sub-goals are pushed as children onto the
//   shared stack in `AgentMemory`; the parent is revisited only after all
//   descendants finish.
// - `interrupt` sets an advisory flag a task observes (and clears) only at
//   the start of its own next step.
// - `check_finished` reports completion and, exactly once, stamps the end
//   tick on the task's memory node.
// - `featurize` returns a descriptor via the injected callback or a
//   task-specific default.
// - `undo` reverses effects where supported (Build, Destroy, Fill, Dig);
//   the other tasks report `UndoUnsupported`.
//
// Expected, recoverable conditions are not errors: unreachable targets and
// placement exhaustion finish the task with a chat notification.
// `TaskError` is reserved for invariant violations the task cannot locally
// repair (total enclosure, a dangling undo identity).
//
// See also: `scheduler.rs` for the cooperative driver, `memory.rs` for the
// stack and task nodes.

use crate::agent::Agent;
use crate::build::BuildTask;
use crate::config::TaskConfig;
use crate::control::{LoopTask, UndoTask};
use crate::destroy::DestroyTask;
use crate::dig::DigTask;
use crate::fill::FillTask;
use crate::memory::{AgentMemory, MemId};
use crate::movement::MoveTask;
use crate::pathfind::Pathfinder;
use crate::spawn::SpawnTask;
use blockbot_core::BlockPos;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unrecoverable task failures. Everything recoverable is handled inside
/// the task (finish + notification), never surfaced here.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The agent is boxed into solid matter: no walkable neighbor in any of
    /// the six directions. An environment invariant breach, not an ordinary
    /// failure.
    #[error("agent is enclosed at {pos}: no walkable neighbor in any direction")]
    Enclosed { pos: BlockPos },

    /// An undo referenced a task identity memory cannot resolve.
    #[error("task {0} not found in memory")]
    UnknownTask(MemId),

    /// `undo` invoked on a task kind that does not support it.
    #[error("task kind `{0}` does not support undo")]
    UndoUnsupported(&'static str),
}

/// Injected descriptor callback; receives the whole task.
pub type Featurizer = fn(&Task) -> String;

/// The collaborators every task operation receives explicitly. No global
/// state: world access, memory, pathfinding, and config all ride here.
pub struct TaskContext<'a> {
    pub agent: &'a mut dyn Agent,
    pub memory: &'a mut AgentMemory,
    pub pathfinder: &'a dyn Pathfinder,
    pub config: &'a TaskConfig,
}

/// Fields shared by every task variant.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TaskBase {
    /// Advisory stop request; observed and cleared at the start of the
    /// task's own next step, never mid-step.
    pub interrupted: bool,
    /// Set by the task itself; immutable once true.
    pub finished: bool,
    pub name: Option<String>,
    /// Persistent identity, assigned when the task is pushed onto the stack.
    pub memid: Option<MemId>,
    #[serde(skip)]
    pub featurizer: Option<Featurizer>,
    /// One-shot guard so the end tick is stamped exactly once.
    pub(crate) end_stamped: bool,
}

/// A task: one closed variant per concrete behavior.
#[derive(Debug)]
pub enum Task {
    Move(MoveTask),
    Build(BuildTask),
    Destroy(DestroyTask),
    Fill(FillTask),
    Dig(DigTask),
    Spawn(SpawnTask),
    Loop(LoopTask),
    Undo(UndoTask),
}

impl Task {
    pub fn base(&self) -> &TaskBase {
        match self {
            Task::Move(t) => &t.base,
            Task::Build(t) => &t.base,
            Task::Destroy(t) => &t.base,
            Task::Fill(t) => &t.base,
            Task::Dig(t) => &t.base,
            Task::Spawn(t) => &t.base,
            Task::Loop(t) => &t.base,
            Task::Undo(t) => &t.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut TaskBase {
        match self {
            Task::Move(t) => &mut t.base,
            Task::Build(t) => &mut t.base,
            Task::Destroy(t) => &mut t.base,
            Task::Fill(t) => &mut t.base,
            Task::Dig(t) => &mut t.base,
            Task::Spawn(t) => &mut t.base,
            Task::Loop(t) => &mut t.base,
            Task::Undo(t) => &mut t.base,
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match self {
            Task::Move(_) => "move",
            Task::Build(_) => "build",
            Task::Destroy(_) => "destroy",
            Task::Fill(_) => "fill",
            Task::Dig(_) => "dig",
            Task::Spawn(_) => "spawn",
            Task::Loop(_) => "loop",
            Task::Undo(_) => "undo",
        }
    }

    /// Perform one bounded unit of work.
    pub fn step(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        match self {
            Task::Move(t) => t.step(cx),
            Task::Build(t) => t.step(cx),
            Task::Destroy(t) => t.step(cx),
            Task::Fill(t) => t.step(cx),
            Task::Dig(t) => t.step(cx),
            Task::Spawn(t) => t.step(cx),
            Task::Loop(t) => t.step(cx),
            Task::Undo(t) => t.step(cx),
        }
    }

    /// Reverse this task's effects, where supported.
    pub fn undo(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        match self {
            Task::Build(t) => t.undo(cx),
            Task::Destroy(t) => t.undo(cx),
            Task::Fill(t) => t.undo(cx),
            Task::Dig(t) => t.undo(cx),
            Task::Move(_) | Task::Spawn(_) | Task::Loop(_) | Task::Undo(_) => {
                Err(TaskError::UndoUnsupported(self.kind_name()))
            }
        }
    }

    /// Request a cooperative stop. Only sets the advisory flag.
    pub fn interrupt(&mut self) {
        self.base_mut().interrupted = true;
    }

    /// Completion status; on the first observation of `finished`, stamps
    /// the end tick on the task's memory node.
    pub fn check_finished(&mut self, memory: &mut AgentMemory) -> bool {
        let finished = self.base().finished;
        if finished && !self.base().end_stamped {
            if let Some(memid) = self.base().memid {
                memory.stamp_task_end(memid);
            }
            self.base_mut().end_stamped = true;
        }
        finished
    }

    /// Descriptor via the injected callback, or the task-specific default.
    pub fn featurize(&self) -> String {
        if let Some(f) = self.base().featurizer {
            return f(self);
        }
        match self {
            Task::Move(t) => t.default_descriptor(),
            Task::Build(_) => "Build".to_string(),
            Task::Destroy(_) => "smash".to_string(),
            _ => "empty".to_string(),
        }
    }
}
