// blockbot_tasks — the task-execution core of a voxel-world agent.
//
// Turns high-level intents (build a structure, clear a region, move to a
// point, spawn a mob, repeat until a condition holds) into small, resumable,
// world-mutating steps driven by a cooperative task stack. Exactly one task
// is active per tick; a task suspends a multi-tick sub-goal by pushing a
// child onto the shared stack and returning, and is revisited only after
// all descendants finish.
//
// Module overview:
// - `agent.rs`:     The `Agent` capability trait (world reads, dig/place,
//                   the six unit movement primitives, chat) + read helpers.
// - `config.rs`:    `TaskConfig` — every tunable (reach, attempts budget,
//                   spawn confirmation window, pathfinder node budget).
// - `memory.rs`:    `AgentMemory` — the shared task stack, task nodes with
//                   parent linkage, semantic triples, locations, block
//                   objects, mob memories, and the logical clock.
// - `pathfind.rs`:  `Pathfinder` trait + grid A* over the agent's world.
// - `task.rs`:      `TaskBase`, the closed `Task` enum, `TaskError`,
//                   `TaskContext` — the uniform contract every task obeys.
// - `scheduler.rs`: Cooperative stepping of the stack top.
// - `movement.rs`:  Move — path following with obstacle clearing.
// - `build.rs`:     Build — schematic-vs-world diff reconciliation.
// - `destroy.rs`:   Destroy — region clearing with tag-preserving undo.
// - `fill.rs`:      Fill — one-shot dispatcher onto an embedded Build.
// - `dig.rs`:       Dig — volume excavation delegating to Destroy.
// - `spawn.rs`:     Spawn — egg placement + world-state confirmation.
// - `control.rs`:   Loop (repeat-until-condition) and Undo (delegator).
// - `sim_agent.rs`: Headless in-memory `Agent` over a dense `VoxelWorld`.
//
// **Critical constraint: determinism.** Single-threaded and cooperative;
// every observable iteration runs over `BTreeMap`/`BTreeSet` or fixed-order
// grids. Tasks re-read world state at the top of each step rather than
// trusting caches — the world may have changed between ticks.

pub mod agent;
pub mod build;
pub mod config;
pub mod control;
pub mod destroy;
pub mod dig;
pub mod fill;
pub mod memory;
pub mod movement;
pub mod pathfind;
pub mod scheduler;
pub mod sim_agent;
pub mod spawn;
pub mod task;

pub use agent::{Agent, MobSighting};
pub use build::{BuildParams, BuildTask};
pub use config::TaskConfig;
pub use control::{LoopTask, StopCondition, TaskFactory, UndoTask};
pub use destroy::DestroyTask;
pub use dig::DigTask;
pub use fill::FillTask;
pub use memory::{AgentMemory, MemId, Triple, TripleValue};
pub use movement::MoveTask;
pub use pathfind::{AstarPathfinder, Pathfinder};
pub use scheduler::{run_until_idle, step_top};
pub use sim_agent::SimAgent;
pub use spawn::SpawnTask;
pub use task::{Task, TaskBase, TaskContext, TaskError};
