// AgentMemory — the shared memory/world-state collaborator.
//
// Hosts everything tasks share: the LIFO task stack with parent linkage
// (the explicit coroutine substitute — suspension is a push, not a call
// frame), the retired-task registry Undo resolves against, semantic triples
// (subject, predicate, object), location entities, composite block objects
// with a coordinate index, mob memories with first-seen ticks, and the
// logical clock.
//
// Task identities are sequential `MemId`s — deterministic, no entropy
// source needed.
//
// See also: `scheduler.rs` which steps the stack top, `task.rs` for the
// `Task` values stored here, `control.rs` for the Undo task that resolves
// retired tasks by id.
//
// **Critical constraint: determinism.** Observable iteration runs over
// `BTreeMap`/`Vec`; the `FxHashMap` coordinate index is a pure lookup
// accelerator whose iteration order is never observed.

use crate::agent::Agent;
use crate::task::Task;
use blockbot_core::{BlockPos, Idm, MobKind};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Persistent identity of a memory record (task, location, object, mob).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemId(pub u64);

impl fmt::Display for MemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mem:{}", self.0)
    }
}

/// The object slot of a triple: another memory record or a literal string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripleValue {
    Mem(MemId),
    Text(String),
}

/// A semantic (subject, predicate, object) assertion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub subj: MemId,
    pub pred: String,
    pub obj: TripleValue,
}

/// Bookkeeping record for a task that has been pushed onto the stack.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskNode {
    pub memid: MemId,
    pub parent: Option<MemId>,
    pub start_tick: u64,
    /// Stamped exactly once, when `check_finished` first observes the task
    /// finished.
    pub end_tick: Option<u64>,
}

/// A composite object: a named set of placed blocks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockObject {
    pub memid: MemId,
    pub blocks: BTreeMap<BlockPos, Idm>,
}

/// A mob the memory knows about, with the tick it was first seen.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MobMemory {
    pub memid: MemId,
    pub pos: BlockPos,
    pub kind: MobKind,
    pub spawn_tick: u64,
}

/// The shared memory collaborator. One instance per agent; mutated only by
/// whichever task is currently active.
#[derive(Debug, Default)]
pub struct AgentMemory {
    /// Logical clock, advanced by the scheduler.
    pub tick: u64,
    next_memid: u64,
    /// The shared task stack. Top of stack = last element. Children sit
    /// above their parent; the parent is revisited only once they finish.
    stack: Vec<Task>,
    task_nodes: BTreeMap<MemId, TaskNode>,
    /// Tasks that have left the stack. Undo (and the delegated undo of
    /// Fill/Dig) resolves task identities against this registry.
    retired_tasks: BTreeMap<MemId, Task>,
    triples: Vec<Triple>,
    locations: BTreeMap<MemId, BlockPos>,
    block_objects: BTreeMap<MemId, BlockObject>,
    xyz_index: FxHashMap<BlockPos, MemId>,
    mobs: BTreeMap<MemId, MobMemory>,
    seen_mob_count: usize,
    recent_entities: Vec<MemId>,
    /// Cells Build has placed and verified; consumed by world perception.
    pub pending_agent_placed_blocks: BTreeSet<BlockPos>,
}

impl AgentMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_tick(&mut self, ticks: u64) {
        self.tick += ticks;
    }

    fn alloc_memid(&mut self) -> MemId {
        self.next_memid += 1;
        MemId(self.next_memid)
    }

    // -----------------------------------------------------------------
    // Task stack
    // -----------------------------------------------------------------

    /// Push a task onto the stack under the given parent identity. Assigns
    /// the task a memid if it does not already carry one, and records its
    /// task node. Returns the task's memid.
    pub fn task_stack_push(&mut self, mut task: Task, parent: Option<MemId>) -> MemId {
        let memid = match task.base().memid {
            Some(id) => id,
            None => {
                let id = self.alloc_memid();
                task.base_mut().memid = Some(id);
                id
            }
        };
        self.task_nodes.insert(
            memid,
            TaskNode {
                memid,
                parent,
                start_tick: self.tick,
                end_tick: None,
            },
        );
        self.stack.push(task);
        memid
    }

    pub fn task_stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn task_stack_is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Remove and return the top of the stack.
    pub fn task_stack_pop(&mut self) -> Option<Task> {
        self.stack.pop()
    }

    /// Re-insert a task at `index` (used by the scheduler to slot a parent
    /// back underneath children it pushed during its step).
    pub fn task_stack_insert(&mut self, index: usize, task: Task) {
        self.stack.insert(index, task);
    }

    pub fn task_node(&self, memid: MemId) -> Option<&TaskNode> {
        self.task_nodes.get(&memid)
    }

    /// Stamp the end tick on a task node, exactly once.
    pub fn stamp_task_end(&mut self, memid: MemId) {
        if let Some(node) = self.task_nodes.get_mut(&memid) {
            if node.end_tick.is_none() {
                node.end_tick = Some(self.tick);
            }
        }
    }

    /// Move a task that has left the stack into the retired registry.
    pub fn retire_task(&mut self, mut task: Task) -> MemId {
        let memid = match task.base().memid {
            Some(id) => id,
            None => {
                let id = self.alloc_memid();
                task.base_mut().memid = Some(id);
                id
            }
        };
        self.retired_tasks.insert(memid, task);
        memid
    }

    /// Resolve a task by identity, removing it from wherever it lives
    /// (retired registry first, then the live stack). The caller must hand
    /// it back via `return_task`.
    pub fn take_task(&mut self, memid: MemId) -> Option<Task> {
        if let Some(task) = self.retired_tasks.remove(&memid) {
            return Some(task);
        }
        let index = self
            .stack
            .iter()
            .position(|t| t.base().memid == Some(memid))?;
        Some(self.stack.remove(index))
    }

    /// Hand back a task previously obtained from `take_task`.
    pub fn return_task(&mut self, task: Task) {
        self.retire_task(task);
    }

    // -----------------------------------------------------------------
    // Triples
    // -----------------------------------------------------------------

    pub fn add_triple(&mut self, subj: MemId, pred: &str, obj: TripleValue) {
        self.triples.push(Triple {
            subj,
            pred: pred.to_string(),
            obj,
        });
    }

    /// Tag a record with a literal: shorthand for a `has_tag` triple.
    pub fn tag(&mut self, subj: MemId, tag: &str) {
        self.add_triple(subj, "has_tag", TripleValue::Text(tag.to_string()));
    }

    /// Query triples; `None` in a slot matches anything.
    pub fn get_triples(
        &self,
        subj: Option<MemId>,
        pred: Option<&str>,
        obj: Option<&TripleValue>,
    ) -> Vec<Triple> {
        self.triples
            .iter()
            .filter(|t| subj.is_none_or(|s| t.subj == s))
            .filter(|t| pred.is_none_or(|p| t.pred == p))
            .filter(|t| obj.is_none_or(|o| &t.obj == o))
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------
    // Locations and recency
    // -----------------------------------------------------------------

    pub fn add_location(&mut self, pos: BlockPos) -> MemId {
        let memid = self.alloc_memid();
        self.locations.insert(memid, pos);
        memid
    }

    pub fn get_location(&self, memid: MemId) -> Option<BlockPos> {
        self.locations.get(&memid).copied()
    }

    /// Mark records as recently referenced (most recent last).
    pub fn update_recent_entities(&mut self, memids: &[MemId]) {
        for &memid in memids {
            self.recent_entities.retain(|&m| m != memid);
            self.recent_entities.push(memid);
        }
    }

    pub fn recent_entities(&self) -> &[MemId] {
        &self.recent_entities
    }

    // -----------------------------------------------------------------
    // Block objects
    // -----------------------------------------------------------------

    /// Register a composite object from its block set. Returns its memid.
    pub fn add_block_object(&mut self, blocks: BTreeMap<BlockPos, Idm>) -> MemId {
        let memid = self.alloc_memid();
        for pos in blocks.keys() {
            self.xyz_index.insert(*pos, memid);
        }
        self.block_objects.insert(memid, BlockObject { memid, blocks });
        memid
    }

    /// The composite object owning the block at `pos`, if any.
    pub fn block_object_at(&self, pos: BlockPos) -> Option<&BlockObject> {
        let memid = self.xyz_index.get(&pos)?;
        self.block_objects.get(memid)
    }

    pub fn block_object(&self, memid: MemId) -> Option<&BlockObject> {
        self.block_objects.get(&memid)
    }

    /// Retire a fully-destroyed composite object: drop the object, its
    /// coordinate index entries, and its triples (the destroyer captured
    /// any tags it intends to restore).
    pub fn remove_block_object(&mut self, memid: MemId) {
        if let Some(obj) = self.block_objects.remove(&memid) {
            for pos in obj.blocks.keys() {
                self.xyz_index.remove(pos);
            }
        }
        self.triples.retain(|t| t.subj != memid);
    }

    // -----------------------------------------------------------------
    // Mobs
    // -----------------------------------------------------------------

    /// Pull the agent's current perception into memory. Newly seen mobs are
    /// recorded with the current tick as their spawn tick.
    pub fn update(&mut self, agent: &dyn Agent) {
        let sightings = agent.visible_mobs();
        for sighting in sightings.iter().skip(self.seen_mob_count) {
            let memid = self.alloc_memid();
            self.mobs.insert(
                memid,
                MobMemory {
                    memid,
                    pos: sighting.pos,
                    kind: sighting.kind,
                    spawn_tick: self.tick,
                },
            );
        }
        self.seen_mob_count = sightings.len();
    }

    /// Mobs inside the inclusive box [min, max], first seen at or after
    /// `since_tick`, optionally restricted to a kind.
    pub fn get_mobs(
        &self,
        min: BlockPos,
        max: BlockPos,
        since_tick: u64,
        kind: Option<MobKind>,
    ) -> Vec<MobMemory> {
        self.mobs
            .values()
            .filter(|m| m.spawn_tick >= since_tick)
            .filter(|m| kind.is_none_or(|k| m.kind == k))
            .filter(|m| {
                m.pos.x >= min.x
                    && m.pos.x <= max.x
                    && m.pos.y >= min.y
                    && m.pos.y <= max.y
                    && m.pos.z >= min.z
                    && m.pos.z <= max.z
            })
            .cloned()
            .collect()
    }
}
