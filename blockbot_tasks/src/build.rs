// Build — diff-driven reconstruction of a schematic in the world.
//
// Build never replays a placement script. Each step it re-reads the target
// region, diffs it against the schematic, and corrects exactly one cell —
// so external edits mid-build are absorbed and convergence is to the
// world's actual state. The diff skips cells whose retry budget is
// exhausted, cells holding an ignore-listed block, interchangeable-pair
// matches, and (in embed mode) cells the schematic leaves as air.
//
// Cell selection runs four consecutive stable sorts, so later keys
// dominate: distance to the agent, then remaining attempts (more first),
// then height (lower first), then whether the cell is under the agent's
// feet (last). The composite order builds bottom-up, prefers fresh cells,
// breaks ties toward the agent, and postpones standing-room conflicts.
//
// Ground snap: a schematic that contains ground-like blocks is meant to
// sit on terrain, so (unless forced or embedded) the origin height is
// re-anchored to the measured terrain height at the origin column.
//
// See also: `destroy.rs` (pushed as a child to excavate blocks in the
// way), `movement.rs` (pushed to get within placement reach),
// `blockbot_core::block_data` for the palette tables the diff consumes.

use crate::agent::{Agent, is_walkable, read_block};
use crate::config::TaskConfig;
use crate::destroy::DestroyTask;
use crate::memory::{MemId, TripleValue};
use crate::movement::MoveTask;
use crate::task::{Task, TaskBase, TaskContext, TaskError};
use blockbot_core::block_data::{
    BUILD_IGNORE_BLOCKS, BUILD_INTERCHANGEABLE_PAIRS, GROUND_BLOCKS, build_replacement,
    is_passable,
};
use blockbot_core::grid::CellCounters;
use blockbot_core::schematic::{blocks_list_to_grid, grid_to_blocks_list};
use blockbot_core::{BlockGrid, BlockPos, Direction, Idm};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Construction parameters for a Build.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildParams {
    /// The structure, as world-space (position, block) pairs. Positions are
    /// normalized internally; only their relative arrangement matters.
    pub blocks_list: Vec<(BlockPos, Idm)>,
    /// World-space minimum corner the normalized schematic is anchored to.
    pub origin: BlockPos,
    /// Embed mode: never clear cells the schematic leaves as air.
    pub embed: bool,
    /// Force mode: suppress the ground-snap heuristic (used by undo, which
    /// must restore at the exact recorded origin).
    pub force: bool,
    /// Announce completion in chat.
    pub verbose: bool,
    /// Announce completion with the fill wording instead.
    pub fill_message: bool,
    /// Schematic record this build instantiates, if any.
    pub schematic_memid: Option<MemId>,
    /// (predicate, value) pairs to assert on the finished block object.
    pub schematic_tags: Vec<(String, String)>,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            blocks_list: Vec::new(),
            origin: BlockPos::new(0, 0, 0),
            embed: false,
            force: false,
            verbose: true,
            fill_message: false,
            schematic_memid: None,
            schematic_tags: Vec::new(),
        }
    }
}

/// One cell the world disagrees with the schematic about.
struct DiffCell {
    rel: (usize, usize, usize),
    pos: BlockPos,
    cur: Idm,
    want: Idm,
}

/// Reconstruct a schematic at an origin, one corrected cell per step.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuildTask {
    pub base: TaskBase,
    schematic: BlockGrid,
    origin: BlockPos,
    /// Per-cell retry budget; a cell at zero leaves the diff for good.
    attempts: CellCounters,
    embed: bool,
    verbose: bool,
    fill_message: bool,
    schematic_memid: Option<MemId>,
    schematic_tags: Vec<(String, String)>,
    /// One-shot guard for the placement-exhaustion notice.
    giving_up_message_sent: bool,
    /// Pre-build snapshot of the target region, captured on the first step;
    /// undo rebuilds from it.
    old_blocks_list: Option<Vec<(BlockPos, Idm)>>,
    /// Blocks this task has placed and verified.
    new_blocks: Vec<(BlockPos, Idm)>,
}

impl BuildTask {
    pub fn new(agent: &dyn Agent, params: BuildParams, config: &TaskConfig) -> Self {
        let (mut schematic, _) = blocks_list_to_grid(&params.blocks_list);
        // Substitute unplaceable block types up front.
        let (sy, sz, sx) = schematic.shape();
        for y in 0..sy {
            for z in 0..sz {
                for x in 0..sx {
                    if let Some(sub) = build_replacement(schematic.get(y, z, x).id) {
                        schematic.set(y, z, x, sub);
                    }
                }
            }
        }

        let mut origin = params.origin;
        let has_ground = schematic
            .cells()
            .any(|(_, idm)| GROUND_BLOCKS.contains(&idm.id));
        if !params.force && !params.embed && has_ground {
            if let Some(ground_y) = terrain_height(agent, origin.x, origin.z, origin.y) {
                info!(from = origin.y, to = ground_y, "build: snapping origin to terrain");
                origin.y = ground_y;
            }
        }

        let attempts = CellCounters::matching(&schematic, config.build_attempts);
        Self {
            base: TaskBase::default(),
            schematic,
            origin,
            attempts,
            embed: params.embed,
            verbose: params.verbose,
            fill_message: params.fill_message,
            schematic_memid: params.schematic_memid,
            schematic_tags: params.schematic_tags,
            giving_up_message_sent: false,
            old_blocks_list: None,
            new_blocks: Vec::new(),
        }
    }

    pub fn origin(&self) -> BlockPos {
        self.origin
    }

    pub fn attempts_at(&self, y: usize, z: usize, x: usize) -> u8 {
        self.attempts.get(y, z, x)
    }

    pub fn new_blocks(&self) -> &[(BlockPos, Idm)] {
        &self.new_blocks
    }

    fn region_max(&self) -> BlockPos {
        let (sy, sz, sx) = self.schematic.shape();
        BlockPos::new(
            self.origin.x + sx.saturating_sub(1) as i32,
            self.origin.y + sy.saturating_sub(1) as i32,
            self.origin.z + sz.saturating_sub(1) as i32,
        )
    }

    fn world_pos(&self, rel: (usize, usize, usize)) -> BlockPos {
        BlockPos::new(
            self.origin.x + rel.2 as i32,
            self.origin.y + rel.0 as i32,
            self.origin.z + rel.1 as i32,
        )
    }

    /// Cells where the world disagrees with the schematic, subject to the
    /// budget, ignore-list, embed, and interchangeable-pair exemptions.
    fn diff(&self, current: &BlockGrid) -> Vec<DiffCell> {
        self.schematic
            .cells()
            .filter_map(|(rel, want)| {
                let cur = current.get(rel.0, rel.1, rel.2);
                if cur.id == want.id {
                    return None;
                }
                if self.attempts.get(rel.0, rel.1, rel.2) == 0 {
                    return None;
                }
                if BUILD_IGNORE_BLOCKS.contains(&cur.id) {
                    return None;
                }
                if self.embed && want.id == 0 {
                    return None;
                }
                if interchangeable(cur.id, want.id) {
                    return None;
                }
                Some(DiffCell {
                    rel,
                    pos: self.world_pos(rel),
                    cur,
                    want,
                })
            })
            .collect()
    }

    pub fn step(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        self.base.interrupted = false;
        let agent_pos = cx.agent.pos();
        let current = cx.agent.read_blocks(self.origin, self.region_max());

        if self.old_blocks_list.is_none() {
            self.old_blocks_list = Some(grid_to_blocks_list(&current, self.origin));
        }

        let mut cells = self.diff(&current);
        if cells.is_empty() {
            self.finish(cx);
            return Ok(());
        }

        // Blocks in the way are excavated wholesale before any placement.
        let to_destroy: Vec<(BlockPos, Idm)> = cells
            .iter()
            .filter(|c| c.cur.id != 0)
            .map(|c| (c.pos, c.cur))
            .collect();
        if !to_destroy.is_empty() {
            info!(count = to_destroy.len(), "build: excavating blocks in the way");
            let child = DestroyTask::new(&*cx.memory, to_destroy, false);
            cx.memory
                .task_stack_push(Task::Destroy(child), self.base.memid);
            return Ok(());
        }

        // Four stable sorts; the later key dominates.
        cells.sort_by_key(|c| agent_pos.manhattan_distance(c.pos));
        cells.sort_by_key(|c| Reverse(self.attempts.get(c.rel.0, c.rel.1, c.rel.2)));
        cells.sort_by_key(|c| c.rel.0);
        cells.sort_by_key(|c| c.pos == agent_pos || c.pos == agent_pos.above());
        let target = &cells[0];

        if target.pos == agent_pos || target.pos == agent_pos.above() {
            return self.step_aside(cx);
        }

        if agent_pos.manhattan_distance(target.pos) > cx.config.place_reach {
            let mut mv = MoveTask::new(target.pos, cx.config.place_reach);
            mv.base.featurizer = self.base.featurizer;
            cx.memory.task_stack_push(Task::Move(mv), self.base.memid);
            return Ok(());
        }

        let (rel, pos, want) = (target.rel, target.pos, target.want);
        if target.cur.id != 0 {
            cx.agent.dig(pos);
        }
        if want.id != 0 {
            cx.agent.set_held_item(want);
            if cx.agent.place_block(pos) {
                let placed = read_block(&*cx.agent, pos);
                if placed.id == want.id {
                    cx.memory.pending_agent_placed_blocks.insert(pos);
                    self.new_blocks.push((pos, want));
                } else {
                    // Reported success, but the world disagrees.
                    error!(%pos, %want, %placed, "build: placement did not stick");
                }
            } else {
                warn!(%pos, %want, "build: placement refused");
            }
        }
        let remaining = self.attempts.decrement(rel.0, rel.1, rel.2);
        if remaining == 0 && !self.giving_up_message_sent {
            cx.agent.send_chat(
                "I'm skipping a block because I can't place it. Maybe something is in the way.",
            );
            self.giving_up_message_sent = true;
        }
        Ok(())
    }

    /// The next target is under the agent's feet: take any walkable step
    /// out of the way. Total enclosure is an invariant breach.
    fn step_aside(&self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        let pos = cx.agent.pos();
        for dir in [
            Direction::PosZ,
            Direction::NegZ,
            Direction::PosX,
            Direction::NegX,
            Direction::PosY,
            Direction::NegY,
        ] {
            if is_walkable(&*cx.agent, dir.step_from(pos)) {
                cx.agent.step(dir);
                return Ok(());
            }
        }
        Err(TaskError::Enclosed { pos })
    }

    /// Register the finished structure in memory and announce completion.
    /// Keyed on the schematic, not on what this task placed: a build that
    /// converges without placing anything (the world already matched, or
    /// someone else finished it) still owns its tags and effect linkage.
    fn finish(&mut self, cx: &mut TaskContext<'_>) {
        let placed = grid_to_blocks_list(&self.schematic, self.origin);
        if let Some(&(anchor, _)) = placed.first() {
            let memid = match cx.memory.block_object_at(anchor) {
                Some(obj) => obj.memid,
                None => {
                    let blocks: BTreeMap<BlockPos, Idm> = if self.new_blocks.is_empty() {
                        placed.iter().copied().collect()
                    } else {
                        self.new_blocks.iter().copied().collect()
                    };
                    cx.memory.add_block_object(blocks)
                }
            };
            if let Some(schematic_memid) = self.schematic_memid {
                cx.memory
                    .add_triple(memid, "_from_schematic", TripleValue::Mem(schematic_memid));
            }
            for (pred, value) in &self.schematic_tags {
                cx.memory
                    .add_triple(memid, pred, TripleValue::Text(value.clone()));
                if pred == "has_name" {
                    cx.memory.tag(memid, value);
                }
            }
            cx.memory.update_recent_entities(&[memid]);
            if let Some(task_memid) = self.base.memid {
                cx.memory
                    .add_triple(task_memid, "task_effect_", TripleValue::Mem(memid));
            }
        }
        if self.verbose {
            cx.agent.send_chat("I finished building this");
        }
        if self.fill_message {
            cx.agent.send_chat("I finished filling this");
        }
        self.base.finished = true;
    }

    /// Reverse the build: destroy what was placed, then rebuild the
    /// pre-build snapshot (the destroy child sits above the rebuild on the
    /// stack, so it runs first).
    pub fn undo(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        cx.agent.send_chat("ok I will remove it.");
        if let Some(old) = &self.old_blocks_list {
            if !old.is_empty() {
                let rebuild = BuildTask::new(
                    &*cx.agent,
                    BuildParams {
                        blocks_list: old.clone(),
                        origin: self.origin,
                        embed: self.embed,
                        force: true,
                        verbose: false,
                        ..BuildParams::default()
                    },
                    cx.config,
                );
                cx.memory
                    .task_stack_push(Task::Build(rebuild), self.base.memid);
            }
        }
        if !self.new_blocks.is_empty() {
            let teardown = DestroyTask::new(&*cx.memory, self.new_blocks.clone(), false);
            cx.memory
                .task_stack_push(Task::Destroy(teardown), self.base.memid);
        }
        Ok(())
    }
}

/// Are these two block types an interchangeable pair (in either order)?
fn interchangeable(a: u16, b: u16) -> bool {
    BUILD_INTERCHANGEABLE_PAIRS
        .iter()
        .any(|&(p, q)| (a == p && b == q) || (a == q && b == p))
}

/// Terrain height at a column: one above the topmost non-passable block,
/// scanning a fixed window around `around_y`. `None` if the column is
/// passable throughout the window.
fn terrain_height(agent: &dyn Agent, x: i32, z: i32, around_y: i32) -> Option<i32> {
    for y in (around_y - 63..=around_y + 16).rev() {
        if !is_passable(read_block(agent, BlockPos::new(x, y, z)).id) {
            return Some(y + 1);
        }
    }
    None
}
