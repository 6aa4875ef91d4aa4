// Move — path following with opportunistic restoration and obstacle clearing.
//
// The movement primitive nearly every other task delegates to. State
// machine over {no-path-cached, path-cached, finished}:
//
// 1. Flush the replace set: blocks dug by the no-path fallback are restored
//    opportunistically; failures stay queued for a later step.
// 2. Within `approx` of the target: finish (and, if this task is tracked in
//    memory, record a location entity and causally link it to the task and
//    to any chat that triggered it).
// 3. Path cache stale (agent's position no longer matches the cached
//    route's tail): ask the pathfinder for a fresh route; if none exists,
//    fall back to a greedy dig-and-step toward the target.
// 4. Otherwise pop the next waypoint and take the single unit step toward
//    it.
//
// The fallback guarantees eventual progress even when the planner fails,
// at the cost of terrain damage that stays queued in the replace set until
// restored.
//
// See also: `pathfind.rs` for the route producer, `build.rs`/`destroy.rs`
// which push Move children to get within reach.

use crate::task::{TaskBase, TaskContext, TaskError};
use blockbot_core::block_data::is_passable;
use blockbot_core::{BlockPos, Direction, Idm};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Walk to within `approx` of a target, clearing obstacles if it must.
#[derive(Debug, Serialize, Deserialize)]
pub struct MoveTask {
    pub base: TaskBase,
    target: BlockPos,
    approx: u32,
    /// Cached route stored tail-first: the last element is the waypoint the
    /// agent currently stands on. Invalidated when the agent's position
    /// diverges from it.
    path: Option<Vec<BlockPos>>,
    /// Blocks destructively cleared by the fallback; restored
    /// opportunistically, removed only after a successful restoration.
    replace: BTreeSet<(BlockPos, Idm)>,
}

impl MoveTask {
    pub fn new(target: BlockPos, approx: u32) -> Self {
        Self {
            base: TaskBase::default(),
            target,
            approx,
            path: None,
            replace: BTreeSet::new(),
        }
    }

    pub fn target(&self) -> BlockPos {
        self.target
    }

    pub fn replace_set(&self) -> &BTreeSet<(BlockPos, Idm)> {
        &self.replace
    }

    pub(crate) fn default_descriptor(&self) -> String {
        format!("Move {} {} {}", self.target.x, self.target.y, self.target.z)
    }

    pub fn step(&mut self, cx: &mut TaskContext<'_>) -> Result<(), TaskError> {
        self.base.interrupted = false;

        // Restore previously dug blocks where possible.
        let pending: Vec<(BlockPos, Idm)> =
            std::mem::take(&mut self.replace).into_iter().collect();
        for (pos, idm) in pending {
            cx.agent.set_held_item(idm);
            if cx.agent.place_block(pos) {
                info!(%pos, %idm, "move: replaced block");
            } else {
                // Try again later.
                self.replace.insert((pos, idm));
            }
        }
        if !self.replace.is_empty() {
            info!(remaining = self.replace.len(), "move: replace set not yet empty");
        }

        // Arrived?
        if cx.agent.pos().manhattan_distance(self.target) <= self.approx {
            if !self.replace.is_empty() {
                warn!(
                    remaining = self.replace.len(),
                    "move finished with non-empty replace set"
                );
            }
            self.base.finished = true;
            if let Some(memid) = self.base.memid {
                let locmemid = cx.memory.add_location(self.target);
                cx.memory.update_recent_entities(&[locmemid]);
                cx.memory.add_triple(
                    memid,
                    "task_effect_",
                    crate::memory::TripleValue::Mem(locmemid),
                );
                let chat_triples = cx.memory.get_triples(
                    None,
                    Some("chat_effect_"),
                    Some(&crate::memory::TripleValue::Mem(memid)),
                );
                if let Some(chat) = chat_triples.first() {
                    cx.memory.add_triple(
                        chat.subj,
                        "chat_effect_",
                        crate::memory::TripleValue::Mem(locmemid),
                    );
                }
            }
            return Ok(());
        }

        // Refresh the path if none is cached or the cache has gone stale.
        let stale = match &self.path {
            None => true,
            Some(route) => route.last() != Some(&cx.agent.pos()),
        };
        if stale {
            let pathfinder = cx.pathfinder;
            match pathfinder.find_path(&*cx.agent, self.target, self.approx) {
                Some(route) => {
                    self.path = Some(route.into_iter().rev().collect());
                }
                None => {
                    self.handle_no_path(cx);
                    return Ok(());
                }
            }
        }

        // Take one step along the path.
        let Some(route) = self.path.as_mut() else {
            return Ok(());
        };
        route.pop(); // the waypoint the agent stands on
        let Some(&next) = route.last() else {
            self.path = None;
            return Ok(());
        };
        let pos = cx.agent.pos();
        match Direction::from_delta(next.x - pos.x, next.y - pos.y, next.z - pos.z) {
            Some(dir) => cx.agent.step(dir),
            None => {
                warn!(%pos, %next, "move: non-unit step in cached path, recomputing");
                self.path = None;
            }
        }
        Ok(())
    }

    /// Greedy fallback when the planner reports no route: pick an axis
    /// direction that makes progress toward the target, dig the foot and
    /// head cells there if they are blocked (queueing them for later
    /// restoration), and step.
    fn handle_no_path(&mut self, cx: &mut TaskContext<'_>) {
        let pos = cx.agent.pos();
        let delta = (
            self.target.x - pos.x,
            self.target.y - pos.y,
            self.target.z - pos.z,
        );
        for dir in Direction::ALL {
            let (ux, uy, uz) = dir.unit();
            if delta.0 * ux + delta.1 * uy + delta.2 * uz <= 0 {
                continue;
            }
            let newpos = dir.step_from(pos);
            let column = cx.agent.read_blocks(newpos, newpos.above());
            let mut dug: SmallVec<[(BlockPos, Idm); 2]> = SmallVec::new();
            for (cell, idm) in [
                (newpos, column.get(0, 0, 0)),
                (newpos.above(), column.get(1, 0, 0)),
            ] {
                if !is_passable(idm.id) {
                    dug.push((cell, idm));
                }
            }
            for (cell, idm) in dug {
                debug!(%cell, %idm, "move fallback: digging through");
                self.replace.insert((cell, idm));
                cx.agent.dig(cell);
            }
            cx.agent.step(dir);
            break;
        }
    }
}
