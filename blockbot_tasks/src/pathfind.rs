// Pathfinding collaborator: trait surface + grid A*.
//
// Tasks treat pathfinding as a black box behind the `Pathfinder` trait:
// given the agent, a target, and an acceptance radius, produce an ordered
// route of waypoints (start position first) ending within that radius, or
// signal unreachability with `None`.
//
// `AstarPathfinder` is the bundled implementation: standard A* using a
// `BinaryHeap` min-heap via reversed ordering, Manhattan heuristic adjusted
// for the acceptance radius (admissible), unit step costs, six axis
// neighbors gated on foot-and-head passability. Expansion is bounded by a
// node budget so an unreachable target in an open world terminates.
//
// **Critical constraint: determinism.** Heap ties break on the position's
// total order; the closed set and came-from maps are lookup-only (their
// iteration order is never observed).

use crate::agent::{Agent, is_walkable};
use blockbot_core::{BlockPos, Direction};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Black-box route producer tasks query.
pub trait Pathfinder {
    /// An ordered route from the agent's current position to within
    /// `approx` (Manhattan) of `target`, start position included, or `None`
    /// if unreachable.
    fn find_path(&self, agent: &dyn Agent, target: BlockPos, approx: u32)
    -> Option<Vec<BlockPos>>;
}

/// Grid A* over the agent's world.
#[derive(Clone, Copy, Debug)]
pub struct AstarPathfinder {
    /// Node expansion budget; search gives up past this.
    pub max_nodes: usize,
}

impl Default for AstarPathfinder {
    fn default() -> Self {
        Self { max_nodes: 4096 }
    }
}

/// Entry in the open set (min-heap via reversed ordering).
struct OpenEntry {
    pos: BlockPos,
    f_score: u32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score && self.pos == other.pos
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest f_score is "greatest".
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.pos.cmp(&self.pos))
    }
}

/// Heuristic: remaining Manhattan distance to the acceptance sphere.
fn heuristic(from: BlockPos, target: BlockPos, approx: u32) -> u32 {
    from.manhattan_distance(target).saturating_sub(approx)
}

impl Pathfinder for AstarPathfinder {
    fn find_path(
        &self,
        agent: &dyn Agent,
        target: BlockPos,
        approx: u32,
    ) -> Option<Vec<BlockPos>> {
        let start = agent.pos();
        if start.manhattan_distance(target) <= approx {
            return Some(vec![start]);
        }

        let mut g_score: FxHashMap<BlockPos, u32> = FxHashMap::default();
        let mut came_from: FxHashMap<BlockPos, BlockPos> = FxHashMap::default();
        let mut closed: FxHashSet<BlockPos> = FxHashSet::default();
        let mut open = BinaryHeap::new();

        g_score.insert(start, 0);
        open.push(OpenEntry {
            pos: start,
            f_score: heuristic(start, target, approx),
        });

        let mut expanded = 0usize;
        while let Some(current) = open.pop() {
            let pos = current.pos;
            if pos.manhattan_distance(target) <= approx {
                return Some(reconstruct(&came_from, start, pos));
            }
            if !closed.insert(pos) {
                continue;
            }
            expanded += 1;
            if expanded > self.max_nodes {
                return None;
            }

            let current_g = g_score[&pos];
            for dir in Direction::ALL {
                let neighbor = dir.step_from(pos);
                if closed.contains(&neighbor) || !is_walkable(agent, neighbor) {
                    continue;
                }
                let tentative_g = current_g + 1;
                if tentative_g < *g_score.get(&neighbor).unwrap_or(&u32::MAX) {
                    g_score.insert(neighbor, tentative_g);
                    came_from.insert(neighbor, pos);
                    open.push(OpenEntry {
                        pos: neighbor,
                        f_score: tentative_g + heuristic(neighbor, target, approx),
                    });
                }
            }
        }
        None
    }
}

fn reconstruct(
    came_from: &FxHashMap<BlockPos, BlockPos>,
    start: BlockPos,
    goal: BlockPos,
) -> Vec<BlockPos> {
    let mut route = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                route.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    route.reverse();
    route
}
